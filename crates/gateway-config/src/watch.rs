//! Hot configuration reload: watches `GATEWAY_CONFIG_PATH` for changes and
//! swaps in a freshly parsed [`GatewayConfig`] without a restart.
//!
//! Only the file layer is live-reloaded; environment variables are read
//! once at process start, matching §9's "long-lived process-wide
//! services constructed at startup" design note applied to configuration.

use crate::loader::load_config;
use crate::settings::GatewayConfig;
use arc_swap::ArcSwap;
use notify::{Event, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A config value that can be hot-swapped in place. Cloning is cheap —
/// every clone shares the same underlying [`ArcSwap`].
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<GatewayConfig>>,
}

impl ConfigHandle {
    /// Wrap an initial config for sharing across the app.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Load the current config. Cheap: an `Arc` clone, not a deep copy.
    #[must_use]
    pub fn current(&self) -> Arc<GatewayConfig> {
        self.inner.load_full()
    }

    /// Replace the current config.
    pub fn store(&self, config: GatewayConfig) {
        self.inner.store(Arc::new(config));
    }
}

/// Spawn a background task that watches the file at `GATEWAY_CONFIG_PATH`
/// (if set) and reloads `handle` whenever it changes on disk. A reload
/// that fails to parse is logged and the previous config is kept.
///
/// Returns `None` (no watcher spawned) if `GATEWAY_CONFIG_PATH` isn't set
/// — there's nothing to watch.
pub fn spawn_watcher(handle: ConfigHandle) -> Option<notify::RecommendedWatcher> {
    let path = std::env::var("GATEWAY_CONFIG_PATH").ok()?;
    let watched_path = PathBuf::from(&path);

    let (tx, mut rx) = tokio::sync::mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match notify::recommended_watcher(move |res| {
        let _ = tx.blocking_send(res);
    }) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "failed to create config file watcher");
            return None;
        }
    };

    if let Err(e) = watcher.watch(&watched_path, RecursiveMode::NonRecursive) {
        error!(error = %e, path = %path, "failed to watch config file");
        return None;
    }

    info!(path = %path, "watching configuration file for changes");

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                Ok(event) if event.kind.is_modify() => match load_config().await {
                    Ok(new_config) => {
                        info!("configuration reloaded");
                        handle.store(new_config);
                    }
                    Err(e) => warn!(error = %e, "config reload failed, keeping previous config"),
                },
                Ok(_) => {}
                Err(e) => warn!(error = %e, "config watcher error"),
            }
        }
    });

    Some(watcher)
}
