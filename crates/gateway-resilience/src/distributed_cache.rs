//! Typed key/value cache facade over a local L1 and a distributed L2.
//!
//! This is the shared cache every budget-resolution read goes through:
//! typed keys, per-family TTLs, a single-round-trip batch `multi_get`, and a
//! negative-result sentinel so a confirmed-absent row is distinguishable
//! from a cold cache. Remote failures degrade to a miss rather than an
//! error — callers fall through to the durable store.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Error types for distributed cache operations
#[derive(Debug, Error)]
pub enum DistributedCacheError {
    /// Connection error
    #[error("cache connection error: {0}")]
    ConnectionError(String),

    /// Serialization error
    #[error("cache serialization error: {0}")]
    SerializationError(String),

    /// Operation timeout
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// Backend not available
    #[error("cache backend not available: {0}")]
    Unavailable(String),

    /// Configuration error
    #[error("cache configuration error: {0}")]
    ConfigError(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, DistributedCacheError>;

/// Cache backend trait for polymorphic cache implementations
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value in the cache with TTL
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Fetch several keys in a single round trip. The default implementation
    /// issues sequential `get`s; backends that support a native batch
    /// primitive (Redis `MGET`) should override this.
    async fn multi_get(&self, keys: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.get(key).await?);
        }
        Ok(out)
    }

    /// Delete a key from the cache
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Delete all keys matching a pattern (tenant-scoped families only)
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64>;

    /// Check if the backend is healthy
    async fn health_check(&self) -> CacheResult<()>;

    /// Get backend name for metrics
    fn name(&self) -> &'static str;

    /// Check if backend supports distributed operations
    fn is_distributed(&self) -> bool;
}

/// Configuration for the cache facade.
#[derive(Debug, Clone)]
pub struct DistributedCacheConfig {
    /// Whether caching is enabled at all.
    pub enabled: bool,
    /// Redis connection URL (e.g. `redis://localhost:6379`). Absence
    /// disables the L2 backend; every read falls through to the L1 and,
    /// on L1 miss, to the caller's durable store.
    pub redis_url: Option<String>,
    /// Redis operation timeout.
    pub redis_operation_timeout: Duration,
    /// Key prefix for namespace isolation.
    pub key_prefix: String,
    /// Default TTL used when a caller does not specify one.
    pub default_ttl: Duration,
    /// Maximum entries kept in the local (L1) cache.
    pub local_cache_size: usize,
    /// Whether to layer a local cache in front of the remote one.
    pub enable_local_cache: bool,
    /// TTL for local cache entries; kept shorter than the L2 TTL so a
    /// remote invalidation is never masked for long.
    pub local_cache_ttl: Duration,
    /// Minimum interval between repeated remote-error log lines.
    pub error_log_window: Duration,
}

impl Default for DistributedCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: None,
            redis_operation_timeout: Duration::from_secs(2),
            key_prefix: "llm-gateway".to_string(),
            default_ttl: Duration::from_secs(600),
            local_cache_size: 10_000,
            enable_local_cache: true,
            local_cache_ttl: Duration::from_secs(30),
            error_log_window: Duration::from_secs(10),
        }
    }
}

/// Literal value stored to mark a confirmed-absent record, distinguishing
/// it from an ordinary cache miss.
const NEGATIVE_SENTINEL: &[u8] = b"null";

/// Outcome of a typed cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// The key was present and held a real value.
    Hit(T),
    /// The key was present but marked confirmed-absent; do not fall
    /// through to the durable store.
    Absent,
    /// The key was not found anywhere; callers should consult the
    /// authoritative source and write back.
    Miss,
}

impl<T> CacheLookup<T> {
    /// True if this is neither a hit nor a confirmed-absent result.
    #[must_use]
    pub const fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }
}

#[derive(Debug)]
struct LocalCacheEntry {
    data: Vec<u8>,
    expires_at: Instant,
    hits: u64,
}

impl LocalCacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
            hits: 0,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// In-memory cache backend (L1, and the only backend in single-instance
/// deployments or tests).
pub struct MemoryCacheBackend {
    entries: Arc<RwLock<HashMap<String, LocalCacheEntry>>>,
    max_entries: usize,
}

impl MemoryCacheBackend {
    /// Create a new memory cache backend.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries,
        }
    }

    async fn evict_if_needed(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired());

        if entries.len() >= self.max_entries {
            let to_remove = entries.len() - self.max_entries + 1;
            let mut hit_counts: Vec<(String, u64)> =
                entries.iter().map(|(k, v)| (k.clone(), v.hits)).collect();
            hit_counts.sort_by_key(|(_, hits)| *hits);
            for (key, _) in hit_counts.into_iter().take(to_remove) {
                entries.remove(&key);
            }
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            if entry.is_expired() {
                entries.remove(key);
                return Ok(None);
            }
            entry.hits += 1;
            return Ok(Some(entry.data.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.evict_if_needed().await;
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), LocalCacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let mut entries = self.entries.write().await;
        let pattern_prefix = pattern.trim_end_matches('*');
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(pattern_prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn health_check(&self) -> CacheResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_distributed(&self) -> bool {
        false
    }
}

/// Redis-backed L2 cache, used for cross-instance state (tenant rows,
/// budget configs, counters, session rows).
pub struct RedisCacheBackend {
    manager: redis::aio::ConnectionManager,
    key_prefix: String,
    operation_timeout: Duration,
}

impl RedisCacheBackend {
    /// Connect to Redis and build a backend.
    ///
    /// # Errors
    /// Returns an error if the URL is malformed or the initial connection
    /// fails.
    pub async fn new(
        url: impl AsRef<str>,
        key_prefix: impl Into<String>,
        operation_timeout: Duration,
    ) -> CacheResult<Self> {
        let client = redis::Client::open(url.as_ref())
            .map_err(|e| DistributedCacheError::ConfigError(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| DistributedCacheError::ConnectionError(e.to_string()))?;
        let key_prefix = key_prefix.into();

        info!(prefix = %key_prefix, "redis cache backend connected");

        Ok(Self {
            manager,
            key_prefix,
            operation_timeout,
        })
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    async fn timed<F, T>(&self, fut: F) -> CacheResult<T>
    where
        F: std::future::Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.operation_timeout, fut)
            .await
            .map_err(|_| DistributedCacheError::Timeout(self.operation_timeout))?
            .map_err(|e| DistributedCacheError::ConnectionError(e.to_string()))
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let prefixed = self.prefixed_key(key);
        self.timed(conn.get(prefixed)).await
    }

    async fn multi_get(&self, keys: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>> {
        use redis::AsyncCommands;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.manager.clone();
        let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed_key(k)).collect();
        self.timed(conn.mget(prefixed)).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let prefixed = self.prefixed_key(key);
        let seconds = ttl.as_secs().max(1);
        self.timed(conn.set_ex(prefixed, value, seconds)).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let prefixed = self.prefixed_key(key);
        self.timed(conn.del(prefixed)).await
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let prefixed = self.prefixed_key(pattern);
        let keys: Vec<String> = self.timed(conn.keys(prefixed)).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let count = keys.len() as u64;
        let mut conn = self.manager.clone();
        let _: () = self.timed(conn.del(keys)).await?;
        Ok(count)
    }

    async fn health_check(&self) -> CacheResult<()> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let _: String = self.timed(redis::cmd("PING").query_async(&mut conn)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }

    fn is_distributed(&self) -> bool {
        true
    }
}

/// Typed key/value cache facade with an L1 (local) and optional L2
/// (distributed) backend.
pub struct DistributedCache {
    config: DistributedCacheConfig,
    l1_backend: Option<Arc<MemoryCacheBackend>>,
    l2_backend: Option<Arc<dyn CacheBackend>>,
    last_error_logged: Mutex<Option<Instant>>,
}

impl DistributedCache {
    /// Build a facade from config, with an in-memory L1 only. Call
    /// [`Self::init_redis`] afterwards to attach the L2 backend.
    #[must_use]
    pub fn new(config: DistributedCacheConfig) -> Self {
        let l1_backend = if config.enable_local_cache && config.enabled {
            Some(Arc::new(MemoryCacheBackend::new(config.local_cache_size)))
        } else {
            None
        };

        Self {
            config,
            l1_backend,
            l2_backend: None,
            last_error_logged: Mutex::new(None),
        }
    }

    /// Local-cache-only facade, used when `REDIS_URL` is unset.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DistributedCacheConfig::default())
    }

    /// A facade with caching fully disabled; every lookup is a miss.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(DistributedCacheConfig {
            enabled: false,
            ..Default::default()
        })
    }

    /// Connect the L2 (Redis) backend, if `redis_url` is configured.
    ///
    /// # Errors
    /// Returns an error if the configured URL cannot be connected to.
    pub async fn init_redis(&mut self) -> CacheResult<()> {
        if let Some(ref url) = self.config.redis_url {
            let backend = RedisCacheBackend::new(
                url,
                self.config.key_prefix.clone(),
                self.config.redis_operation_timeout,
            )
            .await?;
            self.l2_backend = Some(Arc::new(backend));
            info!("redis cache backend attached");
        }
        Ok(())
    }

    /// Attach a pre-built L2 backend (tests, or a custom implementation).
    pub fn set_l2_backend(&mut self, backend: Arc<dyn CacheBackend>) {
        self.l2_backend = Some(backend);
    }

    /// Whether caching is enabled at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether a distributed (cross-instance) backend is attached.
    #[must_use]
    pub fn is_distributed(&self) -> bool {
        self.l2_backend.as_ref().is_some_and(|b| b.is_distributed())
    }

    fn log_remote_error(&self, context: &str, error: &DistributedCacheError) {
        let mut last = self.last_error_logged.lock();
        let should_log = last.is_none_or(|t| t.elapsed() >= self.config.error_log_window);
        if should_log {
            warn!(%context, %error, "cache backend error, degrading to miss");
            *last = Some(Instant::now());
        }
    }

    /// Typed read-through lookup. Tries L1, then L2; on any remote error
    /// degrades to [`CacheLookup::Miss`] rather than propagating.
    pub async fn get_typed<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        if !self.config.enabled {
            return CacheLookup::Miss;
        }

        if let Some(ref l1) = self.l1_backend {
            if let Ok(Some(raw)) = l1.get(key).await {
                return Self::decode(&raw);
            }
        }

        if let Some(ref l2) = self.l2_backend {
            match l2.get(key).await {
                Ok(Some(raw)) => {
                    if let Some(ref l1) = self.l1_backend {
                        let _ = l1.set(key, raw.clone(), self.config.local_cache_ttl).await;
                    }
                    return Self::decode(&raw);
                }
                Ok(None) => {}
                Err(e) => {
                    self.log_remote_error("get_typed", &e);
                }
            }
        }

        CacheLookup::Miss
    }

    /// Batch read in a single round trip to the remote store, per §4.1's
    /// central performance lever. Keys present in L1 short-circuit and
    /// never reach the remote call.
    pub async fn multi_get<T: DeserializeOwned + Clone>(
        &self,
        keys: &[String],
    ) -> Vec<CacheLookup<T>> {
        if !self.config.enabled || keys.is_empty() {
            return keys.iter().map(|_| CacheLookup::Miss).collect();
        }

        let mut results: Vec<Option<CacheLookup<T>>> = vec![None; keys.len()];
        let mut remaining: Vec<(usize, String)> = Vec::new();

        if let Some(ref l1) = self.l1_backend {
            for (i, key) in keys.iter().enumerate() {
                match l1.get(key).await {
                    Ok(Some(raw)) => results[i] = Some(Self::decode(&raw)),
                    _ => remaining.push((i, key.clone())),
                }
            }
        } else {
            remaining = keys.iter().cloned().enumerate().collect();
        }

        if remaining.is_empty() {
            return results.into_iter().map(|r| r.unwrap_or(CacheLookup::Miss)).collect();
        }

        if let Some(ref l2) = self.l2_backend {
            let remaining_keys: Vec<String> = remaining.iter().map(|(_, k)| k.clone()).collect();
            match l2.multi_get(&remaining_keys).await {
                Ok(values) => {
                    for ((idx, key), value) in remaining.into_iter().zip(values) {
                        match value {
                            Some(raw) => {
                                if let Some(ref l1) = self.l1_backend {
                                    let _ = l1.set(&key, raw.clone(), self.config.local_cache_ttl).await;
                                }
                                results[idx] = Some(Self::decode(&raw));
                            }
                            None => results[idx] = Some(CacheLookup::Miss),
                        }
                    }
                }
                Err(e) => {
                    self.log_remote_error("multi_get", &e);
                    for (idx, _) in remaining {
                        results[idx] = Some(CacheLookup::Miss);
                    }
                }
            }
        } else {
            for (idx, _) in remaining {
                results[idx] = Some(CacheLookup::Miss);
            }
        }

        results.into_iter().map(|r| r.unwrap_or(CacheLookup::Miss)).collect()
    }

    fn decode<T: DeserializeOwned>(raw: &[u8]) -> CacheLookup<T> {
        if raw == NEGATIVE_SENTINEL {
            return CacheLookup::Absent;
        }
        match serde_json::from_slice::<T>(raw) {
            Ok(value) => CacheLookup::Hit(value),
            Err(e) => {
                warn!(error = %e, "failed to deserialize cache entry, treating as miss");
                CacheLookup::Miss
            }
        }
    }

    /// Write a value through both layers with the given TTL.
    pub async fn set_typed<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Duration) {
        if !self.config.enabled {
            return;
        }
        let Ok(data) = serde_json::to_vec(value) else {
            warn!(%key, "failed to serialize cache value");
            return;
        };
        self.write_through(key, data, ttl).await;
    }

    /// Mark `key` as confirmed-absent so callers skip the durable store
    /// until the TTL elapses.
    pub async fn set_absent(&self, key: &str, ttl: Duration) {
        if !self.config.enabled {
            return;
        }
        self.write_through(key, NEGATIVE_SENTINEL.to_vec(), ttl).await;
    }

    async fn write_through(&self, key: &str, data: Vec<u8>, ttl: Duration) {
        if let Some(ref l1) = self.l1_backend {
            let _ = l1.set(key, data.clone(), self.config.local_cache_ttl.min(ttl)).await;
        }
        if let Some(ref l2) = self.l2_backend {
            if let Err(e) = l2.set(key, data, ttl).await {
                self.log_remote_error("set_typed", &e);
            }
        }
    }

    /// Delete a single key from both layers.
    pub async fn del(&self, key: &str) {
        if let Some(ref l1) = self.l1_backend {
            let _ = l1.delete(key).await;
        }
        if let Some(ref l2) = self.l2_backend {
            if let Err(e) = l2.delete(key).await {
                self.log_remote_error("del", &e);
            }
        }
    }

    /// Delete every key matching `pattern` from both layers. Reserved for
    /// tenant-scoped families, invoked on admin mutations to invalidate
    /// atomically with the durable write.
    pub async fn del_pattern(&self, pattern: &str) {
        if let Some(ref l1) = self.l1_backend {
            let _ = l1.delete_pattern(pattern).await;
        }
        if let Some(ref l2) = self.l2_backend {
            if let Err(e) = l2.delete_pattern(pattern).await {
                self.log_remote_error("del_pattern", &e);
            }
        }
    }

    /// Health check for the attached remote backend, if any.
    ///
    /// # Errors
    /// Returns an error if the remote backend is attached but unhealthy.
    pub async fn health_check(&self) -> CacheResult<()> {
        if let Some(ref l2) = self.l2_backend {
            l2.health_check().await?;
        }
        Ok(())
    }
}
