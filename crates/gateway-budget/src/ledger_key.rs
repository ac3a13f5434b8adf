//! Ledger key construction (C2).
//!
//! A ledger key names the `(scope, period, window)` bucket a [`Counter`]
//! accumulates into. Daily and monthly keys are derived purely from the
//! current UTC instant; custom keys are whatever `(start, end]` window a
//! budget row carries. Keys never change retroactively — once a request is
//! priced into a window, moving the wall clock never re-buckets it.
//!
//! [`Counter`]: gateway_core::Counter

use chrono::{DateTime, Datelike, Utc};
use gateway_core::domain::Period;

/// A resolved bucket identifier for one counter family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    /// `YYYY-MM-DD`, UTC calendar day, resets at UTC midnight.
    Daily(String),
    /// `YYYY-MM`, UTC calendar month.
    Monthly(String),
    /// Explicit, non-recurring `(start, end]` window, keyed by its bounds.
    Custom {
        /// Window start, inclusive... per the data model, exclusive at the
        /// boundary the window opens on.
        start: DateTime<Utc>,
        /// Window end, exclusive.
        end: DateTime<Utc>,
    },
}

impl LedgerKey {
    /// Render this key as the cache/db key suffix (after the tenant/tag
    /// scope prefix is applied by the caller).
    #[must_use]
    pub fn as_suffix(&self) -> String {
        match self {
            Self::Daily(d) => format!("daily:{d}"),
            Self::Monthly(m) => format!("monthly:{m}"),
            Self::Custom { start, end } => {
                format!("custom:{}:{}", start.timestamp(), end.timestamp())
            }
        }
    }
}

/// Build the ledger key a budget of the given `period` resolves to `at`.
///
/// `custom_window` must be `Some` when `period == Period::Custom`; its
/// absence for that period is a caller bug, not a data error, since the
/// window always comes from the budget row itself.
#[must_use]
pub fn resolve_key(
    period: Period,
    at: DateTime<Utc>,
    custom_window: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> LedgerKey {
    match period {
        Period::Daily => LedgerKey::Daily(at.format("%Y-%m-%d").to_string()),
        Period::Monthly => LedgerKey::Monthly(format!("{:04}-{:02}", at.year(), at.month())),
        Period::Custom => {
            let (start, end) = custom_window
                .expect("custom period budgets must carry an explicit (start, end] window");
            LedgerKey::Custom { start, end }
        }
    }
}

/// Whether `at` falls within the `(start, end]` custom window: excludes the
/// open boundary, includes the close boundary, matching the tie-break rule
/// for a request landing exactly on a window edge.
#[must_use]
pub fn in_custom_window(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    at > start && at <= end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn daily_key_is_utc_calendar_day() {
        let key = resolve_key(Period::Daily, at(2026, 7, 28, 23), None);
        assert_eq!(key, LedgerKey::Daily("2026-07-28".to_string()));
    }

    #[test]
    fn monthly_key_is_utc_calendar_month() {
        let key = resolve_key(Period::Monthly, at(2026, 7, 28, 23), None);
        assert_eq!(key, LedgerKey::Monthly("2026-07".to_string()));
    }

    #[test]
    fn midnight_tie_break_lands_in_the_new_day() {
        let midnight = at(2026, 7, 29, 0);
        let key = resolve_key(Period::Daily, midnight, None);
        assert_eq!(key, LedgerKey::Daily("2026-07-29".to_string()));
    }

    #[test]
    fn custom_window_excludes_start_includes_end() {
        let start = at(2026, 7, 1, 0);
        let end = at(2026, 7, 31, 23);
        assert!(!in_custom_window(start, start, end));
        assert!(in_custom_window(end, start, end));
        assert!(in_custom_window(at(2026, 7, 15, 12), start, end));
    }

    #[test]
    #[should_panic(expected = "custom period budgets")]
    fn custom_period_without_window_panics() {
        let _ = resolve_key(Period::Custom, at(2026, 7, 28, 0), None);
    }
}
