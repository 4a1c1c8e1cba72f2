use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Bounds for one vendor call.
///
/// `through` is the inclusive last trading day the caller asked for. Every
/// window also exposes the exclusive bound [`RequestWindow::end`], which is
/// midnight after `through`; bars at or after it never reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestWindow {
    /// A calendar range, for vendors whose API takes start and end dates.
    Range {
        /// First calendar day to request.
        start: NaiveDate,
        /// Last calendar day to request (inclusive).
        through: NaiveDate,
    },
    /// The newest `count` bars up to `through`, for count-based vendor APIs.
    Count {
        /// Last calendar day to request (inclusive).
        through: NaiveDate,
        /// Number of bars.
        count: usize,
    },
}

impl RequestWindow {
    /// Inclusive last day.
    #[must_use]
    pub const fn through(&self) -> NaiveDate {
        match *self {
            Self::Range { through, .. } | Self::Count { through, .. } => through,
        }
    }

    /// Start day for range windows.
    #[must_use]
    pub const fn start(&self) -> Option<NaiveDate> {
        match *self {
            Self::Range { start, .. } => Some(start),
            Self::Count { .. } => None,
        }
    }

    /// Bar count for count windows.
    #[must_use]
    pub const fn count(&self) -> Option<usize> {
        match *self {
            Self::Count { count, .. } => Some(count),
            Self::Range { .. } => None,
        }
    }

    /// Exclusive upper bound: midnight following `through`.
    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        let through = self.through();
        through
            .checked_add_days(Days::new(1))
            .unwrap_or(through)
            .and_time(NaiveTime::MIN)
    }

    /// True when `dt` falls before the exclusive upper bound.
    #[must_use]
    pub fn admits(&self, dt: NaiveDateTime) -> bool {
        dt < self.end()
    }
}
