use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use klinegate_types::{Frequency, KlineError, RequestWindow};

/// Timezone every canonical `dt` is expressed in.
pub const EXCHANGE_TZ: Tz = chrono_tz::Asia::Shanghai;

/// How a vendor API bounds a bar request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Start and end dates; the start is derived from [`lookback`].
    Range,
    /// Bar count up to the end date, capped at `max`.
    Count {
        /// Largest count the vendor accepts.
        max: usize,
    },
}

/// Calendar lookback for date-range vendors.
///
/// Generous on purpose: stroke and segment markers only stabilize with a
/// long history behind the newest bar.
#[must_use]
pub const fn lookback(freq: Frequency) -> TimeDelta {
    match freq {
        Frequency::M1 => TimeDelta::days(60),
        Frequency::M5 => TimeDelta::days(150),
        Frequency::M15 => TimeDelta::days(400),
        Frequency::M30 => TimeDelta::days(1000),
        Frequency::M60 => TimeDelta::days(2000),
        Frequency::Daily | Frequency::Weekly => TimeDelta::weeks(1000),
    }
}

/// Today's calendar date at the exchange.
#[must_use]
pub fn exchange_today() -> NaiveDate {
    Utc::now().with_timezone(&EXCHANGE_TZ).date_naive()
}

/// Parse the `trade_date` query value.
///
/// The literal `"null"` (or an empty string) means `today`. Otherwise
/// `YYYYMMDD` is expected; `YYYY-MM-DD` is accepted as well.
///
/// # Errors
/// Returns `InvalidParameter` for anything else.
pub fn parse_trade_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, KlineError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return Ok(today);
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| KlineError::InvalidParameter(format!("trade_date '{raw}', expected YYYYMMDD")))
}

/// Fail with `InvalidFrequency` unless `freq` is in `supported`.
///
/// # Errors
/// Returns `InvalidFrequency` naming the vendor when the code is not served.
pub fn ensure_supported(
    freq: Frequency,
    supported: &[Frequency],
    vendor: &str,
) -> Result<(), KlineError> {
    if supported.contains(&freq) {
        Ok(())
    } else {
        Err(KlineError::InvalidFrequency(format!(
            "'{freq}' is not served by {vendor}"
        )))
    }
}

/// Size the vendor window ending on `through` (inclusive).
///
/// Range vendors get `through - lookback(freq)` as the start day. Count
/// vendors get `bar_count` capped at their maximum.
///
/// # Errors
/// Returns `InvalidParameter` when `bar_count` is zero for a count vendor.
pub fn resolve_window(
    freq: Frequency,
    through: NaiveDate,
    policy: WindowPolicy,
    bar_count: usize,
) -> Result<RequestWindow, KlineError> {
    match policy {
        WindowPolicy::Range => {
            let start = through
                .checked_sub_signed(lookback(freq))
                .unwrap_or(NaiveDate::MIN);
            Ok(RequestWindow::Range { start, through })
        }
        WindowPolicy::Count { max } => {
            if bar_count == 0 {
                return Err(KlineError::InvalidParameter(
                    "bar count must be positive".into(),
                ));
            }
            Ok(RequestWindow::Count {
                through,
                count: bar_count.min(max),
            })
        }
    }
}

/// End bound to send a vendor that takes an `end_date`.
///
/// Intraday bars use the window's exclusive end so the trade date's last
/// session is included. Daily and weekly bars are dated, so the trade date
/// itself is sent; sending the next day could spend one bar of a count on a
/// row the normalizer clips.
#[must_use]
pub fn vendor_end(window: &RequestWindow, freq: Frequency) -> NaiveDateTime {
    if freq.is_intraday() {
        window.end()
    } else {
        window.through().and_time(NaiveTime::MIN)
    }
}
