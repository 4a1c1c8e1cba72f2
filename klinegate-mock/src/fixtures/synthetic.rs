//! Deterministic generated bars for symbols without a recorded fixture.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, TimeDelta, Weekday};
use klinegate_core::{Frequency, RawFrame, RequestWindow};
use serde_json::json;

use super::COLUMNS;

/// Upper bound on generated rows per request.
const MAX_ROWS: usize = 20_000;

fn seed(symbol: &str) -> u64 {
    // FNV-1a
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn is_trading_day(d: NaiveDate) -> bool {
    !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Bar close stamps within one trading day.
fn stamps(freq: Frequency) -> Vec<NaiveTime> {
    let Some(step) = freq.minutes() else {
        return vec![NaiveTime::MIN];
    };
    let mut out = Vec::new();
    for (open, close) in [((9, 30), (11, 30)), ((13, 0), (15, 0))] {
        let start = NaiveTime::from_hms_opt(open.0, open.1, 0).unwrap_or(NaiveTime::MIN);
        let end = NaiveTime::from_hms_opt(close.0, close.1, 0).unwrap_or(NaiveTime::MIN);
        let mut t = start + TimeDelta::minutes(step);
        while t <= end {
            out.push(t);
            t += TimeDelta::minutes(step);
        }
    }
    out
}

/// Generate bars for `window`, newest first, plus one bar stamped after the
/// window's exclusive end.
pub fn frame(symbol: &str, freq: Frequency, window: &RequestWindow) -> RawFrame {
    let per_day = stamps(freq);
    let wanted = window.count().unwrap_or(MAX_ROWS).min(MAX_ROWS);
    let floor = window.start().unwrap_or(NaiveDate::MIN);

    let mut stamped = Vec::new();
    let mut day = window.through();
    while stamped.len() < wanted && day >= floor {
        let keep = match freq {
            Frequency::Weekly => day.weekday() == Weekday::Fri,
            _ => is_trading_day(day),
        };
        if keep {
            for t in per_day.iter().rev() {
                stamped.push(day.and_time(*t));
            }
        }
        let Some(prev) = day.checked_sub_days(Days::new(1)) else {
            break;
        };
        day = prev;
    }
    stamped.truncate(wanted);
    stamped.insert(0, window.end() + TimeDelta::minutes(freq.minutes().unwrap_or(0)));

    let s = seed(symbol);
    let base = 5.0 + (s % 9_500) as f64 / 100.0;
    let n = stamped.len();
    let rows = stamped
        .into_iter()
        .enumerate()
        .map(|(i, dt)| {
            let k = (n - i) as f64;
            let open = base * (1.0 + 0.08 * (k / 11.0).sin());
            let close = base * (1.0 + 0.08 * ((k + 1.0) / 11.0).sin());
            let high = open.max(close) * 1.004;
            let low = open.min(close) * 0.996;
            let vol = 1_000 + ((s >> 8).wrapping_add((n - i) as u64 * 7_919)) % 50_000;
            vec![
                json!(symbol),
                json!(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                json!(open),
                json!(close),
                json!(high),
                json!(low),
                json!(vol),
            ]
        })
        .collect();
    RawFrame::new(COLUMNS, rows)
}
