use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use klinegate_types::{Bar, BarSequence, KlineError};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::raw::{Column, RawFrame, RawVendorResponse, TimestampEncoding, VendorSchema};
use crate::resolver::EXCHANGE_TZ;

const REQUIRED: [Column; 6] = [
    Column::Dt,
    Column::Open,
    Column::Close,
    Column::High,
    Column::Low,
    Column::Vol,
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%d %H:%M:%S",
    "%Y%m%d%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Column positions resolved from a vendor schema.
struct Layout {
    symbol: Option<usize>,
    dt: usize,
    open: usize,
    close: usize,
    high: usize,
    low: usize,
    vol: usize,
}

impl Layout {
    fn resolve(frame: &RawFrame, schema: &VendorSchema, vendor: &str) -> Result<Self, KlineError> {
        let find = |col: Column| {
            schema
                .aliases
                .iter()
                .filter(|(_, c)| *c == col)
                .find_map(|(label, _)| frame.position(label))
        };
        let missing: Vec<&str> = REQUIRED
            .iter()
            .filter(|c| find(**c).is_none())
            .map(|c| c.label())
            .collect();
        if !missing.is_empty() {
            return Err(KlineError::normalization(
                vendor,
                format!("missing columns {missing:?}"),
                &frame.columns,
            ));
        }
        let at = |col: Column| find(col).unwrap_or_default();
        Ok(Self {
            symbol: find(Column::Symbol),
            dt: at(Column::Dt),
            open: at(Column::Open),
            close: at(Column::Close),
            high: at(Column::High),
            low: at(Column::Low),
            vol: at(Column::Vol),
        })
    }
}

/// Coerce a numeric cell; strings are parsed, blanks and nulls yield `None`.
fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Round a price to two decimals the way a binary float rounds: the exact
/// binary value decides, ties go to even.
fn price(v: &Value) -> Option<Decimal> {
    let f = number(v)?;
    Decimal::from_f64_retain(f)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
}

fn volume(v: &Value) -> Option<Decimal> {
    number(v).and_then(Decimal::from_f64)
}

fn text_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&EXCHANGE_TZ).naive_local());
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(t.with_timezone(&EXCHANGE_TZ).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn timestamp(v: &Value, encoding: TimestampEncoding) -> Option<NaiveDateTime> {
    match encoding {
        TimestampEncoding::Text => match v {
            Value::String(s) => text_timestamp(s),
            Value::Number(n) => text_timestamp(&n.to_string()),
            _ => None,
        },
        TimestampEncoding::EpochNanos => {
            let nanos = match v {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }?;
            Some(
                DateTime::from_timestamp_nanos(nanos)
                    .with_timezone(&EXCHANGE_TZ)
                    .naive_local(),
            )
        }
    }
}

fn symbol(row: &[Value], layout: &Layout, fallback: &str) -> String {
    match layout.symbol.and_then(|i| row.get(i)) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => fallback.to_string(),
    }
}

/// Convert a raw vendor response into a canonical [`BarSequence`].
///
/// Steps, in order:
/// 1. locate vendor columns through the schema aliases;
/// 2. coerce prices and volume to numbers, rounding prices to two decimals;
/// 3. convert timestamps to exchange-local time, moving open-stamped
///    intraday bars to their close;
/// 4. drop rows with any missing field, session-open artifacts for intraday
///    frequencies, and bars at or past the window's exclusive end;
/// 5. deduplicate on `dt`, first occurrence wins;
/// 6. sort ascending and, for count windows, keep only the newest `count` bars.
///
/// Normalizing an already-canonical frame (see [`RawFrame::from_bars`]) is a no-op.
///
/// # Errors
/// Returns `NormalizationFailure` when a required column is absent or a row's
/// arity disagrees with the header.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "klinegate_core::normalize",
        skip(raw),
        fields(vendor = raw.vendor, symbol = %raw.request.symbol, rows = raw.frame.len()),
    )
)]
pub fn normalize(raw: RawVendorResponse) -> Result<BarSequence, KlineError> {
    let RawVendorResponse {
        vendor,
        request,
        schema,
        frame,
    } = raw;
    let layout = Layout::resolve(&frame, &schema, vendor)?;

    if let Some(bad) = frame.rows.iter().position(|r| r.len() != frame.columns.len()) {
        return Err(KlineError::normalization(
            vendor,
            format!(
                "row {bad} has {} cells, header has {}",
                frame.rows[bad].len(),
                frame.columns.len()
            ),
            &frame.columns,
        ));
    }

    let intraday = request.frequency.is_intraday();
    let drop_open = schema.drop_session_open.filter(|_| intraday);
    let shift = (schema.start_stamped && intraday)
        .then(|| TimeDelta::seconds(request.frequency.seconds()));

    let mut seen: HashSet<NaiveDateTime> = HashSet::with_capacity(frame.len());
    let mut bars: Vec<Bar> = Vec::with_capacity(frame.len());
    #[cfg(feature = "tracing")]
    let mut dropped = 0usize;

    for row in &frame.rows {
        let parsed = (|| {
            Some(Bar {
                symbol: symbol(row, &layout, &request.symbol),
                dt: timestamp(&row[layout.dt], schema.timestamp)?,
                open: price(&row[layout.open])?,
                close: price(&row[layout.close])?,
                high: price(&row[layout.high])?,
                low: price(&row[layout.low])?,
                vol: volume(&row[layout.vol])?,
            })
        })();
        let Some(mut bar) = parsed else {
            #[cfg(feature = "tracing")]
            {
                dropped += 1;
            }
            continue;
        };
        if let Some(len) = shift {
            bar.dt += len;
        }
        if drop_open.is_some_and(|t| bar.dt.time() == t) || !request.window.admits(bar.dt) {
            continue;
        }
        if seen.insert(bar.dt) {
            bars.push(bar);
        }
    }

    #[cfg(feature = "tracing")]
    if dropped > 0 {
        tracing::debug!(vendor, dropped, "dropped rows with missing fields");
    }

    bars.sort_by_key(|b| b.dt);
    let mut seq = BarSequence::try_from_bars(bars)?;
    if let Some(cap) = request.window.count() {
        seq.keep_last(cap);
    }
    Ok(seq)
}
