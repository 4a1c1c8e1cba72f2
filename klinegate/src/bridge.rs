//! Analysis bridge: annotated bars to the wire table.
//!
//! Each row is `[dt, open, close, low, high, vol, fx_mark, fx, bi, xd]`.
//! `dt` is rendered with [`DT_FORMAT`]; prices and volume are JSON numbers;
//! marker cells the engine left empty become `""`.

use klinegate_core::{AnnotatedBar, DT_FORMAT};
use rust_decimal::Decimal;
use serde_json::{Number, Value};

/// Column labels of a wire row, in order.
pub const COLUMNS: [&str; 10] = [
    "dt", "open", "close", "low", "high", "vol", "fx_mark", "fx", "bi", "xd",
];

/// One wire row.
pub type KRow = [Value; 10];

// Through text so the number is the closest double to the decimal.
fn decimal(d: Decimal) -> Value {
    d.normalize()
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

fn marker(v: Option<f64>) -> Value {
    v.and_then(Number::from_f64)
        .map_or_else(|| Value::String(String::new()), Value::Number)
}

/// Render one annotated bar.
#[must_use]
pub fn row(a: &AnnotatedBar) -> KRow {
    let b = &a.bar;
    [
        Value::String(b.dt.format(DT_FORMAT).to_string()),
        decimal(b.open),
        decimal(b.close),
        decimal(b.low),
        decimal(b.high),
        decimal(b.vol),
        Value::String(a.fx_mark.clone().unwrap_or_default()),
        marker(a.fx),
        marker(a.bi),
        marker(a.xd),
    ]
}

/// Render a whole annotated sequence, preserving order.
#[must_use]
pub fn rows(bars: &[AnnotatedBar]) -> Vec<KRow> {
    bars.iter().map(row).collect()
}
