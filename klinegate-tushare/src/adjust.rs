//! Forward (qfq) price adjustment.
//!
//! Prices are scaled by `factor(day) / factor(latest)` so the newest bar keeps
//! its traded price and older bars line up with it. A day missing from the
//! factor table uses the closest earlier factor, or the earliest known one
//! when the bar predates the table.

use std::collections::BTreeMap;

use klinegate_core::RawFrame;
use serde_json::Value;

const PRICE_COLUMNS: [&str; 4] = ["open", "high", "low", "close"];

/// `YYYYMMDD` from either `20200720` or `2020-07-20 09:31:00`.
fn day_key(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let digits: String = s.chars().take_while(|c| *c != ' ' && *c != 'T').filter(char::is_ascii_digit).collect();
    (digits.len() == 8).then_some(digits)
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Factor table keyed by `YYYYMMDD`, built from an `adj_factor` frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AdjFactors(BTreeMap<String, f64>);

impl AdjFactors {
    /// Read `trade_date` / `adj_factor` columns; unusable rows are skipped.
    #[must_use]
    pub fn from_frame(frame: &RawFrame) -> Self {
        let (Some(d), Some(f)) = (frame.position("trade_date"), frame.position("adj_factor")) else {
            return Self::default();
        };
        Self(
            frame
                .rows
                .iter()
                .filter_map(|r| Some((day_key(r.get(d)?)?, as_f64(r.get(f)?)?)))
                .filter(|(_, f)| *f > 0.0)
                .collect(),
        )
    }

    /// No factors known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn at(&self, day: &str) -> Option<f64> {
        self.0
            .range(..=day.to_string())
            .next_back()
            .or_else(|| self.0.iter().next())
            .map(|(_, f)| *f)
    }

    fn latest(&self) -> Option<f64> {
        self.0.values().next_back().copied()
    }

    /// Scale the price columns of `frame` in place. `dt_label` names the
    /// column carrying each row's date.
    pub fn apply(&self, frame: &mut RawFrame, dt_label: &str) {
        let Some(latest) = self.latest() else {
            return;
        };
        let Some(dt) = frame.position(dt_label) else {
            return;
        };
        let cols: Vec<usize> = PRICE_COLUMNS
            .iter()
            .filter_map(|c| frame.position(c))
            .collect();
        for row in &mut frame.rows {
            let Some(factor) = row.get(dt).and_then(day_key).and_then(|d| self.at(&d)) else {
                continue;
            };
            for &i in &cols {
                if let Some(px) = row.get(i).and_then(as_f64) {
                    row[i] = serde_json::json!(px * factor / latest);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn factors() -> AdjFactors {
        AdjFactors::from_frame(&RawFrame::new(
            ["ts_code", "trade_date", "adj_factor"],
            vec![
                vec![json!("000001.SZ"), json!("20200720"), json!(2.0)],
                vec![json!("000001.SZ"), json!("20200717"), json!(1.0)],
            ],
        ))
    }

    #[test]
    fn latest_day_keeps_its_price() {
        let mut f = RawFrame::new(
            ["trade_date", "open", "close", "high", "low", "vol"],
            vec![
                vec![json!("20200720"), json!(10.0), json!(10.0), json!(10.0), json!(10.0), json!(5)],
                vec![json!("20200717"), json!(10.0), json!(10.0), json!(10.0), json!(10.0), json!(5)],
            ],
        );
        factors().apply(&mut f, "trade_date");
        assert_eq!(f.rows[0][1], json!(10.0));
        assert_eq!(f.rows[1][1], json!(5.0));
        assert_eq!(f.rows[1][5], json!(5));
    }

    #[test]
    fn intraday_rows_use_their_calendar_day() {
        let mut f = RawFrame::new(
            ["trade_time", "open", "close", "high", "low"],
            vec![vec![json!("2020-07-17 10:00:00"), json!(4.0), json!(4.0), json!(4.0), json!(4.0)]],
        );
        factors().apply(&mut f, "trade_time");
        assert_eq!(f.rows[0][2], json!(2.0));
    }

    #[test]
    fn day_before_table_uses_earliest_factor() {
        assert_eq!(factors().at("20200101"), Some(1.0));
        assert_eq!(factors().at("20200718"), Some(1.0));
    }
}
