use chrono::NaiveTime;
use klinegate_types::{BarSequence, DT_FORMAT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connector::KlineRequest;

/// Canonical bar fields a vendor column label can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Instrument identifier.
    Symbol,
    /// Bar timestamp.
    Dt,
    /// Opening price.
    Open,
    /// Closing price.
    Close,
    /// High price.
    High,
    /// Low price.
    Low,
    /// Traded volume.
    Vol,
}

impl Column {
    /// Canonical label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Dt => "dt",
            Self::Open => "open",
            Self::Close => "close",
            Self::High => "high",
            Self::Low => "low",
            Self::Vol => "vol",
        }
    }
}

/// How a vendor encodes bar timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampEncoding {
    /// Text (or digits) in exchange-local time, such as `20200720`,
    /// `2020-07-20 09:31:00` or `2020-07-20 09:31`. Text carrying an explicit
    /// UTC offset is converted to exchange-local time.
    Text,
    /// Nanoseconds since the UNIX epoch, UTC.
    EpochNanos,
}

/// Static description of a vendor's tabular schema.
///
/// Only metadata lives here. The normalizer reads it to locate columns; the
/// connector never rewrites its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorSchema {
    /// Vendor column label to canonical field. Several labels may map to the
    /// same field (e.g. `trade_date` and `trade_time`); the first present wins.
    pub aliases: &'static [(&'static str, Column)],
    /// Timestamp encoding of the `Dt` column.
    pub timestamp: TimestampEncoding,
    /// Intraday bars stamped at this local time are a subscription artifact
    /// and are dropped.
    pub drop_session_open: Option<NaiveTime>,
    /// Intraday `Dt` values mark the bar's open; the normalizer moves them
    /// one bar length forward so every vendor stamps bars at their close.
    pub start_stamped: bool,
}

impl VendorSchema {
    /// The schema of an already-canonical frame.
    pub const CANONICAL: Self = Self {
        aliases: &[
            ("symbol", Column::Symbol),
            ("dt", Column::Dt),
            ("open", Column::Open),
            ("close", Column::Close),
            ("high", Column::High),
            ("low", Column::Low),
            ("vol", Column::Vol),
        ],
        timestamp: TimestampEncoding::Text,
        drop_session_open: None,
        start_stamped: false,
    };
}

/// Column-labelled rows exactly as a vendor returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Column labels.
    pub columns: Vec<String>,
    /// Row values, one entry per column.
    pub rows: Vec<Vec<Value>>,
}

impl RawFrame {
    /// Build a frame from labels and rows.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    /// Parse comma-separated text whose first line is the header.
    ///
    /// Cells are kept as strings; blank lines are skipped.
    #[must_use]
    pub fn from_csv(text: &str) -> Self {
        let mut lines = text.trim().lines().filter(|l| !l.trim().is_empty());
        let columns = lines
            .next()
            .map(|h| h.split(',').map(|c| c.trim().to_string()).collect())
            .unwrap_or_default();
        let rows = lines
            .map(|l| {
                l.split(',')
                    .map(|c| Value::String(c.trim().to_string()))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Render a canonical sequence back into a canonical-labelled frame.
    #[must_use]
    pub fn from_bars(bars: &BarSequence) -> Self {
        let columns = VendorSchema::CANONICAL
            .aliases
            .iter()
            .map(|(label, _)| (*label).to_string())
            .collect();
        let rows = bars
            .iter()
            .map(|b| {
                vec![
                    Value::String(b.symbol.clone()),
                    Value::String(b.dt.format(DT_FORMAT).to_string()),
                    Value::String(b.open.to_string()),
                    Value::String(b.close.to_string()),
                    Value::String(b.high.to_string()),
                    Value::String(b.low.to_string()),
                    Value::String(b.vol.to_string()),
                ]
            })
            .collect();
        Self { columns, rows }
    }

    /// Position of a column label.
    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A connector's answer: the request it served, the schema it speaks and the
/// untouched rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVendorResponse {
    /// Connector name that produced the rows.
    pub vendor: &'static str,
    /// The request as issued.
    pub request: KlineRequest,
    /// Schema of `frame`.
    pub schema: VendorSchema,
    /// Rows as received.
    pub frame: RawFrame,
}
