use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::KlineError;

/// Canonical string form of a bar timestamp.
pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One trading interval in canonical form.
///
/// `dt` is exchange-local; for intraday bars it is the closing instant of the
/// interval. Prices are rounded to two decimals by the normalizer, `vol` is
/// kept at vendor precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Vendor-qualified instrument identifier.
    pub symbol: String,
    /// Exchange-local timestamp.
    pub dt: NaiveDateTime,
    /// Opening price.
    pub open: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Traded volume.
    pub vol: Decimal,
}

impl Bar {
    /// `dt` rendered in the canonical transport form.
    #[must_use]
    pub fn dt_string(&self) -> String {
        self.dt.format(DT_FORMAT).to_string()
    }
}

/// An ordered run of bars with unique, strictly ascending `dt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BarSequence(Vec<Bar>);

impl BarSequence {
    /// Wrap bars that are already strictly ascending by `dt`.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when two adjacent bars are out of order or share a `dt`.
    pub fn try_from_bars(bars: Vec<Bar>) -> Result<Self, KlineError> {
        if let Some(w) = bars.windows(2).find(|w| w[0].dt >= w[1].dt) {
            return Err(KlineError::InvalidParameter(format!(
                "bars not strictly ascending at {} -> {}",
                w[0].dt_string(),
                w[1].dt_string()
            )));
        }
        Ok(Self(bars))
    }

    /// Borrow the bars.
    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.0
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the sequence holds no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate bars in ascending order.
    pub fn iter(&self) -> core::slice::Iter<'_, Bar> {
        self.0.iter()
    }

    /// Keep only the newest `n` bars.
    pub fn keep_last(&mut self, n: usize) {
        let len = self.0.len();
        if len > n {
            self.0.drain(..len - n);
        }
    }

    /// Unwrap into the owned bars.
    #[must_use]
    pub fn into_inner(self) -> Vec<Bar> {
        self.0
    }
}

impl<'a> IntoIterator for &'a BarSequence {
    type Item = &'a Bar;
    type IntoIter = core::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A bar plus the marker columns produced by the analysis engine.
///
/// Markers are opaque to klinegate; `None` means the engine left the cell empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    /// The canonical bar.
    pub bar: Bar,
    /// Fractal kind label (e.g. top or bottom).
    pub fx_mark: Option<String>,
    /// Fractal price.
    pub fx: Option<f64>,
    /// Stroke price.
    pub bi: Option<f64>,
    /// Segment price.
    pub xd: Option<f64>,
}

impl AnnotatedBar {
    /// Wrap a bar with no markers.
    #[must_use]
    pub const fn plain(bar: Bar) -> Self {
        Self {
            bar,
            fx_mark: None,
            fx: None,
            bi: None,
            xd: None,
        }
    }
}
