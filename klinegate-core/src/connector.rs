use async_trait::async_trait;

use crate::raw::RawVendorResponse;
use crate::resolver::WindowPolicy;
use klinegate_types::{AssetClass, ConnectorKey, Frequency, KlineError, RequestWindow};

/// Everything a connector needs to issue one bar request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    /// Vendor-qualified symbol, passed through verbatim.
    pub symbol: String,
    /// Requested bar frequency.
    pub frequency: Frequency,
    /// Instrument class; ignored by vendors that do not distinguish.
    pub asset: AssetClass,
    /// Window resolved for this vendor.
    pub window: RequestWindow,
}

/// Focused role trait for connectors that serve historical bars.
///
/// Implementations issue the vendor's native call and return its rows
/// untouched. Renaming, rounding, timezone handling and deduplication all
/// belong to [`crate::normalize`].
#[async_trait]
pub trait KlineProvider: Send + Sync {
    /// Fetch raw bars for the request.
    ///
    /// # Errors
    /// - `VendorUnavailable` on transport, auth or protocol failure.
    /// - `VendorDataEmpty` when the vendor answers with zero rows.
    /// - `InvalidParameter` / `InvalidFrequency` when the request cannot be expressed
    ///   in the vendor's API (e.g. an asset class it does not serve).
    async fn fetch(&self, req: &KlineRequest) -> Result<RawVendorResponse, KlineError>;

    /// Frequency codes this connector can natively serve.
    fn supported_frequencies(&self) -> &'static [Frequency];

    /// How this vendor's API bounds a request.
    fn window_policy(&self) -> WindowPolicy;

    /// Whether [`KlineRequest::asset`] selects anything at this vendor.
    ///
    /// When false, an unrecognized `asset` code from a client is ignored
    /// instead of rejected.
    fn distinguishes_assets(&self) -> bool {
        false
    }
}

/// Focused role trait for connectors that serve static instrument metadata.
#[async_trait]
pub trait BasicProvider: Send + Sync {
    /// Fetch metadata for `ts_code`; the JSON shape is vendor specific.
    async fn basic(&self, ts_code: &str) -> Result<serde_json::Value, KlineError>;
}

/// Main connector trait implemented by vendor crates. Exposes capability discovery.
pub trait VendorConnector: Send + Sync {
    /// A stable identifier, e.g. "klinegate-tushare".
    fn name(&self) -> &'static str;

    /// Canonical connector key constructed from the static name.
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Advertise bar capability by returning a usable trait object reference when supported.
    fn as_kline_provider(&self) -> Option<&dyn KlineProvider> {
        None
    }

    /// Advertise metadata capability by returning a usable trait object reference when supported.
    fn as_basic_provider(&self) -> Option<&dyn BasicProvider> {
        None
    }
}
