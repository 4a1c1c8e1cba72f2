//! klinegate-core
//!
//! The vendor-independent half of the bar-serving pipeline.
//!
//! - `connector`: the `VendorConnector` trait and its capability traits.
//! - `raw`: the untouched tabular response a connector hands back, plus the
//!   static schema describing its column labels.
//! - `resolver`: frequency lookbacks, trade-date parsing and window sizing.
//! - `normalize`: raw response to canonical `BarSequence`.
//! - `credentials`: explicit token providers passed into connectors.
//! - `analysis`: the narrow interface to the external marker engine.
#![warn(missing_docs)]

/// Analysis-engine contract and the marker-free engine.
pub mod analysis;
/// Connector capability traits and the primary `VendorConnector` interface.
pub mod connector;
/// Credential providers.
pub mod credentials;
/// Raw-response to canonical-bar normalization.
pub mod normalize;
/// Raw vendor responses and their schemas.
pub mod raw;
/// Frequency resolver.
pub mod resolver;

pub use analysis::{AnalysisEngine, PlainEngine};
pub use connector::{BasicProvider, KlineProvider, KlineRequest, VendorConnector};
pub use credentials::{CredentialProvider, StaticToken};
pub use normalize::normalize;
pub use raw::{Column, RawFrame, RawVendorResponse, TimestampEncoding, VendorSchema};
pub use resolver::{
    EXCHANGE_TZ, WindowPolicy, ensure_supported, exchange_today, lookback, parse_trade_date,
    resolve_window, vendor_end,
};

pub use klinegate_types::*;
