//! klinegate-tq
//!
//! Connector for TianQin market data through a local TqSdk bridge. The
//! bridge keeps one stateful session; requests are serialized through it and
//! always return the newest bars, so windows ending in the past are clipped
//! by the normalizer.
#![warn(missing_docs)]

/// Session contract and the HTTP bridge session.
pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use klinegate_core::{
    Column, ConnectorKey, Frequency, KlineError, KlineProvider, KlineRequest, RawVendorResponse,
    TimestampEncoding, TqConfig, VendorConnector, VendorSchema, WindowPolicy,
};
use tokio::sync::Mutex;

pub use crate::session::{BridgeSession, KlineSession};

pub(crate) const VENDOR: &str = "tq";

/// Largest `data_length` a kline serial holds.
pub const MAX_COUNT: usize = 8964;

// Kline serials stamp each bar at its open.
const SCHEMA: VendorSchema = VendorSchema {
    aliases: &[
        ("symbol", Column::Symbol),
        ("datetime", Column::Dt),
        ("open", Column::Open),
        ("close", Column::Close),
        ("high", Column::High),
        ("low", Column::Low),
        ("volume", Column::Vol),
    ],
    timestamp: TimestampEncoding::EpochNanos,
    drop_session_open: None,
    start_stamped: true,
};

/// TianQin connector.
pub struct TqConnector {
    session: Mutex<Box<dyn KlineSession>>,
}

impl TqConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("klinegate-tq");

    /// Wrap a session.
    pub fn new(session: impl KlineSession + 'static) -> Self {
        Self {
            session: Mutex::new(Box::new(session)),
        }
    }

    /// Build from the `[tq]` configuration table.
    ///
    /// # Errors
    /// `InvalidParameter` for a malformed endpoint, `VendorUnavailable` if the
    /// HTTP client cannot be constructed.
    pub fn from_config(config: &TqConfig, timeout: Duration) -> Result<Self, KlineError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KlineError::vendor(VENDOR, e.to_string()))?;
        Ok(Self::new(BridgeSession::new(http, &config.endpoint)?))
    }
}

#[async_trait]
impl KlineProvider for TqConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "klinegate_tq::fetch",
            skip(self, req),
            fields(symbol = %req.symbol, freq = %req.frequency),
        )
    )]
    async fn fetch(&self, req: &KlineRequest) -> Result<RawVendorResponse, KlineError> {
        let length = req.window.count().unwrap_or(MAX_COUNT).min(MAX_COUNT);
        let frame = {
            let mut session = self.session.lock().await;
            session
                .kline_serial(&req.symbol, req.frequency.seconds(), length)
                .await?
        };
        if frame.is_empty() {
            return Err(KlineError::empty(format!("{VENDOR} {}", req.symbol)));
        }
        Ok(RawVendorResponse {
            vendor: VENDOR,
            request: req.clone(),
            schema: SCHEMA,
            frame,
        })
    }

    fn supported_frequencies(&self) -> &'static [Frequency] {
        Frequency::ALL
    }

    fn window_policy(&self) -> WindowPolicy {
        WindowPolicy::Count { max: MAX_COUNT }
    }
}

impl VendorConnector for TqConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        VENDOR
    }

    fn as_kline_provider(&self) -> Option<&dyn KlineProvider> {
        Some(self as &dyn KlineProvider)
    }
}
