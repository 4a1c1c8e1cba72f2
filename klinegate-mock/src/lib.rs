//! klinegate-mock
//!
//! Connectors that never touch the network.
//!
//! - [`MockConnector`] serves recorded fixtures and deterministic generated
//!   bars, with a few magic symbols for failure paths.
//! - [`DynamicMockConnector`] is scripted per symbol from a test through its
//!   [`DynamicMockController`] and records every request it receives.

use async_trait::async_trait;
use klinegate_core::{
    BasicProvider, Frequency, KlineError, KlineProvider, KlineRequest, RawVendorResponse,
    VendorConnector, WindowPolicy,
};
use serde_json::Value;

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockConnector, DynamicMockController, MockBehavior};

const NAME: &str = "klinegate-mock";

/// Mock connector for CI-safe demos. Provides deterministic data from static fixtures.
///
/// Symbols `FAIL`, `EMPTY` and `TIMEOUT` force the vendor-unavailable, empty
/// and slow paths.
pub struct MockConnector {
    policy: WindowPolicy,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Range-window mock, like a date-range vendor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            policy: WindowPolicy::Range,
        }
    }

    /// Count-window mock capped at `max`, like a count vendor.
    #[must_use]
    pub const fn counting(max: usize) -> Self {
        Self {
            policy: WindowPolicy::Count { max },
        }
    }

    async fn maybe_fail_or_delay(symbol: &str) -> Result<(), KlineError> {
        match symbol {
            "FAIL" => Err(KlineError::vendor("mock", "forced failure")),
            "EMPTY" => Err(KlineError::empty(format!("mock {symbol}"))),
            "TIMEOUT" => {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl KlineProvider for MockConnector {
    async fn fetch(&self, req: &KlineRequest) -> Result<RawVendorResponse, KlineError> {
        Self::maybe_fail_or_delay(&req.symbol).await?;
        let frame = match req.frequency {
            Frequency::Daily => fixtures::daily::by_symbol(&req.symbol),
            _ => None,
        }
        .unwrap_or_else(|| fixtures::synthetic::frame(&req.symbol, req.frequency, &req.window));
        Ok(RawVendorResponse {
            vendor: "mock",
            request: req.clone(),
            schema: fixtures::SCHEMA,
            frame,
        })
    }

    fn supported_frequencies(&self) -> &'static [Frequency] {
        Frequency::ALL
    }

    fn window_policy(&self) -> WindowPolicy {
        self.policy
    }

    fn distinguishes_assets(&self) -> bool {
        true
    }
}

#[async_trait]
impl BasicProvider for MockConnector {
    async fn basic(&self, ts_code: &str) -> Result<Value, KlineError> {
        Self::maybe_fail_or_delay(ts_code).await?;
        fixtures::basic::by_symbol(ts_code)
            .ok_or_else(|| KlineError::empty(format!("mock basic {ts_code}")))
    }
}

impl VendorConnector for MockConnector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn vendor(&self) -> &'static str {
        "mock"
    }

    fn as_kline_provider(&self) -> Option<&dyn KlineProvider> {
        Some(self as &dyn KlineProvider)
    }

    fn as_basic_provider(&self) -> Option<&dyn BasicProvider> {
        Some(self as &dyn BasicProvider)
    }
}
