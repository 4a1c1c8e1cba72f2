//! klinegate-tushare
//!
//! Connector for the Tushare Pro HTTP API. Serves every frequency code over a
//! date-range window, forward-adjusts equity prices with `adj_factor`, and
//! answers `/basic` lookups from the `stock_basic` table.
#![warn(missing_docs)]

/// Forward price adjustment.
pub mod adjust;
/// Query-endpoint client.
pub mod client;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveTime;
use klinegate_core::{
    AssetClass, BasicProvider, Column, ConnectorKey, CredentialProvider, Frequency, KlineError,
    KlineProvider, KlineRequest, RawFrame, RawVendorResponse, StaticToken, TimestampEncoding,
    TushareConfig, VendorConnector, VendorSchema, WindowPolicy,
};
use moka::future::Cache;
use serde_json::{Map, Value, json};

use crate::adjust::AdjFactors;
pub use crate::client::TushareClient;
use crate::client::VENDOR;

const SCHEMA: VendorSchema = VendorSchema {
    aliases: &[
        ("ts_code", Column::Symbol),
        ("trade_time", Column::Dt),
        ("trade_date", Column::Dt),
        ("open", Column::Open),
        ("close", Column::Close),
        ("high", Column::High),
        ("low", Column::Low),
        ("vol", Column::Vol),
    ],
    timestamp: TimestampEncoding::Text,
    drop_session_open: NaiveTime::from_hms_opt(9, 30, 0),
    start_stamped: false,
};

const SUPPORTED: &[Frequency] = Frequency::ALL;

const BASIC_TTL: Duration = Duration::from_secs(3600);
const BASIC_FIELDS: &str = "ts_code,name,area,industry,list_date";

/// Which table serves an asset class at a frequency.
fn bar_api(asset: AssetClass, freq: Frequency) -> Result<&'static str, KlineError> {
    use AssetClass as A;
    use Frequency as F;
    let api = match (asset, freq) {
        (A::Equity | A::Fund, f) if f.is_intraday() => "stk_mins",
        (A::Index, f) if f.is_intraday() => "idx_mins",
        (A::Future, f) if f.is_intraday() => "ft_mins",
        (A::Equity, F::Daily) => "daily",
        (A::Equity, F::Weekly) => "weekly",
        (A::Index, F::Daily) => "index_daily",
        (A::Index, F::Weekly) => "index_weekly",
        (A::Fund, F::Daily) => "fund_daily",
        (A::Future, F::Daily) => "fut_daily",
        (A::Fund | A::Future, F::Weekly) => {
            return Err(KlineError::InvalidFrequency(format!(
                "'W' is not served by tushare for asset {asset}"
            )));
        }
        (other, _) => {
            return Err(KlineError::InvalidParameter(format!(
                "asset {other} is not served by tushare"
            )));
        }
    };
    Ok(api)
}

/// Tushare Pro connector.
pub struct TushareConnector {
    client: TushareClient,
    basic_cache: Cache<&'static str, Arc<RawFrame>>,
}

impl TushareConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("klinegate-tushare");

    /// Build around an existing client.
    #[must_use]
    pub fn new(client: TushareClient) -> Self {
        Self {
            client,
            basic_cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(BASIC_TTL)
                .build(),
        }
    }

    /// Build from the `[tushare]` configuration table.
    ///
    /// # Errors
    /// Returns `VendorUnavailable` if the HTTP client cannot be constructed.
    pub fn from_config(config: &TushareConfig, timeout: Duration) -> Result<Self, KlineError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KlineError::vendor(VENDOR, e.to_string()))?;
        let token: Arc<dyn CredentialProvider> =
            Arc::new(StaticToken::new(VENDOR, config.token.clone()));
        Ok(Self::new(TushareClient::new(
            http,
            config.base_url.clone(),
            token,
        )))
    }

    async fn stock_basic(&self) -> Result<Arc<RawFrame>, KlineError> {
        let client = self.client.clone();
        self.basic_cache
            .try_get_with("stock_basic", async move {
                let params = json!({"exchange": "", "list_status": "L"});
                client
                    .query("stock_basic", params, BASIC_FIELDS)
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())
    }
}

#[async_trait]
impl KlineProvider for TushareConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "klinegate_tushare::fetch",
            skip(self, req),
            fields(symbol = %req.symbol, freq = %req.frequency, asset = %req.asset),
        )
    )]
    async fn fetch(&self, req: &KlineRequest) -> Result<RawVendorResponse, KlineError> {
        let api = bar_api(req.asset, req.frequency)?;
        let start = req.window.start().ok_or_else(|| {
            KlineError::InvalidParameter("tushare takes date-range windows".into())
        })?;
        let through = req.window.through();

        let (params, dt_label, fields) = if req.frequency.is_intraday() {
            (
                json!({
                    "ts_code": req.symbol,
                    "freq": req.frequency.code(),
                    "start_date": format!("{} 00:00:00", start.format("%Y-%m-%d")),
                    "end_date": req.window.end().format("%Y-%m-%d %H:%M:%S").to_string(),
                }),
                "trade_time",
                "ts_code,trade_time,open,close,high,low,vol",
            )
        } else {
            (
                json!({
                    "ts_code": req.symbol,
                    "start_date": start.format("%Y%m%d").to_string(),
                    "end_date": through.format("%Y%m%d").to_string(),
                }),
                "trade_date",
                "ts_code,trade_date,open,close,high,low,vol",
            )
        };

        let mut frame = self.client.query(api, params, fields).await?;
        if frame.is_empty() {
            return Err(KlineError::empty(format!("{api} {}", req.symbol)));
        }

        if req.asset == AssetClass::Equity {
            let adj = self
                .client
                .query(
                    "adj_factor",
                    json!({
                        "ts_code": req.symbol,
                        "start_date": start.format("%Y%m%d").to_string(),
                        "end_date": through.format("%Y%m%d").to_string(),
                    }),
                    "ts_code,trade_date,adj_factor",
                )
                .await?;
            let factors = AdjFactors::from_frame(&adj);
            #[cfg(feature = "tracing")]
            if factors.is_empty() {
                tracing::debug!(symbol = %req.symbol, "no adj_factor rows, prices left unadjusted");
            }
            factors.apply(&mut frame, dt_label);
        }

        Ok(RawVendorResponse {
            vendor: VENDOR,
            request: req.clone(),
            schema: SCHEMA,
            frame,
        })
    }

    fn supported_frequencies(&self) -> &'static [Frequency] {
        SUPPORTED
    }

    fn window_policy(&self) -> WindowPolicy {
        WindowPolicy::Range
    }

    fn distinguishes_assets(&self) -> bool {
        true
    }
}

#[async_trait]
impl BasicProvider for TushareConnector {
    async fn basic(&self, ts_code: &str) -> Result<Value, KlineError> {
        let table = self.stock_basic().await?;
        let code_at = table
            .position("ts_code")
            .ok_or_else(|| KlineError::vendor(VENDOR, "stock_basic without ts_code"))?;
        let row = table
            .rows
            .iter()
            .find(|r| r.get(code_at).and_then(Value::as_str) == Some(ts_code))
            .ok_or_else(|| KlineError::empty(format!("stock_basic {ts_code}")))?;
        let mut obj: Map<String, Value> = table
            .columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect();
        obj.insert("symbol".into(), Value::String(ts_code.to_string()));
        Ok(Value::Array(vec![Value::Object(obj)]))
    }
}

impl VendorConnector for TushareConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        VENDOR
    }

    fn as_kline_provider(&self) -> Option<&dyn KlineProvider> {
        Some(self as &dyn KlineProvider)
    }

    fn as_basic_provider(&self) -> Option<&dyn BasicProvider> {
        Some(self as &dyn BasicProvider)
    }
}
