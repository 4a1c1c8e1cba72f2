//! klinegate-gm
//!
//! Connector for the MyQuant (GM, 掘金) terminal. The terminal must run
//! locally; bars are requested through its HTTP bridge with a `history_n`
//! call, newest `count` bars ending at the window's exclusive bound.
#![warn(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use klinegate_core::{
    Column, ConnectorKey, CredentialProvider, Frequency, GmConfig, KlineError, KlineProvider,
    KlineRequest, RawFrame, RawVendorResponse, StaticToken, TimestampEncoding, VendorConnector,
    VendorSchema, WindowPolicy, ensure_supported, vendor_end,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use url::Url;

const VENDOR: &str = "gm";

/// Largest `count` requested from the terminal.
pub const MAX_COUNT: usize = 5000;

/// Fields requested from `history_n`, in frame column order.
const FIELDS: [&str; 7] = ["symbol", "eob", "open", "close", "high", "low", "volume"];

const SCHEMA: VendorSchema = VendorSchema {
    aliases: &[
        ("symbol", Column::Symbol),
        ("eob", Column::Dt),
        ("open", Column::Open),
        ("close", Column::Close),
        ("high", Column::High),
        ("low", Column::Low),
        ("volume", Column::Vol),
    ],
    timestamp: TimestampEncoding::Text,
    drop_session_open: None,
    start_stamped: false,
};

// No weekly bars.
const SUPPORTED: &[Frequency] = &[
    Frequency::M1,
    Frequency::M5,
    Frequency::M15,
    Frequency::M30,
    Frequency::M60,
    Frequency::Daily,
];

/// GM frequency string; `None` for codes the terminal does not serve.
#[must_use]
pub const fn frequency(freq: Frequency) -> Option<&'static str> {
    match freq {
        Frequency::M1 => Some("60s"),
        Frequency::M5 => Some("300s"),
        Frequency::M15 => Some("900s"),
        Frequency::M30 => Some("1800s"),
        Frequency::M60 => Some("3600s"),
        Frequency::Daily => Some("1d"),
        Frequency::Weekly => None,
    }
}

#[derive(Deserialize)]
struct BridgeResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<Map<String, Value>>,
}

fn records_to_frame(records: Vec<Map<String, Value>>) -> RawFrame {
    let rows = records
        .into_iter()
        .map(|mut r| {
            FIELDS
                .iter()
                .map(|f| r.remove(*f).unwrap_or(Value::Null))
                .collect()
        })
        .collect();
    RawFrame::new(FIELDS, rows)
}

/// GM terminal connector.
pub struct GmConnector {
    http: reqwest::Client,
    history_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl GmConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("klinegate-gm");

    /// Build from parts. `endpoint` is the bridge root, e.g. `http://127.0.0.1:7001`.
    ///
    /// # Errors
    /// `InvalidParameter` when `endpoint` is not a valid URL.
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, KlineError> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| KlineError::InvalidParameter(format!("gm endpoint '{endpoint}': {e}")))?;
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        let history_url = base
            .join("history_n")
            .map_err(|e| KlineError::InvalidParameter(format!("gm endpoint '{endpoint}': {e}")))?;
        Ok(Self {
            http,
            history_url,
            credentials,
        })
    }

    /// Build from the `[gm]` configuration table.
    ///
    /// # Errors
    /// `InvalidParameter` for a malformed endpoint, `VendorUnavailable` if the
    /// HTTP client cannot be constructed.
    pub fn from_config(config: &GmConfig, timeout: Duration) -> Result<Self, KlineError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KlineError::vendor(VENDOR, e.to_string()))?;
        Self::new(
            http,
            &config.endpoint,
            Arc::new(StaticToken::new(VENDOR, config.token.clone())),
        )
    }
}

#[async_trait]
impl KlineProvider for GmConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "klinegate_gm::fetch",
            skip(self, req),
            fields(symbol = %req.symbol, freq = %req.frequency),
        )
    )]
    async fn fetch(&self, req: &KlineRequest) -> Result<RawVendorResponse, KlineError> {
        ensure_supported(req.frequency, SUPPORTED, VENDOR)?;
        let freq = frequency(req.frequency)
            .ok_or_else(|| KlineError::InvalidFrequency(req.frequency.to_string()))?;
        let count = req.window.count().unwrap_or(MAX_COUNT).min(MAX_COUNT);
        let token = self.credentials.token().await?;
        let body = json!({
            "token": token,
            "symbol": req.symbol,
            "frequency": freq,
            "end_time": vendor_end(&req.window, req.frequency)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            "count": count,
            "fields": FIELDS.join(","),
        });

        let resp = self
            .http
            .post(self.history_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("terminal unreachable: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(KlineError::vendor(VENDOR, format!("http status {status}")));
        }
        let parsed: BridgeResponse = resp
            .json()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("bad response: {e}")))?;
        if parsed.code != 0 {
            return Err(KlineError::vendor(
                VENDOR,
                format!("code {}: {}", parsed.code, parsed.msg),
            ));
        }
        if parsed.data.is_empty() {
            return Err(KlineError::empty(format!("{VENDOR} {}", req.symbol)));
        }
        Ok(RawVendorResponse {
            vendor: VENDOR,
            request: req.clone(),
            schema: SCHEMA,
            frame: records_to_frame(parsed.data),
        })
    }

    fn supported_frequencies(&self) -> &'static [Frequency] {
        SUPPORTED
    }

    fn window_policy(&self) -> WindowPolicy {
        WindowPolicy::Count { max: MAX_COUNT }
    }
}

impl VendorConnector for GmConnector {
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
