//! klinegate-joinquant
//!
//! Connector for the JoinQuant data API (`dataapi.joinquant.com/apis`).
//! Requests are count-bounded (at most 5000 bars); answers are CSV text whose
//! header row names the columns.
#![warn(missing_docs)]

/// Mobile/password token provider.
pub mod credentials;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use klinegate_core::{
    Column, ConnectorKey, CredentialProvider, Frequency, JoinQuantConfig, KlineError,
    KlineProvider, KlineRequest, RawFrame, RawVendorResponse, RequestWindow, TimestampEncoding,
    VendorConnector, VendorSchema, WindowPolicy, vendor_end,
};
use serde_json::{Value, json};

pub use crate::credentials::JoinQuantCredentials;

pub(crate) const VENDOR: &str = "joinquant";

/// Largest `count` the API honors.
pub const MAX_COUNT: usize = 5000;

const SCHEMA: VendorSchema = VendorSchema {
    aliases: &[
        ("date", Column::Dt),
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

/// JoinQuant `unit` for a frequency.
#[must_use]
pub const fn unit(freq: Frequency) -> &'static str {
    match freq {
        Frequency::M1 => "1m",
        Frequency::M5 => "5m",
        Frequency::M15 => "15m",
        Frequency::M30 => "30m",
        Frequency::M60 => "60m",
        Frequency::Daily => "1d",
        Frequency::Weekly => "1w",
    }
}

fn looks_like_expired_token(msg: &str) -> bool {
    let m = msg.to_ascii_lowercase();
    m.contains("token") && (m.contains("invalid") || m.contains("expire") || m.contains("过期"))
}

/// JoinQuant connector.
pub struct JoinQuantConnector {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl JoinQuantConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("klinegate-joinquant");

    /// Build from parts.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }

    /// Build from the `[joinquant]` configuration table.
    ///
    /// # Errors
    /// `VendorUnavailable` if no credentials file is configured or the HTTP
    /// client cannot be constructed.
    pub fn from_config(config: &JoinQuantConfig, timeout: Duration) -> Result<Self, KlineError> {
        let path = config
            .credentials_path
            .clone()
            .ok_or_else(|| KlineError::vendor(VENDOR, "joinquant.credentials_path is not set"))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KlineError::vendor(VENDOR, e.to_string()))?;
        let creds = Arc::new(JoinQuantCredentials::new(
            http.clone(),
            config.base_url.clone(),
            path,
        ));
        Ok(Self::new(http, config.base_url.clone(), creds))
    }

    fn body(req: &KlineRequest, token: String) -> Value {
        let end = vendor_end(&req.window, req.frequency)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        match req.window {
            RequestWindow::Count { count, .. } => json!({
                "method": "get_price",
                "token": token,
                "code": req.symbol,
                "count": count.min(MAX_COUNT),
                "unit": unit(req.frequency),
                "end_date": end,
            }),
            RequestWindow::Range { start, .. } => json!({
                "method": "get_price_period",
                "token": token,
                "code": req.symbol,
                "unit": unit(req.frequency),
                "date": start.format("%Y-%m-%d").to_string(),
                "end_date": end,
            }),
        }
    }

    async fn call(&self, body: &Value) -> Result<String, KlineError> {
        let resp = self
            .http
            .post(&self.base_url)
            .json(body)
            .send()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(KlineError::vendor(VENDOR, format!("http status {status}")));
        }
        resp.text()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, e.to_string()))
    }
}

#[async_trait]
impl KlineProvider for JoinQuantConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "klinegate_joinquant::fetch",
            skip(self, req),
            fields(symbol = %req.symbol, freq = %req.frequency),
        )
    )]
    async fn fetch(&self, req: &KlineRequest) -> Result<RawVendorResponse, KlineError> {
        let token = self.credentials.token().await?;
        let mut text = self.call(&Self::body(req, token)).await?;
        if text.trim_start().starts_with("error") && looks_like_expired_token(&text) {
            #[cfg(feature = "tracing")]
            tracing::info!("joinquant token rejected, refreshing once");
            let token = self.credentials.refresh().await?;
            text = self.call(&Self::body(req, token)).await?;
        }
        let text = text.trim();
        if text.starts_with("error") {
            return Err(KlineError::vendor(VENDOR, text));
        }
        let frame = RawFrame::from_csv(text);
        if frame.is_empty() {
            return Err(KlineError::empty(format!("{} {}", VENDOR, req.symbol)));
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

impl VendorConnector for JoinQuantConnector {
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
