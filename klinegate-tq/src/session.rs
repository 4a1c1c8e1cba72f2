use async_trait::async_trait;
use klinegate_core::{KlineError, RawFrame};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::VENDOR;

/// A live market-data session.
///
/// Sessions hold subscription state, so every call takes `&mut self`; the
/// connector serializes access.
#[async_trait]
pub trait KlineSession: Send {
    /// The newest `data_length` bars of `duration_seconds` for `symbol`.
    ///
    /// # Errors
    /// `VendorUnavailable` when the session cannot be used.
    async fn kline_serial(
        &mut self,
        symbol: &str,
        duration_seconds: i64,
        data_length: usize,
    ) -> Result<RawFrame, KlineError>;
}

#[derive(Deserialize)]
struct Opened {
    session: String,
}

/// Session held by a local TqSdk bridge process over HTTP.
///
/// `POST /session` opens a session; `POST /kline_serial` reads bars from it
/// as `{"columns": [...], "rows": [[...]]}`. A session the bridge no longer
/// knows (404) is reopened once.
pub struct BridgeSession {
    http: reqwest::Client,
    base: Url,
    id: Option<String>,
}

impl BridgeSession {
    /// Session against the bridge rooted at `endpoint`.
    ///
    /// # Errors
    /// `InvalidParameter` when `endpoint` is not a valid URL.
    pub fn new(http: reqwest::Client, endpoint: &str) -> Result<Self, KlineError> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| KlineError::InvalidParameter(format!("tq endpoint '{endpoint}': {e}")))?;
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        Ok(Self {
            http,
            base,
            id: None,
        })
    }

    fn url(&self, path: &str) -> Result<Url, KlineError> {
        self.base
            .join(path)
            .map_err(|e| KlineError::vendor(VENDOR, e.to_string()))
    }

    async fn open(&mut self) -> Result<String, KlineError> {
        if let Some(id) = &self.id {
            return Ok(id.clone());
        }
        let resp = self
            .http
            .post(self.url("session")?)
            .send()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("bridge unreachable: {e}")))?;
        if !resp.status().is_success() {
            return Err(KlineError::vendor(
                VENDOR,
                format!("open session: http status {}", resp.status()),
            ));
        }
        let opened: Opened = resp
            .json()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("open session: {e}")))?;
        self.id = Some(opened.session.clone());
        Ok(opened.session)
    }

    async fn read(
        &mut self,
        symbol: &str,
        duration_seconds: i64,
        data_length: usize,
    ) -> Result<Option<RawFrame>, KlineError> {
        let session = self.open().await?;
        let body = json!({
            "session": session,
            "symbol": symbol,
            "duration_seconds": duration_seconds,
            "data_length": data_length,
        });
        let resp = self
            .http
            .post(self.url("kline_serial")?)
            .json(&body)
            .send()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("bridge unreachable: {e}")))?;
        match resp.status() {
            StatusCode::NOT_FOUND => {
                self.id = None;
                Ok(None)
            }
            s if s.is_success() => resp
                .json::<RawFrame>()
                .await
                .map(Some)
                .map_err(|e| KlineError::vendor(VENDOR, format!("kline_serial: {e}"))),
            s => Err(KlineError::vendor(
                VENDOR,
                format!("kline_serial: http status {s}"),
            )),
        }
    }
}

#[async_trait]
impl KlineSession for BridgeSession {
    async fn kline_serial(
        &mut self,
        symbol: &str,
        duration_seconds: i64,
        data_length: usize,
    ) -> Result<RawFrame, KlineError> {
        if let Some(frame) = self.read(symbol, duration_seconds, data_length).await? {
            return Ok(frame);
        }
        #[cfg(feature = "tracing")]
        tracing::info!("tq session expired, reopening");
        self.read(symbol, duration_seconds, data_length)
            .await?
            .ok_or_else(|| KlineError::vendor(VENDOR, "session rejected after reopen"))
    }
}
