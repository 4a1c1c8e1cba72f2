use std::sync::Arc;

use klinegate_core::{CredentialProvider, KlineError, RawFrame};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const VENDOR: &str = "tushare";

#[derive(Serialize)]
struct ApiRequest<'a> {
    api_name: &'a str,
    token: &'a str,
    params: &'a Value,
    fields: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<ApiData>,
}

#[derive(Deserialize)]
struct ApiData {
    fields: Vec<String>,
    #[serde(default)]
    items: Vec<Vec<Value>>,
}

/// Thin client for the Tushare Pro query endpoint.
///
/// Every call is one POST of `{api_name, token, params, fields}`; the answer
/// is a `{code, msg, data: {fields, items}}` envelope whose table is returned
/// as a [`RawFrame`] without touching the values.
#[derive(Clone)]
pub struct TushareClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl TushareClient {
    /// Client posting to `base_url` with tokens from `credentials`.
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

    /// Run one table query.
    ///
    /// # Errors
    /// `VendorUnavailable` on transport failure, a non-zero `code` or an
    /// envelope that cannot be decoded.
    pub async fn query(
        &self,
        api_name: &str,
        params: Value,
        fields: &str,
    ) -> Result<RawFrame, KlineError> {
        let token = self.credentials.token().await?;
        let body = ApiRequest {
            api_name,
            token: &token,
            params: &params,
            fields,
        };
        let resp = self
            .http
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("{api_name}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(KlineError::vendor(
                VENDOR,
                format!("{api_name}: http status {status}"),
            ));
        }
        let envelope: ApiResponse = resp
            .json()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("{api_name}: bad envelope: {e}")))?;
        if envelope.code != 0 {
            let msg = envelope.msg.unwrap_or_default();
            return Err(KlineError::vendor(
                VENDOR,
                format!("{api_name}: code {}: {msg}", envelope.code),
            ));
        }
        let data = envelope
            .data
            .ok_or_else(|| KlineError::vendor(VENDOR, format!("{api_name}: envelope without data")))?;
        Ok(RawFrame::new(data.fields, data.items))
    }
}
