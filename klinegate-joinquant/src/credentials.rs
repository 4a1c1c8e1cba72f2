use std::path::PathBuf;

use async_trait::async_trait;
use klinegate_core::{CredentialProvider, KlineError};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::VENDOR;

/// Account stored in the credentials file: `{"mob": "...", "pwd": "..."}`.
#[derive(Debug, Clone, Deserialize)]
struct Account {
    mob: String,
    pwd: String,
}

/// Exchanges a mobile/password pair for a data-API token.
///
/// The account is read from a JSON file on first use. The issued token is
/// cached until [`CredentialProvider::refresh`] is called.
pub struct JoinQuantCredentials {
    http: reqwest::Client,
    base_url: String,
    path: PathBuf,
    cached: Mutex<Option<String>>,
}

impl JoinQuantCredentials {
    /// Provider reading the account from `path` and calling `base_url`.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    async fn account(&self) -> Result<Account, KlineError> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            KlineError::vendor(
                VENDOR,
                format!("credentials file {}: {e}", self.path.display()),
            )
        })?;
        serde_json::from_str(&text).map_err(|e| {
            KlineError::vendor(
                VENDOR,
                format!("credentials file {}: {e}", self.path.display()),
            )
        })
    }

    async fn issue(&self) -> Result<String, KlineError> {
        let Account { mob, pwd } = self.account().await?;
        let body = json!({"method": "get_current_token", "mob": mob, "pwd": pwd});
        let text = self
            .http
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("get_current_token: {e}")))?
            .text()
            .await
            .map_err(|e| KlineError::vendor(VENDOR, format!("get_current_token: {e}")))?;
        let token = text.trim();
        if token.is_empty() || token.starts_with("error") {
            return Err(KlineError::vendor(
                VENDOR,
                format!("get_current_token: {token}"),
            ));
        }
        Ok(token.to_string())
    }
}

#[async_trait]
impl CredentialProvider for JoinQuantCredentials {
    async fn token(&self) -> Result<String, KlineError> {
        let mut slot = self.cached.lock().await;
        if let Some(t) = slot.as_ref() {
            return Ok(t.clone());
        }
        let fresh = self.issue().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    async fn refresh(&self) -> Result<String, KlineError> {
        let mut slot = self.cached.lock().await;
        *slot = None;
        let fresh = self.issue().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }
}
