use async_trait::async_trait;
use klinegate_types::KlineError;

/// Supplies the credential a connector attaches to vendor calls.
///
/// Connectors receive a provider at construction instead of reading ambient
/// files. `token` may serve a cached value; `refresh` must contact the
/// credential source again.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current token.
    ///
    /// # Errors
    /// Returns `VendorUnavailable` when no credential can be produced.
    async fn token(&self) -> Result<String, KlineError>;

    /// Discard any cached token and obtain a fresh one.
    ///
    /// Default: same as `token` (nothing is cached).
    ///
    /// # Errors
    /// Returns `VendorUnavailable` when no credential can be produced.
    async fn refresh(&self) -> Result<String, KlineError> {
        self.token().await
    }
}

/// A token fixed at construction, e.g. read from the service configuration.
#[derive(Clone)]
pub struct StaticToken {
    vendor: &'static str,
    token: String,
}

impl StaticToken {
    /// Wrap a configured token for `vendor`.
    pub fn new(vendor: &'static str, token: impl Into<String>) -> Self {
        Self {
            vendor,
            token: token.into(),
        }
    }
}

impl core::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticToken")
            .field("vendor", &self.vendor)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn token(&self) -> Result<String, KlineError> {
        if self.token.trim().is_empty() {
            return Err(KlineError::vendor(self.vendor, "no token configured"));
        }
        Ok(self.token.clone())
    }
}
