use std::sync::Arc;
use std::time::Duration;

use klinegate_core::{
    AnalysisConfig, AnalysisEngine, AssetClass, Capability, Frequency, KlineError, KlineRequest,
    PlainEngine, VendorConnector, ensure_supported, exchange_today, normalize, parse_trade_date,
    resolve_window,
};
use serde::Deserialize;
use serde_json::Value;

use crate::bridge::{self, KRow};

/// Query accepted by `/kline`, over the query string or a JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KlineQuery {
    /// Vendor-qualified symbol.
    pub ts_code: String,
    /// Frequency code.
    pub freq: String,
    /// `YYYYMMDD` or `"null"` for today; absent means today.
    #[serde(default)]
    pub trade_date: Option<String>,
    /// Asset class code, `E` when absent.
    #[serde(default)]
    pub asset: Option<String>,
}

/// Query accepted by `/basic`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BasicQuery {
    /// Instrument code.
    pub ts_code: String,
}

/// Pipeline orchestrator: resolve, fetch, normalize, annotate, render.
pub struct Kline {
    connector: Arc<dyn VendorConnector>,
    engine: Arc<dyn AnalysisEngine>,
    analysis: AnalysisConfig,
    bar_count: usize,
    fetch_timeout: Duration,
}

/// Builder for constructing a [`Kline`] orchestrator.
pub struct KlineBuilder {
    connector: Option<Arc<dyn VendorConnector>>,
    engine: Arc<dyn AnalysisEngine>,
    analysis: AnalysisConfig,
    bar_count: usize,
    fetch_timeout: Duration,
}

impl Default for KlineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KlineBuilder {
    /// Create a new builder.
    ///
    /// Starts with no connector, the marker-free engine, default analysis
    /// parameters, 5000 bars per count request and a 60s fetch timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connector: None,
            engine: Arc::new(PlainEngine),
            analysis: AnalysisConfig::default(),
            bar_count: 5000,
            fetch_timeout: Duration::from_secs(60),
        }
    }

    /// Register the vendor connector. A later call replaces an earlier one.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn VendorConnector>) -> Self {
        self.connector = Some(c);
        self
    }

    /// Use this analysis engine.
    #[must_use]
    pub fn engine(mut self, e: Arc<dyn AnalysisEngine>) -> Self {
        self.engine = e;
        self
    }

    /// Parameters forwarded to the engine on every request.
    #[must_use]
    pub fn analysis(mut self, cfg: AnalysisConfig) -> Self {
        self.analysis = cfg;
        self
    }

    /// Bars requested from count-window vendors before their own cap.
    #[must_use]
    pub const fn bar_count(mut self, n: usize) -> Self {
        self.bar_count = n;
        self
    }

    /// Upper bound on one vendor fetch.
    #[must_use]
    pub const fn fetch_timeout(mut self, t: Duration) -> Self {
        self.fetch_timeout = t;
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidParameter` if no connector was registered or `bar_count` is zero.
    pub fn build(self) -> Result<Kline, KlineError> {
        let connector = self.connector.ok_or_else(|| {
            KlineError::InvalidParameter(
                "no connector registered; add one via with_connector(...)".into(),
            )
        })?;
        if self.bar_count == 0 {
            return Err(KlineError::InvalidParameter(
                "bar_count must be positive".into(),
            ));
        }
        Ok(Kline {
            connector,
            engine: self.engine,
            analysis: self.analysis,
            bar_count: self.bar_count,
            fetch_timeout: self.fetch_timeout,
        })
    }
}

impl Kline {
    /// Start building a new `Kline` instance.
    #[must_use]
    pub fn builder() -> KlineBuilder {
        KlineBuilder::new()
    }

    /// The connector serving this instance.
    #[must_use]
    pub fn connector(&self) -> &dyn VendorConnector {
        self.connector.as_ref()
    }

    /// Serve one `/kline` query.
    ///
    /// Validation happens before any vendor call: an unknown or unsupported
    /// frequency, a malformed date or asset never reaches the network.
    /// Asset codes are only checked for vendors that distinguish them.
    ///
    /// # Errors
    /// Any [`KlineError`]; `VendorDataEmpty` signals an empty answer rather
    /// than a failure.
    #[tracing::instrument(
        name = "klinegate::kline",
        skip(self, q),
        fields(ts_code = %q.ts_code, freq = %q.freq, vendor = self.connector.vendor()),
    )]
    pub async fn kline(&self, q: &KlineQuery) -> Result<Vec<KRow>, KlineError> {
        let frequency: Frequency = q.freq.parse()?;
        if q.ts_code.trim().is_empty() {
            return Err(KlineError::InvalidParameter("ts_code is required".into()));
        }
        let through = parse_trade_date(q.trade_date.as_deref().unwrap_or("null"), exchange_today())?;

        let provider = self
            .connector
            .as_kline_provider()
            .ok_or_else(|| KlineError::unsupported(Capability::Kline.as_str()))?;
        let asset: AssetClass = match q.asset.as_deref().map(str::trim) {
            None | Some("") => AssetClass::default(),
            Some(code) if provider.distinguishes_assets() => code.parse()?,
            Some(code) => code.parse::<AssetClass>().unwrap_or_else(|_| {
                tracing::debug!(asset = code, "asset ignored by vendor");
                AssetClass::default()
            }),
        };
        ensure_supported(
            frequency,
            provider.supported_frequencies(),
            self.connector.vendor(),
        )?;
        let window = resolve_window(frequency, through, provider.window_policy(), self.bar_count)?;
        let req = KlineRequest {
            symbol: q.ts_code.trim().to_string(),
            frequency,
            asset,
            window,
        };

        let raw = tokio::time::timeout(self.fetch_timeout, provider.fetch(&req))
            .await
            .unwrap_or_else(|_| {
                Err(KlineError::vendor(
                    self.connector.vendor(),
                    format!("no answer within {}s", self.fetch_timeout.as_secs()),
                ))
            })?;
        let rows_in = raw.frame.len();
        let bars = normalize(raw).inspect_err(|e| {
            if let KlineError::NormalizationFailure { columns, .. } = e {
                tracing::error!(?columns, "vendor frame could not be normalized");
            }
        })?;
        tracing::debug!(rows_in, bars = bars.len(), "normalized");
        if bars.is_empty() {
            return Err(KlineError::empty(format!("{} {}", req.symbol, frequency)));
        }

        let annotated = self.engine.annotate(bars, &self.analysis).await?;
        tracing::debug!(engine = self.engine.name(), rows = annotated.len(), "annotated");
        Ok(bridge::rows(&annotated))
    }

    /// Serve one `/basic` query. Vendors without metadata, and codes the
    /// vendor does not know, yield `null`.
    ///
    /// # Errors
    /// Vendor failures other than an empty answer.
    #[tracing::instrument(name = "klinegate::basic", skip(self), fields(vendor = self.connector.vendor()))]
    pub async fn basic(&self, ts_code: &str) -> Result<Value, KlineError> {
        let Some(provider) = self.connector.as_basic_provider() else {
            tracing::debug!(capability = %Capability::Basic, "not offered by vendor");
            return Ok(Value::Null);
        };
        match provider.basic(ts_code.trim()).await {
            Ok(v) => Ok(v),
            Err(KlineError::VendorDataEmpty { what }) => {
                tracing::info!(%what, "no metadata");
                Ok(Value::Null)
            }
            Err(e) => Err(e),
        }
    }
}
