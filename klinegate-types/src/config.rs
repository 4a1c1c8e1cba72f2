//! Configuration types for the service and its connectors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which vendor backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum VendorKind {
    /// Tushare Pro HTTP API.
    #[default]
    Tushare,
    /// JoinQuant data API.
    #[serde(alias = "jq")]
    JoinQuant,
    /// MyQuant (GM) terminal.
    Gm,
    /// TianQin (TqSdk) session.
    Tq,
}

impl core::str::FromStr for VendorKind {
    type Err = crate::KlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tushare" | "ts" => Ok(Self::Tushare),
            "joinquant" | "jq" => Ok(Self::JoinQuant),
            "gm" | "myquant" => Ok(Self::Gm),
            "tq" | "tqsdk" => Ok(Self::Tq),
            other => Err(crate::KlineError::InvalidParameter(format!(
                "unknown vendor '{other}'"
            ))),
        }
    }
}

/// Parameters handed to the analysis engine with every bar sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Moving-average windows.
    pub ma_params: Vec<u32>,
    /// Compute the momentum/convergence indicator (MACD).
    pub use_macd: bool,
    /// Compute segment markers.
    pub use_xd: bool,
    /// Newest bars to retain in the annotated result.
    pub max_count: usize,
    /// External engine command line (program followed by its arguments).
    /// When absent, bars are served without markers.
    pub command: Option<Vec<String>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ma_params: vec![5, 20],
            use_macd: true,
            use_xd: true,
            max_count: 5000,
            command: None,
        }
    }
}

/// Tushare Pro connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TushareConfig {
    /// API token.
    pub token: String,
    /// API endpoint.
    pub base_url: String,
}

impl Default for TushareConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: "http://api.tushare.pro".to_string(),
        }
    }
}

/// JoinQuant connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinQuantConfig {
    /// JSON file holding `{"mob": ..., "pwd": ...}`. Defaults to `~/jq.token.json`.
    pub credentials_path: Option<PathBuf>,
    /// API endpoint.
    pub base_url: String,
}

impl Default for JoinQuantConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            base_url: "https://dataapi.joinquant.com/apis".to_string(),
        }
    }
}

/// GM terminal connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmConfig {
    /// Token registered with the local terminal.
    pub token: String,
    /// Local terminal bridge endpoint.
    pub endpoint: String,
}

impl Default for GmConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            endpoint: "http://127.0.0.1:7001".to_string(),
        }
    }
}

/// TianQin connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TqConfig {
    /// Local TqSdk bridge endpoint.
    pub endpoint: String,
}

impl Default for TqConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:7777".to_string(),
        }
    }
}

/// Top-level service configuration, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listening port. The charting front-end expects 8005.
    pub port: u16,
    /// Listening address.
    pub bind: String,
    /// Directory holding the front-end bundle.
    pub web_root: PathBuf,
    /// Vendor backing `/kline` and `/basic`.
    pub vendor: VendorKind,
    /// Bars requested from count-based vendors (capped per vendor).
    pub bar_count: usize,
    /// Timeout applied by the vendor HTTP clients.
    pub http_timeout_secs: u64,
    /// Analysis engine parameters.
    pub analysis: AnalysisConfig,
    /// Tushare settings.
    pub tushare: TushareConfig,
    /// JoinQuant settings.
    pub joinquant: JoinQuantConfig,
    /// GM settings.
    pub gm: GmConfig,
    /// TianQin settings.
    pub tq: TqConfig,
}

impl ServiceConfig {
    /// Port the front-end is hard-wired to.
    pub const DEFAULT_PORT: u16 = 8005;
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            bind: "127.0.0.1".to_string(),
            web_root: PathBuf::from("web"),
            vendor: VendorKind::default(),
            bar_count: 5000,
            http_timeout_secs: 30,
            analysis: AnalysisConfig::default(),
            tushare: TushareConfig::default(),
            joinquant: JoinQuantConfig::default(),
            gm: GmConfig::default(),
            tq: TqConfig::default(),
        }
    }
}
