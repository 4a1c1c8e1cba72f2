use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KlineError;

/// Instrument class for vendors that distinguish them.
///
/// Codes follow the `asset` query parameter: `E`, `I`, `FD`, `FT`, `C`, `O`, `CB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssetClass {
    /// Equities.
    #[default]
    #[serde(rename = "E")]
    Equity,
    /// Exchange indices.
    #[serde(rename = "I")]
    Index,
    /// Funds.
    #[serde(rename = "FD")]
    Fund,
    /// Futures.
    #[serde(rename = "FT")]
    Future,
    /// Crypto currencies.
    #[serde(rename = "C")]
    Crypto,
    /// Options.
    #[serde(rename = "O")]
    Option,
    /// Convertible bonds.
    #[serde(rename = "CB")]
    ConvertibleBond,
}

impl AssetClass {
    /// The wire code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Equity => "E",
            Self::Index => "I",
            Self::Fund => "FD",
            Self::Future => "FT",
            Self::Crypto => "C",
            Self::Option => "O",
            Self::ConvertibleBond => "CB",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AssetClass {
    type Err = KlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E" => Ok(Self::Equity),
            "I" => Ok(Self::Index),
            "FD" => Ok(Self::Fund),
            "FT" => Ok(Self::Future),
            "C" => Ok(Self::Crypto),
            "O" => Ok(Self::Option),
            "CB" => Ok(Self::ConvertibleBond),
            other => Err(KlineError::InvalidParameter(format!("unknown asset '{other}'"))),
        }
    }
}
