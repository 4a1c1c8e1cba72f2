use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KlineError;

/// Trading-frequency code accepted by the `/kline` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Frequency {
    /// One-minute bars.
    #[serde(rename = "1min")]
    M1,
    /// Five-minute bars.
    #[serde(rename = "5min")]
    M5,
    /// Fifteen-minute bars.
    #[serde(rename = "15min")]
    M15,
    /// Thirty-minute bars.
    #[serde(rename = "30min")]
    M30,
    /// Sixty-minute bars.
    #[serde(rename = "60min")]
    M60,
    /// Daily bars.
    #[serde(rename = "D")]
    Daily,
    /// Weekly bars.
    #[serde(rename = "W")]
    Weekly,
}

impl Frequency {
    /// Every recognized code, finest first.
    pub const ALL: &'static [Self] = &[
        Self::M1,
        Self::M5,
        Self::M15,
        Self::M30,
        Self::M60,
        Self::Daily,
        Self::Weekly,
    ];

    /// The wire code, e.g. `"30min"` or `"D"`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::M1 => "1min",
            Self::M5 => "5min",
            Self::M15 => "15min",
            Self::M30 => "30min",
            Self::M60 => "60min",
            Self::Daily => "D",
            Self::Weekly => "W",
        }
    }

    /// Bar length in minutes for intraday codes.
    #[must_use]
    pub const fn minutes(self) -> Option<i64> {
        match self {
            Self::M1 => Some(1),
            Self::M5 => Some(5),
            Self::M15 => Some(15),
            Self::M30 => Some(30),
            Self::M60 => Some(60),
            Self::Daily | Self::Weekly => None,
        }
    }

    /// Bar length in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self.minutes() {
            Some(m) => m * 60,
            None => match self {
                Self::Weekly => 7 * 86_400,
                _ => 86_400,
            },
        }
    }

    /// True for the minute codes.
    #[must_use]
    pub const fn is_intraday(self) -> bool {
        self.minutes().is_some()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = KlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.code() == s)
            .ok_or_else(|| {
                KlineError::InvalidFrequency(format!(
                    "'{s}', expected one of 1min, 5min, 15min, 30min, 60min, D, W"
                ))
            })
    }
}
