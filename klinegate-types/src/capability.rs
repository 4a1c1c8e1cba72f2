use core::fmt;
use serde::{Deserialize, Serialize};

/// Capability labels used in errors and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Capability {
    /// Historical bars for one instrument and frequency.
    Kline,
    /// Static instrument metadata.
    Basic,
}

impl Capability {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kline => "kline",
            Self::Basic => "basic",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
