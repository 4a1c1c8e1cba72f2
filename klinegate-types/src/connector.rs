//! Connector identity.

use core::fmt;

/// Stable name of a connector crate, e.g. `klinegate-tushare`.
///
/// Shows up in span fields and in the startup log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorKey(&'static str);

impl ConnectorKey {
    /// Key for a static connector name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Full connector name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }

    /// Name without the `klinegate-` prefix.
    #[must_use]
    pub fn short(self) -> &'static str {
        self.0.strip_prefix("klinegate-").unwrap_or(self.0)
    }
}

impl fmt::Display for ConnectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
