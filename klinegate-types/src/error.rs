use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the klinegate workspace.
///
/// Request validation, vendor transport failures, empty windows, schema drift
/// and analysis-engine failures each get their own variant so the HTTP layer
/// can report them precisely.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KlineError {
    /// The frequency code is not recognized, or not served by the selected vendor.
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    /// A request argument is missing or malformed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The vendor could not be reached, rejected the credentials, or answered garbage.
    #[error("{vendor} unavailable: {msg}")]
    VendorUnavailable {
        /// Connector name that failed.
        vendor: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The vendor answered successfully but returned no rows for the window.
    #[error("no data: {what}")]
    VendorDataEmpty {
        /// Description of the empty request, e.g. "kline for 000001.SZ".
        what: String,
    },

    /// The raw response does not carry the columns the normalizer requires.
    #[error("{vendor} response could not be normalized: {msg} (columns: {columns:?})")]
    NormalizationFailure {
        /// Connector name whose response drifted.
        vendor: String,
        /// What was missing or malformed.
        msg: String,
        /// The raw column labels as received.
        columns: Vec<String>,
    },

    /// The external analysis engine failed.
    #[error("analysis engine failed: {0}")]
    Analysis(String),

    /// The connector does not implement the requested capability.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability label, e.g. "basic".
        capability: String,
    },
}

impl KlineError {
    /// Helper: build a `VendorUnavailable` error.
    pub fn vendor(vendor: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::VendorUnavailable {
            vendor: vendor.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `VendorDataEmpty` error.
    pub fn empty(what: impl Into<String>) -> Self {
        Self::VendorDataEmpty { what: what.into() }
    }

    /// Helper: build a `NormalizationFailure` error.
    pub fn normalization(
        vendor: impl Into<String>,
        msg: impl Into<String>,
        columns: &[String],
    ) -> Self {
        Self::NormalizationFailure {
            vendor: vendor.into(),
            msg: msg.into(),
            columns: columns.to_vec(),
        }
    }

    /// Helper: build an `Unsupported` error for a capability label.
    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: capability.into(),
        }
    }

    /// True for errors caused by the caller's arguments.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFrequency(_) | Self::InvalidParameter(_) | Self::Unsupported { .. }
        )
    }
}
