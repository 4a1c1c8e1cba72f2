use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use klinegate_core::KlineError;
use serde_json::{Value, json};

/// HTTP status for a pipeline error.
#[must_use]
pub const fn status_of(e: &KlineError) -> StatusCode {
    match e {
        KlineError::InvalidFrequency(_)
        | KlineError::InvalidParameter(_)
        | KlineError::Unsupported { .. } => StatusCode::BAD_REQUEST,
        KlineError::VendorUnavailable { .. } | KlineError::NormalizationFailure { .. } => {
            StatusCode::BAD_GATEWAY
        }
        KlineError::VendorDataEmpty { .. } => StatusCode::OK,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A pipeline error rendered for one endpoint.
///
/// The body always carries the endpoint's payload key with an empty value
/// (`"kdata": []` or `"basic": null`) next to `msg`, so clients can read it
/// unconditionally.
#[derive(Debug)]
pub struct ApiError {
    err: KlineError,
    payload: (&'static str, Value),
}

impl ApiError {
    /// Error answered on `/kline`.
    #[must_use]
    pub fn kline(err: KlineError) -> Self {
        Self {
            err,
            payload: ("kdata", json!([])),
        }
    }

    /// Error answered on `/basic`.
    #[must_use]
    pub const fn basic(err: KlineError) -> Self {
        Self {
            err,
            payload: ("basic", Value::Null),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.err);
        let (key, empty) = self.payload;
        if let KlineError::VendorDataEmpty { what } = &self.err {
            tracing::info!(%what, "vendor returned no rows");
            let mut body = serde_json::Map::new();
            body.insert(key.to_string(), empty);
            return (status, Json(Value::Object(body))).into_response();
        }
        if self.err.is_client_error() {
            tracing::warn!(error = %self.err, "request rejected");
        } else {
            tracing::error!(error = %self.err, "request failed");
        }
        let mut body = serde_json::Map::new();
        body.insert("msg".into(), Value::String(self.err.to_string()));
        body.insert(key.to_string(), empty);
        (status, Json(Value::Object(body))).into_response()
    }
}
