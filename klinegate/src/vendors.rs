use std::sync::Arc;
use std::time::Duration;

use klinegate_core::{
    AnalysisEngine, KlineError, PlainEngine, ServiceConfig, VendorConnector, VendorKind,
};
use klinegate_gm::GmConnector;
use klinegate_joinquant::JoinQuantConnector;
use klinegate_tq::TqConnector;
use klinegate_tushare::TushareConnector;

use crate::engine::CommandEngine;

/// Construct the connector selected by `cfg.vendor`.
///
/// # Errors
/// Propagates the connector's construction error (missing credentials file,
/// malformed endpoint).
pub fn connector_from_config(cfg: &ServiceConfig) -> Result<Arc<dyn VendorConnector>, KlineError> {
    let timeout = Duration::from_secs(cfg.http_timeout_secs);
    let c: Arc<dyn VendorConnector> = match cfg.vendor {
        VendorKind::Tushare => Arc::new(TushareConnector::from_config(&cfg.tushare, timeout)?),
        VendorKind::JoinQuant => Arc::new(JoinQuantConnector::from_config(&cfg.joinquant, timeout)?),
        VendorKind::Gm => Arc::new(GmConnector::from_config(&cfg.gm, timeout)?),
        VendorKind::Tq => Arc::new(TqConnector::from_config(&cfg.tq, timeout)?),
        other => {
            return Err(KlineError::InvalidParameter(format!(
                "vendor {other:?} has no connector"
            )));
        }
    };
    Ok(c)
}

/// The configured external engine, or the marker-free one.
///
/// # Errors
/// `Analysis` when `analysis.command` is present but empty.
pub fn engine_from_config(cfg: &ServiceConfig) -> Result<Arc<dyn AnalysisEngine>, KlineError> {
    match &cfg.analysis.command {
        Some(argv) => Ok(Arc::new(CommandEngine::from_argv(argv)?)),
        None => {
            tracing::warn!("no analysis.command configured; bars are served without markers");
            Ok(Arc::new(PlainEngine))
        }
    }
}
