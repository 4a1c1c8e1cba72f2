//! klinegate serves candlestick bars from Chinese market-data vendors to a
//! charting front-end.
//!
//! Overview
//! - One vendor connector per process, picked from configuration.
//! - A `/kline` request resolves a frequency and trade date into a vendor
//!   window, fetches raw rows, normalizes them into a canonical bar sequence,
//!   runs the analysis engine and renders fixed 10-column rows.
//! - `/basic` returns instrument metadata where the vendor offers it.
//! - Every other path serves the front-end bundle.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use klinegate::{AppState, Kline, KlineQuery, router};
//! use klinegate_tushare::TushareConnector;
//!
//! let kline = Kline::builder()
//!     .with_connector(Arc::new(TushareConnector::from_config(&cfg.tushare, timeout)?))
//!     .bar_count(5000)
//!     .build()?;
//! let app = router(Arc::new(AppState { kline, web_root: "web".into() }));
//! ```
#![warn(missing_docs)]

pub mod bridge;
pub(crate) mod core;
mod engine;
pub mod http;
mod vendors;

pub use crate::core::{BasicQuery, Kline, KlineBuilder, KlineQuery};
pub use engine::CommandEngine;
pub use http::{AppState, router};
pub use vendors::{connector_from_config, engine_from_config};

pub use klinegate_core::{KlineError, ServiceConfig, VendorConnector, VendorKind};
