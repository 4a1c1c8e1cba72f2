//! Shared data transfer objects and configuration primitives for klinegate.
#![warn(missing_docs)]

mod asset;
mod bar;
mod capability;
mod config;
mod connector;
mod error;
mod frequency;
mod window;

pub use asset::AssetClass;
pub use bar::{AnnotatedBar, Bar, BarSequence, DT_FORMAT};
pub use capability::Capability;
pub use config::{
    AnalysisConfig, GmConfig, JoinQuantConfig, ServiceConfig, TqConfig, TushareConfig, VendorKind,
};
pub use connector::ConnectorKey;
pub use error::KlineError;
pub use frequency::Frequency;
pub use window::RequestWindow;
