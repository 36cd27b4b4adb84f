pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{
    ledger::{FileJobLedger, InMemoryJobLedger},
    predictor::LinearPredictor,
    storage::LocalStorage,
};
pub use config::TomlConfig;
pub use core::{
    engine::{JobSummary, RecommendResponse, RecommendationSummary, ReplayResponse, SiteSelectionEngine},
    pipeline::{DegradedPolicy, RecommendationPipeline},
    registry::SiteRegistry,
};
pub use domain::model::{AuthContext, JobId, LandUse, OwnerId, ProjectRequirements};
pub use utils::error::{Result, SiteError};
