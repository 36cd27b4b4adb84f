pub mod engine;
pub mod filter;
pub mod pipeline;
pub mod ranker;
pub mod registry;

pub use crate::domain::model::{ProjectRequirements, RankedRecommendation, RecommendationSet, Site};
pub use crate::domain::ports::{JobLedger, Predictor, Storage};
pub use crate::utils::error::Result;
