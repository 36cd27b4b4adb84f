use crate::domain::model::{FeatureVector, JobId, JobRecord, OwnerId, StoredJob};
use crate::utils::error::Result;
use async_trait::async_trait;
use thiserror::Error;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictorError {
    #[error("feature schema mismatch: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("unexpected value for feature '{feature}': {reason}")]
    InvalidFeature { feature: String, reason: String },

    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

/// Pre-trained scoring capability. One score per input, aligned by position.
pub trait Predictor: Send + Sync {
    fn score(&self, candidates: &[FeatureVector]) -> std::result::Result<Vec<f64>, PredictorError>;
}

/// Append-only store of recommendation jobs, scoped by owner.
#[async_trait]
pub trait JobLedger: Send + Sync {
    async fn append(&self, record: JobRecord) -> Result<JobId>;

    /// `None` both for unknown ids and for jobs owned by someone else.
    async fn get(&self, id: JobId, owner: &OwnerId) -> Result<Option<StoredJob>>;

    /// Newest first.
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<StoredJob>>;
}
