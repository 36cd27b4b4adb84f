use crate::core::pipeline::RecommendationPipeline;
use crate::domain::model::{
    AuthContext, JobId, JobRecord, ProjectRequirements, RankedRecommendation, RecommendationSet,
    ScoringMode, StoredJob,
};
use crate::domain::ports::JobLedger;
use crate::utils::error::{Result, SiteError};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate figures for one run, independent of whether it was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub result_count: usize,
    pub top_score: f64,
    /// Sites that passed the hard constraints before truncation.
    pub candidate_count: usize,
}

impl From<&RecommendationSet> for RecommendationSummary {
    fn from(result: &RecommendationSet) -> Self {
        Self {
            result_count: result.recommendations.len(),
            top_score: result.top_score(),
            candidate_count: result.candidate_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub recommendations: Vec<RankedRecommendation>,
    pub summary: RecommendationSummary,
    pub degraded: bool,
    /// `None` when the job could not be recorded.
    pub job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResponse {
    pub job_id: JobId,
    /// When the job was originally run.
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub recommendations: Vec<RankedRecommendation>,
    pub summary: RecommendationSummary,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub requirements: ProjectRequirements,
    pub result_count: usize,
    pub top_score: f64,
}

impl From<StoredJob> for JobSummary {
    fn from(job: StoredJob) -> Self {
        let title = if job.record.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            job.record.title
        };
        Self {
            id: job.id,
            title,
            timestamp: job.record.timestamp,
            requirements: job.record.requirements,
            result_count: job.record.result_count,
            top_score: job.record.top_score,
        }
    }
}

/// Caller-facing operations: fresh recommendations, replay and history.
pub struct SiteSelectionEngine<L: JobLedger> {
    pipeline: RecommendationPipeline,
    ledger: L,
}

impl<L: JobLedger> SiteSelectionEngine<L> {
    pub fn new(pipeline: RecommendationPipeline, ledger: L) -> Self {
        Self { pipeline, ledger }
    }

    pub fn pipeline(&self) -> &RecommendationPipeline {
        &self.pipeline
    }

    pub async fn recommend(
        &self,
        requirements: ProjectRequirements,
        auth: &AuthContext,
    ) -> Result<RecommendResponse> {
        requirements.validate()?;

        tracing::info!(
            "🔎 Recommendation request '{}' from {}",
            requirements.title,
            auth.username
        );
        let result = self.pipeline.run(&requirements).map_err(|e| log_failure(e, "recommend"))?;

        let timestamp = Utc::now();
        let record = JobRecord::from_run(auth, &requirements, &result, timestamp);

        let mut warnings = Vec::new();
        let job_id = match self.ledger.append(record).await {
            Ok(id) => {
                tracing::debug!("Recorded job {} for {}", id, auth.owner);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("⚠️ Job not recorded, serving results anyway: {}", e);
                warnings.push(e.to_string());
                None
            }
        };

        if let ScoringMode::Degraded { reason } = &result.scoring {
            warnings.push(format!("Prediction degraded: {}", reason));
        }

        let summary = RecommendationSummary::from(&result);
        tracing::info!(
            "✅ Returned {} of {} candidates (top score {:.2})",
            summary.result_count,
            summary.candidate_count,
            summary.top_score
        );

        Ok(RecommendResponse {
            timestamp,
            user: auth.username.clone(),
            summary,
            degraded: result.is_degraded(),
            recommendations: result.recommendations,
            job_id,
            warnings,
        })
    }

    /// Recompute a past job's recommendations from its stored requirements.
    pub async fn replay(&self, job_id: JobId, auth: &AuthContext) -> Result<ReplayResponse> {
        let job = self
            .ledger
            .get(job_id, &auth.owner)
            .await?
            .ok_or(SiteError::JobNotFound)
            .map_err(|e| log_failure(e, "replay"))?;

        tracing::info!("🔁 Replaying job {} ('{}')", job.id, job.record.title);
        let result = self
            .pipeline
            .run(&job.record.requirements)
            .map_err(|e| log_failure(e, "replay"))?;

        Ok(ReplayResponse {
            job_id: job.id,
            timestamp: job.record.timestamp,
            user: job.record.username,
            summary: RecommendationSummary::from(&result),
            degraded: result.is_degraded(),
            recommendations: result.recommendations,
        })
    }

    pub async fn history(&self, auth: &AuthContext) -> Result<Vec<JobSummary>> {
        let jobs = self.ledger.list_by_owner(&auth.owner).await?;
        Ok(jobs.into_iter().map(JobSummary::from).collect())
    }
}

fn log_failure(e: SiteError, operation: &str) -> SiteError {
    if e.is_operational() {
        tracing::error!("❌ {} failed: {} ({})", operation, e, e.error_code());
    } else {
        tracing::info!("{} ended without results: {}", operation, e);
    }
    e
}
