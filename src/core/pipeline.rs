use crate::core::filter;
use crate::core::ranker;
use crate::core::registry::SiteRegistry;
use crate::domain::model::{FeatureVector, ProjectRequirements, RecommendationSet, ScoringMode, Site};
use crate::domain::ports::{Predictor, PredictorError};
use crate::utils::error::{Result, SiteError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to do when the predictor cannot score a candidate set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegradedPolicy {
    /// Fall back to baseline scores and tag the result.
    #[default]
    Flag,
    /// Fail the request with `PredictionDegraded`.
    Reject,
}

impl DegradedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradedPolicy::Flag => "flag",
            DegradedPolicy::Reject => "reject",
        }
    }
}

/// Filter → score → rank over shared, read-only state.
///
/// The pipeline does not know whether a request is live or replayed; the same
/// requirements against the same registry and predictor always produce the
/// same ranked output.
#[derive(Clone)]
pub struct RecommendationPipeline {
    registry: Option<Arc<SiteRegistry>>,
    predictor: Option<Arc<dyn Predictor>>,
    policy: DegradedPolicy,
}

impl RecommendationPipeline {
    pub fn new(
        registry: Option<Arc<SiteRegistry>>,
        predictor: Option<Arc<dyn Predictor>>,
        policy: DegradedPolicy,
    ) -> Self {
        Self {
            registry,
            predictor,
            policy,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready().is_ok()
    }

    pub fn registry(&self) -> Option<&SiteRegistry> {
        self.registry.as_deref()
    }

    fn ready(&self) -> Result<(&SiteRegistry, &dyn Predictor)> {
        let registry = match self.registry.as_deref() {
            Some(registry) if !registry.is_empty() => registry,
            Some(_) => {
                return Err(SiteError::ServiceUnready {
                    message: "site registry is empty".to_string(),
                })
            }
            None => {
                return Err(SiteError::ServiceUnready {
                    message: "site registry not loaded".to_string(),
                })
            }
        };
        let predictor = self
            .predictor
            .as_deref()
            .ok_or_else(|| SiteError::ServiceUnready {
                message: "scoring model not loaded".to_string(),
            })?;
        Ok((registry, predictor))
    }

    pub fn run(&self, requirements: &ProjectRequirements) -> Result<RecommendationSet> {
        let (registry, predictor) = self.ready()?;

        let candidates = filter::filter(registry, requirements);
        tracing::debug!(
            "Filtered {} of {} sites for '{}'",
            candidates.len(),
            registry.len(),
            requirements.title
        );
        if candidates.is_empty() {
            return Err(SiteError::NoMatchingSites);
        }

        let (scores, scoring) = score_candidates(predictor, &candidates);
        if let ScoringMode::Degraded { reason } = &scoring {
            tracing::warn!("⚠️ Predictor failed, using baseline scores: {}", reason);
            if self.policy == DegradedPolicy::Reject {
                return Err(SiteError::PredictionDegraded {
                    reason: reason.clone(),
                });
            }
        }

        let recommendations = ranker::rank(&candidates, &scores);

        Ok(RecommendationSet {
            recommendations,
            candidate_count: candidates.len(),
            scoring,
        })
    }
}

/// Score with the predictor, falling back to each site's baseline score on any failure.
fn score_candidates(predictor: &dyn Predictor, candidates: &[&Site]) -> (Vec<f64>, ScoringMode) {
    let features: Vec<FeatureVector> = candidates.iter().map(|s| s.feature_vector()).collect();

    match predictor.score(&features).and_then(|scores| check_scores(scores, features.len())) {
        Ok(scores) => (scores, ScoringMode::Model),
        Err(e) => {
            let fallback = candidates.iter().map(|s| s.baseline_score()).collect();
            (
                fallback,
                ScoringMode::Degraded {
                    reason: e.to_string(),
                },
            )
        }
    }
}

fn check_scores(scores: Vec<f64>, expected: usize) -> std::result::Result<Vec<f64>, PredictorError> {
    if scores.len() != expected {
        return Err(PredictorError::InferenceFailed(format!(
            "predictor returned {} scores for {} candidates",
            scores.len(),
            expected
        )));
    }
    if let Some(position) = scores.iter().position(|s| !s.is_finite()) {
        return Err(PredictorError::InferenceFailed(format!(
            "non-finite score at position {}",
            position
        )));
    }
    Ok(scores)
}
