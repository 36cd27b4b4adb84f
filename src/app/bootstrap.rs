use crate::adapters::predictor::LinearPredictor;
use crate::config::toml_config::TomlConfig;
use crate::core::pipeline::RecommendationPipeline;
use crate::core::registry::SiteRegistry;
use crate::domain::ports::{Predictor, Storage};
use crate::utils::error::{Result, SiteError};
use serde::Serialize;
use std::sync::Arc;

/// What startup managed to load. Failures are kept so operators can see them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StartupReport {
    pub registry_sites: Option<usize>,
    pub model_features: Option<usize>,
    pub errors: Vec<String>,
}

impl StartupReport {
    pub fn is_ready(&self) -> bool {
        self.registry_sites.is_some_and(|n| n > 0) && self.model_features.is_some()
    }

    pub fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        let message = if self.errors.is_empty() {
            "site registry is empty".to_string()
        } else {
            self.errors.join("; ")
        };
        Err(SiteError::ServiceUnready { message })
    }
}

/// Load the registry and model once. A load failure does not abort startup:
/// the pipeline is built without that piece and answers `ServiceUnready`.
pub async fn load_pipeline<S: Storage>(
    storage: &S,
    config: &TomlConfig,
) -> (RecommendationPipeline, StartupReport) {
    let mut report = StartupReport::default();

    let registry = match SiteRegistry::load(storage, &config.registry.path).await {
        Ok(registry) => {
            report.registry_sites = Some(registry.len());
            Some(Arc::new(registry))
        }
        Err(e) => {
            record_failure(&mut report, e);
            None
        }
    };

    let predictor: Option<Arc<dyn Predictor>> =
        match LinearPredictor::load(storage, &config.model.path).await {
            Ok(model) => {
                report.model_features = Some(model.features.len());
                Some(Arc::new(model))
            }
            Err(e) => {
                record_failure(&mut report, e);
                None
            }
        };

    let pipeline = RecommendationPipeline::new(registry, predictor, config.degraded_policy());
    (pipeline, report)
}

fn record_failure(report: &mut StartupReport, e: SiteError) {
    tracing::error!("❌ Load error: {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    report.errors.push(e.to_string());
}
