//! File-backed linear scoring model.
//!
//! The model file is JSON produced by the offline training job:
//!
//! ```json
//! {
//!   "intercept": 12.5,
//!   "features": [
//!     { "kind": "categorical", "name": "Land_Use", "levels": { "Industrial": 4.0 } },
//!     { "kind": "numeric", "name": "Elevation_m", "weight": -0.006, "impute": 480.0 }
//!   ]
//! }
//! ```
//!
//! `features` lists the schema in feature-vector order. Missing numeric inputs
//! use the `impute` value; unseen categorical levels contribute nothing.

use crate::domain::model::{FeatureValue, FeatureVector};
use crate::domain::ports::{Predictor, PredictorError, Storage};
use crate::utils::error::{Result, SiteError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureSpec {
    Numeric {
        name: String,
        weight: f64,
        impute: f64,
    },
    Categorical {
        name: String,
        levels: BTreeMap<String, f64>,
    },
}

impl FeatureSpec {
    pub fn name(&self) -> &str {
        match self {
            FeatureSpec::Numeric { name, .. } | FeatureSpec::Categorical { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPredictor {
    pub intercept: f64,
    pub features: Vec<FeatureSpec>,
}

impl LinearPredictor {
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        tracing::info!("🧠 Loading scoring model from: {}", path);

        let bytes = storage
            .read_file(path)
            .await
            .map_err(|e| SiteError::ModelUnavailable {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let model = Self::from_json_bytes(&bytes).map_err(|e| SiteError::ModelUnavailable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!("✅ Model loaded with {} features", model.features.len());
        Ok(model)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        // serde_json has no NaN/Inf literals and rejects out-of-range numbers,
        // so every parsed weight is finite.
        let model: LinearPredictor = serde_json::from_slice(bytes)?;
        Ok(model)
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name().to_string()).collect()
    }

    fn check_schema(&self, vector: &FeatureVector) -> std::result::Result<(), PredictorError> {
        let schema_matches = vector.columns.len() == self.features.len()
            && vector
                .names()
                .zip(self.features.iter())
                .all(|(column, spec)| column == spec.name());

        if schema_matches {
            return Ok(());
        }
        Err(PredictorError::SchemaMismatch {
            expected: self.feature_names(),
            actual: vector.names().map(str::to_string).collect(),
        })
    }

    fn predict_one(&self, vector: &FeatureVector) -> std::result::Result<f64, PredictorError> {
        self.check_schema(vector)?;

        let mut total = self.intercept;
        for (spec, (_, value)) in self.features.iter().zip(vector.columns.iter()) {
            total += match (spec, value) {
                (FeatureSpec::Numeric { weight, .. }, FeatureValue::Number(x)) => weight * x,
                (FeatureSpec::Numeric { weight, impute, .. }, FeatureValue::Missing) => {
                    weight * impute
                }
                (FeatureSpec::Categorical { levels, .. }, FeatureValue::Category(level)) => {
                    levels.get(level).copied().unwrap_or(0.0)
                }
                (FeatureSpec::Categorical { .. }, FeatureValue::Missing) => 0.0,
                (spec, other) => {
                    return Err(PredictorError::InvalidFeature {
                        feature: spec.name().to_string(),
                        reason: format!("unexpected value {:?}", other),
                    })
                }
            };
        }
        Ok(total)
    }
}

impl Predictor for LinearPredictor {
    fn score(&self, candidates: &[FeatureVector]) -> std::result::Result<Vec<f64>, PredictorError> {
        candidates.iter().map(|fv| self.predict_one(fv)).collect()
    }
}
