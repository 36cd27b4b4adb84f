use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum number of recommendations returned for one request.
pub const TOP_K: usize = 20;

/// Registry columns that never reach the predictor: identity, administrative
/// keys, raw coordinates and the baseline label.
pub const NON_FEATURE_COLUMNS: [&str; 7] = [
    "UUID",
    "Site_Code",
    "State_Key",
    "District",
    "Suitability_Score",
    "Latitude",
    "Longitude",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LandUse {
    Industrial,
    Commercial,
    Residential,
    Agricultural,
}

impl LandUse {
    pub const ALL: [LandUse; 4] = [
        LandUse::Industrial,
        LandUse::Commercial,
        LandUse::Residential,
        LandUse::Agricultural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LandUse::Industrial => "Industrial",
            LandUse::Commercial => "Commercial",
            LandUse::Residential => "Residential",
            LandUse::Agricultural => "Agricultural",
        }
    }
}

impl fmt::Display for LandUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registry row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(rename = "UUID", default)]
    pub uuid: Option<String>,
    #[serde(rename = "Site_Code", default)]
    pub site_code: Option<String>,
    #[serde(rename = "State_Key", default)]
    pub state_key: Option<String>,
    #[serde(rename = "District", default)]
    pub district: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Land_Use")]
    pub land_use: LandUse,
    #[serde(rename = "Elevation_m")]
    pub elevation_m: f64,
    #[serde(rename = "Slope_deg", default)]
    pub slope_deg: Option<f64>,
    #[serde(rename = "Dist_to_Road_km")]
    pub distance_to_road_km: f64,
    #[serde(rename = "Pop_Density_sqkm")]
    pub population_density: f64,
    #[serde(rename = "Land_Value_USD_sqm")]
    pub land_value_per_sqm: f64,
    #[serde(rename = "Suitability_Score", default)]
    pub suitability_score: Option<f64>,
}

impl Site {
    /// Every column of the row in registry header order.
    pub fn columns(&self) -> Vec<(&'static str, FeatureValue)> {
        vec![
            ("UUID", FeatureValue::from_text(self.uuid.as_deref())),
            ("Site_Code", FeatureValue::from_text(self.site_code.as_deref())),
            ("State_Key", FeatureValue::from_text(self.state_key.as_deref())),
            ("District", FeatureValue::from_text(self.district.as_deref())),
            ("Latitude", FeatureValue::Number(self.latitude)),
            ("Longitude", FeatureValue::Number(self.longitude)),
            ("Land_Use", FeatureValue::Category(self.land_use.as_str().to_string())),
            ("Elevation_m", FeatureValue::Number(self.elevation_m)),
            ("Slope_deg", FeatureValue::from_number(self.slope_deg)),
            ("Dist_to_Road_km", FeatureValue::Number(self.distance_to_road_km)),
            ("Pop_Density_sqkm", FeatureValue::Number(self.population_density)),
            ("Land_Value_USD_sqm", FeatureValue::Number(self.land_value_per_sqm)),
            ("Suitability_Score", FeatureValue::from_number(self.suitability_score)),
        ]
    }

    /// The row with `NON_FEATURE_COLUMNS` stripped.
    pub fn feature_vector(&self) -> FeatureVector {
        let columns = self
            .columns()
            .into_iter()
            .filter(|(name, _)| !NON_FEATURE_COLUMNS.contains(name))
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        FeatureVector { columns }
    }

    /// Fallback score used when the predictor cannot be trusted.
    pub fn baseline_score(&self) -> f64 {
        self.suitability_score.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
    Missing,
}

impl FeatureValue {
    fn from_text(value: Option<&str>) -> Self {
        match value {
            Some(text) => FeatureValue::Category(text.to_string()),
            None => FeatureValue::Missing,
        }
    }

    fn from_number(value: Option<f64>) -> Self {
        value.map(FeatureValue::Number).unwrap_or(FeatureValue::Missing)
    }
}

/// Ordered predictor input for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub columns: Vec<(String, FeatureValue)>,
}

impl FeatureVector {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }
}

/// A request's hard constraints. Stored verbatim on the job for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRequirements {
    pub title: String,
    #[serde(rename = "budget_limit_usd_sqm")]
    pub budget_limit_usd_per_sqm: f64,
    pub max_road_dist_km: f64,
    pub max_slope_deg: f64,
    pub environmental_risk_tolerance: f64,
    pub preferred_land_use: Vec<LandUse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub rank: usize,
    /// Registry code, or `SITE-{position}` when the row carries none.
    pub site_code: String,
    pub predicted_score: f64,
    pub site: Site,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScoringMode {
    Model,
    Degraded { reason: String },
}

impl ScoringMode {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ScoringMode::Degraded { .. })
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<RankedRecommendation>,
    pub candidate_count: usize,
    pub scoring: ScoringMode,
}

impl RecommendationSet {
    pub fn top_score(&self) -> f64 {
        self.recommendations
            .first()
            .map(|r| r.predicted_score)
            .unwrap_or(0.0)
    }

    pub fn is_degraded(&self) -> bool {
        self.scoring.is_degraded()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity resolved by the caller's auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub owner: OwnerId,
    pub username: String,
}

impl AuthContext {
    pub fn new(owner: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            owner: OwnerId::new(owner),
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(JobId)
    }
}

/// One persisted recommendation request. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub owner: OwnerId,
    pub username: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub requirements: ProjectRequirements,
    pub result_count: usize,
    pub top_score: f64,
}

impl JobRecord {
    pub fn from_run(
        auth: &AuthContext,
        requirements: &ProjectRequirements,
        result: &RecommendationSet,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            owner: auth.owner.clone(),
            username: auth.username.clone(),
            title: requirements.title.clone(),
            timestamp,
            requirements: requirements.clone(),
            result_count: result.recommendations.len(),
            top_score: result.top_score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredJob {
    pub id: JobId,
    #[serde(flatten)]
    pub record: JobRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_site() -> Site {
        Site {
            uuid: Some("A1B2C3D4".to_string()),
            site_code: Some("IN-PUN-0001".to_string()),
            state_key: Some("MH".to_string()),
            district: Some("Pune".to_string()),
            latitude: 18.52,
            longitude: 73.85,
            land_use: LandUse::Industrial,
            elevation_m: 560.0,
            slope_deg: Some(4.2),
            distance_to_road_km: 2.5,
            population_density: 1200.0,
            land_value_per_sqm: 1480.0,
            suitability_score: Some(71.5),
        }
    }

    #[test]
    fn test_feature_vector_strips_non_feature_columns() {
        let features = sample_site().feature_vector();
        let names: Vec<&str> = features.names().collect();

        assert_eq!(
            names,
            vec![
                "Land_Use",
                "Elevation_m",
                "Slope_deg",
                "Dist_to_Road_km",
                "Pop_Density_sqkm",
                "Land_Value_USD_sqm",
            ]
        );
        for column in NON_FEATURE_COLUMNS {
            assert!(features.get(column).is_none(), "{} leaked", column);
        }
    }

    #[test]
    fn test_missing_slope_is_missing_feature() {
        let mut site = sample_site();
        site.slope_deg = None;
        assert_eq!(
            site.feature_vector().get("Slope_deg"),
            Some(&FeatureValue::Missing)
        );
    }

    #[test]
    fn test_baseline_score_defaults_to_zero() {
        let mut site = sample_site();
        assert_eq!(site.baseline_score(), 71.5);
        site.suitability_score = None;
        assert_eq!(site.baseline_score(), 0.0);
    }

    #[test]
    fn test_requirements_use_request_field_names() {
        let json = serde_json::json!({
            "title": "Test Project Alpha",
            "budget_limit_usd_sqm": 5000.0,
            "max_road_dist_km": 50.0,
            "max_slope_deg": 30.0,
            "environmental_risk_tolerance": 1.0,
            "preferred_land_use": ["Industrial", "Commercial"]
        });

        let req: ProjectRequirements = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(req.budget_limit_usd_per_sqm, 5000.0);
        assert_eq!(
            req.preferred_land_use,
            vec![LandUse::Industrial, LandUse::Commercial]
        );
        assert_eq!(serde_json::to_value(&req).unwrap(), json);
    }

    #[test]
    fn test_job_id_round_trips_through_display() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
