use proptest::prelude::*;
use site_select::core::filter;
use site_select::domain::model::{FeatureValue, FeatureVector, Site, TOP_K};
use site_select::domain::ports::{Predictor, PredictorError};
use site_select::{
    AuthContext, DegradedPolicy, InMemoryJobLedger, LandUse, ProjectRequirements,
    RecommendationPipeline, SiteError, SiteRegistry, SiteSelectionEngine,
};
use std::sync::Arc;

/// Coarse scores so that ties are common.
struct BucketPredictor;

impl Predictor for BucketPredictor {
    fn score(&self, candidates: &[FeatureVector]) -> Result<Vec<f64>, PredictorError> {
        candidates
            .iter()
            .map(|fv| match fv.get("Elevation_m") {
                Some(FeatureValue::Number(e)) => Ok(((*e as i64) % 4) as f64),
                _ => Err(PredictorError::InferenceFailed("missing elevation".to_string())),
            })
            .collect()
    }
}

struct FailingPredictor;

impl Predictor for FailingPredictor {
    fn score(&self, _: &[FeatureVector]) -> Result<Vec<f64>, PredictorError> {
        Err(PredictorError::InferenceFailed("offline".to_string()))
    }
}

fn land_use() -> impl Strategy<Value = LandUse> {
    prop_oneof![
        Just(LandUse::Industrial),
        Just(LandUse::Commercial),
        Just(LandUse::Residential),
        Just(LandUse::Agricultural),
    ]
}

fn sites() -> impl Strategy<Value = Vec<Site>> {
    prop::collection::vec(
        (
            land_use(),
            0u32..40,
            prop::option::of(0u32..45),
            0u32..50,
            0u32..6000,
            prop::option::of(0u32..100),
            any::<bool>(),
        ),
        1..60,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (land_use, elevation, slope, road, value, baseline, has_code))| Site {
                uuid: Some(i.to_string()),
                site_code: has_code.then(|| format!("IN-{:04}", i)),
                state_key: None,
                district: None,
                latitude: 20.0,
                longitude: 78.0,
                land_use,
                elevation_m: elevation as f64,
                slope_deg: slope.map(f64::from),
                distance_to_road_km: road as f64,
                population_density: 1000.0,
                land_value_per_sqm: value as f64,
                suitability_score: baseline.map(f64::from),
            })
            .collect()
    })
}

fn requirements() -> impl Strategy<Value = ProjectRequirements> {
    (
        0u32..6000,
        0u32..50,
        0u32..45,
        prop::sample::subsequence(LandUse::ALL.to_vec(), 1..=4),
    )
        .prop_map(|(budget, road, slope, uses)| ProjectRequirements {
            title: "prop".to_string(),
            budget_limit_usd_per_sqm: budget as f64,
            max_road_dist_km: road as f64,
            max_slope_deg: slope as f64,
            environmental_risk_tolerance: 0.5,
            preferred_land_use: uses,
        })
}

fn pipeline(sites: Vec<Site>, predictor: Arc<dyn Predictor>) -> RecommendationPipeline {
    let registry = SiteRegistry::from_sites(sites).unwrap();
    RecommendationPipeline::new(Some(Arc::new(registry)), Some(predictor), DegradedPolicy::Flag)
}

fn filtered_position(filtered: &[&Site], site: &Site) -> usize {
    filtered
        .iter()
        .position(|candidate| candidate.uuid == site.uuid)
        .unwrap()
}

fn check_invariants(
    registry_sites: &[Site],
    req: &ProjectRequirements,
    predictor: Arc<dyn Predictor>,
    expect_degraded: bool,
) -> Result<(), TestCaseError> {
    let registry = SiteRegistry::from_sites(registry_sites.to_vec()).unwrap();
    let filtered = filter::filter(&registry, req);
    let result = pipeline(registry_sites.to_vec(), predictor).run(req);

    if filtered.is_empty() {
        prop_assert!(matches!(result, Err(SiteError::NoMatchingSites)));
        return Ok(());
    }
    let result = result.unwrap();
    let recs = &result.recommendations;

    prop_assert_eq!(result.is_degraded(), expect_degraded);
    prop_assert!(recs.len() <= TOP_K);
    prop_assert_eq!(recs.len(), filtered.len().min(TOP_K));

    for (i, rec) in recs.iter().enumerate() {
        let site = &rec.site;
        prop_assert_eq!(rec.rank, i + 1);
        prop_assert!(site.land_value_per_sqm <= req.budget_limit_usd_per_sqm);
        prop_assert!(site.distance_to_road_km <= req.max_road_dist_km);
        prop_assert!(req.preferred_land_use.contains(&site.land_use));
        if let Some(slope) = site.slope_deg {
            prop_assert!(slope <= req.max_slope_deg);
        }
        match &site.site_code {
            Some(code) => prop_assert_eq!(&rec.site_code, code),
            None => prop_assert_eq!(rec.site_code.clone(), format!("SITE-{}", i)),
        }
        if expect_degraded {
            prop_assert_eq!(rec.predicted_score, site.baseline_score());
        }
    }

    for pair in recs.windows(2) {
        prop_assert!(pair[0].predicted_score >= pair[1].predicted_score);
        if pair[0].predicted_score == pair[1].predicted_score {
            prop_assert!(
                filtered_position(&filtered, &pair[0].site)
                    < filtered_position(&filtered, &pair[1].site)
            );
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_model_ranking_invariants(sites in sites(), req in requirements()) {
        check_invariants(&sites, &req, Arc::new(BucketPredictor), false)?;
    }

    #[test]
    fn prop_degraded_ranking_invariants(sites in sites(), req in requirements()) {
        check_invariants(&sites, &req, Arc::new(FailingPredictor), true)?;
    }

    #[test]
    fn prop_replay_reproduces_original(sites in sites(), req in requirements()) {
        let engine = SiteSelectionEngine::new(
            pipeline(sites, Arc::new(BucketPredictor)),
            InMemoryJobLedger::new(),
        );
        let auth = AuthContext::new("u-7", "surveyor");

        let outcome = tokio_test::block_on(async {
            match engine.recommend(req, &auth).await {
                Ok(original) => {
                    let replay = engine.replay(original.job_id.unwrap(), &auth).await.unwrap();
                    Some((original, replay))
                }
                Err(SiteError::NoMatchingSites) => None,
                Err(e) => panic!("unexpected error: {}", e),
            }
        });

        if let Some((original, replay)) = outcome {
            prop_assert_eq!(replay.recommendations, original.recommendations);
            prop_assert_eq!(replay.degraded, original.degraded);
        }
    }
}
