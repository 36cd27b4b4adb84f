use crate::domain::model::{RankedRecommendation, Site, TOP_K};
use std::cmp::Ordering;

/// Order `candidates` by `scores` descending and keep the first `TOP_K`.
///
/// `scores[i]` belongs to `candidates[i]`. The sort is stable, so equal
/// scores keep their filtered order; there is no secondary key. Callers
/// pass finite scores only.
pub fn rank(candidates: &[&Site], scores: &[f64]) -> Vec<RankedRecommendation> {
    debug_assert_eq!(candidates.len(), scores.len());

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });
    order.truncate(TOP_K);

    order
        .into_iter()
        .enumerate()
        .map(|(position, index)| {
            let site = candidates[index];
            let site_code = site
                .site_code
                .clone()
                .unwrap_or_else(|| format!("SITE-{}", position));

            RankedRecommendation {
                rank: position + 1,
                site_code,
                predicted_score: scores[index],
                site: site.clone(),
            }
        })
        .collect()
}
