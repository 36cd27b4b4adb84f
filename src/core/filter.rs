use crate::core::registry::SiteRegistry;
use crate::domain::model::{ProjectRequirements, Site};
use crate::utils::error::{Result, SiteError};
use crate::utils::validation::{validate_non_negative_limit, Validate};

/// Hard-constraint predicate for a single site.
pub fn matches(site: &Site, req: &ProjectRequirements) -> bool {
    let within_budget = site.land_value_per_sqm <= req.budget_limit_usd_per_sqm;
    let near_road = site.distance_to_road_km <= req.max_road_dist_km;
    let preferred_use = req.preferred_land_use.contains(&site.land_use);
    // Sites without a slope reading are not rejected on slope.
    let gentle_enough = site
        .slope_deg
        .map(|slope| slope <= req.max_slope_deg)
        .unwrap_or(true);

    within_budget && near_road && preferred_use && gentle_enough
}

/// Sites satisfying every constraint, in registry order.
pub fn filter<'a>(registry: &'a SiteRegistry, req: &ProjectRequirements) -> Vec<&'a Site> {
    registry
        .sites()
        .iter()
        .filter(|site| matches(site, req))
        .collect()
}

impl Validate for ProjectRequirements {
    fn validate(&self) -> Result<()> {
        validate_non_negative_limit("budget_limit_usd_sqm", self.budget_limit_usd_per_sqm)?;
        validate_non_negative_limit("max_road_dist_km", self.max_road_dist_km)?;
        validate_non_negative_limit("max_slope_deg", self.max_slope_deg)?;

        if self.preferred_land_use.is_empty() {
            return Err(SiteError::InvalidRequirements {
                field: "preferred_land_use".to_string(),
                reason: "must name at least one land use".to_string(),
            });
        }

        Ok(())
    }
}
