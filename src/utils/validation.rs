use crate::utils::error::{Result, SiteError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(SiteError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("Valid values: {}", allowed.join(", ")),
    })
}

/// Request-side check: a finite, non-negative limit.
pub fn validate_non_negative_limit(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(SiteError::InvalidRequirements {
            field: field_name.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(SiteError::InvalidRequirements {
            field: field_name.to_string(),
            reason: format!("must be >= 0 (got {})", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("registry.path", "data/sites.csv").is_ok());
        assert!(validate_path("registry.path", "").is_err());
        assert!(validate_path("registry.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_non_negative_limit() {
        assert!(validate_non_negative_limit("max_slope_deg", 0.0).is_ok());
        assert!(validate_non_negative_limit("max_slope_deg", 12.5).is_ok());
        assert!(validate_non_negative_limit("max_slope_deg", -1.0).is_err());
        assert!(validate_non_negative_limit("max_slope_deg", f64::NAN).is_err());
        assert!(validate_non_negative_limit("max_slope_deg", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("scoring.degraded_policy", "flag", &["flag", "reject"]).is_ok());
        assert!(validate_one_of("scoring.degraded_policy", "ignore", &["flag", "reject"]).is_err());
    }
}
