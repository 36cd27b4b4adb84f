use crate::domain::model::Site;
use crate::domain::ports::Storage;
use crate::utils::error::{Result, SiteError};
use std::collections::HashSet;

/// Immutable, in-memory collection of candidate sites.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

impl SiteRegistry {
    /// Load the registry CSV through `storage`.
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        tracing::info!("📂 Loading site registry from: {}", path);

        let bytes = storage
            .read_file(path)
            .await
            .map_err(|e| SiteError::RegistryUnavailable {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let registry = Self::from_csv_bytes(&bytes).map_err(|e| match e {
            SiteError::RegistryUnavailable { reason, .. } => SiteError::RegistryUnavailable {
                path: path.to_string(),
                reason,
            },
            other => other,
        })?;

        tracing::info!("✅ Registry loaded with {} sites", registry.len());
        Ok(registry)
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let mut sites = Vec::new();
        for (row, record) in reader.deserialize::<Site>().enumerate() {
            let site = record.map_err(|e| corrupt(format!("row {}: {}", row + 1, e)))?;
            sites.push(site);
        }

        Self::from_sites(sites)
    }

    /// Build a registry from already-parsed rows, checking row invariants.
    pub fn from_sites(sites: Vec<Site>) -> Result<Self> {
        let mut seen = HashSet::new();

        for (row, site) in sites.iter().enumerate() {
            if let Some(code) = &site.site_code {
                if !seen.insert(code.as_str()) {
                    return Err(corrupt(format!("duplicate Site_Code '{}'", code)));
                }
            }

            check_coordinate(row, "Latitude", site.latitude)?;
            check_coordinate(row, "Longitude", site.longitude)?;
            check_attribute(row, "Elevation_m", Some(site.elevation_m))?;
            check_attribute(row, "Slope_deg", site.slope_deg)?;
            check_attribute(row, "Dist_to_Road_km", Some(site.distance_to_road_km))?;
            check_attribute(row, "Pop_Density_sqkm", Some(site.population_density))?;
            check_attribute(row, "Land_Value_USD_sqm", Some(site.land_value_per_sqm))?;
            check_attribute(row, "Suitability_Score", site.suitability_score)?;
        }

        // Code-less rows are named `SITE-{position}` at ranking time.
        if sites.iter().any(|site| site.site_code.is_none()) {
            let synthetic = sites
                .iter()
                .filter_map(|site| site.site_code.as_deref())
                .find(|code| is_synthetic_code(code));
            if let Some(code) = synthetic {
                return Err(corrupt(format!(
                    "Site_Code '{}' collides with generated codes for rows without a Site_Code",
                    code
                )));
            }
        }

        Ok(Self { sites })
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

fn corrupt(reason: String) -> SiteError {
    SiteError::RegistryUnavailable {
        path: "<memory>".to_string(),
        reason,
    }
}

fn is_synthetic_code(code: &str) -> bool {
    code.strip_prefix("SITE-")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn check_coordinate(row: usize, column: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(corrupt(format!("row {}: {} is not finite", row + 1, column)));
    }
    Ok(())
}

fn check_attribute(row: usize, column: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(corrupt(format!(
            "row {}: {} must be a non-negative number (got {})",
            row + 1,
            column,
            v
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::LandUse;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const HEADER: &str = "UUID,Site_Code,State_Key,District,Latitude,Longitude,Land_Use,Elevation_m,Slope_deg,Dist_to_Road_km,Pop_Density_sqkm,Land_Value_USD_sqm,Suitability_Score";

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), data.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                SiteError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_parse_registry_csv() {
        let csv = format!(
            "{}\nA1,IN-PUN-1,MH,Pune,18.5,73.8,Industrial,560,4.2,2.5,1200,1480.5,71.5\nB2,IN-NAG-2,MH,Nagpur,21.1,79.0,Agricultural,310,,8.0,400,180,\n",
            HEADER
        );

        let registry = SiteRegistry::from_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(registry.len(), 2);
        let first = &registry.sites()[0];
        assert_eq!(first.site_code.as_deref(), Some("IN-PUN-1"));
        assert_eq!(first.land_use, LandUse::Industrial);
        assert_eq!(first.slope_deg, Some(4.2));

        let second = &registry.sites()[1];
        assert_eq!(second.slope_deg, None);
        assert_eq!(second.suitability_score, None);
    }

    #[test]
    fn test_registry_without_optional_columns() {
        let csv = "Latitude,Longitude,Land_Use,Elevation_m,Dist_to_Road_km,Pop_Density_sqkm,Land_Value_USD_sqm\n18.5,73.8,Commercial,560,2.5,1200,1480\n";

        let registry = SiteRegistry::from_csv_bytes(csv.as_bytes()).unwrap();

        let site = &registry.sites()[0];
        assert!(site.site_code.is_none());
        assert!(site.slope_deg.is_none());
        assert!(site.suitability_score.is_none());
    }

    #[test]
    fn test_duplicate_site_code_is_rejected() {
        let csv = format!(
            "{}\nA1,DUP,MH,Pune,18.5,73.8,Industrial,560,4.2,2.5,1200,1480,71.5\nB2,DUP,MH,Pune,18.6,73.9,Industrial,560,4.2,2.5,1200,1480,71.5\n",
            HEADER
        );

        let err = SiteRegistry::from_csv_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SiteError::RegistryUnavailable { .. }));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_generated_code_collision_is_rejected() {
        let csv = format!(
            "{}\nA1,,MH,Pune,18.5,73.8,Industrial,560,4.2,2.5,1200,1480,71.5\nB2,SITE-0,MH,Pune,18.6,73.9,Industrial,560,4.2,2.5,1200,1480,71.5\n",
            HEADER
        );

        let err = SiteRegistry::from_csv_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SiteError::RegistryUnavailable { .. }));
        assert!(err.to_string().contains("SITE-0"));
    }

    #[test]
    fn test_site_prefixed_codes_allowed_when_every_row_has_a_code() {
        let csv = format!(
            "{}\nA1,SITE-0,MH,Pune,18.5,73.8,Industrial,560,4.2,2.5,1200,1480,71.5\nB2,SITE-HQ,MH,Pune,18.6,73.9,Industrial,560,4.2,2.5,1200,1480,71.5\n",
            HEADER
        );

        assert_eq!(SiteRegistry::from_csv_bytes(csv.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn test_negative_attribute_is_rejected() {
        let csv = format!(
            "{}\nA1,IN-1,MH,Pune,18.5,73.8,Industrial,560,4.2,-2.5,1200,1480,71.5\n",
            HEADER
        );

        let err = SiteRegistry::from_csv_bytes(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Dist_to_Road_km"));
    }

    #[test]
    fn test_unknown_land_use_is_corrupt() {
        let csv = format!(
            "{}\nA1,IN-1,MH,Pune,18.5,73.8,Forest,560,4.2,2.5,1200,1480,71.5\n",
            HEADER
        );

        assert!(matches!(
            SiteRegistry::from_csv_bytes(csv.as_bytes()),
            Err(SiteError::RegistryUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_registry_unavailable() {
        let storage = MockStorage::with_file("other.csv", HEADER);

        let err = SiteRegistry::load(&storage, "sites.csv").await.unwrap_err();

        match err {
            SiteError::RegistryUnavailable { path, .. } => assert_eq!(path, "sites.csv"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_through_storage() {
        let csv = format!(
            "{}\nA1,IN-PUN-1,MH,Pune,18.5,73.8,Industrial,560,4.2,2.5,1200,1480.5,71.5\n",
            HEADER
        );
        let storage = MockStorage::with_file("sites.csv", &csv);

        let registry = SiteRegistry::load(&storage, "sites.csv").await.unwrap();
        assert_eq!(registry.len(), 1);
    }
}
