use crate::domain::geo::ProximityRules;
use crate::domain::model::Dataset;
use crate::domain::region::RegionFilter;
use crate::domain::sample::SampleSpec;
use crate::utils::error::{AccessError, Result};
use crate::utils::validation::{self, Validate};
use crate::visualization::chart::{MIN_CHART_HEIGHT, MIN_CHART_WIDTH};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const API_KEY_ENV: &str = "PUBLIC_DATA_API_KEY";
pub const DEFAULT_CONFIG_FILE: &str = "access-config.toml";

const PORTAL_BASE_URL: &str = "https://api.data.go.kr/openapi";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub api: ApiConfig,
    pub sources: SourcesConfig,
    pub region: RegionConfig,
    pub analysis: AnalysisConfig,
    pub visualization: VisualizationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiFailurePolicy {
    UseSampleData,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub service_key: Option<String>,
    pub page_size: usize,
    pub max_pages: usize,
    pub timeout_seconds: u64,
    pub retry_count: u32,
    pub retry_delay_seconds: u64,
    pub on_api_failure: ApiFailurePolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_key: None,
            page_size: 1000,
            max_pages: 10,
            timeout_seconds: 30,
            retry_count: 3,
            retry_delay_seconds: 1,
            on_api_failure: ApiFailurePolicy::UseSampleData,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub parameters: Option<HashMap<String, String>>,
    /// UTF-8 CSV export read instead of calling the API.
    pub local_file: Option<String>,
    pub field_aliases: HashMap<String, Vec<String>>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            parameters: None,
            local_file: None,
            field_aliases: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub charging_station: SourceConfig,
    pub walkway: SourceConfig,
    pub disability_facilities: SourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub name: String,
    pub short_name: String,
    pub districts: Vec<String>,
    pub rural_districts: Vec<String>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        let districts = [
            "중구", "동구", "서구", "남구", "북구", "수성구", "달서구", "달성군", "군위군",
        ];
        Self {
            name: "대구광역시".to_string(),
            short_name: "대구".to_string(),
            districts: districts.iter().map(|d| d.to_string()).collect(),
            rural_districts: vec!["달성군".to_string(), "군위군".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub proximity_threshold_m: f64,
    pub score_distance_cutoff_m: f64,
    pub min_accessible_width_m: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: 300.0,
            score_distance_cutoff_m: 1000.0,
            min_accessible_width_m: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// [lat, lon]
    pub map_center: [f64; 2],
    pub map_zoom: u8,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            map_center: [35.8714, 128.6014],
            map_zoom: 12,
            chart_width: 1500,
            chart_height: 1200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: String,
    pub results_dir: String,
    pub archive: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            results_dir: "results".to_string(),
            archive: false,
        }
    }
}

impl AccessConfig {
    /// Loads a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Reads `path` when it exists, otherwise starts from the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)?
        } else {
            tracing::debug!("{} not found, using defaults", path.display());
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AccessError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value, leaving unknown variables untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AccessError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Falls back to `PUBLIC_DATA_API_KEY` when the file does not provide a usable key.
    pub fn apply_env(&mut self) {
        let usable = self
            .api
            .service_key
            .as_deref()
            .map(|k| !k.trim().is_empty() && !k.starts_with("${"))
            .unwrap_or(false);

        if !usable {
            self.api.service_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
    }

    pub fn service_key(&self) -> Result<&str> {
        validation::validate_required_field("api.service_key", &self.api.service_key)
            .map(|k| k.as_str())
    }

    pub fn source(&self, dataset: Dataset) -> &SourceConfig {
        match dataset {
            Dataset::ChargingStation => &self.sources.charging_station,
            Dataset::Walkway => &self.sources.walkway,
            Dataset::DisabilityFacilities => &self.sources.disability_facilities,
        }
    }

    pub fn endpoint(&self, dataset: Dataset) -> String {
        self.source(dataset).endpoint.clone().unwrap_or_else(|| {
            let path = match dataset {
                Dataset::ChargingStation => "tn_pubr_public_electr_whlchairhgh_spdchrgr_api",
                Dataset::Walkway => "walkway-api",
                Dataset::DisabilityFacilities => "disability-facilities-api",
            };
            format!("{}/{}", PORTAL_BASE_URL, path)
        })
    }

    /// Extra query parameters; the walkway and facility APIs filter by region server-side.
    pub fn parameters(&self, dataset: Dataset) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = match &self.source(dataset).parameters {
            Some(configured) => configured
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => match dataset {
                Dataset::ChargingStation => Vec::new(),
                Dataset::Walkway | Dataset::DisabilityFacilities => {
                    vec![("region".to_string(), self.region.name.clone())]
                }
            },
        };
        params.sort();
        params
    }

    pub fn region_filter(&self) -> Result<RegionFilter> {
        RegionFilter::new(
            &self.region.name,
            &self.region.short_name,
            &self.region.districts,
        )
    }

    pub fn proximity_rules(&self) -> ProximityRules {
        ProximityRules {
            proximity_threshold_m: self.analysis.proximity_threshold_m,
            score_distance_cutoff_m: self.analysis.score_distance_cutoff_m,
        }
    }

    pub fn map_center(&self) -> (f64, f64) {
        (
            self.visualization.map_center[0],
            self.visualization.map_center[1],
        )
    }

    pub fn sample_spec(&self, collected_on: &str) -> SampleSpec {
        SampleSpec {
            region_name: self.region.name.clone(),
            districts: self.region.districts.clone(),
            center: self.map_center(),
            collected_on: collected_on.to_string(),
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        for dataset in Dataset::ALL {
            let source = self.source(dataset);
            if !source.enabled {
                continue;
            }
            let field = format!("sources.{}", dataset.key());
            match &source.local_file {
                Some(file) => {
                    validation::validate_path(&format!("{}.local_file", field), file)?;
                    validation::validate_file_extensions(
                        &format!("{}.local_file", field),
                        std::slice::from_ref(file),
                        &["csv"],
                    )?;
                }
                None => {
                    validation::validate_url(&format!("{}.endpoint", field), &self.endpoint(dataset))?
                }
            }
        }

        validation::validate_positive_number("api.page_size", self.api.page_size, 1)?;
        validation::validate_positive_number("api.max_pages", self.api.max_pages, 1)?;
        validation::validate_positive_number(
            "api.timeout_seconds",
            self.api.timeout_seconds as usize,
            1,
        )?;

        validation::validate_non_empty_string("region.name", &self.region.name)?;
        if self.region.districts.is_empty() {
            return Err(AccessError::InvalidConfigValueError {
                field: "region.districts".to_string(),
                value: "[]".to_string(),
                reason: "At least one district is required".to_string(),
            });
        }

        validation::validate_range(
            "analysis.proximity_threshold_m",
            self.analysis.proximity_threshold_m,
            1.0,
            10_000.0,
        )?;
        validation::validate_range(
            "analysis.score_distance_cutoff_m",
            self.analysis.score_distance_cutoff_m,
            1.0,
            50_000.0,
        )?;
        validation::validate_range(
            "visualization.map_center.lat",
            self.visualization.map_center[0],
            -90.0,
            90.0,
        )?;
        validation::validate_range(
            "visualization.map_center.lon",
            self.visualization.map_center[1],
            -180.0,
            180.0,
        )?;
        validation::validate_range("visualization.map_zoom", self.visualization.map_zoom, 1, 19)?;
        validation::validate_range(
            "visualization.chart_width",
            self.visualization.chart_width,
            MIN_CHART_WIDTH,
            8000,
        )?;
        validation::validate_range(
            "visualization.chart_height",
            self.visualization.chart_height,
            MIN_CHART_HEIGHT,
            8000,
        )?;

        validation::validate_path("output.data_dir", &self.output.data_dir)?;
        validation::validate_path("output.results_dir", &self.output.results_dir)?;

        Ok(())
    }
}

impl Validate for AccessConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = AccessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.page_size, 1000);
        assert_eq!(config.region.districts.len(), 9);
        assert_eq!(
            config.endpoint(Dataset::ChargingStation),
            "https://api.data.go.kr/openapi/tn_pubr_public_electr_whlchairhgh_spdchrgr_api"
        );
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_content = r#"
[api]
service_key = "abc"
page_size = 100

[sources.walkway]
endpoint = "http://localhost:9000/walkways"

[output]
results_dir = "./out"
"#;

        let config = AccessConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.service_key().unwrap(), "abc");
        assert_eq!(config.api.page_size, 100);
        assert_eq!(config.api.max_pages, 10);
        assert_eq!(config.endpoint(Dataset::Walkway), "http://localhost:9000/walkways");
        assert_eq!(
            config.parameters(Dataset::Walkway),
            vec![("region".to_string(), "대구광역시".to_string())]
        );
        assert!(config.parameters(Dataset::ChargingStation).is_empty());
        assert_eq!(config.output.results_dir, "./out");
        assert_eq!(config.output.data_dir, "data");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DAEGU_ACCESS_TEST_ENDPOINT", "https://test.api.com/chargers");

        let toml_content = r#"
[sources.charging_station]
endpoint = "${DAEGU_ACCESS_TEST_ENDPOINT}"
"#;

        let config = AccessConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.endpoint(Dataset::ChargingStation),
            "https://test.api.com/chargers"
        );

        std::env::remove_var("DAEGU_ACCESS_TEST_ENDPOINT");
    }

    #[test]
    fn test_unresolved_key_placeholder_is_not_a_key() {
        let toml_content = r#"
[api]
service_key = "${DAEGU_ACCESS_TEST_UNSET_KEY}"
"#;
        let mut config = AccessConfig::from_toml_str(toml_content).unwrap();
        let before = std::env::var(API_KEY_ENV).ok();
        config.apply_env();
        assert_eq!(config.api.service_key, before.filter(|k| !k.trim().is_empty()));
    }

    #[test]
    fn test_failure_policy_parses() {
        let config = AccessConfig::from_toml_str("[api]\non_api_failure = \"fail\"\n").unwrap();
        assert_eq!(config.api.on_api_failure, ApiFailurePolicy::Fail);
    }

    #[test]
    fn test_config_validation() {
        let invalid_endpoint = r#"
[sources.walkway]
endpoint = "walkway-api"
"#;
        let config = AccessConfig::from_toml_str(invalid_endpoint).unwrap();
        assert!(config.validate().is_err());

        let disabled = r#"
[sources.walkway]
enabled = false
endpoint = "walkway-api"
"#;
        let config = AccessConfig::from_toml_str(disabled).unwrap();
        assert!(config.validate().is_ok());

        let bad_local = r#"
[sources.charging_station]
local_file = "chargers.xlsx"
"#;
        let config = AccessConfig::from_toml_str(bad_local).unwrap();
        assert!(config.validate().is_err());

        let bad_center = r#"
[visualization]
map_center = [128.6, 35.8]
"#;
        let config = AccessConfig::from_toml_str(bad_center).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chart_size_must_fit_the_panel_grid() {
        let mut config = AccessConfig::default();
        config.visualization.chart_width = MIN_CHART_WIDTH;
        config.visualization.chart_height = MIN_CHART_HEIGHT;
        assert!(config.validate().is_ok());

        config.visualization.chart_height = 220;
        assert!(config.validate().is_err());

        config.visualization.chart_height = MIN_CHART_HEIGHT;
        config.visualization.chart_width = MIN_CHART_WIDTH - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[region]
name = "대구광역시"
short_name = "대구"
districts = ["중구", "수성구"]
rural_districts = []
"#;
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = AccessConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.region.districts, vec!["중구", "수성구"]);
        assert!(config.region.rural_districts.is_empty());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AccessConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.region.name, "대구광역시");
    }
}
