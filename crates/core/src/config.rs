use serde::Deserialize;

use crate::types::JoinPolicy;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `MARKETING_INTEL__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub insights: InsightConfig,
    #[serde(default)]
    pub join: JoinConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Locations of the four input tables.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: String,
    #[serde(default = "default_facebook_file")]
    pub facebook_file: String,
    #[serde(default = "default_google_file")]
    pub google_file: String,
    #[serde(default = "default_tiktok_file")]
    pub tiktok_file: String,
    #[serde(default = "default_business_file")]
    pub business_file: String,
}

/// Thresholds for insight eligibility.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    /// Fraction of scope spend an entity needs to rank as top performer or opportunity.
    #[serde(default = "default_min_spend_share")]
    pub min_spend_share: f64,
    /// Absolute spend floor; the effective threshold is the larger of the two.
    #[serde(default)]
    pub min_spend_floor: f64,
    /// Below-threshold entities are still reviewed when their ROAS falls under
    /// this fraction of the scope average.
    #[serde(default = "default_review_roas_ratio")]
    pub review_roas_ratio: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinConfig {
    #[serde(default)]
    pub policy: JoinPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_states")]
    pub top_states: usize,
}

// Default functions
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_facebook_file() -> String {
    "Facebook.csv".to_string()
}
fn default_google_file() -> String {
    "Google.csv".to_string()
}
fn default_tiktok_file() -> String {
    "TikTok.csv".to_string()
}
fn default_business_file() -> String {
    "Business.csv".to_string()
}
fn default_min_spend_share() -> f64 {
    0.05
}
fn default_review_roas_ratio() -> f64 {
    0.5
}
fn default_top_states() -> usize {
    10
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            facebook_file: default_facebook_file(),
            google_file: default_google_file(),
            tiktok_file: default_tiktok_file(),
            business_file: default_business_file(),
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            min_spend_share: default_min_spend_share(),
            min_spend_floor: 0.0,
            review_roas_ratio: default_review_roas_ratio(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_states: default_top_states(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment variables.
    /// Environment variables take precedence over the file.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            tracing::debug!(path, "Loading configuration file");
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("MARKETING_INTEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntelError;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data.dir, "data");
        assert_eq!(config.data.business_file, "Business.csv");
        assert_eq!(config.join.policy, JoinPolicy::FillMissing);
        assert_eq!(config.report.top_states, 10);
        assert!((config.insights.min_spend_share - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"join": {"policy": "business_dates"}, "insights": {"min_spend_floor": 250.0}}"#,
        )
        .unwrap();
        assert_eq!(config.join.policy, JoinPolicy::BusinessDates);
        assert!((config.insights.min_spend_floor - 250.0).abs() < f64::EPSILON);
        assert!((config.insights.review_roas_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.data.tiktok_file, "TikTok.csv");
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = AppConfig::load(Some("/nonexistent/marketing-intel.toml")).unwrap_err();
        assert!(matches!(IntelError::from(err), IntelError::Config(_)));
    }
}
