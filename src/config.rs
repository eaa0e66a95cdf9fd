//! Configuration management for the trip planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripPlanError;
use crate::models::Location;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Which implementation every planning agent is built with
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PlanningMode {
    /// Deterministic synthetic data, no network calls
    #[default]
    Offline,
    /// Language-model suggestions, no live data providers
    Assisted,
    /// Real weather, mapping and restaurant providers
    Live,
}

impl fmt::Display for PlanningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningMode::Offline => write!(f, "offline"),
            PlanningMode::Assisted => write!(f, "assisted"),
            PlanningMode::Live => write!(f, "live"),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TripPlanConfig {
    pub mode: PlanningMode,
    pub planner: PlannerConfig,
    pub orchestration: OrchestrationConfig,
    pub offline: OfflineConfig,
    pub providers: ProvidersConfig,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Where trips go and how many date options to return
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub destination: DestinationConfig,
    /// Number of ranked date options in a plan
    pub max_date_options: usize,
    /// Return one shortened range instead of failing when the window is too narrow
    pub allow_shortened_window: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Deadlines and retry policy of the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    pub date_timeout_ms: u64,
    pub agent_timeout_ms: u64,
    /// Whole-run deadline; unset means no global deadline
    pub global_deadline_ms: Option<u64>,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Seed for all synthetic variation
    pub seed: u64,
}

/// External data provider endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub open_meteo_forecast_url: String,
    pub open_meteo_archive_url: String,
    pub open_meteo_geocoding_url: String,
    pub graphhopper_url: String,
    pub graphhopper_api_key: Option<String>,
    pub yelp_url: String,
    pub yelp_api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Transport-level retries for transient HTTP failures
    pub max_retries: u32,
}

/// OpenAI-compatible chat completion endpoint (Azure OpenAI included)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Model name, or deployment name on Azure
    pub model: String,
    /// Set for Azure OpenAI deployments
    pub api_version: Option<String>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory; defaults to the platform cache directory
    pub location: Option<PathBuf>,
    pub ttl_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or compact)
    pub format: String,
    /// OTLP/HTTP endpoint for span export
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_destination_name() -> String {
    "Yellowstone National Park".to_string()
}

fn default_max_date_options() -> usize {
    3
}

fn default_date_timeout_ms() -> u64 {
    20_000
}

fn default_agent_timeout_ms() -> u64 {
    15_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_seed() -> u64 {
    42
}

fn default_cache_ttl() -> u32 {
    6
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            destination: DestinationConfig::default(),
            max_date_options: default_max_date_options(),
            allow_shortened_window: false,
        }
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            name: default_destination_name(),
            latitude: 44.428,
            longitude: -110.5885,
        }
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            date_timeout_ms: default_date_timeout_ms(),
            agent_timeout_ms: default_agent_timeout_ms(),
            global_deadline_ms: None,
            max_attempts: default_max_attempts(),
            backoff_base_ms: 200,
            backoff_max_ms: 2_000,
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            open_meteo_forecast_url: "https://api.open-meteo.com/v1".to_string(),
            open_meteo_archive_url: "https://archive-api.open-meteo.com/v1".to_string(),
            open_meteo_geocoding_url: "https://geocoding-api.open-meteo.com/v1".to_string(),
            graphhopper_url: "https://graphhopper.com/api/1".to_string(),
            graphhopper_api_key: None,
            yelp_url: "https://api.yelp.com/v3".to_string(),
            yelp_api_key: None,
            timeout_seconds: 30,
            max_retries: 2,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            api_version: None,
            temperature: 0.3,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: None,
            ttl_hours: default_cache_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl PlannerConfig {
    #[must_use]
    pub fn destination_location(&self) -> Location {
        Location::new(
            self.destination.latitude,
            self.destination.longitude,
            self.destination.name.clone(),
        )
    }
}

impl OrchestrationConfig {
    #[must_use]
    pub fn date_timeout(&self) -> Duration {
        Duration::from_millis(self.date_timeout_ms)
    }

    #[must_use]
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_timeout_ms)
    }

    #[must_use]
    pub fn global_deadline(&self) -> Option<Duration> {
        self.global_deadline_ms.map(Duration::from_millis)
    }
}

impl CacheConfig {
    /// Configured directory, or `<cache_dir>/tripplan`
    #[must_use]
    pub fn resolved_location(&self) -> PathBuf {
        self.location.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("tripplan")
        })
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_hours) * 3600)
    }
}

impl TripPlanConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.or_else(Self::get_config_path);

        if let Some(config_file) = config_file {
            if explicit && !config_file.exists() {
                return Err(TripPlanError::config(format!(
                    "config file {} does not exist",
                    config_file.display()
                ))
                .into());
            }
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPPLAN_MODE=live, TRIPPLAN_LLM__API_KEY=...
        builder = builder.add_source(
            Environment::with_prefix("TRIPPLAN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: TripPlanConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripplan").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_mode_requirements()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(1..=10).contains(&self.planner.max_date_options) {
            return Err(TripPlanError::config("planner.max_date_options must be between 1 and 10").into());
        }

        let lat = self.planner.destination.latitude;
        let lon = self.planner.destination.longitude;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(TripPlanError::config(format!(
                "destination coordinates {lat}, {lon} are out of range"
            ))
            .into());
        }

        let orchestration = &self.orchestration;
        if !(1..=5).contains(&orchestration.max_attempts) {
            return Err(TripPlanError::config("orchestration.max_attempts must be between 1 and 5").into());
        }
        if orchestration.date_timeout_ms == 0 || orchestration.agent_timeout_ms == 0 {
            return Err(TripPlanError::config("agent timeouts must be greater than zero").into());
        }
        if orchestration.global_deadline_ms == Some(0) {
            return Err(TripPlanError::config(
                "orchestration.global_deadline_ms must be greater than zero when set",
            )
            .into());
        }
        if orchestration.backoff_base_ms > orchestration.backoff_max_ms {
            return Err(TripPlanError::config(
                "orchestration.backoff_base_ms cannot exceed backoff_max_ms",
            )
            .into());
        }

        if self.providers.timeout_seconds == 0 || self.providers.timeout_seconds > 300 {
            return Err(TripPlanError::config("Provider timeout must be between 1 and 300 seconds").into());
        }
        if self.providers.max_retries > 10 {
            return Err(TripPlanError::config("Provider max retries cannot exceed 10").into());
        }

        if self.cache.ttl_hours > 168 {
            return Err(TripPlanError::config("Cache TTL cannot exceed 168 hours (1 week)").into());
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(TripPlanError::config("llm.temperature must be between 0 and 2").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripPlanError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripPlanError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let providers = &self.providers;
        let mut urls = vec![
            ("providers.open_meteo_forecast_url", providers.open_meteo_forecast_url.as_str()),
            ("providers.open_meteo_archive_url", providers.open_meteo_archive_url.as_str()),
            ("providers.open_meteo_geocoding_url", providers.open_meteo_geocoding_url.as_str()),
            ("providers.graphhopper_url", providers.graphhopper_url.as_str()),
            ("providers.yelp_url", providers.yelp_url.as_str()),
        ];
        if let Some(url) = &self.llm.base_url {
            urls.push(("llm.base_url", url.as_str()));
        }
        if let Some(url) = &self.logging.otlp_endpoint {
            urls.push(("logging.otlp_endpoint", url.as_str()));
        }
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripPlanError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn validate_mode_requirements(&self) -> Result<()> {
        fn present(value: Option<&String>) -> bool {
            value.is_some_and(|v| !v.trim().is_empty())
        }

        match self.mode {
            PlanningMode::Offline => {}
            PlanningMode::Assisted => {
                if !present(self.llm.base_url.as_ref()) {
                    return Err(TripPlanError::config("assisted mode requires llm.base_url").into());
                }
                if !present(self.llm.api_key.as_ref()) {
                    return Err(TripPlanError::config("assisted mode requires llm.api_key").into());
                }
            }
            PlanningMode::Live => {
                if !present(self.providers.graphhopper_api_key.as_ref()) {
                    return Err(TripPlanError::config(
                        "live mode requires providers.graphhopper_api_key",
                    )
                    .into());
                }
                if !present(self.providers.yelp_api_key.as_ref()) {
                    return Err(TripPlanError::config("live mode requires providers.yelp_api_key").into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TripPlanConfig::default();
        assert_eq!(config.mode, PlanningMode::Offline);
        assert_eq!(config.planner.max_date_options, 3);
        assert_eq!(config.orchestration.max_attempts, 3);
        assert_eq!(config.offline.seed, 42);
        assert_eq!(config.logging.level, "info");
        assert!(config.orchestration.global_deadline().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_assisted_mode_requires_llm_credentials() {
        let mut config = TripPlanConfig::default();
        config.mode = PlanningMode::Assisted;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm.base_url"));

        config.llm.base_url = Some("https://example.openai.azure.com".to_string());
        config.llm.api_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_live_mode_requires_provider_keys() {
        let mut config = TripPlanConfig::default();
        config.mode = PlanningMode::Live;
        config.providers.graphhopper_api_key = Some("gh".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("yelp_api_key"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TripPlanConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = TripPlanConfig::default();
        config.orchestration.max_attempts = 9;
        assert!(config.validate().is_err());

        let mut config = TripPlanConfig::default();
        config.orchestration.global_deadline_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[planner]
max_date_options = 5

[orchestration]
global_deadline_ms = 30000
"#
        )
        .unwrap();

        let config = TripPlanConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.planner.max_date_options, 5);
        assert_eq!(
            config.orchestration.global_deadline(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(config.orchestration.agent_timeout_ms, 15_000);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = TripPlanConfig::load_from_path(Some(PathBuf::from(
            "/definitely/not/here/tripplan.toml",
        )));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_generation() {
        let path = TripPlanConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("tripplan"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
