//! Planning agents and their per-mode implementations
//!
//! Each agent is a trait with one implementation per [`PlanningMode`]. The
//! orchestrator only sees the traits; [`AgentSet::for_mode`] picks the
//! implementations once, at construction.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::info;

use crate::cache::PersistentCache;
use crate::config::{PlanningMode, TripPlanConfig};
use crate::http::{ApiClient, HttpError};
use crate::llm::{ChatCompletionsClient, LanguageModel};
use crate::models::{
    DateRange, DateRangeCandidate, DiningPlan, FailureCode, Location, Preferences, RoutePlan,
    TripRequest, WeatherDay,
};
use crate::open_meteo::OpenMeteoClient;

pub mod dates;
pub mod dining;
pub mod route;
pub mod weather;

/// Failure of a single agent call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct AgentError {
    pub code: FailureCode,
    pub message: String,
}

impl AgentError {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn no_feasible_window(message: impl Into<String>) -> Self {
        Self::new(FailureCode::NoFeasibleWindow, message)
    }

    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureCode::ProviderUnavailable, message)
    }

    pub fn location_unresolved(message: impl Into<String>) -> Self {
        Self::new(FailureCode::LocationUnresolved, message)
    }

    pub fn route_not_found(message: impl Into<String>) -> Self {
        Self::new(FailureCode::RouteNotFound, message)
    }

    pub fn distance_service_unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureCode::DistanceServiceUnavailable, message)
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::new(FailureCode::InvalidOutput, message)
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Classify an HTTP failure: transient ones become `transient`, rejected
    /// requests become `rejected`, undecodable bodies are invalid output
    pub(crate) fn from_http(err: &HttpError, transient: FailureCode, rejected: FailureCode) -> Self {
        let code = if err.is_transient() {
            transient
        } else if matches!(err, HttpError::Decode { .. }) {
            FailureCode::InvalidOutput
        } else {
            rejected
        };
        Self::new(code, err.to_string())
    }
}

/// Produces ranked candidate date ranges for a request
#[async_trait]
pub trait DateAdvisor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidates best first, every one inside the window
    async fn propose_dates(&self, request: &TripRequest)
    -> Result<Vec<DateRangeCandidate>, AgentError>;
}

/// Produces one forecast day per date in a range
#[async_trait]
pub trait WeatherAgent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn forecast(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<WeatherDay>, AgentError>;
}

/// Produces a chain-connected route for a catalog route selection
#[async_trait]
pub trait RouteAgent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn plan_route(
        &self,
        start: &str,
        route_id: &str,
        duration_days: u8,
    ) -> Result<RoutePlan, AgentError>;
}

/// Produces restaurant picks per route stop
#[async_trait]
pub trait DiningAgent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recommend(
        &self,
        route: &RoutePlan,
        preferences: &Preferences,
    ) -> Result<DiningPlan, AgentError>;
}

/// The four agents an orchestrator runs
#[derive(Clone)]
pub struct AgentSet {
    pub dates: Arc<dyn DateAdvisor>,
    pub weather: Arc<dyn WeatherAgent>,
    pub route: Arc<dyn RouteAgent>,
    pub dining: Arc<dyn DiningAgent>,
}

impl fmt::Debug for AgentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSet")
            .field("dates", &self.dates.name())
            .field("weather", &self.weather.name())
            .field("route", &self.route.name())
            .field("dining", &self.dining.name())
            .finish()
    }
}

impl AgentSet {
    /// Deterministic agents; never touch the network or disk
    #[must_use]
    pub fn offline(config: &TripPlanConfig) -> Self {
        let seed = config.offline.seed;
        Self {
            dates: Arc::new(dates::offline::OfflineDateAdvisor::from_config(config)),
            weather: Arc::new(weather::offline::OfflineWeatherAgent::new(seed)),
            route: Arc::new(route::offline::OfflineRouteAgent::new()),
            dining: Arc::new(dining::offline::OfflineDiningAgent::new(seed)),
        }
    }

    /// Build every agent for the configured mode
    pub fn for_mode(config: &TripPlanConfig) -> Result<Self> {
        let agents = match config.mode {
            PlanningMode::Offline => Self::offline(config),
            PlanningMode::Assisted => {
                let http = ApiClient::new(&config.providers)
                    .context("Failed to build HTTP client for the language model")?;
                let llm: Arc<dyn LanguageModel> = Arc::new(
                    ChatCompletionsClient::from_config(&config.llm, http)
                        .context("Failed to configure the language model")?,
                );
                let offline = Self::offline(config);
                Self {
                    dates: Arc::new(dates::assisted::AssistedDateAdvisor::new(
                        Arc::clone(&llm),
                        dates::offline::OfflineDateAdvisor::from_config(config),
                    )),
                    weather: Arc::new(weather::assisted::AssistedWeatherAgent::new(
                        llm,
                        weather::offline::OfflineWeatherAgent::new(config.offline.seed),
                    )),
                    ..offline
                }
            }
            PlanningMode::Live => {
                let http = ApiClient::new(&config.providers)
                    .context("Failed to build HTTP client for live providers")?;
                let cache_dir = config.cache.resolved_location();
                let cache = PersistentCache::open(&cache_dir)
                    .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
                let open_meteo = OpenMeteoClient::new(http.clone(), &config.providers);
                Self {
                    dates: Arc::new(dates::live::LiveDateAdvisor::new(
                        open_meteo.clone(),
                        cache.clone(),
                        config,
                    )),
                    weather: Arc::new(weather::live::LiveWeatherAgent::new(
                        open_meteo.clone(),
                        cache.clone(),
                        config.cache.ttl(),
                    )),
                    route: Arc::new(
                        route::live::LiveRouteAgent::new(http.clone(), open_meteo, cache, config)
                            .context("Failed to configure the routing provider")?,
                    ),
                    dining: Arc::new(
                        dining::live::LiveDiningAgent::new(http, config)
                            .context("Failed to configure the restaurant provider")?,
                    ),
                }
            }
        };
        info!(mode = %config.mode, agents = ?agents, "Planning agents ready");
        Ok(agents)
    }
}

/// Reproducible random stream for one seed and one (tag, date) key
pub(crate) fn seeded_rng(seed: u64, tag: &str, date: NaiveDate) -> StdRng {
    // FNV-1a over the tag, then fold in the date
    let mut key: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in tag.bytes() {
        key ^= u64::from(byte);
        key = key.wrapping_mul(0x0000_0100_0000_01b3);
    }
    key ^= u64::from(date.num_days_from_ce().unsigned_abs());
    key = key.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    StdRng::seed_from_u64(seed ^ key)
}

/// `true` for Saturday and Sunday
pub(crate) fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().number_from_monday() >= 6
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngExt;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        let a: f64 = seeded_rng(42, "weather", date).random_range(0.0..1.0);
        let b: f64 = seeded_rng(42, "weather", date).random_range(0.0..1.0);
        let c: f64 = seeded_rng(42, "crowd", date).random_range(0.0..1.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_http_failure_classification() {
        let transient = HttpError::Transport {
            url: "x".into(),
            message: "reset".into(),
        };
        let err = AgentError::from_http(
            &transient,
            FailureCode::DistanceServiceUnavailable,
            FailureCode::RouteNotFound,
        );
        assert_eq!(err.code, FailureCode::DistanceServiceUnavailable);
        assert!(err.is_retryable());

        let decode = HttpError::Decode {
            url: "x".into(),
            message: "eof".into(),
        };
        let err = AgentError::from_http(
            &decode,
            FailureCode::ProviderUnavailable,
            FailureCode::LocationUnresolved,
        );
        assert_eq!(err.code, FailureCode::InvalidOutput);
    }

    #[test]
    fn test_offline_agent_set_names() {
        let agents = AgentSet::offline(&TripPlanConfig::default());
        assert_eq!(agents.dates.name(), "offline-dates");
        assert_eq!(agents.route.name(), "offline-route");
    }
}
