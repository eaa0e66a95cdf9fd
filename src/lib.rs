//! `tripplan` - Multi-agent trip planning for a national park visit
//!
//! This library provides the planning agents (dates, weather, route and
//! dining), the orchestrator that runs them, and the offline, assisted and
//! live implementations behind each agent.

pub mod agents;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod models;
pub mod open_meteo;
pub mod orchestrator;
pub mod telemetry;

// Re-export core types for public API
pub use agents::{AgentError, AgentSet, DateAdvisor, DiningAgent, RouteAgent, WeatherAgent};
pub use config::{PlanningMode, TripPlanConfig};
pub use error::{OrchestrationError, TripPlanError};
pub use models::{
    DateRange, DateRangeCandidate, DiningPlan, FailureCode, Location, PlanState, Preferences,
    PriceTier, RoutePlan, Section, TravelWindow, TripPlan, TripRequest, WeatherDay,
};
pub use orchestrator::PlanOrchestrator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripPlanError>;
