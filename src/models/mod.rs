//! Data models for the trip planner
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and metadata
//! - Request: The immutable trip request and its preferences
//! - Dates: Ranked date range candidates
//! - Weather: Per-day forecasts
//! - Route: Chain-connected route segments and day groups
//! - Dining: Restaurant recommendations per stop
//! - Plan: The composite trip plan and its per-section status markers

pub mod dates;
pub mod dining;
pub mod location;
pub mod plan;
pub mod request;
pub mod route;
pub mod weather;

// Re-export all public types for convenient access
pub use dates::{DateRange, DateRangeCandidate, ScoreWeights};
pub use dining::{DiningPlan, DiningRecommendation, PriceTier, Reservation};
pub use location::Location;
pub use plan::{FailureCode, FailureReason, PlanState, Section, SectionStatus, TripPlan};
pub use request::{Preferences, TravelWindow, TripRequest};
pub use route::{RoutePlan, RouteSegment, RouteStop};
pub use weather::{Daylight, WeatherDay};
