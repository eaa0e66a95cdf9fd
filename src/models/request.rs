//! Trip request submitted to the orchestrator

use std::collections::BTreeSet;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::PriceTier;

/// Shortest and longest trip the planner accepts, in days
pub const MIN_TRIP_DAYS: u8 = 1;
pub const MAX_TRIP_DAYS: u8 = 14;

/// Inclusive calendar bounds the traveler can travel within
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl TravelWindow {
    #[must_use]
    pub fn new(earliest: NaiveDate, latest: NaiveDate) -> Self {
        Self { earliest, latest }
    }

    /// Number of calendar days in the window, inclusive
    #[must_use]
    pub fn len_days(&self) -> i64 {
        (self.latest - self.earliest).num_days() + 1
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }
}

/// Traveler preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Highest price tier the traveler wants to pay
    pub dining_budget: PriceTier,
    /// Cuisine tags; empty means any cuisine
    #[serde(default)]
    pub cuisines: BTreeSet<String>,
    #[serde(default)]
    pub hiking_interest: bool,
    #[serde(default)]
    pub accessibility_needs: bool,
    /// Only start the trip on this weekday when the window allows it
    #[serde(default)]
    pub preferred_start_weekday: Option<Weekday>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dining_budget: PriceTier::Moderate,
            cuisines: BTreeSet::new(),
            hiking_interest: false,
            accessibility_needs: false,
            preferred_start_weekday: None,
        }
    }
}

/// A single planning request. Never mutated after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    pub starting_location: String,
    pub window: TravelWindow,
    pub duration_days: u8,
    #[serde(default)]
    pub preferences: Preferences,
    pub route_id: String,
}

impl TripRequest {
    /// Check the request's own invariants; window feasibility is the date advisor's call
    pub fn validate(&self) -> Result<(), String> {
        if self.starting_location.trim().is_empty() {
            return Err("starting location cannot be empty".to_string());
        }
        if self.route_id.trim().is_empty() {
            return Err("route selection cannot be empty".to_string());
        }
        if !(MIN_TRIP_DAYS..=MAX_TRIP_DAYS).contains(&self.duration_days) {
            return Err(format!(
                "trip duration must be between {MIN_TRIP_DAYS} and {MAX_TRIP_DAYS} days, got {}",
                self.duration_days
            ));
        }
        if self.window.earliest > self.window.latest {
            return Err(format!(
                "travel window starts ({}) after it ends ({})",
                self.window.earliest, self.window.latest
            ));
        }
        Ok(())
    }
}
