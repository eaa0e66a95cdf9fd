//! Dining agents and the selection rules they share
//!
//! Cuisine and budget are hard filters. Accessibility and trail-friendliness
//! only add a bounded bonus to the score used for ordering.

use std::collections::BTreeSet;

use super::AgentError;
use crate::models::{DiningPlan, DiningRecommendation, Preferences, RoutePlan};

pub mod catalog;
pub mod live;
pub mod offline;

/// Picks kept per stop
pub const MAX_PER_STOP: usize = 3;
/// Evening seatings offered by restaurants that take reservations
pub const STANDARD_SEATINGS: [&str; 3] = ["5:00 PM", "6:30 PM", "8:00 PM"];

const ACCESSIBLE_BONUS: f64 = 0.3;
const TRAIL_FRIENDLY_BONUS: f64 = 0.2;

/// A restaurant plus the soft attributes preferences can reward
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub recommendation: DiningRecommendation,
    pub accessible: bool,
    pub trail_friendly: bool,
}

impl Candidate {
    fn effective_score(&self, preferences: &Preferences) -> f64 {
        let mut score = self.recommendation.rating;
        if preferences.accessibility_needs && self.accessible {
            score += ACCESSIBLE_BONUS;
        }
        if preferences.hiking_interest && self.trail_friendly {
            score += TRAIL_FRIENDLY_BONUS;
        }
        score
    }
}

/// Cuisine tag without a qualifier: "American (Traditional)" is "american"
fn cuisine_base(tag: &str) -> String {
    tag.split(" (").next().unwrap_or(tag).trim().to_lowercase()
}

/// Hard cuisine filter; an empty set accepts everything
#[must_use]
pub fn cuisine_matches(tag: &str, wanted: &BTreeSet<String>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let base = cuisine_base(tag);
    wanted.iter().any(|w| cuisine_base(w) == base)
}

/// Apply the hard filters, order by effective score then price then name,
/// and keep the best [`MAX_PER_STOP`]
#[must_use]
pub fn select(candidates: Vec<Candidate>, preferences: &Preferences) -> Vec<DiningRecommendation> {
    let mut kept: Vec<(f64, Candidate)> = candidates
        .into_iter()
        .filter(|c| cuisine_matches(&c.recommendation.cuisine, &preferences.cuisines))
        .filter(|c| c.recommendation.price_tier <= preferences.dining_budget)
        .map(|c| (c.effective_score(preferences), c))
        .collect();

    kept.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| a.recommendation.price_tier.cmp(&b.recommendation.price_tier))
            .then_with(|| a.recommendation.name.cmp(&b.recommendation.name))
    });

    kept.into_iter()
        .take(MAX_PER_STOP)
        .map(|(_, c)| c.recommendation)
        .collect()
}

/// Check a finished plan against the route and the hard filters
pub fn check_plan(
    plan: &DiningPlan,
    route: &RoutePlan,
    preferences: &Preferences,
) -> Result<(), AgentError> {
    let stops: BTreeSet<&str> = route.stop_ids().collect();
    for (stop, picks) in plan {
        if !stops.contains(stop.as_str()) {
            return Err(AgentError::invalid_output(format!(
                "recommendations for '{stop}', which is not a stop on the route"
            )));
        }
        for pick in picks {
            if !cuisine_matches(&pick.cuisine, &preferences.cuisines) {
                return Err(AgentError::invalid_output(format!(
                    "'{}' serves {}, outside the requested cuisines",
                    pick.name, pick.cuisine
                )));
            }
            if pick.price_tier > preferences.dining_budget {
                return Err(AgentError::invalid_output(format!(
                    "'{}' is {}, above the {} budget",
                    pick.name, pick.price_tier, preferences.dining_budget
                )));
            }
            if !(0.0..=5.0).contains(&pick.rating) {
                return Err(AgentError::invalid_output(format!(
                    "'{}' has rating {} outside 0-5",
                    pick.name, pick.rating
                )));
            }
        }
    }
    Ok(())
}
