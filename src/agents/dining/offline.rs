use async_trait::async_trait;
use chrono::NaiveDate;
use rand::RngExt;
use tracing::{debug, instrument};

use super::catalog::{self, Listing};
use super::{Candidate, STANDARD_SEATINGS, select};
use crate::agents::{AgentError, DiningAgent, seeded_rng};
use crate::models::{
    DiningPlan, DiningRecommendation, Preferences, PriceTier, Reservation, RoutePlan,
};

/// Restaurant picks from the built-in town listings, with seeded reservations
#[derive(Debug, Clone)]
pub struct OfflineDiningAgent {
    seed: u64,
}

impl OfflineDiningAgent {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn roll(&self, tag: &str) -> rand::rngs::StdRng {
        // Listings are not date-bound; any fixed date keeps the stream stable
        seeded_rng(self.seed, tag, NaiveDate::default())
    }

    fn reservation(&self, town: &str, name: &str) -> Reservation {
        let accepts = self.roll(&format!("reservations:{town}:{name}")).random_range(0..4) != 0;
        if accepts {
            Reservation::from_slots(STANDARD_SEATINGS.iter().map(ToString::to_string).collect())
        } else {
            Reservation::NotAccepted
        }
    }

    fn from_listing(&self, town: &str, listing: &Listing) -> Candidate {
        Candidate {
            recommendation: DiningRecommendation {
                name: listing.name.to_string(),
                cuisine: listing.cuisine.to_string(),
                price_tier: listing.price_tier,
                rating: listing.rating,
                address: format!("{}, {town}", listing.address),
                contact: listing.phone.to_string(),
                reservation: self.reservation(town, listing.name),
            },
            accessible: listing.accessible,
            trail_friendly: listing.trail_friendly,
        }
    }

    /// Three stand-in restaurants for a town without listings
    fn generated(&self, town: &str) -> Vec<Candidate> {
        let specs = [
            (format!("{town} Diner"), "American", PriceTier::Budget, 3.5, "123 Main St"),
            (format!("{town} Grill"), "American", PriceTier::Moderate, 3.8, "456 Oak Ave"),
            ("Pasta Palace".to_string(), "Italian", PriceTier::Moderate, 3.7, "789 Elm St"),
        ];
        specs
            .into_iter()
            .map(|(name, cuisine, price_tier, floor, street)| {
                let raw: f64 = self.roll(&format!("rating:{town}:{name}")).random_range(floor..floor + 1.0);
                let rating = (raw * 10.0).round() / 10.0;
                Candidate {
                    recommendation: DiningRecommendation {
                        reservation: self.reservation(town, &name),
                        name,
                        cuisine: cuisine.to_string(),
                        price_tier,
                        rating,
                        address: format!("{street}, {town}"),
                        contact: "555-123-4567".to_string(),
                    },
                    accessible: true,
                    trail_friendly: false,
                }
            })
            .collect()
    }

    fn candidates(&self, town: &str) -> Vec<Candidate> {
        match catalog::find_town(town) {
            Some(known) if !known.listings.is_empty() => known
                .listings
                .iter()
                .map(|listing| self.from_listing(known.name, listing))
                .collect(),
            _ => {
                debug!(town, "No listings; generating stand-ins");
                self.generated(town)
            }
        }
    }
}

#[async_trait]
impl DiningAgent for OfflineDiningAgent {
    fn name(&self) -> &'static str {
        "offline-dining"
    }

    #[instrument(skip_all, fields(agent = "offline-dining", route = %route.route_id))]
    async fn recommend(
        &self,
        route: &RoutePlan,
        preferences: &Preferences,
    ) -> Result<DiningPlan, AgentError> {
        Ok(route
            .stops()
            .iter()
            .map(|stop| {
                let picks = select(self.candidates(&stop.dining_town), preferences);
                (stop.id.clone(), picks)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::dining::check_plan;
    use crate::agents::route::offline::OfflineRouteAgent;

    fn route() -> RoutePlan {
        OfflineRouteAgent::new().plan("Denver, CO", "classic", 6).unwrap()
    }

    #[tokio::test]
    async fn test_every_stop_gets_recommendations() {
        let route = route();
        let preferences = Preferences::default();
        let plan = OfflineDiningAgent::new(42).recommend(&route, &preferences).await.unwrap();

        let keys: Vec<_> = plan.keys().map(String::as_str).collect();
        let mut stops: Vec<_> = route.stop_ids().collect();
        stops.sort_unstable();
        assert_eq!(keys, stops);
        assert!(plan.values().all(|picks| !picks.is_empty() && picks.len() <= 3));
        assert!(check_plan(&plan, &route, &preferences).is_ok());
    }

    #[tokio::test]
    async fn test_cuisine_and_budget_are_hard_filters() {
        let route = route();
        let preferences = Preferences {
            dining_budget: PriceTier::Budget,
            cuisines: ["Italian".to_string()].into(),
            ..Preferences::default()
        };
        let plan = OfflineDiningAgent::new(42).recommend(&route, &preferences).await.unwrap();
        for pick in plan.values().flatten() {
            assert_eq!(pick.cuisine, "Italian");
            assert_eq!(pick.price_tier, PriceTier::Budget);
        }
    }

    #[test]
    fn test_generated_town_is_reproducible() {
        let agent = OfflineDiningAgent::new(7);
        let a = agent.candidates("Canyon Village");
        let b = agent.candidates("Canyon Village");
        assert_eq!(a, b);
        assert_eq!(a[0].recommendation.name, "Canyon Village Diner");
        for c in &a {
            assert!((3.5..=4.8).contains(&c.recommendation.rating));
        }
    }

    #[test]
    fn test_reservations_always_carry_slots() {
        let agent = OfflineDiningAgent::new(42);
        for town in catalog::TOWNS {
            for candidate in agent.candidates(town.name) {
                if let Reservation::Available { time_slots } = candidate.recommendation.reservation {
                    assert_eq!(time_slots, STANDARD_SEATINGS);
                }
            }
        }
    }
}
