use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{Candidate, catalog, cuisine_matches, select};
use crate::agents::{AgentError, DiningAgent};
use crate::config::TripPlanConfig;
use crate::http::{ApiClient, HttpError, bearer};
use crate::models::{
    DiningPlan, DiningRecommendation, FailureCode, Preferences, PriceTier, Reservation, RoutePlan,
};

const SEARCH_LIMIT: u8 = 20;

/// Restaurant picks from Yelp Fusion business search
pub struct LiveDiningAgent {
    http: ApiClient,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    businesses: Vec<Business>,
}

#[derive(Debug, Deserialize)]
struct Business {
    name: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    location: BusinessLocation,
    #[serde(default)]
    display_phone: String,
    #[serde(default)]
    is_closed: bool,
}

#[derive(Debug, Deserialize)]
struct Category {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct BusinessLocation {
    #[serde(default)]
    display_address: Vec<String>,
}

impl Business {
    /// `None` when the listing is closed or has no usable price
    fn into_candidate(self, preferences: &Preferences) -> Option<Candidate> {
        if self.is_closed {
            return None;
        }
        let price_tier = self.price.as_deref().and_then(PriceTier::from_dollar_signs)?;
        // Prefer the category the traveler asked for as the cuisine tag
        let cuisine = self
            .categories
            .iter()
            .find(|c| cuisine_matches(&c.title, &preferences.cuisines))
            .or_else(|| self.categories.first())
            .map_or_else(|| "Restaurant".to_string(), |c| c.title.clone());

        Some(Candidate {
            recommendation: DiningRecommendation {
                name: self.name,
                cuisine,
                price_tier,
                rating: self.rating.clamp(0.0, 5.0),
                address: self.location.display_address.join(", "),
                contact: self.display_phone,
                // Search results carry no table availability
                reservation: Reservation::NotAccepted,
            },
            accessible: false,
            trail_friendly: false,
        })
    }
}

/// Yelp's `price` filter: every tier up to the budget
fn price_filter(budget: PriceTier) -> &'static str {
    match budget {
        PriceTier::Budget => "1",
        PriceTier::Moderate => "1,2",
        PriceTier::Expensive => "1,2,3,4",
    }
}

impl LiveDiningAgent {
    pub fn new(http: ApiClient, config: &TripPlanConfig) -> Result<Self> {
        let api_key = config
            .providers
            .yelp_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("providers.yelp_api_key is not set"))?;
        Ok(Self {
            http,
            base_url: config.providers.yelp_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn search_url(&self, town: &str, preferences: &Preferences) -> String {
        let area = match catalog::find_town(town) {
            Some(known) => format!("latitude={}&longitude={}", known.latitude, known.longitude),
            None => format!("location={}", urlencoding::encode(town)),
        };
        format!(
            "{}/businesses/search?{area}&categories=restaurants&price={}&sort_by=rating&limit={SEARCH_LIMIT}",
            self.base_url,
            price_filter(preferences.dining_budget)
        )
    }

    #[instrument(skip(self, preferences))]
    async fn search(
        &self,
        town: &str,
        preferences: &Preferences,
    ) -> Result<Vec<DiningRecommendation>, AgentError> {
        let headers = bearer(&self.api_key).map_err(|e| AgentError::invalid_output(e.to_string()))?;
        let response: SearchResponse = self
            .http
            .get_json(&self.search_url(town, preferences), headers)
            .await
            .map_err(|e: HttpError| {
                AgentError::from_http(&e, FailureCode::ProviderUnavailable, FailureCode::LocationUnresolved)
            })?;
        debug!(found = response.businesses.len(), "Restaurant search results");

        let candidates = response
            .businesses
            .into_iter()
            .filter_map(|b| b.into_candidate(preferences))
            .collect();
        Ok(select(candidates, preferences))
    }
}

#[async_trait]
impl DiningAgent for LiveDiningAgent {
    fn name(&self) -> &'static str {
        "live-dining"
    }

    #[instrument(skip_all, fields(agent = "live-dining", route = %route.route_id))]
    async fn recommend(
        &self,
        route: &RoutePlan,
        preferences: &Preferences,
    ) -> Result<DiningPlan, AgentError> {
        // One search per town, shared by every stop it serves
        let towns: Vec<&str> = {
            let mut towns: Vec<&str> = route.stops().iter().map(|s| s.dining_town.as_str()).collect();
            towns.sort_unstable();
            towns.dedup();
            towns
        };
        let results = try_join_all(towns.iter().map(|town| self.search(town, preferences))).await?;
        let by_town: BTreeMap<&str, Vec<DiningRecommendation>> =
            towns.into_iter().zip(results).collect();

        Ok(route
            .stops()
            .iter()
            .map(|stop| {
                let picks = by_town.get(stop.dining_town.as_str()).cloned().unwrap_or_default();
                (stop.id.clone(), picks)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r#"{
        "businesses": [
            {
                "name": "Old Town Cafe",
                "rating": 4.5,
                "price": "$",
                "categories": [{"alias": "breakfast_brunch", "title": "Breakfast & Brunch"}, {"alias": "tradamerican", "title": "American (Traditional)"}],
                "location": {"display_address": ["19 Madison Ave", "West Yellowstone, MT 59758"]},
                "display_phone": "(406) 555-0199",
                "is_closed": false
            },
            {
                "name": "Closed Diner",
                "rating": 5.0,
                "price": "$",
                "categories": [{"alias": "diners", "title": "Diners"}],
                "is_closed": true
            },
            {
                "name": "No Price Grill",
                "rating": 4.0,
                "categories": [{"alias": "tradamerican", "title": "American (Traditional)"}]
            }
        ]
    }"#;

    #[test]
    fn test_search_results_become_candidates() {
        let preferences = Preferences {
            cuisines: ["American".to_string()].into(),
            ..Preferences::default()
        };
        let response: SearchResponse = serde_json::from_str(SEARCH).unwrap();
        let candidates: Vec<_> = response
            .businesses
            .into_iter()
            .filter_map(|b| b.into_candidate(&preferences))
            .collect();

        assert_eq!(candidates.len(), 1);
        let pick = &candidates[0].recommendation;
        assert_eq!(pick.cuisine, "American (Traditional)");
        assert_eq!(pick.price_tier, PriceTier::Budget);
        assert_eq!(pick.address, "19 Madison Ave, West Yellowstone, MT 59758");
        assert!(!pick.reservation.accepts_reservations());
    }

    #[test]
    fn test_search_url_uses_town_coordinates() {
        let mut config = TripPlanConfig::default();
        config.providers.yelp_api_key = Some("key".to_string());
        let http = ApiClient::new(&config.providers).unwrap();
        let agent = LiveDiningAgent::new(http, &config).unwrap();

        let url = agent.search_url("Gardiner", &Preferences::default());
        assert!(url.contains("latitude=45.0322&longitude=-110.7053"));
        assert!(url.contains("price=1,2"));

        let url = agent.search_url("Big Sky", &Preferences::default());
        assert!(url.contains("location=Big%20Sky"));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = TripPlanConfig::default();
        let http = ApiClient::new(&config.providers).unwrap();
        assert!(LiveDiningAgent::new(http, &config).is_err());
    }
}
