//! Dining recommendation model

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Price tier, ordered cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Budget,
    Moderate,
    Expensive,
}

impl PriceTier {
    /// Map a `$`..`$$$$` price string
    #[must_use]
    pub fn from_dollar_signs(price: &str) -> Option<Self> {
        match price.trim().chars().filter(|c| *c == '$').count() {
            1 => Some(Self::Budget),
            2 => Some(Self::Moderate),
            3 | 4 => Some(Self::Expensive),
            _ => None,
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceTier::Budget => write!(f, "budget"),
            PriceTier::Moderate => write!(f, "moderate"),
            PriceTier::Expensive => write!(f, "expensive"),
        }
    }
}

impl std::str::FromStr for PriceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "budget" | "$" => Ok(Self::Budget),
            "moderate" | "$$" => Ok(Self::Moderate),
            "expensive" | "$$$" | "$$$$" => Ok(Self::Expensive),
            other => Err(format!(
                "unknown price tier '{other}' (expected budget, moderate or expensive)"
            )),
        }
    }
}

/// Reservation availability. Accepting reservations always comes with slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reservations", rename_all = "snake_case")]
pub enum Reservation {
    NotAccepted,
    Available { time_slots: Vec<String> },
}

impl Reservation {
    /// Available if there is at least one slot, otherwise not accepted
    #[must_use]
    pub fn from_slots(time_slots: Vec<String>) -> Self {
        if time_slots.is_empty() {
            Self::NotAccepted
        } else {
            Self::Available { time_slots }
        }
    }

    #[must_use]
    pub fn accepts_reservations(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningRecommendation {
    pub name: String,
    pub cuisine: String,
    pub price_tier: PriceTier,
    /// Rating from 0 to 5
    pub rating: f64,
    pub address: String,
    pub contact: String,
    #[serde(flatten)]
    pub reservation: Reservation,
}

/// Recommendations keyed by route stop id, each list best first
pub type DiningPlan = BTreeMap<String, Vec<DiningRecommendation>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_tier_ordering_and_parsing() {
        assert!(PriceTier::Budget < PriceTier::Moderate);
        assert!(PriceTier::Moderate < PriceTier::Expensive);
        assert_eq!("Moderate".parse::<PriceTier>().unwrap(), PriceTier::Moderate);
        assert_eq!(PriceTier::from_dollar_signs("$$$$"), Some(PriceTier::Expensive));
        assert_eq!(PriceTier::from_dollar_signs(""), None);
        assert!("cheap".parse::<PriceTier>().is_err());
    }

    #[test]
    fn test_reservation_without_slots_is_not_accepted() {
        assert_eq!(Reservation::from_slots(vec![]), Reservation::NotAccepted);
        let r = Reservation::from_slots(vec!["6:30 PM".to_string()]);
        assert!(r.accepts_reservations());
    }

    #[test]
    fn test_recommendation_serializes_reservation_inline() {
        let rec = DiningRecommendation {
            name: "Wonderland Cafe".to_string(),
            cuisine: "American".to_string(),
            price_tier: PriceTier::Moderate,
            rating: 4.4,
            address: "206 Main St, Gardiner, MT".to_string(),
            contact: "406-555-4567".to_string(),
            reservation: Reservation::from_slots(vec!["5:00 PM".to_string()]),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["reservations"], "available");
        assert_eq!(json["time_slots"][0], "5:00 PM");
        assert_eq!(json["price_tier"], "moderate");
    }
}
