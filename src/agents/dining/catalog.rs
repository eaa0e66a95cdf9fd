//! Restaurant listings for the park's gateway towns

use crate::models::PriceTier;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listing {
    pub name: &'static str,
    pub cuisine: &'static str,
    pub price_tier: PriceTier,
    pub rating: f64,
    pub address: &'static str,
    pub phone: &'static str,
    pub accessible: bool,
    pub trail_friendly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Town {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub listings: &'static [Listing],
}

pub const TOWNS: &[Town] = &[
    Town {
        name: "West Yellowstone",
        latitude: 44.6621,
        longitude: -111.1041,
        listings: &[
            Listing {
                name: "Madison Crossing Lounge",
                cuisine: "American",
                price_tier: PriceTier::Moderate,
                rating: 4.3,
                address: "121 Madison Ave",
                phone: "406-555-1234",
                accessible: true,
                trail_friendly: false,
            },
            Listing {
                name: "Cafe Madriz",
                cuisine: "Spanish",
                price_tier: PriceTier::Moderate,
                rating: 4.7,
                address: "311 Canyon St",
                phone: "406-555-2345",
                accessible: false,
                trail_friendly: false,
            },
            Listing {
                name: "Wild West Pizzeria",
                cuisine: "Italian",
                price_tier: PriceTier::Budget,
                rating: 4.1,
                address: "14 Madison Ave",
                phone: "406-555-3456",
                accessible: true,
                trail_friendly: true,
            },
            Listing {
                name: "Running Bear Pancake House",
                cuisine: "American",
                price_tier: PriceTier::Budget,
                rating: 4.4,
                address: "538 Madison Ave",
                phone: "406-555-4321",
                accessible: true,
                trail_friendly: true,
            },
        ],
    },
    Town {
        name: "Gardiner",
        latitude: 45.0322,
        longitude: -110.7053,
        listings: &[
            Listing {
                name: "Wonderland Cafe",
                cuisine: "American",
                price_tier: PriceTier::Moderate,
                rating: 4.4,
                address: "206 Main St",
                phone: "406-555-4567",
                accessible: true,
                trail_friendly: true,
            },
            Listing {
                name: "Yellowstone Pizza Company",
                cuisine: "Italian",
                price_tier: PriceTier::Budget,
                rating: 4.0,
                address: "804 Scott St",
                phone: "406-555-5678",
                accessible: false,
                trail_friendly: true,
            },
            Listing {
                name: "Cowboy's Lodge Grill",
                cuisine: "Mexican",
                price_tier: PriceTier::Budget,
                rating: 4.2,
                address: "208 Park St",
                phone: "406-555-6543",
                accessible: true,
                trail_friendly: false,
            },
        ],
    },
    Town {
        name: "Cody",
        latitude: 44.5263,
        longitude: -109.0565,
        listings: &[
            Listing {
                name: "Proud Cut Saloon",
                cuisine: "American",
                price_tier: PriceTier::Moderate,
                rating: 4.2,
                address: "1227 Sheridan Ave",
                phone: "307-555-6789",
                accessible: false,
                trail_friendly: false,
            },
            Listing {
                name: "Millstone Pizza Company",
                cuisine: "Italian",
                price_tier: PriceTier::Budget,
                rating: 4.5,
                address: "1057 Sheridan Ave",
                phone: "307-555-7890",
                accessible: true,
                trail_friendly: true,
            },
            Listing {
                name: "Irma Restaurant",
                cuisine: "American",
                price_tier: PriceTier::Expensive,
                rating: 4.1,
                address: "1192 Sheridan Ave",
                phone: "307-555-7654",
                accessible: true,
                trail_friendly: false,
            },
        ],
    },
    Town {
        name: "Jackson",
        latitude: 43.4799,
        longitude: -110.7624,
        listings: &[
            Listing {
                name: "Gun Barrel Steak House",
                cuisine: "American",
                price_tier: PriceTier::Expensive,
                rating: 4.6,
                address: "862 W Broadway",
                phone: "307-555-8901",
                accessible: true,
                trail_friendly: false,
            },
            Listing {
                name: "Snake River Grill",
                cuisine: "American",
                price_tier: PriceTier::Expensive,
                rating: 4.8,
                address: "84 E Broadway",
                phone: "307-555-9012",
                accessible: false,
                trail_friendly: false,
            },
            Listing {
                name: "Hand Fire Pizza",
                cuisine: "Italian",
                price_tier: PriceTier::Moderate,
                rating: 4.5,
                address: "120 W Broadway",
                phone: "307-555-0123",
                accessible: true,
                trail_friendly: true,
            },
            Listing {
                name: "Hatch Taqueria",
                cuisine: "Mexican",
                price_tier: PriceTier::Moderate,
                rating: 4.3,
                address: "120 N Cache St",
                phone: "307-555-1122",
                accessible: true,
                trail_friendly: true,
            },
        ],
    },
    Town {
        // No listings; recommendations are generated
        name: "Canyon Village",
        latitude: 44.7355,
        longitude: -110.4894,
        listings: &[],
    },
];

#[must_use]
pub fn find_town(name: &str) -> Option<&'static Town> {
    TOWNS.iter().find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_town_is_known() {
        for route in crate::agents::route::catalog::ROUTES {
            for sight in route.sights {
                assert!(find_town(sight.dining_town).is_some(), "{}", sight.dining_town);
            }
        }
    }

    #[test]
    fn test_ratings_are_in_range() {
        for town in TOWNS {
            for listing in town.listings {
                assert!((0.0..=5.0).contains(&listing.rating), "{}", listing.name);
            }
        }
    }
}
