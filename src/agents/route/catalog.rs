//! Static route catalog for Yellowstone and a gazetteer of common trip origins

use crate::models::Location;

/// A sight or town on a catalog route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub id: &'static str,
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    /// How much a traveler gains from extra time here, 1-10
    pub highlight: u8,
    /// Roads driven to arrive here from the previous waypoint
    pub roads_in: &'static [&'static str],
    /// Town whose restaurants serve visitors of this waypoint
    pub dining_town: &'static str,
}

impl Waypoint {
    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogRoute {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Gateway town where the route enters the park
    pub gateway: Waypoint,
    /// Sights in driving order
    pub sights: &'static [Waypoint],
    /// Drive back to the gateway after the last sight
    pub returns_to_gateway: bool,
}

/// A known place a trip can start from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    /// Highways from here toward the park
    pub roads: &'static [&'static str],
}

impl Origin {
    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude, self.name)
    }
}

const WEST_YELLOWSTONE: Waypoint = Waypoint {
    id: "west-yellowstone",
    name: "West Yellowstone",
    latitude: 44.6621,
    longitude: -111.1041,
    highlight: 2,
    roads_in: &["US-191", "US-20"],
    dining_town: "West Yellowstone",
};

const GARDINER: Waypoint = Waypoint {
    id: "gardiner",
    name: "Gardiner",
    latitude: 45.0322,
    longitude: -110.7053,
    highlight: 2,
    roads_in: &["US-89"],
    dining_town: "Gardiner",
};

const CODY: Waypoint = Waypoint {
    id: "cody",
    name: "Cody",
    latitude: 44.5263,
    longitude: -109.0565,
    highlight: 3,
    roads_in: &["US-14", "US-20"],
    dining_town: "Cody",
};

const JACKSON: Waypoint = Waypoint {
    id: "jackson",
    name: "Jackson",
    latitude: 43.4799,
    longitude: -110.7624,
    highlight: 4,
    roads_in: &["US-191", "US-89"],
    dining_town: "Jackson",
};

const GRAND_PRISMATIC: Waypoint = Waypoint {
    id: "grand-prismatic-spring",
    name: "Grand Prismatic Spring",
    latitude: 44.5251,
    longitude: -110.8382,
    highlight: 9,
    roads_in: &["West Entrance Road", "Grand Loop Road"],
    dining_town: "West Yellowstone",
};

const OLD_FAITHFUL: Waypoint = Waypoint {
    id: "old-faithful",
    name: "Old Faithful",
    latitude: 44.4605,
    longitude: -110.8281,
    highlight: 10,
    roads_in: &["Grand Loop Road"],
    dining_town: "West Yellowstone",
};

const WEST_THUMB: Waypoint = Waypoint {
    id: "west-thumb",
    name: "West Thumb Geyser Basin",
    latitude: 44.4166,
    longitude: -110.5734,
    highlight: 6,
    roads_in: &["Grand Loop Road"],
    dining_town: "Jackson",
};

const LEWIS_FALLS: Waypoint = Waypoint {
    id: "lewis-falls",
    name: "Lewis Falls",
    latitude: 44.2810,
    longitude: -110.6290,
    highlight: 4,
    roads_in: &["US-89", "South Entrance Road"],
    dining_town: "Jackson",
};

const YELLOWSTONE_LAKE: Waypoint = Waypoint {
    id: "yellowstone-lake",
    name: "Yellowstone Lake",
    latitude: 44.5653,
    longitude: -110.3734,
    highlight: 7,
    roads_in: &["East Entrance Road", "Grand Loop Road"],
    dining_town: "Cody",
};

const HAYDEN_VALLEY: Waypoint = Waypoint {
    id: "hayden-valley",
    name: "Hayden Valley",
    latitude: 44.6460,
    longitude: -110.4760,
    highlight: 7,
    roads_in: &["Grand Loop Road"],
    dining_town: "Canyon Village",
};

const GRAND_CANYON: Waypoint = Waypoint {
    id: "grand-canyon-of-the-yellowstone",
    name: "Grand Canyon of the Yellowstone",
    latitude: 44.7202,
    longitude: -110.4789,
    highlight: 9,
    roads_in: &["Grand Loop Road"],
    dining_town: "Canyon Village",
};

const TOWER_FALL: Waypoint = Waypoint {
    id: "tower-fall",
    name: "Tower Fall",
    latitude: 44.8918,
    longitude: -110.3871,
    highlight: 5,
    roads_in: &["Grand Loop Road"],
    dining_town: "Gardiner",
};

const LAMAR_VALLEY: Waypoint = Waypoint {
    id: "lamar-valley",
    name: "Lamar Valley",
    latitude: 44.8983,
    longitude: -110.2210,
    highlight: 8,
    roads_in: &["Northeast Entrance Road"],
    dining_town: "Gardiner",
};

const MAMMOTH: Waypoint = Waypoint {
    id: "mammoth-hot-springs",
    name: "Mammoth Hot Springs",
    latitude: 44.9766,
    longitude: -110.7030,
    highlight: 8,
    roads_in: &["Grand Loop Road"],
    dining_town: "Gardiner",
};

const NORRIS: Waypoint = Waypoint {
    id: "norris-geyser-basin",
    name: "Norris Geyser Basin",
    latitude: 44.7266,
    longitude: -110.7040,
    highlight: 6,
    roads_in: &["Grand Loop Road"],
    dining_town: "West Yellowstone",
};

pub const ROUTES: &[CatalogRoute] = &[
    CatalogRoute {
        id: "classic",
        name: "Grand Loop",
        description: "The full figure-eight: geysers, canyon, wildlife and terraces",
        gateway: WEST_YELLOWSTONE,
        sights: &[
            GRAND_PRISMATIC,
            OLD_FAITHFUL,
            WEST_THUMB,
            GRAND_CANYON,
            LAMAR_VALLEY,
            MAMMOTH,
            NORRIS,
        ],
        returns_to_gateway: true,
    },
    CatalogRoute {
        id: "north-loop",
        name: "Northern Range Wildlife Route",
        description: "Terraces and the best wolf and bison country in the park",
        gateway: GARDINER,
        sights: &[MAMMOTH, TOWER_FALL, LAMAR_VALLEY],
        returns_to_gateway: false,
    },
    CatalogRoute {
        id: "south-entrance",
        name: "South Entrance Geyser Route",
        description: "From Jackson past the lake to the geyser basins",
        gateway: JACKSON,
        sights: &[LEWIS_FALLS, WEST_THUMB, OLD_FAITHFUL, GRAND_PRISMATIC],
        returns_to_gateway: false,
    },
    CatalogRoute {
        id: "east-entrance",
        name: "East Entrance Canyon Route",
        description: "Over Sylvan Pass to the lake, canyon and Lamar Valley",
        gateway: CODY,
        sights: &[YELLOWSTONE_LAKE, HAYDEN_VALLEY, GRAND_CANYON, TOWER_FALL, LAMAR_VALLEY],
        returns_to_gateway: false,
    },
];

pub const ORIGINS: &[Origin] = &[
    Origin {
        name: "Denver",
        latitude: 39.7392,
        longitude: -104.9903,
        roads: &["I-25", "I-80", "US-287"],
    },
    Origin {
        name: "Salt Lake City",
        latitude: 40.7608,
        longitude: -111.8910,
        roads: &["I-15", "US-20"],
    },
    Origin {
        name: "Bozeman",
        latitude: 45.6770,
        longitude: -111.0429,
        roads: &["US-191", "I-90", "US-89"],
    },
    Origin {
        name: "Billings",
        latitude: 45.7833,
        longitude: -108.5007,
        roads: &["I-90", "US-212", "WY-120"],
    },
    Origin {
        name: "Idaho Falls",
        latitude: 43.4917,
        longitude: -112.0339,
        roads: &["US-20"],
    },
    Origin {
        name: "Jackson",
        latitude: 43.4799,
        longitude: -110.7624,
        roads: &["US-191", "US-89"],
    },
    Origin {
        name: "Cody",
        latitude: 44.5263,
        longitude: -109.0565,
        roads: &["US-14", "WY-120"],
    },
    Origin {
        name: "West Yellowstone",
        latitude: 44.6621,
        longitude: -111.1041,
        roads: &["US-191"],
    },
    Origin {
        name: "Gardiner",
        latitude: 45.0322,
        longitude: -110.7053,
        roads: &["US-89"],
    },
];

#[must_use]
pub fn find_route(route_id: &str) -> Option<&'static CatalogRoute> {
    let wanted = route_id.trim();
    ROUTES.iter().find(|r| r.id.eq_ignore_ascii_case(wanted))
}

/// Match "Denver, CO" or "denver" against the gazetteer
#[must_use]
pub fn find_origin(start: &str) -> Option<&'static Origin> {
    let place = start.split(',').next().unwrap_or(start).trim();
    ORIGINS.iter().find(|o| o.name.eq_ignore_ascii_case(place))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(find_route("Classic").unwrap().name, "Grand Loop");
        assert!(find_route("mars-rover").is_none());
        assert_eq!(find_origin("Denver, CO").unwrap().name, "Denver");
        assert!(find_origin("Atlantis").is_none());
    }

    #[test]
    fn test_catalog_is_well_formed() {
        for route in ROUTES {
            assert!(!route.sights.is_empty(), "{} has no sights", route.id);
            let mut ids: Vec<_> = route.sights.iter().map(|s| s.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), route.sights.len(), "{} repeats a sight", route.id);
            for sight in route.sights {
                assert!((1..=10).contains(&sight.highlight));
                assert!(!sight.roads_in.is_empty());
            }
        }
    }
}
