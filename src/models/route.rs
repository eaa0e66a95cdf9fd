//! Route plan model: a chain of driving segments grouped into trip days

use serde::{Deserialize, Serialize};

/// One driving leg between two labelled places
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub origin: String,
    pub destination: String,
    /// Driving distance in miles, always positive
    pub distance_miles: f64,
    /// Driving time in minutes, always positive
    pub duration_minutes: u32,
    /// Named roads traversed, in order
    pub roads: Vec<String>,
}

/// A day group of the trip: one or more consecutive waypoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    /// Identifier used to key dining recommendations
    pub id: String,
    pub name: String,
    /// 1-based trip day this stop starts on
    pub first_day: u8,
    /// Days spent at this stop
    pub days: u8,
    /// Sights visited during this stop, in driving order
    pub waypoints: Vec<String>,
    /// Town whose restaurants serve this stop
    pub dining_town: String,
}

/// Ordered, non-empty, chain-connected route.
///
/// `segments[i].destination == segments[i + 1].origin` for every `i`. The
/// constructor rejects anything else and deserialization goes through it, so a
/// `RoutePlan` in hand always holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RoutePlanData")]
pub struct RoutePlan {
    pub route_id: String,
    pub route_name: String,
    segments: Vec<RouteSegment>,
    stops: Vec<RouteStop>,
    total_distance_miles: f64,
    total_duration_minutes: u32,
}

/// Incoming form of a [`RoutePlan`]; serialized totals are ignored and recomputed
#[derive(Deserialize)]
struct RoutePlanData {
    route_id: String,
    route_name: String,
    segments: Vec<RouteSegment>,
    stops: Vec<RouteStop>,
}

impl TryFrom<RoutePlanData> for RoutePlan {
    type Error = String;

    fn try_from(data: RoutePlanData) -> Result<Self, Self::Error> {
        Self::new(data.route_id, data.route_name, data.segments, data.stops)
    }
}

impl RoutePlan {
    pub fn new(
        route_id: impl Into<String>,
        route_name: impl Into<String>,
        segments: Vec<RouteSegment>,
        stops: Vec<RouteStop>,
    ) -> Result<Self, String> {
        if segments.is_empty() {
            return Err("route has no segments".to_string());
        }
        for (i, segment) in segments.iter().enumerate() {
            if !(segment.distance_miles > 0.0) {
                return Err(format!(
                    "segment {i} ({} -> {}) has non-positive distance",
                    segment.origin, segment.destination
                ));
            }
            if segment.duration_minutes == 0 {
                return Err(format!(
                    "segment {i} ({} -> {}) has zero duration",
                    segment.origin, segment.destination
                ));
            }
        }
        for (i, pair) in segments.windows(2).enumerate() {
            if pair[0].destination != pair[1].origin {
                return Err(format!(
                    "segment {i} ends at '{}' but segment {} starts at '{}'",
                    pair[0].destination,
                    i + 1,
                    pair[1].origin
                ));
            }
        }

        let total_distance_miles =
            (segments.iter().map(|s| s.distance_miles).sum::<f64>() * 10.0).round() / 10.0;
        let total_duration_minutes = segments.iter().map(|s| s.duration_minutes).sum();

        Ok(Self {
            route_id: route_id.into(),
            route_name: route_name.into(),
            segments,
            stops,
            total_distance_miles,
            total_duration_minutes,
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    #[must_use]
    pub fn stops(&self) -> &[RouteStop] {
        &self.stops
    }

    #[must_use]
    pub fn total_distance_miles(&self) -> f64 {
        self.total_distance_miles
    }

    #[must_use]
    pub fn total_duration_minutes(&self) -> u32 {
        self.total_duration_minutes
    }

    pub fn stop_ids(&self) -> impl Iterator<Item = &str> {
        self.stops.iter().map(|s| s.id.as_str())
    }

    #[must_use]
    pub fn total_days(&self) -> u32 {
        self.stops.iter().map(|s| u32::from(s.days)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(origin: &str, destination: &str, miles: f64, minutes: u32) -> RouteSegment {
        RouteSegment {
            origin: origin.to_string(),
            destination: destination.to_string(),
            distance_miles: miles,
            duration_minutes: minutes,
            roads: vec!["Grand Loop Road".to_string()],
        }
    }

    #[test]
    fn test_chain_and_totals() {
        let plan = RoutePlan::new(
            "classic",
            "Grand Loop",
            vec![
                segment("Gardiner", "Mammoth Hot Springs", 5.2, 10),
                segment("Mammoth Hot Springs", "Tower-Roosevelt", 18.4, 40),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(plan.total_distance_miles(), 23.6);
        assert_eq!(plan.total_duration_minutes(), 50);
    }

    #[test]
    fn test_broken_chain_is_rejected() {
        let err = RoutePlan::new(
            "classic",
            "Grand Loop",
            vec![
                segment("Gardiner", "Mammoth Hot Springs", 5.2, 10),
                segment("Old Faithful", "West Thumb", 17.0, 35),
            ],
            vec![],
        )
        .unwrap_err();
        assert!(err.contains("Old Faithful"));
    }

    #[test]
    fn test_deserializing_checks_the_chain() {
        let plan = RoutePlan::new(
            "classic",
            "Grand Loop",
            vec![
                segment("Gardiner", "Mammoth Hot Springs", 5.2, 10),
                segment("Mammoth Hot Springs", "Tower-Roosevelt", 18.4, 40),
            ],
            vec![],
        )
        .unwrap();
        let mut json = serde_json::to_value(&plan).unwrap();
        assert_eq!(serde_json::from_value::<RoutePlan>(json.clone()).unwrap(), plan);

        json["segments"][1]["origin"] = "Old Faithful".into();
        let err = serde_json::from_value::<RoutePlan>(json).unwrap_err();
        assert!(err.to_string().contains("Old Faithful"));
    }

    #[test]
    fn test_empty_and_degenerate_segments_are_rejected() {
        assert!(RoutePlan::new("x", "x", vec![], vec![]).is_err());
        assert!(RoutePlan::new("x", "x", vec![segment("A", "B", 0.0, 10)], vec![]).is_err());
        assert!(RoutePlan::new("x", "x", vec![segment("A", "B", 1.0, 0)], vec![]).is_err());
    }
}
