use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::catalog::{self, CatalogRoute};
use super::{
    CatalogLeg, HIGHWAY_MPH, LegEnd, MIN_APPROACH_MILES, PARK_MPH, ROAD_FACTOR, build_route_plan,
    catalog_legs, round_miles, whole_minutes,
};
use crate::agents::{AgentError, RouteAgent};
use crate::models::{Location, RoutePlan, RouteSegment};

/// Approach assumed when the start is not in the gazetteer
const UNKNOWN_APPROACH_MILES: f64 = 100.0;
const UNKNOWN_APPROACH_MINUTES: u32 = 120;
const UNKNOWN_APPROACH_ROADS: &[&str] = &["US-191", "Grand Loop Road"];

/// Catalog routes measured with great-circle distances and fixed speeds
#[derive(Debug, Clone, Default)]
pub struct OfflineRouteAgent;

impl OfflineRouteAgent {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Synchronous planning used by the trait and by tests
    pub fn plan(
        &self,
        start: &str,
        route_id: &str,
        duration_days: u8,
    ) -> Result<RoutePlan, AgentError> {
        let route = catalog::find_route(route_id).ok_or_else(|| {
            AgentError::route_not_found(format!("no catalog route named '{route_id}'"))
        })?;

        let approach = approach_segment(start, route);
        let legs = catalog_legs(route)
            .iter()
            .map(|leg| estimate_leg(leg, PARK_MPH))
            .collect();

        build_route_plan(route, approach, legs, duration_days)
    }
}

fn estimate_leg(leg: &CatalogLeg, mph: f64) -> RouteSegment {
    let from = Location::new(leg.from.latitude, leg.from.longitude, leg.from.name);
    let to = Location::new(leg.to.latitude, leg.to.longitude, leg.to.name);
    let miles = round_miles(from.distance_miles(&to) * ROAD_FACTOR);
    RouteSegment {
        origin: leg.from.name.to_string(),
        destination: leg.to.name.to_string(),
        distance_miles: miles,
        duration_minutes: whole_minutes(miles / mph * 60.0),
        roads: leg.roads.iter().map(ToString::to_string).collect(),
    }
}

fn approach_segment(start: &str, route: &CatalogRoute) -> Option<RouteSegment> {
    let gateway = &route.gateway;
    let start_label = start.trim();

    let Some(origin) = catalog::find_origin(start_label) else {
        warn!(start = start_label, "Unknown start; assuming a typical approach drive");
        return Some(RouteSegment {
            origin: start_label.to_string(),
            destination: gateway.name.to_string(),
            distance_miles: UNKNOWN_APPROACH_MILES,
            duration_minutes: UNKNOWN_APPROACH_MINUTES,
            roads: UNKNOWN_APPROACH_ROADS.iter().map(ToString::to_string).collect(),
        });
    };

    let crow_flies = origin.location().distance_miles(&gateway.location());
    if crow_flies * ROAD_FACTOR < MIN_APPROACH_MILES {
        debug!(start = origin.name, "Start is the gateway; no approach leg");
        return None;
    }

    let leg = CatalogLeg {
        from: LegEnd {
            name: origin.name,
            latitude: origin.latitude,
            longitude: origin.longitude,
        },
        to: LegEnd::from(gateway),
        roads: origin.roads,
    };
    let mut segment = estimate_leg(&leg, HIGHWAY_MPH);
    segment.origin = start_label.to_string();
    for road in gateway.roads_in {
        if !segment.roads.iter().any(|r| r == road) {
            segment.roads.push((*road).to_string());
        }
    }
    Some(segment)
}

#[async_trait]
impl RouteAgent for OfflineRouteAgent {
    fn name(&self) -> &'static str {
        "offline-route"
    }

    #[instrument(skip(self), fields(agent = "offline-route"))]
    async fn plan_route(
        &self,
        start: &str,
        route_id: &str,
        duration_days: u8,
    ) -> Result<RoutePlan, AgentError> {
        self.plan(start, route_id, duration_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureCode;

    #[test]
    fn test_classic_from_denver() {
        let plan = OfflineRouteAgent::new().plan("Denver, CO", "classic", 6).unwrap();
        let segments = plan.segments();

        assert_eq!(segments[0].origin, "Denver, CO");
        assert_eq!(segments[0].destination, "West Yellowstone");
        assert!(segments[0].distance_miles > 400.0);
        assert!(segments[0].roads.contains(&"I-25".to_string()));
        assert_eq!(segments.last().unwrap().destination, "West Yellowstone");

        for pair in segments.windows(2) {
            assert_eq!(pair[0].destination, pair[1].origin);
        }
        let sum: f64 = segments.iter().map(|s| s.distance_miles).sum();
        assert!((plan.total_distance_miles() - sum).abs() < 0.05);
        let minutes: u32 = segments.iter().map(|s| s.duration_minutes).sum();
        assert_eq!(plan.total_duration_minutes(), minutes);

        // Seven sights squeezed into six days
        assert_eq!(plan.stops().len(), 6);
        assert_eq!(plan.total_days(), 6);
    }

    #[test]
    fn test_start_at_gateway_skips_approach() {
        let plan = OfflineRouteAgent::new().plan("Gardiner", "north-loop", 3).unwrap();
        assert_eq!(plan.segments()[0].origin, "Gardiner");
        assert_eq!(plan.segments()[0].destination, "Mammoth Hot Springs");
    }

    #[test]
    fn test_unknown_start_uses_typical_approach() {
        let plan = OfflineRouteAgent::new().plan("Atlantis", "south-entrance", 4).unwrap();
        let approach = &plan.segments()[0];
        assert_eq!(approach.origin, "Atlantis");
        assert_eq!(approach.distance_miles, UNKNOWN_APPROACH_MILES);
        assert_eq!(approach.duration_minutes, UNKNOWN_APPROACH_MINUTES);
    }

    #[test]
    fn test_unknown_route() {
        let err = OfflineRouteAgent::new().plan("Denver, CO", "moon-base", 3).unwrap_err();
        assert_eq!(err.code, FailureCode::RouteNotFound);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_planning_is_deterministic() {
        let agent = OfflineRouteAgent::new();
        let a = agent.plan_route("Bozeman, MT", "east-entrance", 3).await.unwrap();
        let b = agent.plan_route("Bozeman, MT", "east-entrance", 3).await.unwrap();
        assert_eq!(a, b);
    }
}
