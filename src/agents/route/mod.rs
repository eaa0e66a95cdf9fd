//! Route agents and the day-allocation policy they share
//!
//! Every agent produces the same shape: an optional approach leg from the
//! traveler's start to the route's gateway, then one leg per catalog waypoint.
//! How the legs are measured differs per mode; how sights are grouped into
//! trip days does not, and lives here.

use tracing::debug;

use super::AgentError;
use crate::models::{RoutePlan, RouteSegment, RouteStop};

pub mod catalog;
pub mod live;
pub mod offline;

use catalog::{CatalogRoute, Waypoint};

/// Road factor applied to great-circle distances
pub const ROAD_FACTOR: f64 = 1.25;
/// Average speed outside the park, mph
pub const HIGHWAY_MPH: f64 = 50.0;
/// Average speed on park roads, mph
pub const PARK_MPH: f64 = 35.0;
/// Approaches shorter than this are dropped
pub const MIN_APPROACH_MILES: f64 = 1.0;

/// A labelled endpoint of a catalog leg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegEnd {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Waypoint> for LegEnd {
    fn from(waypoint: &Waypoint) -> Self {
        Self {
            name: waypoint.name,
            latitude: waypoint.latitude,
            longitude: waypoint.longitude,
        }
    }
}

/// One leg of a catalog route, before it is measured
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogLeg {
    pub from: LegEnd,
    pub to: LegEnd,
    pub roads: &'static [&'static str],
}

/// The legs of `route` in driving order: gateway to the first sight, sight to
/// sight, then back to the gateway for loops
#[must_use]
pub fn catalog_legs(route: &CatalogRoute) -> Vec<CatalogLeg> {
    let mut legs = Vec::with_capacity(route.sights.len() + 1);
    let mut previous = LegEnd::from(&route.gateway);
    for sight in route.sights {
        let next = LegEnd::from(sight);
        legs.push(CatalogLeg {
            from: previous,
            to: next,
            roads: sight.roads_in,
        });
        previous = next;
    }
    if route.returns_to_gateway {
        legs.push(CatalogLeg {
            from: previous,
            to: LegEnd::from(&route.gateway),
            roads: route.gateway.roads_in,
        });
    }
    legs
}

#[derive(Debug)]
struct DayGroup {
    first: usize,
    last: usize,
    days: u8,
}

/// Group `sights` into at most `duration_days` stops.
///
/// `link_miles[i]` is the driving distance from sight `i` to sight `i + 1`.
/// Tight trips merge the adjacent pair with the shortest link, earliest first
/// on ties. Loose trips hand extra days round-robin to sights by descending
/// highlight, catalog order on ties.
fn allocate_days(sights: &[Waypoint], link_miles: &[f64], duration_days: u8) -> Vec<DayGroup> {
    let days = usize::from(duration_days.max(1));
    let mut groups: Vec<DayGroup> = (0..sights.len())
        .map(|i| DayGroup {
            first: i,
            last: i,
            days: 1,
        })
        .collect();

    while groups.len() > days {
        let Some(merge_at) = (0..groups.len() - 1).min_by(|&a, &b| {
            let link_a = link_miles.get(groups[a].last).copied().unwrap_or(f64::MAX);
            let link_b = link_miles.get(groups[b].last).copied().unwrap_or(f64::MAX);
            link_a.total_cmp(&link_b)
        }) else {
            break;
        };
        let absorbed = groups.remove(merge_at + 1);
        groups[merge_at].last = absorbed.last;
        debug!(
            into = sights[groups[merge_at].first].id,
            absorbed = sights[absorbed.first].id,
            "Merged stops for a tight trip"
        );
    }

    if !groups.is_empty() && groups.len() < days {
        let mut by_highlight: Vec<usize> = (0..groups.len()).collect();
        by_highlight.sort_by_key(|&i| std::cmp::Reverse(sights[groups[i].first].highlight));
        let extra = days - groups.len();
        for n in 0..extra {
            let target = by_highlight[n % by_highlight.len()];
            groups[target].days += 1;
        }
    }

    groups
}

/// Assemble a plan from measured legs.
///
/// `legs` must be the measured [`catalog_legs`] of `route`, in the same order.
pub fn build_route_plan(
    route: &CatalogRoute,
    approach: Option<RouteSegment>,
    legs: Vec<RouteSegment>,
    duration_days: u8,
) -> Result<RoutePlan, AgentError> {
    if legs.len() < route.sights.len() {
        return Err(AgentError::invalid_output(format!(
            "route '{}' has {} sights but only {} legs were measured",
            route.id,
            route.sights.len(),
            legs.len()
        )));
    }

    // legs[0] reaches the first sight; legs[i + 1] links sight i to sight i + 1
    let link_miles: Vec<f64> = legs
        .iter()
        .skip(1)
        .take(route.sights.len().saturating_sub(1))
        .map(|leg| leg.distance_miles)
        .collect();

    let mut first_day: u8 = 1;
    let stops: Vec<RouteStop> = allocate_days(route.sights, &link_miles, duration_days)
        .into_iter()
        .map(|group| {
            let members = &route.sights[group.first..=group.last];
            let stop = RouteStop {
                id: members[0].id.to_string(),
                name: members
                    .iter()
                    .map(|w| w.name)
                    .collect::<Vec<_>>()
                    .join(" & "),
                first_day,
                days: group.days,
                waypoints: members.iter().map(|w| w.name.to_string()).collect(),
                dining_town: members[0].dining_town.to_string(),
            };
            first_day = first_day.saturating_add(group.days);
            stop
        })
        .collect();

    let segments: Vec<RouteSegment> = approach.into_iter().chain(legs).collect();
    RoutePlan::new(route.id, route.name, segments, stops).map_err(AgentError::invalid_output)
}

/// Round to one decimal, never below 0.1 miles
pub(crate) fn round_miles(miles: f64) -> f64 {
    ((miles * 10.0).round() / 10.0).max(0.1)
}

/// Whole minutes, never zero
pub(crate) fn whole_minutes(minutes: f64) -> u32 {
    (minutes.ceil() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn segment(from: &str, to: &str, miles: f64) -> RouteSegment {
        RouteSegment {
            origin: from.to_string(),
            destination: to.to_string(),
            distance_miles: miles,
            duration_minutes: 30,
            roads: vec!["Grand Loop Road".to_string()],
        }
    }

    fn measured(route: &CatalogRoute, miles: &[f64]) -> Vec<RouteSegment> {
        catalog_legs(route)
            .iter()
            .zip(miles)
            .map(|(leg, &m)| segment(leg.from.name, leg.to.name, m))
            .collect()
    }

    fn north_loop() -> &'static CatalogRoute {
        catalog::find_route("north-loop").unwrap()
    }

    #[test]
    fn test_catalog_legs_chain() {
        for route in catalog::ROUTES {
            let legs = catalog_legs(route);
            for pair in legs.windows(2) {
                assert_eq!(pair[0].to.name, pair[1].from.name);
            }
            let expected = route.sights.len() + usize::from(route.returns_to_gateway);
            assert_eq!(legs.len(), expected);
        }
    }

    #[test]
    fn test_tight_trip_merges_shortest_link() {
        // Mammoth -> Tower 20 mi, Tower -> Lamar 12 mi: Tower and Lamar merge
        let route = north_loop();
        let plan = build_route_plan(route, None, measured(route, &[5.0, 20.0, 12.0]), 2).unwrap();
        let ids: Vec<_> = plan.stop_ids().collect();
        assert_eq!(ids, ["mammoth-hot-springs", "tower-fall"]);
        assert_eq!(plan.stops()[1].name, "Tower Fall & Lamar Valley");
        assert_eq!(plan.stops()[1].first_day, 2);
        assert_eq!(plan.total_days(), 2);
        assert_eq!(plan.segments().len(), 3);
    }

    #[test]
    fn test_merge_ties_go_to_the_earliest_pair() {
        let route = north_loop();
        let plan = build_route_plan(route, None, measured(route, &[5.0, 15.0, 15.0]), 2).unwrap();
        assert_eq!(plan.stops()[0].waypoints, ["Mammoth Hot Springs", "Tower Fall"]);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(3, 3)]
    #[case(6, 3)]
    #[case(14, 3)]
    fn test_stop_count_and_days(#[case] duration: u8, #[case] stops: usize) {
        let route = north_loop();
        let plan =
            build_route_plan(route, None, measured(route, &[5.0, 20.0, 12.0]), duration).unwrap();
        assert_eq!(plan.stops().len(), stops);
        assert_eq!(plan.total_days(), u32::from(duration));
    }

    #[test]
    fn test_loose_trip_favours_highlights() {
        // Mammoth and Lamar (8) outrank Tower Fall (5); Mammoth wins the tie by order
        let route = north_loop();
        let plan = build_route_plan(route, None, measured(route, &[5.0, 20.0, 12.0]), 4).unwrap();
        let days: Vec<_> = plan.stops().iter().map(|s| s.days).collect();
        assert_eq!(days, [2, 1, 1]);
        let plan = build_route_plan(route, None, measured(route, &[5.0, 20.0, 12.0]), 5).unwrap();
        let days: Vec<_> = plan.stops().iter().map(|s| s.days).collect();
        assert_eq!(days, [2, 1, 2]);
        let first_days: Vec<_> = plan.stops().iter().map(|s| s.first_day).collect();
        assert_eq!(first_days, [1, 3, 4]);
    }

    #[test]
    fn test_missing_legs_are_invalid_output() {
        let route = north_loop();
        let err = build_route_plan(route, None, measured(route, &[5.0]), 3).unwrap_err();
        assert_eq!(err.code, crate::models::FailureCode::InvalidOutput);
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_miles(0.01), 0.1);
        assert_eq!(round_miles(12.34), 12.3);
        assert_eq!(whole_minutes(0.2), 1);
        assert_eq!(whole_minutes(30.1), 31);
    }
}
