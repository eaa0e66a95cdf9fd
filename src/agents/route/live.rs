use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::catalog::{self, CatalogRoute};
use super::{CatalogLeg, MIN_APPROACH_MILES, build_route_plan, catalog_legs, round_miles, whole_minutes};
use crate::agents::{AgentError, RouteAgent};
use crate::cache::{PersistentCache, jittered_ttl};
use crate::config::TripPlanConfig;
use crate::http::{ApiClient, HttpError};
use crate::models::{FailureCode, Location, RoutePlan, RouteSegment};
use crate::open_meteo::OpenMeteoClient;

const METERS_PER_MILE: f64 = 1609.344;
const LEG_TTL: Duration = Duration::from_hours(24 * 7);
const GEOCODE_TTL: Duration = Duration::from_hours(24 * 30);

/// Catalog routes measured leg by leg with GraphHopper
pub struct LiveRouteAgent {
    http: ApiClient,
    open_meteo: OpenMeteoClient,
    cache: PersistentCache,
    base_url: String,
    api_key: String,
}

/// What GraphHopper told us about one leg; this is what gets cached
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MeasuredLeg {
    distance_m: f64,
    time_ms: u64,
    streets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    paths: Vec<PathResponse>,
}

#[derive(Debug, Deserialize)]
struct PathResponse {
    distance: f64,
    time: u64,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
struct Instruction {
    #[serde(default)]
    street_name: String,
}

impl PathResponse {
    fn into_measured(self) -> MeasuredLeg {
        let mut streets: Vec<String> = Vec::new();
        for name in self.instructions.into_iter().map(|i| i.street_name) {
            let name = name.trim();
            if !name.is_empty() && streets.last().is_none_or(|last| last != name) {
                streets.push(name.to_string());
            }
        }
        MeasuredLeg {
            distance_m: self.distance,
            time_ms: self.time,
            streets,
        }
    }
}

fn routing_error(err: &HttpError) -> AgentError {
    AgentError::from_http(
        err,
        FailureCode::DistanceServiceUnavailable,
        FailureCode::RouteNotFound,
    )
}

impl LiveRouteAgent {
    pub fn new(
        http: ApiClient,
        open_meteo: OpenMeteoClient,
        cache: PersistentCache,
        config: &TripPlanConfig,
    ) -> Result<Self> {
        let api_key = config
            .providers
            .graphhopper_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("providers.graphhopper_api_key is not set"))?;
        Ok(Self {
            http,
            open_meteo,
            cache,
            base_url: config.providers.graphhopper_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Geocode the start, cached by name
    async fn resolve_start(&self, start: &str) -> Result<Location, AgentError> {
        let key = format!("geocode:{}", start.trim().to_lowercase());
        match self.cache.get::<Location>(&key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Geocode cache read failed"),
        }

        let found = self
            .open_meteo
            .geocode(start)
            .await
            .map_err(|e| routing_error(&e))?
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::route_not_found(format!("could not find start '{start}'")))?;

        if let Err(e) = self.cache.put(&key, found.clone(), GEOCODE_TTL).await {
            warn!(error = %e, "Failed to cache geocoding result");
        }
        Ok(found)
    }

    #[instrument(skip(self), fields(from = %from.name, to = %to.name))]
    async fn measure(&self, from: &Location, to: &Location) -> Result<MeasuredLeg, AgentError> {
        let key = from.cache_key("route", &format!("{:.4},{:.4}", to.latitude, to.longitude));
        match self.cache.get::<MeasuredLeg>(&key).await {
            Ok(Some(hit)) => {
                debug!("Route leg cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Route cache read failed"),
        }

        debug!("Calling the routing API");
        let url = format!(
            "{}/route?point={},{}&point={},{}&profile=car&points_encoded=false&calc_points=false&instructions=true&key={}",
            self.base_url,
            from.latitude,
            from.longitude,
            to.latitude,
            to.longitude,
            urlencoding::encode(&self.api_key)
        );
        let response: RouteResponse = self
            .http
            .get_json(&url, HeaderMap::new())
            .await
            .map_err(|e| routing_error(&e))?;

        let leg = response
            .paths
            .into_iter()
            .next()
            .map(PathResponse::into_measured)
            .ok_or_else(|| {
                AgentError::route_not_found(format!("no drivable path from {} to {}", from.name, to.name))
            })?;

        if let Err(e) = self.cache.put(&key, leg.clone(), jittered_ttl(LEG_TTL)).await {
            warn!(error = %e, "Failed to cache route leg");
        }
        Ok(leg)
    }

    async fn measure_segment(
        &self,
        from: Location,
        to: Location,
        fallback_roads: &[&str],
    ) -> Result<RouteSegment, AgentError> {
        let leg = self.measure(&from, &to).await?;
        if !(leg.distance_m > 0.0) {
            return Err(AgentError::invalid_output(format!(
                "routing returned a zero-length leg from {} to {}",
                from.name, to.name
            )));
        }
        let roads = if leg.streets.is_empty() {
            fallback_roads.iter().map(ToString::to_string).collect()
        } else {
            leg.streets
        };
        Ok(RouteSegment {
            origin: from.name,
            destination: to.name,
            distance_miles: round_miles(leg.distance_m / METERS_PER_MILE),
            duration_minutes: whole_minutes(leg.time_ms as f64 / 60_000.0),
            roads,
        })
    }

    async fn approach(
        &self,
        start: &str,
        route: &CatalogRoute,
    ) -> Result<Option<RouteSegment>, AgentError> {
        let mut from = self.resolve_start(start).await?;
        let gateway = route.gateway.location();
        if from.distance_miles(&gateway) < MIN_APPROACH_MILES {
            debug!(start, "Start is the gateway; no approach leg");
            return Ok(None);
        }
        from.name = start.trim().to_string();
        let fallback = catalog::find_origin(start).map_or(route.gateway.roads_in, |o| o.roads);
        self.measure_segment(from, gateway, fallback).await.map(Some)
    }
}

fn leg_locations(leg: &CatalogLeg) -> (Location, Location) {
    (
        Location::new(leg.from.latitude, leg.from.longitude, leg.from.name),
        Location::new(leg.to.latitude, leg.to.longitude, leg.to.name),
    )
}

#[async_trait]
impl RouteAgent for LiveRouteAgent {
    fn name(&self) -> &'static str {
        "live-route"
    }

    #[instrument(skip(self), fields(agent = "live-route"))]
    async fn plan_route(
        &self,
        start: &str,
        route_id: &str,
        duration_days: u8,
    ) -> Result<RoutePlan, AgentError> {
        let route = catalog::find_route(route_id).ok_or_else(|| {
            AgentError::route_not_found(format!("no catalog route named '{route_id}'"))
        })?;

        let catalog = catalog_legs(route);
        let legs = try_join_all(catalog.iter().map(|leg| {
            let (from, to) = leg_locations(leg);
            self.measure_segment(from, to, leg.roads)
        }));
        let (approach, legs) = tokio::try_join!(self.approach(start, route), legs)?;

        build_route_plan(route, approach, legs, duration_days)
    }
}
