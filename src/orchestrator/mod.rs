//! The planning orchestrator
//!
//! Runs the fixed step list for one request: dates first, then weather and
//! route side by side, then dining once the route is known. Every agent
//! outcome is captured as a [`Section`]; only date resolution can fail the
//! whole run.

use std::pin::pin;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, OptionFuture};
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::agents::dining::check_plan;
use crate::agents::{AgentError, AgentSet};
use crate::config::{OrchestrationConfig, TripPlanConfig};
use crate::error::OrchestrationError;
use crate::models::weather::check_coverage;
use crate::models::{
    DateRange, DateRangeCandidate, DiningPlan, FailureCode, Location, PlanState, Preferences,
    RoutePlan, Section, TripPlan, TripRequest, WeatherDay,
};

pub mod retry;
pub mod state;

use retry::{Attempted, RetryPolicy, run_with_retry};
use state::StateLog;

/// Global deadline: its length, for reporting, and the instant it expires
type Deadline = Option<(Duration, Instant)>;

type Sections = (Section<Vec<WeatherDay>>, Section<RoutePlan>, Section<DiningPlan>);

pub struct PlanOrchestrator {
    agents: AgentSet,
    destination: Location,
    settings: OrchestrationConfig,
}

impl std::fmt::Debug for PlanOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanOrchestrator")
            .field("agents", &self.agents)
            .field("destination", &self.destination.name)
            .finish_non_exhaustive()
    }
}

impl PlanOrchestrator {
    #[must_use]
    pub fn new(agents: AgentSet, config: &TripPlanConfig) -> Self {
        Self {
            agents,
            destination: config.planner.destination_location(),
            settings: config.orchestration.clone(),
        }
    }

    /// Plan one trip.
    ///
    /// Returns a plan whose sections each carry their own outcome, or an
    /// [`OrchestrationError`] when no dates could be settled.
    #[instrument(skip_all, fields(start = %request.starting_location, route = %request.route_id, days = request.duration_days))]
    pub async fn plan(&self, request: &TripRequest) -> Result<TripPlan, OrchestrationError> {
        let mut states = StateLog::new();
        let deadline: Deadline = self
            .settings
            .global_deadline()
            .map(|limit| (limit, Instant::now() + limit));

        if let Err(message) = request.validate() {
            states.enter(PlanState::Failed);
            return Err(OrchestrationError::InvalidRequest(message));
        }

        let date_options = match self.resolve_dates(request, deadline).await {
            Ok(options) => options,
            Err(e) => {
                warn!(code = e.code(), error = %e, "Could not settle travel dates");
                states.enter(PlanState::Failed);
                return Err(e);
            }
        };
        states.enter(PlanState::DatesResolved);

        // The advisor's ranking is final: the first option is the trip
        let Some(chosen_dates) = date_options.first().cloned() else {
            states.enter(PlanState::Failed);
            return Err(OrchestrationError::DateResolution {
                code: FailureCode::InvalidOutput,
                message: "date advisor returned no options".to_string(),
                attempts: 1,
            });
        };
        info!(
            start = %chosen_dates.start_date,
            end = %chosen_dates.end_date,
            total_score = chosen_dates.total_score,
            "Travel dates chosen"
        );

        let (weather, route, dining) = self
            .run_agents(request, &chosen_dates.range(), deadline, &mut states)
            .await?;
        states.enter(PlanState::Complete);

        info!(
            weather = %weather.status(),
            route = %route.status(),
            dining = %dining.status(),
            "Trip plan complete"
        );

        Ok(TripPlan {
            request: request.clone(),
            date_options,
            chosen_dates,
            weather,
            route,
            dining,
            state_history: states.into_history(),
        })
    }

    async fn resolve_dates(
        &self,
        request: &TripRequest,
        deadline: Deadline,
    ) -> Result<Vec<DateRangeCandidate>, OrchestrationError> {
        let policy = RetryPolicy::from_config(
            &self.settings,
            self.settings.date_timeout(),
            FailureCode::DeadlineExceeded,
        );
        let call = run_with_retry("dates", &policy, || self.agents.dates.propose_dates(request));

        let attempted = match deadline {
            Some((limit, at)) => tokio::time::timeout_at(at, call)
                .await
                .map_err(|_| OrchestrationError::GlobalDeadlineExceeded(limit))?,
            None => call.await,
        };

        let attempts = attempted.attempts;
        match attempted.outcome {
            Ok(candidates) => check_candidates(request, candidates).map_err(|message| {
                OrchestrationError::DateResolution {
                    code: FailureCode::InvalidOutput,
                    message,
                    attempts,
                }
            }),
            Err(e) => Err(match e.code {
                FailureCode::NoFeasibleWindow => OrchestrationError::NoFeasibleWindow(e.message),
                FailureCode::DeadlineExceeded => {
                    OrchestrationError::DateAdvisorTimedOut(policy.call_timeout)
                }
                code => OrchestrationError::DateResolution {
                    code,
                    message: e.message,
                    attempts,
                },
            }),
        }
    }

    async fn run_agents(
        &self,
        request: &TripRequest,
        range: &DateRange,
        deadline: Deadline,
        states: &mut StateLog,
    ) -> Result<Sections, OrchestrationError> {
        let agent_timeout = self.settings.agent_timeout();
        let weather_policy =
            RetryPolicy::from_config(&self.settings, agent_timeout, FailureCode::ProviderUnavailable);
        let route_policy = RetryPolicy::from_config(
            &self.settings,
            agent_timeout,
            FailureCode::DistanceServiceUnavailable,
        );

        states.enter(PlanState::WeatherAndRoutePending);
        let mut weather_call = pin!(run_with_retry("weather", &weather_policy, || {
            self.agents.weather.forecast(&self.destination, range)
        }));
        let mut route_call = pin!(run_with_retry("route", &route_policy, || {
            self.agents.route.plan_route(
                &request.starting_location,
                &request.route_id,
                request.duration_days,
            )
        }));
        let mut dining_call: Option<BoxFuture<'_, Attempted<DiningPlan>>> = None;
        let mut expiry = pin!(async move {
            match deadline {
                Some((_, at)) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        });

        let mut weather: Option<Section<Vec<WeatherDay>>> = None;
        let mut route: Option<Section<RoutePlan>> = None;
        let mut dining: Option<Section<DiningPlan>> = None;

        while weather.is_none() || route.is_none() || dining.is_none() {
            tokio::select! {
                biased;

                attempted = &mut weather_call, if weather.is_none() => {
                    weather = Some(settle("weather", attempted, |days: &Vec<WeatherDay>| {
                        check_coverage(days, range).map_err(AgentError::invalid_output)
                    }));
                }

                attempted = &mut route_call, if route.is_none() => {
                    let section = settle("route", attempted, |_: &RoutePlan| Ok(()));
                    states.enter(PlanState::RouteResolved);
                    match section.data() {
                        Some(plan) => {
                            states.enter(PlanState::DiningPending);
                            dining_call = Some(self.dining_call(
                                plan.clone(),
                                request.preferences.clone(),
                                weather_policy,
                            ));
                        }
                        None => {
                            info!("Route did not succeed; skipping dining");
                            dining = Some(Section::Skipped {
                                dependency: "route".to_string(),
                            });
                        }
                    }
                    route = Some(section);
                }

                Some(attempted) = OptionFuture::from(dining_call.as_mut()), if dining.is_none() && dining_call.is_some() => {
                    let route_plan = route.as_ref().and_then(Section::data);
                    dining = Some(settle("dining", attempted, |plan: &DiningPlan| match route_plan {
                        Some(route_plan) => check_plan(plan, route_plan, &request.preferences),
                        None => Ok(()),
                    }));
                }

                () = &mut expiry => {
                    let limit = deadline.map_or(Duration::ZERO, |(limit, _)| limit);
                    warn!(?limit, "Global deadline expired; cancelling pending agents");
                    states.enter(PlanState::DeadlineExceeded);

                    if weather.is_none() && route.is_none() {
                        states.enter(PlanState::Failed);
                        return Err(OrchestrationError::GlobalDeadlineExceeded(limit));
                    }
                    if weather.is_none() {
                        weather = Some(cancelled(limit));
                    }
                    if route.is_none() {
                        route = Some(cancelled(limit));
                        dining = Some(Section::Skipped {
                            dependency: "route".to_string(),
                        });
                    }
                    if dining.is_none() {
                        dining = Some(cancelled(limit));
                    }
                }
            }
        }

        match (weather, route, dining) {
            (Some(weather), Some(route), Some(dining)) => Ok((weather, route, dining)),
            _ => Err(OrchestrationError::DateResolution {
                code: FailureCode::InvalidOutput,
                message: "planning ended with an unsettled section".to_string(),
                attempts: 0,
            }),
        }
    }

    fn dining_call(
        &self,
        route: RoutePlan,
        preferences: Preferences,
        policy: RetryPolicy,
    ) -> BoxFuture<'_, Attempted<DiningPlan>> {
        let agent = &self.agents.dining;
        async move {
            run_with_retry("dining", &policy, || agent.recommend(&route, &preferences)).await
        }
        .boxed()
    }
}

/// Turn an agent outcome into a plan section, checking successful data first
fn settle<T>(
    step: &'static str,
    attempted: Attempted<T>,
    validate: impl FnOnce(&T) -> Result<(), AgentError>,
) -> Section<T> {
    let Attempted { outcome, attempts } = attempted;
    match outcome.and_then(|data| validate(&data).map(|()| data)) {
        Ok(data) => {
            info!(step, attempts, "Section succeeded");
            Section::Succeeded { data, attempts }
        }
        Err(e) => {
            warn!(step, attempts, code = %e.code, error = %e.message, "Section failed");
            Section::failed(e.code, e.message, attempts)
        }
    }
}

fn cancelled<T>(limit: Duration) -> Section<T> {
    Section::failed(
        FailureCode::DeadlineExceeded,
        format!("cancelled when the {limit:?} planning deadline expired"),
        1,
    )
}

/// Candidates must be non-empty, ranked, inside the window, and the requested
/// length unless flagged as shortened to the whole window
fn check_candidates(
    request: &TripRequest,
    candidates: Vec<DateRangeCandidate>,
) -> Result<Vec<DateRangeCandidate>, String> {
    if candidates.is_empty() {
        return Err("date advisor returned no options".to_string());
    }
    let window = &request.window;
    for c in &candidates {
        if !window.contains(c.start_date) || !window.contains(c.end_date) || c.end_date < c.start_date {
            return Err(format!(
                "{}..{} is outside the travel window {}..{}",
                c.start_date, c.end_date, window.earliest, window.latest
            ));
        }
        let fits = if c.shortened {
            c.span_days() == window.len_days() && window.len_days() < i64::from(request.duration_days)
        } else {
            c.span_days() == i64::from(request.duration_days)
        };
        if !fits {
            return Err(format!(
                "{}..{} spans {} days but {} were requested",
                c.start_date,
                c.end_date,
                c.span_days(),
                request.duration_days
            ));
        }
    }
    if candidates
        .windows(2)
        .any(|pair| pair[0].rank_cmp(&pair[1]) == std::cmp::Ordering::Greater)
    {
        return Err("date options are not ranked best first".to_string());
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScoreWeights, TravelWindow};

    fn request(days: u8) -> TripRequest {
        TripRequest {
            starting_location: "Denver, CO".to_string(),
            window: TravelWindow::new(
                "2025-07-01".parse().unwrap(),
                "2025-07-10".parse().unwrap(),
            ),
            duration_days: days,
            preferences: Preferences::default(),
            route_id: "classic".to_string(),
        }
    }

    fn candidate(start: &str, days: u8, total: f64) -> DateRangeCandidate {
        let range = DateRange::starting_at(start.parse().unwrap(), days).unwrap();
        let mut c = DateRangeCandidate::scored(range, total, total, total, &ScoreWeights::default());
        c.total_score = total;
        c
    }

    #[test]
    fn test_check_candidates_accepts_ranked_options() {
        let options = vec![candidate("2025-07-02", 3, 0.9), candidate("2025-07-05", 3, 0.7)];
        assert!(check_candidates(&request(3), options).is_ok());
    }

    #[test]
    fn test_check_candidates_rejects_bad_output() {
        let unranked = vec![candidate("2025-07-02", 3, 0.5), candidate("2025-07-05", 3, 0.7)];
        assert!(check_candidates(&request(3), unranked).is_err());

        let too_long = vec![candidate("2025-07-02", 4, 0.5)];
        assert!(check_candidates(&request(3), too_long).is_err());

        let outside = vec![candidate("2025-07-09", 3, 0.5)];
        assert!(check_candidates(&request(3), outside).is_err());

        assert!(check_candidates(&request(3), vec![]).is_err());
    }

    #[test]
    fn test_shortened_option_must_cover_the_window() {
        let mut whole = candidate("2025-07-01", 10, 0.5);
        whole.shortened = true;
        assert!(check_candidates(&request(12), vec![whole.clone()]).is_ok());
        assert!(check_candidates(&request(5), vec![whole]).is_err());
    }

    #[tokio::test]
    async fn test_offline_plan_completes() {
        let config = TripPlanConfig::default();
        let orchestrator = PlanOrchestrator::new(AgentSet::offline(&config), &config);
        let plan = orchestrator.plan(&request(4)).await.unwrap();

        assert!(plan.is_fully_successful());
        assert_eq!(plan.chosen_dates, plan.date_options[0]);
        assert_eq!(
            plan.state_history,
            [
                PlanState::Init,
                PlanState::DatesResolved,
                PlanState::WeatherAndRoutePending,
                PlanState::RouteResolved,
                PlanState::DiningPending,
                PlanState::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let config = TripPlanConfig::default();
        let orchestrator = PlanOrchestrator::new(AgentSet::offline(&config), &config);
        let err = orchestrator.plan(&request(0)).await.unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }
}
