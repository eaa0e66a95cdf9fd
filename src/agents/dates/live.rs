use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use tracing::{debug, instrument, warn};

use super::offline::OfflineDateAdvisor;
use super::{candidate_windows, mark_shortened, top_candidates};
use crate::agents::{AgentError, DateAdvisor};
use crate::cache::PersistentCache;
use crate::config::TripPlanConfig;
use crate::models::dates::clamp_unit;
use crate::models::{DateRange, DateRangeCandidate, FailureCode, Location, TripRequest};
use crate::open_meteo::{DailyObservation, OpenMeteoClient, climatology_range};

/// Archives do not change; keep them for a month
const ARCHIVE_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// Scores weather from last year's observed conditions at the destination;
/// crowds and wildlife come from the seasonal model
pub struct LiveDateAdvisor {
    open_meteo: OpenMeteoClient,
    cache: PersistentCache,
    destination: Location,
    seasonal: OfflineDateAdvisor,
}

/// Weather desirability of an observed day: mild highs and dry skies score best
#[must_use]
pub fn observed_weather_score(day: &DailyObservation) -> f64 {
    let comfort = if (65.0..=82.0).contains(&day.high_f) {
        1.0
    } else {
        let off_by = if day.high_f < 65.0 {
            65.0 - day.high_f
        } else {
            day.high_f - 82.0
        };
        (1.0 - off_by * 0.03).max(0.1)
    };
    clamp_unit(comfort - f64::from(day.precipitation_chance) / 100.0 * 0.5)
}

impl LiveDateAdvisor {
    #[must_use]
    pub fn new(open_meteo: OpenMeteoClient, cache: PersistentCache, config: &TripPlanConfig) -> Self {
        Self {
            open_meteo,
            cache,
            destination: config.planner.destination_location(),
            seasonal: OfflineDateAdvisor::from_config(config),
        }
    }

    /// Observed weather score per (current-year) date, keyed by date
    async fn historical_scores(
        &self,
        window: &DateRange,
        today: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, f64>, AgentError> {
        let Some(past) = climatology_range(window, today) else {
            return Ok(BTreeMap::new());
        };
        let years_back = window.start.years_since(past.start).unwrap_or(1);

        let key = self
            .destination
            .cache_key("archive", &format!("{}:{}", past.start, past.end));
        let observations = match self.cache.get::<Vec<DailyObservation>>(&key).await {
            Ok(Some(hit)) => hit,
            Ok(None) | Err(_) => {
                let fetched = self
                    .open_meteo
                    .daily_archive(&self.destination, &past)
                    .await
                    .map_err(|e| {
                        AgentError::from_http(
                            &e,
                            FailureCode::ProviderUnavailable,
                            FailureCode::LocationUnresolved,
                        )
                    })?;
                if let Err(e) = self.cache.put(&key, fetched.clone(), ARCHIVE_TTL).await {
                    warn!(error = %e, "Failed to cache archive response");
                }
                fetched
            }
        };

        Ok(observations
            .iter()
            .filter_map(|day| {
                let date = day.date.checked_add_months(Months::new(12 * years_back))?;
                Some((date, observed_weather_score(day)))
            })
            .collect())
    }
}

#[async_trait]
impl DateAdvisor for LiveDateAdvisor {
    fn name(&self) -> &'static str {
        "live-dates"
    }

    #[instrument(skip_all, fields(advisor = "live"))]
    async fn propose_dates(
        &self,
        request: &TripRequest,
    ) -> Result<Vec<DateRangeCandidate>, AgentError> {
        let windows = candidate_windows(request, self.seasonal.allow_shortened())?;
        let window = DateRange::new(request.window.earliest, request.window.latest);
        let today = Utc::now().date_naive();

        let observed = match self.historical_scores(&window, today).await {
            Ok(scores) => scores,
            Err(e) if e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Archive rejected the request; scoring weather seasonally");
                BTreeMap::new()
            }
        };
        debug!(days = observed.len(), "Observed weather days");

        let model = self.seasonal.model();
        let scored: Vec<DateRangeCandidate> = windows
            .ranges
            .iter()
            .map(|range| model.score_range_with(range, |date| observed.get(&date).copied()))
            .collect();

        let mut ranked = top_candidates(scored, self.seasonal.max_options());
        if windows.shortened
            && let Some(only) = ranked.first_mut()
        {
            mark_shortened(only, request.duration_days);
        }
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(high_f: f64, precipitation_chance: u8) -> DailyObservation {
        DailyObservation {
            date: "2024-07-01".parse().unwrap(),
            condition: "Clear sky".to_string(),
            high_f,
            low_f: 45.0,
            precipitation_chance,
        }
    }

    #[test]
    fn test_observed_weather_score() {
        assert_eq!(observed_weather_score(&observation(75.0, 0)), 1.0);
        assert!(observed_weather_score(&observation(75.0, 80)) < 0.7);
        assert!(observed_weather_score(&observation(40.0, 10)) < observed_weather_score(&observation(70.0, 10)));
        let worst = observed_weather_score(&observation(10.0, 100));
        assert!((0.0..=1.0).contains(&worst));
    }
}
