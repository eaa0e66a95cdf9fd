use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use tracing::{debug, instrument, warn};

use super::offline::OfflineWeatherAgent;
use super::{check_location, weather_day};
use crate::agents::{AgentError, WeatherAgent};
use crate::cache::PersistentCache;
use crate::models::{DateRange, FailureCode, Location, WeatherDay};
use crate::open_meteo::{
    DailyObservation, OpenMeteoClient, climatology_range, within_forecast_horizon,
};

/// Open-Meteo forecast inside the forecast horizon, last year's observations beyond it
pub struct LiveWeatherAgent {
    open_meteo: OpenMeteoClient,
    cache: PersistentCache,
    ttl: Duration,
    gap_filler: OfflineWeatherAgent,
}

impl LiveWeatherAgent {
    #[must_use]
    pub fn new(open_meteo: OpenMeteoClient, cache: PersistentCache, ttl: Duration) -> Self {
        Self {
            open_meteo,
            cache,
            ttl,
            gap_filler: OfflineWeatherAgent::new(0),
        }
    }

    async fn observations(
        &self,
        location: &Location,
        range: &DateRange,
        today: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DailyObservation>, AgentError> {
        let to_agent_error = |e: crate::http::HttpError| {
            AgentError::from_http(
                &e,
                FailureCode::ProviderUnavailable,
                FailureCode::LocationUnresolved,
            )
        };

        let (kind, fetch_range, years_back) = if within_forecast_horizon(range, today) {
            ("forecast", *range, 0)
        } else if range.end < today {
            ("archive", *range, 0)
        } else {
            let past = climatology_range(range, today).ok_or_else(|| {
                AgentError::provider_unavailable(format!(
                    "no historical period available for {}..{}",
                    range.start, range.end
                ))
            })?;
            let years = range.start.years_since(past.start).unwrap_or(1);
            ("archive", past, years)
        };

        let key = location.cache_key(
            "weather",
            &format!("{kind}:{}:{}", fetch_range.start, fetch_range.end),
        );
        let cached = match self.cache.get::<Vec<DailyObservation>>(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, "Weather cache read failed");
                None
            }
        };

        let observations = match cached {
            Some(hit) => {
                debug!(kind, "Weather cache hit");
                hit
            }
            None => {
                let fetched = if kind == "forecast" {
                    self.open_meteo.daily_forecast(location, &fetch_range).await
                } else {
                    self.open_meteo.daily_archive(location, &fetch_range).await
                }
                .map_err(to_agent_error)?;
                if let Err(e) = self.cache.put(&key, fetched.clone(), self.ttl).await {
                    warn!(error = %e, "Failed to cache weather response");
                }
                fetched
            }
        };

        Ok(observations
            .into_iter()
            .filter_map(|obs| {
                let date = obs.date.checked_add_months(Months::new(12 * years_back))?;
                Some((date, obs))
            })
            .collect())
    }
}

#[async_trait]
impl WeatherAgent for LiveWeatherAgent {
    fn name(&self) -> &'static str {
        "live-weather"
    }

    #[instrument(skip_all, fields(agent = "live-weather", location = %location.name, start = %range.start, end = %range.end))]
    async fn forecast(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<WeatherDay>, AgentError> {
        check_location(location)?;
        let today = Utc::now().date_naive();
        let observations = self.observations(location, range, today).await?;

        if observations.is_empty() {
            return Err(AgentError::invalid_output(
                "weather provider returned no usable days",
            ));
        }

        let days: Vec<WeatherDay> = range
            .dates()
            .into_iter()
            .map(|date| match observations.get(&date) {
                Some(obs) => weather_day(
                    location,
                    date,
                    obs.condition.clone(),
                    obs.high_f,
                    obs.low_f,
                    obs.precipitation_chance,
                ),
                None => {
                    warn!(%date, "Provider skipped a day; using climatology");
                    self.gap_filler.synthetic_day(location, date)
                }
            })
            .collect();

        Ok(days)
    }
}
