use async_trait::async_trait;
use chrono::NaiveDate;
use rand::RngExt;
use tracing::instrument;

use super::{check_location, climate_normal, weather_day};
use crate::agents::{AgentError, WeatherAgent, seeded_rng};
use crate::models::weather::describe_conditions;
use crate::models::{DateRange, Location, WeatherDay};

/// Synthetic forecast from monthly normals with seeded day-to-day variation
#[derive(Debug, Clone)]
pub struct OfflineWeatherAgent {
    seed: u64,
}

impl OfflineWeatherAgent {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// One synthetic day; also used to fill gaps in other agents' output
    #[must_use]
    pub fn synthetic_day(&self, location: &Location, date: NaiveDate) -> WeatherDay {
        let normal = climate_normal(date);
        let mut rng = seeded_rng(self.seed, &location.cache_key("weather", ""), date);

        let swing: f64 = rng.random_range(-6.0..6.0);
        let high_f = normal.high_f + swing;
        let low_f = normal.low_f + swing * 0.6;
        let precipitation_chance = (i16::from(normal.precipitation_chance)
            + rng.random_range(-15_i16..=15))
        .clamp(0, 100) as u8;

        weather_day(
            location,
            date,
            describe_conditions(precipitation_chance, high_f, low_f),
            high_f,
            low_f,
            precipitation_chance,
        )
    }

    /// Fully synchronous forecast; never fails for valid coordinates
    pub fn synthetic_forecast(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<WeatherDay>, AgentError> {
        check_location(location)?;
        Ok(range
            .dates()
            .into_iter()
            .map(|date| self.synthetic_day(location, date))
            .collect())
    }
}

#[async_trait]
impl WeatherAgent for OfflineWeatherAgent {
    fn name(&self) -> &'static str {
        "offline-weather"
    }

    #[instrument(skip_all, fields(agent = "offline-weather", start = %range.start, end = %range.end))]
    async fn forecast(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<WeatherDay>, AgentError> {
        self.synthetic_forecast(location, range)
    }
}
