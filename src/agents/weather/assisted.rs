use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::offline::OfflineWeatherAgent;
use super::{check_location, weather_day};
use crate::agents::{AgentError, WeatherAgent};
use crate::llm::{LanguageModel, extract_json, parse_each};
use crate::models::weather::describe_conditions;
use crate::models::{DateRange, Location, WeatherDay};

const SYSTEM_PROMPT: &str = "You are an expert weather forecaster for Yellowstone National Park. \
Forecast typical conditions for the requested dates from historical patterns for the season. \
Answer with JSON only.";

/// Typical-pattern forecast from the language model, with every missing or
/// implausible day replaced by the synthetic climatology
pub struct AssistedWeatherAgent {
    llm: Arc<dyn LanguageModel>,
    fallback: OfflineWeatherAgent,
}

#[derive(Debug, Deserialize)]
struct SuggestedDay {
    date: NaiveDate,
    #[serde(default)]
    condition: Option<String>,
    high_temp_f: f64,
    low_temp_f: f64,
    #[serde(default)]
    precipitation_chance: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ForecastPayload {
    List(Vec<serde_json::Value>),
    Wrapped {
        #[serde(alias = "forecast", alias = "days")]
        forecasts: Vec<serde_json::Value>,
    },
}

impl SuggestedDay {
    fn is_plausible(&self) -> bool {
        let temps_ok = (-60.0..=120.0).contains(&self.high_temp_f)
            && (-60.0..=120.0).contains(&self.low_temp_f)
            && self.high_temp_f >= self.low_temp_f;
        let precipitation_ok = self
            .precipitation_chance
            .is_none_or(|p| (0.0..=100.0).contains(&p));
        temps_ok && precipitation_ok
    }
}

impl AssistedWeatherAgent {
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>, fallback: OfflineWeatherAgent) -> Self {
        Self { llm, fallback }
    }

    fn merge(
        &self,
        location: &Location,
        range: &DateRange,
        suggested: Vec<SuggestedDay>,
    ) -> Vec<WeatherDay> {
        let by_date: BTreeMap<NaiveDate, SuggestedDay> = suggested
            .into_iter()
            .filter(SuggestedDay::is_plausible)
            .map(|day| (day.date, day))
            .collect();

        let mut repaired = 0;
        let days: Vec<WeatherDay> = range
            .dates()
            .into_iter()
            .map(|date| match by_date.get(&date) {
                Some(day) => {
                    let chance = day.precipitation_chance.unwrap_or(20.0).round() as u8;
                    let condition = day
                        .condition
                        .clone()
                        .filter(|c| !c.trim().is_empty())
                        .unwrap_or_else(|| {
                            describe_conditions(chance, day.high_temp_f, day.low_temp_f).to_string()
                        });
                    weather_day(location, date, condition, day.high_temp_f, day.low_temp_f, chance)
                }
                None => {
                    repaired += 1;
                    self.fallback.synthetic_day(location, date)
                }
            })
            .collect();

        if repaired > 0 {
            warn!(repaired, "Filled forecast days the model left out or got wrong");
        }
        days
    }
}

#[async_trait]
impl WeatherAgent for AssistedWeatherAgent {
    fn name(&self) -> &'static str {
        "assisted-weather"
    }

    #[instrument(skip_all, fields(agent = "assisted-weather", start = %range.start, end = %range.end))]
    async fn forecast(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<WeatherDay>, AgentError> {
        check_location(location)?;

        let prompt = format!(
            "Give a daily forecast for {} from {} to {} inclusive. Reply with a JSON array with one \
object per day: date (YYYY-MM-DD), condition, high_temp_f, low_temp_f, precipitation_chance (0-100).",
            location.name, range.start, range.end
        );

        let reply = self.llm.complete(SYSTEM_PROMPT, &prompt).await.map_err(|e| {
            if e.is_retryable() {
                AgentError::provider_unavailable(e.to_string())
            } else {
                AgentError::invalid_output(e.to_string())
            }
        });

        let suggested = match reply {
            Ok(reply) => match extract_json(&reply).map(serde_json::from_str::<ForecastPayload>) {
                Some(Ok(ForecastPayload::List(days) | ForecastPayload::Wrapped { forecasts: days })) => {
                    parse_each::<SuggestedDay>(days)
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Model forecast did not parse; using climatology");
                    Vec::new()
                }
                None => {
                    warn!("Model forecast had no JSON; using climatology");
                    Vec::new()
                }
            },
            Err(e) if e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Model rejected the forecast request; using climatology");
                Vec::new()
            }
        };
        debug!(suggested = suggested.len(), "Model forecast days");

        Ok(self.merge(location, range, suggested))
    }
}
