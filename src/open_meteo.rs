//! `OpenMeteo` geocoding, forecast and historical archive client

use chrono::{Days, NaiveDate};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProvidersConfig;
use crate::http::{ApiClient, HttpError};
use crate::models::{DateRange, Location, weather::describe_conditions};

/// Forecasts reach this many days ahead; anything later needs climatology
pub const FORECAST_HORIZON_DAYS: u64 = 16;

/// One day of provider data, temperatures in Fahrenheit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub condition: String,
    pub high_f: f64,
    pub low_f: f64,
    pub precipitation_chance: u8,
}

#[derive(Clone, Debug)]
pub struct OpenMeteoClient {
    http: ApiClient,
    forecast_url: String,
    archive_url: String,
    geocoding_url: String,
}

impl OpenMeteoClient {
    #[must_use]
    pub fn new(http: ApiClient, config: &ProvidersConfig) -> Self {
        Self {
            http,
            forecast_url: config.open_meteo_forecast_url.trim_end_matches('/').to_string(),
            archive_url: config.open_meteo_archive_url.trim_end_matches('/').to_string(),
            geocoding_url: config.open_meteo_geocoding_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a place name such as "Denver, CO" to candidate locations, best first
    #[tracing::instrument(skip(self))]
    pub async fn geocode(&self, location_name: &str) -> Result<Vec<Location>, HttpError> {
        let (place, region) = split_place(location_name);
        let url = format!(
            "{}/search?name={}&count=10&language=en&format=json",
            self.geocoding_url,
            urlencoding::encode(place)
        );

        let response: GeocodingResponse = self.http.get_json(&url, HeaderMap::new()).await?;
        let mut results = response.results.unwrap_or_default();

        if let Some(region) = region {
            // Prefer results whose state or country matches the qualifier
            results.sort_by_key(|r| !r.matches_region(region));
        }
        debug!(count = results.len(), "Geocoding results");

        Ok(results.into_iter().map(Location::from).collect())
    }

    /// Daily forecast for `range`; the range must start within the forecast horizon
    #[tracing::instrument(skip(self), fields(location = %location.name))]
    pub async fn daily_forecast(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<DailyObservation>, HttpError> {
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&daily=weather_code,temperature_2m_max,temperature_2m_min,precipitation_probability_max&temperature_unit=fahrenheit&timezone=auto&start_date={}&end_date={}",
            self.forecast_url, location.latitude, location.longitude, range.start, range.end
        );
        let response: DailyResponse = self.http.get_json(&url, HeaderMap::new()).await?;
        response.daily.into_observations(&url)
    }

    /// Observed daily weather for a past `range`
    #[tracing::instrument(skip(self), fields(location = %location.name))]
    pub async fn daily_archive(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<DailyObservation>, HttpError> {
        let url = format!(
            "{}/archive?latitude={}&longitude={}&daily=weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum&temperature_unit=fahrenheit&timezone=auto&start_date={}&end_date={}",
            self.archive_url, location.latitude, location.longitude, range.start, range.end
        );
        let response: DailyResponse = self.http.get_json(&url, HeaderMap::new()).await?;
        response.daily.into_observations(&url)
    }
}

/// Whether `range` can be served by the forecast endpoint as seen from `today`
#[must_use]
pub fn within_forecast_horizon(range: &DateRange, today: NaiveDate) -> bool {
    let horizon = today
        .checked_add_days(Days::new(FORECAST_HORIZON_DAYS - 1))
        .unwrap_or(today);
    range.start >= today && range.end <= horizon
}

/// Same calendar dates one or more years back, landing strictly before `today`
#[must_use]
pub fn climatology_range(range: &DateRange, today: NaiveDate) -> Option<DateRange> {
    use chrono::Months;
    let mut years_back = 1;
    loop {
        let months = Months::new(12 * years_back);
        let start = range.start.checked_sub_months(months)?;
        let end = range.end.checked_sub_months(months)?;
        if end < today {
            return Some(DateRange::new(start, end));
        }
        years_back += 1;
        if years_back > 5 {
            return None;
        }
    }
}

fn split_place(location_name: &str) -> (&str, Option<&str>) {
    match location_name.split_once(',') {
        Some((place, region)) if !region.trim().is_empty() => (place.trim(), Some(region.trim())),
        _ => (location_name.trim(), None),
    }
}

/// Rough chance of precipitation from an observed daily total in mm
fn chance_from_precipitation_sum(mm: f64) -> u8 {
    match mm {
        x if x <= 0.1 => 10,
        x if x < 1.0 => 30,
        x if x < 5.0 => 55,
        _ => 80,
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    country_code: Option<String>,
    admin1: Option<String>,
}

impl GeocodingResult {
    fn matches_region(&self, region: &str) -> bool {
        let region = region.to_ascii_lowercase();
        let admin1 = self.admin1.as_deref().unwrap_or_default().to_ascii_lowercase();
        let state_matches = admin1 == region
            || state_abbreviation(&admin1).is_some_and(|abbr| abbr.eq_ignore_ascii_case(&region));
        state_matches
            || self
                .country
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(&region))
            || self
                .country_code
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(&region))
    }
}

impl From<GeocodingResult> for Location {
    fn from(result: GeocodingResult) -> Self {
        let name = match &result.admin1 {
            Some(admin1) => format!("{}, {admin1}", result.name),
            None => result.name,
        };
        match result.country {
            Some(country) => {
                Location::with_country(result.latitude, result.longitude, name, country)
            }
            None => Location::new(result.latitude, result.longitude, name),
        }
    }
}

/// Abbreviations for the states a Yellowstone trip usually starts from
fn state_abbreviation(state: &str) -> Option<&'static str> {
    match state {
        "montana" => Some("MT"),
        "wyoming" => Some("WY"),
        "idaho" => Some("ID"),
        "utah" => Some("UT"),
        "colorado" => Some("CO"),
        "washington" => Some("WA"),
        "oregon" => Some("OR"),
        "california" => Some("CA"),
        "nevada" => Some("NV"),
        "south dakota" => Some("SD"),
        "north dakota" => Some("ND"),
        "nebraska" => Some("NE"),
        "minnesota" => Some("MN"),
        "illinois" => Some("IL"),
        "texas" => Some("TX"),
        "arizona" => Some("AZ"),
        "new mexico" => Some("NM"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    daily: DailyData,
}

#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    weather_code: Option<Vec<Option<u8>>>,
    temperature_2m_max: Option<Vec<Option<f64>>>,
    temperature_2m_min: Option<Vec<Option<f64>>>,
    precipitation_probability_max: Option<Vec<Option<f64>>>,
    precipitation_sum: Option<Vec<Option<f64>>>,
}

fn value_at<T: Copy>(series: Option<&Vec<Option<T>>>, i: usize) -> Option<T> {
    series.and_then(|values| values.get(i).copied().flatten())
}

impl DailyData {
    fn into_observations(self, url: &str) -> Result<Vec<DailyObservation>, HttpError> {
        let mut observations = Vec::with_capacity(self.time.len());

        for (i, day) in self.time.iter().enumerate() {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
                HttpError::Decode {
                    url: url.split('?').next().unwrap_or(url).to_string(),
                    message: format!("bad date '{day}': {e}"),
                }
            })?;

            let (Some(high_f), Some(low_f)) = (
                value_at(self.temperature_2m_max.as_ref(), i),
                value_at(self.temperature_2m_min.as_ref(), i),
            ) else {
                debug!(%date, "Skipping day without temperatures");
                continue;
            };

            let precipitation_chance = match value_at(self.precipitation_probability_max.as_ref(), i)
            {
                Some(p) => p.round().clamp(0.0, 100.0) as u8,
                None => value_at(self.precipitation_sum.as_ref(), i)
                    .map_or(10, chance_from_precipitation_sum),
            };

            let condition = match value_at(self.weather_code.as_ref(), i) {
                Some(code) => weather_code_to_description(code),
                None => describe_conditions(precipitation_chance, high_f, low_f),
            };

            observations.push(DailyObservation {
                date,
                condition: condition.to_string(),
                high_f,
                low_f,
                precipitation_chance,
            });
        }

        Ok(observations)
    }
}

/// Convert `OpenMeteo` weather code to human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 | 67 => "Freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 | 81 => "Rain showers",
        82 => "Violent rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_forecast_response_parsing() {
        let json = r#"{
            "latitude": 44.43, "longitude": -110.59,
            "daily": {
                "time": ["2025-07-01", "2025-07-02", "2025-07-03"],
                "weather_code": [0, 95, null],
                "temperature_2m_max": [78.1, 74.0, 70.2],
                "temperature_2m_min": [44.0, 46.3, 41.0],
                "precipitation_probability_max": [5, 61, 25]
            }
        }"#;
        let response: DailyResponse = serde_json::from_str(json).unwrap();
        let days = response.daily.into_observations("https://x").unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].condition, "Clear sky");
        assert_eq!(days[1].condition, "Thunderstorm");
        assert_eq!(days[1].precipitation_chance, 61);
        assert_eq!(days[2].condition, "Partly Cloudy");
    }

    #[test]
    fn test_archive_response_uses_precipitation_sum() {
        let json = r#"{
            "daily": {
                "time": ["2024-07-01", "2024-07-02"],
                "temperature_2m_max": [80.0, null],
                "temperature_2m_min": [45.0, 40.0],
                "precipitation_sum": [3.2, 0.0]
            }
        }"#;
        let response: DailyResponse = serde_json::from_str(json).unwrap();
        let days = response.daily.into_observations("https://x").unwrap();
        assert_eq!(days.len(), 1, "days without a high are dropped");
        assert_eq!(days[0].precipitation_chance, 55);
    }

    #[test]
    fn test_forecast_horizon() {
        let today = date("2025-07-01");
        let near = DateRange::new(date("2025-07-03"), date("2025-07-08"));
        let far = DateRange::new(date("2025-08-01"), date("2025-08-06"));
        assert!(within_forecast_horizon(&near, today));
        assert!(!within_forecast_horizon(&far, today));
    }

    #[test]
    fn test_climatology_range_steps_back_whole_years() {
        let today = date("2025-06-01");
        let range = DateRange::new(date("2025-08-01"), date("2025-08-06"));
        let past = climatology_range(&range, today).unwrap();
        assert_eq!(past.start, date("2024-08-01"));
        assert_eq!(past.end, date("2024-08-06"));
    }

    #[test]
    fn test_region_matching() {
        let result = GeocodingResult {
            name: "Denver".into(),
            latitude: 39.74,
            longitude: -104.98,
            country: Some("United States".into()),
            country_code: Some("US".into()),
            admin1: Some("Colorado".into()),
        };
        assert!(result.matches_region("CO"));
        assert!(result.matches_region("colorado"));
        assert!(!result.matches_region("MT"));
        assert_eq!(split_place("Denver, CO"), ("Denver", Some("CO")));
        assert_eq!(split_place("Bozeman"), ("Bozeman", None));
    }
}
