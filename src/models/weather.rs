//! Per-day weather forecast model

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::{DateRange, Location};

/// Sunrise and sunset for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Daylight {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl Daylight {
    pub fn at(location: &Location, date: NaiveDate) -> Result<Self> {
        let coordinates =
            Coordinates::new(location.latitude, location.longitude).with_context(|| {
                format!(
                    "Invalid coordinates: lat={}, lng={}",
                    location.latitude, location.longitude
                )
            })?;

        let solar_day = SolarDay::new(coordinates, date);

        let sunrise = solar_day.event_time(SolarEvent::Sunrise);
        let sunset = solar_day.event_time(SolarEvent::Sunset);

        Ok(Self { sunrise, sunset })
    }

    /// Hours of usable light
    #[must_use]
    pub fn hours(&self) -> f64 {
        (self.sunset - self.sunrise).num_minutes() as f64 / 60.0
    }
}

/// Forecast for a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    pub date: NaiveDate,
    /// Condition label, e.g. "Sunny"
    pub condition: String,
    /// Daily high in Fahrenheit
    pub high_temp_f: f64,
    /// Daily low in Fahrenheit
    pub low_temp_f: f64,
    /// Chance of precipitation, 0-100
    pub precipitation_chance: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daylight: Option<Daylight>,
}

impl WeatherDay {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.0}°F / {:.0}°F", self.high_temp_f, self.low_temp_f)
    }
}

/// Check that `days` covers every date of `range`, in order, with no gaps or extras
pub fn check_coverage(days: &[WeatherDay], range: &DateRange) -> std::result::Result<(), String> {
    let expected = range.dates();
    if days.len() != expected.len() {
        return Err(format!(
            "forecast has {} day(s), date range {}..={} needs {}",
            days.len(),
            range.start,
            range.end,
            expected.len()
        ));
    }
    for (day, date) in days.iter().zip(expected) {
        if day.date != date {
            return Err(format!("expected forecast for {date}, found {}", day.date));
        }
        if day.precipitation_chance > 100 {
            return Err(format!(
                "precipitation chance {} on {date} is out of range",
                day.precipitation_chance
            ));
        }
    }
    Ok(())
}

/// Condition label from precipitation chance and temperatures
#[must_use]
pub fn describe_conditions(precipitation_chance: u8, high_f: f64, low_f: f64) -> &'static str {
    match precipitation_chance {
        0..=19 => "Sunny",
        20..=39 => "Partly Cloudy",
        40..=59 if high_f >= 75.0 => "Afternoon Thunderstorms",
        40..=59 => "Scattered Showers",
        _ if low_f <= 32.0 => "Snow Showers",
        _ => "Rain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str) -> WeatherDay {
        WeatherDay {
            date: date.parse().unwrap(),
            condition: "Sunny".to_string(),
            high_temp_f: 75.0,
            low_temp_f: 45.0,
            precipitation_chance: 10,
            daylight: None,
        }
    }

    #[test]
    fn test_coverage_accepts_contiguous_days() {
        let range = DateRange::new("2025-07-01".parse().unwrap(), "2025-07-03".parse().unwrap());
        let days = vec![day("2025-07-01"), day("2025-07-02"), day("2025-07-03")];
        assert!(check_coverage(&days, &range).is_ok());
    }

    #[test]
    fn test_coverage_rejects_gaps() {
        let range = DateRange::new("2025-07-01".parse().unwrap(), "2025-07-03".parse().unwrap());
        let days = vec![day("2025-07-01"), day("2025-07-03"), day("2025-07-04")];
        let err = check_coverage(&days, &range).unwrap_err();
        assert!(err.contains("2025-07-02"));
    }

    #[test]
    fn test_describe_conditions() {
        assert_eq!(describe_conditions(5, 80.0, 45.0), "Sunny");
        assert_eq!(describe_conditions(45, 80.0, 45.0), "Afternoon Thunderstorms");
        assert_eq!(describe_conditions(45, 60.0, 35.0), "Scattered Showers");
        assert_eq!(describe_conditions(70, 35.0, 20.0), "Snow Showers");
        assert_eq!(describe_conditions(70, 60.0, 40.0), "Rain");
    }

    #[test]
    fn test_daylight_in_summer_is_long() {
        let old_faithful = Location::new(44.4605, -110.8281, "Old Faithful");
        let daylight = Daylight::at(&old_faithful, "2025-06-21".parse().unwrap()).unwrap();
        assert!(daylight.hours() > 14.0, "got {}", daylight.hours());
    }
}
