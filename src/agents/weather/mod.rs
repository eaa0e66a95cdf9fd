//! Weather agents and the park climatology they fall back on

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::AgentError;
use crate::models::{Daylight, Location, WeatherDay};

pub mod assisted;
pub mod live;
pub mod offline;

/// Monthly normal for the park: high and low in Fahrenheit, precipitation chance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateNormal {
    pub high_f: f64,
    pub low_f: f64,
    pub precipitation_chance: u8,
}

const MONTHLY_NORMALS: [(f64, f64, u8); 12] = [
    (29.0, 10.0, 35),
    (33.0, 11.0, 30),
    (41.0, 17.0, 35),
    (50.0, 25.0, 35),
    (60.0, 32.0, 40),
    (70.0, 39.0, 40),
    (80.0, 45.0, 25),
    (79.0, 43.0, 25),
    (68.0, 36.0, 25),
    (54.0, 28.0, 30),
    (38.0, 18.0, 35),
    (29.0, 10.0, 35),
];

#[must_use]
pub fn climate_normal(date: NaiveDate) -> ClimateNormal {
    let (high_f, low_f, precipitation_chance) = MONTHLY_NORMALS[date.month0() as usize];
    ClimateNormal {
        high_f,
        low_f,
        precipitation_chance,
    }
}

/// Reject coordinates no provider could resolve
pub(crate) fn check_location(location: &Location) -> Result<(), AgentError> {
    let valid = location.latitude.is_finite()
        && location.longitude.is_finite()
        && (-90.0..=90.0).contains(&location.latitude)
        && (-180.0..=180.0).contains(&location.longitude);
    if valid {
        Ok(())
    } else {
        Err(AgentError::location_unresolved(format!(
            "'{}' has no usable coordinates ({})",
            location.name,
            location.format_coordinates()
        )))
    }
}

/// Sunrise and sunset, if they can be computed for this place and date
pub(crate) fn daylight_for(location: &Location, date: NaiveDate) -> Option<Daylight> {
    match Daylight::at(location, date) {
        Ok(daylight) => Some(daylight),
        Err(e) => {
            debug!(error = %e, %date, "No daylight times");
            None
        }
    }
}

/// Build a day from raw values, with a rounded temperature pair and sane bounds
pub(crate) fn weather_day(
    location: &Location,
    date: NaiveDate,
    condition: impl Into<String>,
    high_f: f64,
    low_f: f64,
    precipitation_chance: u8,
) -> WeatherDay {
    let (high_f, low_f) = if high_f >= low_f {
        (high_f, low_f)
    } else {
        (low_f, high_f)
    };
    WeatherDay {
        date,
        condition: condition.into(),
        high_temp_f: high_f.round(),
        low_temp_f: low_f.round(),
        precipitation_chance: precipitation_chance.min(100),
        daylight: daylight_for(location, date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_climate_normals_peak_in_july() {
        let july = climate_normal("2025-07-15".parse().unwrap());
        let january = climate_normal("2025-01-15".parse().unwrap());
        assert!(july.high_f > january.high_f);
        assert!(july.high_f > july.low_f);
    }

    #[test]
    fn test_invalid_coordinates_are_unresolved() {
        let nowhere = Location::new(f64::NAN, 0.0, "Nowhere");
        let err = check_location(&nowhere).unwrap_err();
        assert_eq!(err.code, crate::models::FailureCode::LocationUnresolved);
        assert!(check_location(&Location::new(44.43, -110.59, "Park")).is_ok());
    }

    #[test]
    fn test_weather_day_orders_temperatures() {
        let park = Location::new(44.43, -110.59, "Park");
        let day = weather_day(&park, "2025-07-01".parse().unwrap(), "Sunny", 40.2, 71.6, 120);
        assert_eq!(day.high_temp_f, 72.0);
        assert_eq!(day.low_temp_f, 40.0);
        assert_eq!(day.precipitation_chance, 100);
        assert!(day.daylight.is_some());
    }
}
