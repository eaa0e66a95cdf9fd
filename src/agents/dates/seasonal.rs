//! Seasonal scoring model for the park: month patterns, weekend and holiday crowds

use chrono::{Datelike, NaiveDate};
use rand::RngExt;

use crate::agents::{is_weekend, seeded_rng};
use crate::models::dates::{clamp_unit, round2};
use crate::models::{DateRange, DateRangeCandidate, ScoreWeights};

/// Sub-scores for a single day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayScores {
    pub weather: f64,
    pub crowd: f64,
    pub wildlife: f64,
}

/// Deterministic month-driven model with seeded day-to-day variation
#[derive(Debug, Clone)]
pub struct SeasonalModel {
    seed: u64,
    weights: ScoreWeights,
}

/// Holiday weeks: Memorial Day week, Independence Day week, Labor Day week
#[must_use]
pub fn is_holiday_period(date: NaiveDate) -> bool {
    matches!(
        (date.month(), date.day()),
        (5, 25..=31) | (7, 1..=7) | (9, 1..=7)
    )
}

impl SeasonalModel {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            weights: ScoreWeights::default(),
        }
    }

    #[must_use]
    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Typical weather desirability for the month, before variation
    #[must_use]
    pub fn weather_baseline(date: NaiveDate) -> f64 {
        match date.month() {
            7 | 8 => 0.9,
            6 | 9 => 0.75,
            5 | 10 => 0.5,
            _ => 0.3,
        }
    }

    #[must_use]
    pub fn day_scores(&self, date: NaiveDate) -> DayScores {
        let month = date.month();

        let weather = Self::weather_baseline(date) + self.variation("weather", date);

        // Higher is better: fewer people
        let mut crowd = match month {
            7 | 8 => 0.35,
            6 | 9 => 0.65,
            _ => 0.85,
        };
        if is_weekend(date) {
            crowd -= 0.1;
        }
        if is_holiday_period(date) {
            crowd -= 0.2;
        }
        crowd = (crowd + self.variation("crowd", date)).clamp(0.1, 1.0);

        let wildlife = match month {
            5 | 9 | 10 => 0.85,
            6..=8 => 0.65,
            _ => 0.5,
        } + self.variation("wildlife", date);

        DayScores {
            weather: clamp_unit(weather),
            crowd: clamp_unit(crowd),
            wildlife: clamp_unit(wildlife),
        }
    }

    /// Score a range by averaging its days; `weather_override` replaces the
    /// modelled weather score for days it has an answer for
    #[must_use]
    pub fn score_range_with(
        &self,
        range: &DateRange,
        weather_override: impl Fn(NaiveDate) -> Option<f64>,
    ) -> DateRangeCandidate {
        let dates = range.dates();
        let days = dates.len().max(1) as f64;
        let (mut weather, mut crowd, mut wildlife) = (0.0, 0.0, 0.0);
        for date in dates {
            let scores = self.day_scores(date);
            weather += weather_override(date).unwrap_or(scores.weather);
            crowd += scores.crowd;
            wildlife += scores.wildlife;
        }

        let mut candidate = DateRangeCandidate::scored(
            *range,
            round2(weather / days),
            round2(crowd / days),
            round2(wildlife / days),
            &self.weights,
        );
        candidate.reasoning = super::describe_candidate(&candidate);
        candidate
    }

    #[must_use]
    pub fn score_range(&self, range: &DateRange) -> DateRangeCandidate {
        self.score_range_with(range, |_| None)
    }

    fn variation(&self, tag: &str, date: NaiveDate) -> f64 {
        seeded_rng(self.seed, tag, date).random_range(-0.1..0.1)
    }
}
