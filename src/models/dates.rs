//! Date range candidates and their ordering

use std::cmp::Ordering;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive run of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Range of `days` days beginning at `start`
    #[must_use]
    pub fn starting_at(start: NaiveDate, days: u8) -> Option<Self> {
        let end = start.checked_add_days(Days::new(u64::from(days.max(1)) - 1))?;
        Some(Self { start, end })
    }

    #[must_use]
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every date in the range, in order
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(|d| *d <= end).collect()
    }
}

/// Weights of the derived total score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub weather: f64,
    pub crowd: f64,
    pub wildlife: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            weather: 0.4,
            crowd: 0.4,
            wildlife: 0.2,
        }
    }
}

impl ScoreWeights {
    /// Weighted total, rounded to two decimals
    #[must_use]
    pub fn total(&self, weather: f64, crowd: f64, wildlife: f64) -> f64 {
        round2(weather * self.weather + crowd * self.crowd + wildlife * self.wildlife)
    }
}

/// A candidate travel window with its scores. Scores lie in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeCandidate {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weather_score: f64,
    /// Higher means fewer people
    pub crowd_score: f64,
    pub wildlife_score: f64,
    pub total_score: f64,
    pub reasoning: String,
    /// Set when the window could not fit the requested duration
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub shortened: bool,
}

impl DateRangeCandidate {
    /// Build a candidate, clamping sub-scores and deriving the total
    #[must_use]
    pub fn scored(
        range: DateRange,
        weather: f64,
        crowd: f64,
        wildlife: f64,
        weights: &ScoreWeights,
    ) -> Self {
        let weather = round2(clamp_unit(weather));
        let crowd = round2(clamp_unit(crowd));
        let wildlife = round2(clamp_unit(wildlife));
        Self {
            start_date: range.start,
            end_date: range.end,
            weather_score: weather,
            crowd_score: crowd,
            wildlife_score: wildlife,
            total_score: weights.total(weather, crowd, wildlife),
            reasoning: String::new(),
            shortened: false,
        }
    }

    #[must_use]
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    #[must_use]
    pub fn span_days(&self) -> i64 {
        self.range().len_days()
    }

    /// Best first: higher total, then earlier start
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .total_score
            .total_cmp(&self.total_score)
            .then_with(|| self.start_date.cmp(&other.start_date))
    }
}

/// Sort candidates into their canonical ranked order
pub fn rank_candidates(candidates: &mut [DateRangeCandidate]) {
    candidates.sort_by(DateRangeCandidate::rank_cmp);
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_range_starting_at() {
        let range = DateRange::starting_at(date("2025-07-30"), 6).unwrap();
        assert_eq!(range.end, date("2025-08-04"));
        assert_eq!(range.len_days(), 6);
        assert_eq!(range.dates().len(), 6);
    }

    #[test]
    fn test_scored_clamps_and_totals() {
        let range = DateRange::starting_at(date("2025-07-01"), 3).unwrap();
        let c = DateRangeCandidate::scored(range, 1.4, 0.5, -0.2, &ScoreWeights::default());
        assert_eq!(c.weather_score, 1.0);
        assert_eq!(c.wildlife_score, 0.0);
        assert_eq!(c.total_score, 0.6);
    }

    #[test]
    fn test_rank_ties_break_on_earlier_start() {
        let weights = ScoreWeights::default();
        let late = DateRangeCandidate::scored(
            DateRange::starting_at(date("2025-07-10"), 2).unwrap(),
            0.5,
            0.5,
            0.5,
            &weights,
        );
        let early = DateRangeCandidate::scored(
            DateRange::starting_at(date("2025-07-02"), 2).unwrap(),
            0.5,
            0.5,
            0.5,
            &weights,
        );
        let best = DateRangeCandidate::scored(
            DateRange::starting_at(date("2025-07-20"), 2).unwrap(),
            0.9,
            0.9,
            0.9,
            &weights,
        );
        let mut all = vec![late, early, best];
        rank_candidates(&mut all);
        let starts: Vec<_> = all.iter().map(|c| c.start_date).collect();
        assert_eq!(
            starts,
            vec![date("2025-07-20"), date("2025-07-02"), date("2025-07-10")]
        );
    }
}
