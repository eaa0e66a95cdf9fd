//! Date advisors: candidate windows, scoring and output repair

use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;
use tracing::{debug, warn};

use super::AgentError;
use crate::models::dates::{clamp_unit, rank_candidates};
use crate::models::{DateRange, DateRangeCandidate, ScoreWeights, TripRequest};

pub mod assisted;
pub mod live;
pub mod offline;
pub mod seasonal;

/// Date ranges that may be scored for a request
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateWindows {
    pub ranges: Vec<DateRange>,
    /// The window was too short; `ranges` holds the whole window once
    pub shortened: bool,
}

/// Every start date whose range fits the window, filtered by preferred weekday.
///
/// A window shorter than the trip is `NoFeasibleWindow` unless `allow_shortened`.
pub fn candidate_windows(
    request: &TripRequest,
    allow_shortened: bool,
) -> Result<CandidateWindows, AgentError> {
    let window = request.window;
    let wanted = i64::from(request.duration_days);
    if request.duration_days == 0 {
        return Err(AgentError::no_feasible_window("trip needs at least one day"));
    }
    if window.latest < window.earliest {
        return Err(AgentError::no_feasible_window(format!(
            "travel window {}..{} is empty",
            window.earliest, window.latest
        )));
    }

    if window.len_days() < wanted {
        if !allow_shortened {
            return Err(AgentError::no_feasible_window(format!(
                "travel window {} to {} has {} day(s), trip needs {wanted}",
                window.earliest,
                window.latest,
                window.len_days()
            )));
        }
        warn!(
            window_days = window.len_days(),
            wanted, "Window shorter than trip; proposing the whole window"
        );
        return Ok(CandidateWindows {
            ranges: vec![DateRange::new(window.earliest, window.latest)],
            shortened: true,
        });
    }

    let last_start = window
        .latest
        .checked_sub_days(Days::new(u64::from(request.duration_days.saturating_sub(1))))
        .unwrap_or(window.earliest);

    let all: Vec<DateRange> = window
        .earliest
        .iter_days()
        .take_while(|d| *d <= last_start)
        .filter_map(|start| DateRange::starting_at(start, request.duration_days))
        .collect();

    let ranges = match request.preferences.preferred_start_weekday {
        Some(weekday) => {
            let preferred: Vec<DateRange> = all
                .iter()
                .copied()
                .filter(|r| r.start.weekday() == weekday)
                .collect();
            if preferred.is_empty() {
                warn!(%weekday, "No start date in the window falls on the preferred weekday; ignoring it");
                all
            } else {
                preferred
            }
        }
        None => all,
    };

    debug!(count = ranges.len(), "Candidate windows");
    Ok(CandidateWindows {
        ranges,
        shortened: false,
    })
}

/// Sort best first and keep the top `max_options`
#[must_use]
pub fn top_candidates(
    mut candidates: Vec<DateRangeCandidate>,
    max_options: usize,
) -> Vec<DateRangeCandidate> {
    rank_candidates(&mut candidates);
    candidates.truncate(max_options.max(1));
    candidates
}

/// Human-readable explanation of a candidate's scores
#[must_use]
pub fn describe_candidate(candidate: &DateRangeCandidate) -> String {
    let mut reasons = Vec::new();

    reasons.push(match candidate.weather_score {
        s if s > 0.7 => "excellent weather conditions",
        s if s > 0.5 => "good weather conditions",
        _ => "acceptable weather conditions",
    });
    reasons.push(match candidate.crowd_score {
        s if s > 0.7 => "low crowd levels",
        s if s > 0.5 => "moderate crowd levels",
        _ => "higher crowd levels",
    });
    if candidate.wildlife_score > 0.7 {
        reasons.push("excellent wildlife viewing opportunities");
    } else if candidate.wildlife_score > 0.5 {
        reasons.push("good wildlife viewing opportunities");
    }

    let month = candidate.start_date.format("%B");
    let listed = match reasons.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {last}", rest.join(", ")),
        Some((last, _)) => (*last).to_string(),
        None => String::new(),
    };
    format!("Dates in {month} offer {listed}.")
}

/// Mark the single candidate of a shortened window and say so in its reasoning
pub fn mark_shortened(candidate: &mut DateRangeCandidate, wanted_days: u8) {
    candidate.shortened = true;
    candidate.reasoning = format!(
        "{} Your window only allows {} of the {wanted_days} requested days.",
        candidate.reasoning,
        candidate.span_days()
    );
}

/// One candidate as suggested by a language model, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestedRange {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub weather_score: Option<f64>,
    #[serde(default)]
    pub crowd_score: Option<f64>,
    #[serde(default)]
    pub wildlife_score: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Force suggested ranges into valid candidates for `request`.
///
/// Each suggested start is moved to the nearest start in `windows`, which keeps
/// it inside the window and on the preferred weekday. Spans are set to the trip
/// duration, scores are clamped, totals recomputed, duplicates dropped and the
/// result re-ranked. Missing scores are taken from `fallback`.
pub fn repair_suggestions(
    suggestions: Vec<SuggestedRange>,
    request: &TripRequest,
    windows: &CandidateWindows,
    weights: &ScoreWeights,
    max_options: usize,
    fallback: impl Fn(&DateRange) -> DateRangeCandidate,
) -> Vec<DateRangeCandidate> {
    let Some(first) = windows.ranges.first() else {
        return Vec::new();
    };
    let mut repaired: Vec<DateRangeCandidate> = Vec::new();
    for suggestion in suggestions {
        let range = if windows.shortened {
            *first
        } else {
            let suggested = suggestion.start_date;
            let Some(range) = windows
                .ranges
                .iter()
                .min_by_key(|r| ((r.start - suggested).num_days().abs(), r.start))
                .copied()
            else {
                continue;
            };
            if range.start != suggested {
                debug!(%suggested, start = %range.start, "Moved suggestion to nearest valid start");
            }
            if suggestion
                .end_date
                .is_some_and(|end| (end - suggested).num_days() + 1 != i64::from(request.duration_days))
            {
                debug!(start = %suggested, "Suggested span did not match trip length; resized");
            }
            range
        };

        if repaired.iter().any(|c| c.start_date == range.start) {
            continue;
        }

        let baseline = fallback(&range);
        let score = |value: Option<f64>, default: f64| {
            value.filter(|v| v.is_finite()).map_or(default, clamp_unit)
        };
        let mut candidate = DateRangeCandidate::scored(
            range,
            score(suggestion.weather_score, baseline.weather_score),
            score(suggestion.crowd_score, baseline.crowd_score),
            score(suggestion.wildlife_score, baseline.wildlife_score),
            weights,
        );
        candidate.reasoning = suggestion
            .reasoning
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| describe_candidate(&candidate));
        repaired.push(candidate);
    }

    top_candidates(repaired, max_options)
}
