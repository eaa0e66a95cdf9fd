//! Composite trip plan and per-section outcome markers

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DateRangeCandidate, DiningPlan, RoutePlan, TripRequest, WeatherDay};

/// Machine-readable reason a step did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    NoFeasibleWindow,
    ProviderUnavailable,
    LocationUnresolved,
    RouteNotFound,
    DistanceServiceUnavailable,
    InvalidOutput,
    DeadlineExceeded,
}

impl FailureCode {
    /// Transient kinds the orchestrator may retry
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureCode::ProviderUnavailable | FailureCode::DistanceServiceUnavailable
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCode::NoFeasibleWindow => "no_feasible_window",
            FailureCode::ProviderUnavailable => "provider_unavailable",
            FailureCode::LocationUnresolved => "location_unresolved",
            FailureCode::RouteNotFound => "route_not_found",
            FailureCode::DistanceServiceUnavailable => "distance_service_unavailable",
            FailureCode::InvalidOutput => "invalid_output",
            FailureCode::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub code: FailureCode,
    pub message: String,
    /// Attempts made before giving up
    pub attempts: u32,
}

/// Outcome of one plan section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Succeeded {
        data: T,
        attempts: u32,
    },
    Failed {
        reason: FailureReason,
    },
    #[serde(rename = "skipped_due_to_dependency_failure")]
    Skipped {
        /// Section whose failure caused the skip
        dependency: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Succeeded,
    Failed,
    SkippedDueToDependencyFailure,
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionStatus::Succeeded => write!(f, "succeeded"),
            SectionStatus::Failed => write!(f, "failed"),
            SectionStatus::SkippedDueToDependencyFailure => {
                write!(f, "skipped (dependency failed)")
            }
        }
    }
}

impl SectionStatus {
    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            SectionStatus::Succeeded => "🟢",
            SectionStatus::Failed => "🔴",
            SectionStatus::SkippedDueToDependencyFailure => "⚪",
        }
    }
}

impl<T> Section<T> {
    #[must_use]
    pub fn status(&self) -> SectionStatus {
        match self {
            Section::Succeeded { .. } => SectionStatus::Succeeded,
            Section::Failed { .. } => SectionStatus::Failed,
            Section::Skipped { .. } => SectionStatus::SkippedDueToDependencyFailure,
        }
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Succeeded { data, .. } => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Section::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    #[must_use]
    pub fn failed(code: FailureCode, message: impl Into<String>, attempts: u32) -> Self {
        Section::Failed {
            reason: FailureReason {
                code,
                message: message.into(),
                attempts,
            },
        }
    }
}

/// Orchestration states, recorded in the order they were entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    Init,
    DatesResolved,
    WeatherAndRoutePending,
    RouteResolved,
    DiningPending,
    DeadlineExceeded,
    Complete,
    Failed,
}

impl fmt::Display for PlanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanState::Init => "init",
            PlanState::DatesResolved => "dates_resolved",
            PlanState::WeatherAndRoutePending => "weather_and_route_pending",
            PlanState::RouteResolved => "route_resolved",
            PlanState::DiningPending => "dining_pending",
            PlanState::DeadlineExceeded => "deadline_exceeded",
            PlanState::Complete => "complete",
            PlanState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a completed orchestration run.
///
/// Every field is ordered data; serializing the same plan twice yields the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub request: TripRequest,
    /// Ranked best first
    pub date_options: Vec<DateRangeCandidate>,
    /// Always `date_options[0]`
    pub chosen_dates: DateRangeCandidate,
    pub weather: Section<Vec<WeatherDay>>,
    pub route: Section<RoutePlan>,
    pub dining: Section<DiningPlan>,
    pub state_history: Vec<PlanState>,
}

impl TripPlan {
    #[must_use]
    pub fn final_state(&self) -> PlanState {
        self.state_history.last().copied().unwrap_or(PlanState::Init)
    }

    /// True when every section succeeded
    #[must_use]
    pub fn is_fully_successful(&self) -> bool {
        self.weather.status() == SectionStatus::Succeeded
            && self.route.status() == SectionStatus::Succeeded
            && self.dining.status() == SectionStatus::Succeeded
    }
}

fn write_section_header<T>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    section: &Section<T>,
) -> fmt::Result {
    let status = section.status();
    writeln!(f, "\n{} {title}: {status}", status.emoji())?;
    match section {
        Section::Failed { reason } => writeln!(
            f,
            "   [{}] {} (after {} attempt(s))",
            reason.code, reason.message, reason.attempts
        ),
        Section::Skipped { dependency } => writeln!(f, "   {dependency} did not succeed"),
        Section::Succeeded { .. } => Ok(()),
    }
}

impl fmt::Display for TripPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chosen = &self.chosen_dates;
        writeln!(
            f,
            "📅 Trip from {}: {} to {} ({} days)",
            self.request.starting_location,
            chosen.start_date,
            chosen.end_date,
            chosen.span_days()
        )?;
        writeln!(
            f,
            "   score {:.2} (weather {:.2}, crowds {:.2}, wildlife {:.2})",
            chosen.total_score, chosen.weather_score, chosen.crowd_score, chosen.wildlife_score
        )?;
        if !chosen.reasoning.is_empty() {
            writeln!(f, "   {}", chosen.reasoning)?;
        }
        for (rank, option) in self.date_options.iter().enumerate().skip(1) {
            writeln!(
                f,
                "   alt #{}: {} to {} (score {:.2})",
                rank + 1,
                option.start_date,
                option.end_date,
                option.total_score
            )?;
        }

        write_section_header(f, "Weather", &self.weather)?;
        if let Some(days) = self.weather.data() {
            for day in days {
                write!(
                    f,
                    "   {} {:<24} {}  precip {}%",
                    day.date,
                    day.condition,
                    day.format_temperature(),
                    day.precipitation_chance
                )?;
                match &day.daylight {
                    Some(daylight) => writeln!(f, "  daylight {:.1}h", daylight.hours())?,
                    None => writeln!(f)?,
                }
            }
        }

        write_section_header(f, "Route", &self.route)?;
        if let Some(route) = self.route.data() {
            writeln!(
                f,
                "   {} ({:.1} mi, {}h{:02}m driving)",
                route.route_name,
                route.total_distance_miles(),
                route.total_duration_minutes() / 60,
                route.total_duration_minutes() % 60
            )?;
            for stop in route.stops() {
                writeln!(
                    f,
                    "   day {}{}: {}",
                    stop.first_day,
                    if stop.days > 1 {
                        format!("-{}", stop.first_day + stop.days - 1)
                    } else {
                        String::new()
                    },
                    stop.waypoints.join(", ")
                )?;
            }
        }

        write_section_header(f, "Dining", &self.dining)?;
        if let Some(dining) = self.dining.data() {
            for (stop, picks) in dining {
                writeln!(f, "   {stop}:")?;
                if picks.is_empty() {
                    writeln!(f, "      no matches")?;
                }
                for pick in picks {
                    writeln!(
                        f,
                        "      {} ({}, {}, ★{:.1})",
                        pick.name, pick.cuisine, pick.price_tier, pick.rating
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_codes_are_retryable() {
        assert!(FailureCode::ProviderUnavailable.is_retryable());
        assert!(FailureCode::DistanceServiceUnavailable.is_retryable());
        assert!(!FailureCode::LocationUnresolved.is_retryable());
        assert!(!FailureCode::RouteNotFound.is_retryable());
        assert!(!FailureCode::NoFeasibleWindow.is_retryable());
        assert!(!FailureCode::DeadlineExceeded.is_retryable());
    }

    #[test]
    fn test_section_status_tags() {
        let skipped: Section<u8> = Section::Skipped {
            dependency: "route".to_string(),
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["status"], "skipped_due_to_dependency_failure");

        let failed: Section<u8> = Section::failed(FailureCode::ProviderUnavailable, "down", 3);
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"]["code"], "provider_unavailable");
        assert_eq!(failed.status(), SectionStatus::Failed);
        assert!(failed.data().is_none());

        let ok = Section::Succeeded { data: 7u8, attempts: 1 };
        assert_eq!(ok.data(), Some(&7));
    }

    #[test]
    fn test_failure_code_display_matches_serde() {
        let code = FailureCode::DistanceServiceUnavailable;
        assert_eq!(
            serde_json::to_value(code).unwrap(),
            serde_json::Value::String(code.to_string())
        );
    }
}
