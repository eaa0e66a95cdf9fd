//! Orchestration state log

use tracing::{info, warn};

use crate::models::PlanState;

/// Whether the orchestrator may move from `from` to `to`
#[must_use]
pub fn is_allowed(from: PlanState, to: PlanState) -> bool {
    use PlanState::{
        Complete, DatesResolved, DeadlineExceeded, DiningPending, Failed, Init, RouteResolved,
        WeatherAndRoutePending,
    };
    matches!(
        (from, to),
        (Init, DatesResolved | Failed)
            | (DatesResolved, WeatherAndRoutePending | Failed)
            | (WeatherAndRoutePending, RouteResolved | DeadlineExceeded | Complete)
            | (RouteResolved, DiningPending | DeadlineExceeded | Complete)
            | (DiningPending, DeadlineExceeded | Complete)
            | (DeadlineExceeded, Complete | Failed)
    )
}

/// States in the order they were entered, starting at [`PlanState::Init`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLog {
    history: Vec<PlanState>,
}

impl Default for StateLog {
    fn default() -> Self {
        Self {
            history: vec![PlanState::Init],
        }
    }
}

impl StateLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> PlanState {
        self.history.last().copied().unwrap_or(PlanState::Init)
    }

    pub fn enter(&mut self, next: PlanState) {
        let from = self.current();
        if is_allowed(from, next) {
            info!(%from, to = %next, "Plan state transition");
        } else {
            warn!(%from, to = %next, "Unexpected plan state transition");
        }
        self.history.push(next);
    }

    #[must_use]
    pub fn into_history(self) -> Vec<PlanState> {
        self.history
    }
}
