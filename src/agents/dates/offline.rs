use async_trait::async_trait;
use tracing::{debug, instrument};

use super::seasonal::SeasonalModel;
use super::{candidate_windows, mark_shortened, top_candidates};
use crate::agents::{AgentError, DateAdvisor};
use crate::config::TripPlanConfig;
use crate::models::{DateRangeCandidate, TripRequest};

/// Scores every feasible window with the seasonal model
#[derive(Debug, Clone)]
pub struct OfflineDateAdvisor {
    model: SeasonalModel,
    max_options: usize,
    allow_shortened: bool,
}

impl OfflineDateAdvisor {
    #[must_use]
    pub fn new(seed: u64, max_options: usize, allow_shortened: bool) -> Self {
        Self {
            model: SeasonalModel::new(seed),
            max_options,
            allow_shortened,
        }
    }

    #[must_use]
    pub fn from_config(config: &TripPlanConfig) -> Self {
        Self::new(
            config.offline.seed,
            config.planner.max_date_options,
            config.planner.allow_shortened_window,
        )
    }

    #[must_use]
    pub fn model(&self) -> &SeasonalModel {
        &self.model
    }

    #[must_use]
    pub fn max_options(&self) -> usize {
        self.max_options
    }

    #[must_use]
    pub fn allow_shortened(&self) -> bool {
        self.allow_shortened
    }

    /// Synchronous core, shared with the assisted and live advisors
    pub fn rank(&self, request: &TripRequest) -> Result<Vec<DateRangeCandidate>, AgentError> {
        let windows = candidate_windows(request, self.allow_shortened)?;
        let scored: Vec<DateRangeCandidate> = windows
            .ranges
            .iter()
            .map(|range| self.model.score_range(range))
            .collect();

        let mut ranked = top_candidates(scored, self.max_options);
        if windows.shortened
            && let Some(only) = ranked.first_mut()
        {
            mark_shortened(only, request.duration_days);
        }
        debug!(
            best = ?ranked.first().map(|c| (c.start_date, c.total_score)),
            "Ranked date options"
        );
        Ok(ranked)
    }
}

#[async_trait]
impl DateAdvisor for OfflineDateAdvisor {
    fn name(&self) -> &'static str {
        "offline-dates"
    }

    #[instrument(skip_all, fields(advisor = "offline"))]
    async fn propose_dates(
        &self,
        request: &TripRequest,
    ) -> Result<Vec<DateRangeCandidate>, AgentError> {
        self.rank(request)
    }
}
