use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::offline::OfflineDateAdvisor;
use super::{SuggestedRange, candidate_windows, mark_shortened, repair_suggestions};
use crate::agents::{AgentError, DateAdvisor};
use crate::llm::{LanguageModel, extract_json, parse_each};
use crate::models::{DateRangeCandidate, TripRequest};

const SYSTEM_PROMPT: &str = "You are an expert Yellowstone National Park trip advisor. \
Recommend travel date ranges using historical weather patterns, visitor crowd levels \
(summer and holiday weeks are busiest, weekends busier than weekdays) and wildlife \
activity (spring and autumn are best). Answer with JSON only.";

/// Asks the language model for date ranges and repairs its answer.
///
/// Falls back to seasonal scoring when the model is unreachable or nothing
/// usable survives repair.
pub struct AssistedDateAdvisor {
    llm: Arc<dyn LanguageModel>,
    fallback: OfflineDateAdvisor,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuggestionPayload {
    List(Vec<serde_json::Value>),
    Wrapped {
        #[serde(alias = "recommended_date_ranges", alias = "candidates")]
        recommendations: Vec<serde_json::Value>,
    },
}

impl AssistedDateAdvisor {
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>, fallback: OfflineDateAdvisor) -> Self {
        Self { llm, fallback }
    }

    fn user_prompt(&self, request: &TripRequest) -> String {
        let weekday = request
            .preferences
            .preferred_start_weekday
            .map(|w| format!(" Prefer trips starting on {w}."))
            .unwrap_or_default();
        format!(
            "Suggest up to {max} date ranges of exactly {days} days between {earliest} and {latest} \
(inclusive) for a trip starting from {start}.{weekday}\n\
Reply with a JSON array of objects with fields start_date (YYYY-MM-DD), end_date (YYYY-MM-DD), \
weather_score, crowd_score, wildlife_score (each 0 to 1, crowd_score higher when less crowded) \
and reasoning (one sentence).",
            max = self.fallback.max_options(),
            days = request.duration_days,
            earliest = request.window.earliest,
            latest = request.window.latest,
            start = request.starting_location,
        )
    }
}

/// Parse the model's reply into raw suggestions
pub(crate) fn parse_suggestions(reply: &str) -> Result<Vec<SuggestedRange>, String> {
    let json = extract_json(reply).ok_or("reply contained no JSON")?;
    match serde_json::from_str::<SuggestionPayload>(json) {
        Ok(SuggestionPayload::List(list)) => Ok(parse_each(list)),
        Ok(SuggestionPayload::Wrapped { recommendations }) => Ok(parse_each(recommendations)),
        Err(e) => Err(format!("reply did not match the expected shape: {e}")),
    }
}

#[async_trait]
impl DateAdvisor for AssistedDateAdvisor {
    fn name(&self) -> &'static str {
        "assisted-dates"
    }

    #[instrument(skip_all, fields(advisor = "assisted", model = %self.llm.name()))]
    async fn propose_dates(
        &self,
        request: &TripRequest,
    ) -> Result<Vec<DateRangeCandidate>, AgentError> {
        // Infeasible windows fail before spending a model call
        let windows = candidate_windows(request, self.fallback.allow_shortened())?;

        let reply = match self
            .llm
            .complete(SYSTEM_PROMPT, &self.user_prompt(request))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Language model unavailable; using seasonal scoring");
                return self.fallback.rank(request);
            }
        };

        let suggestions = match parse_suggestions(&reply) {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "Unusable model output; using seasonal scoring");
                return self.fallback.rank(request);
            }
        };

        let model = self.fallback.model();
        let mut repaired = repair_suggestions(
            suggestions,
            request,
            &windows,
            model.weights(),
            self.fallback.max_options(),
            |range| model.score_range(range),
        );

        if repaired.is_empty() {
            warn!("No model suggestion survived validation; using seasonal scoring");
            return self.fallback.rank(request);
        }
        if windows.shortened
            && let Some(only) = repaired.first_mut()
        {
            mark_shortened(only, request.duration_days);
        }

        info!(options = repaired.len(), "Model date suggestions accepted");
        Ok(repaired)
    }
}
