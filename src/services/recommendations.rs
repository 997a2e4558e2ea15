use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogEntry, RunStatus, Suggestion},
    services::{
        normalizer::normalize,
        progress::{notify, ProgressObserver},
        prompt::{build_initial_prompt, build_retry_prompt},
        providers::GenerationProvider,
        response_parser::{self, ParseError},
        suggestion_filter::{category_allowlist, filter_candidates, FilterOutcome},
    },
};

/// Generation rounds allowed per run unless configured otherwise
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Inputs of one recommendation run
#[derive(Debug, Clone, Copy)]
pub struct RunInput<'a> {
    pub catalog: &'a [CatalogEntry],
    pub count: usize,
    /// Empty means any category
    pub categories: &'a [String],
    pub model: &'a str,
}

/// What a run hands back to its caller
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Accepted suggestions in acceptance order, never more than requested
    pub suggestions: Vec<Suggestion>,
    pub status: RunStatus,
    pub attempts: u32,
    /// Every title rejected as a duplicate, across all rounds
    pub filtered_duplicates: Vec<String>,
}

/// Result of a single prompt → generate → parse → filter round
enum RoundOutcome {
    Completed(FilterOutcome),
    ParseFailure(ParseError),
    TransportFailure(AppError),
}

/// Mutable state owned by one run
#[derive(Default)]
struct RunState {
    accepted: Vec<Suggestion>,
    accepted_keys: HashSet<String>,
    rejected_titles: Vec<String>,
    attempts: u32,
}

impl RunState {
    /// Appends accepted suggestions up to `target` and records rejected titles
    fn absorb(&mut self, outcome: FilterOutcome, target: usize) -> usize {
        let before = self.accepted.len();
        for suggestion in outcome.accepted {
            if self.accepted.len() >= target {
                break;
            }
            self.accepted_keys.insert(normalize(&suggestion.title));
            self.accepted.push(suggestion);
        }
        self.rejected_titles.extend(outcome.rejected_titles);
        self.accepted.len() - before
    }
}

/// Drives the generator until enough unique, unseen suggestions are collected
///
/// Rounds are strictly sequential since each retry prompt embeds the duplicates
/// and accepted titles of every earlier round.
pub struct RecommendationEngine {
    generator: Arc<dyn GenerationProvider>,
    max_attempts: u32,
}

impl RecommendationEngine {
    pub fn new(generator: Arc<dyn GenerationProvider>) -> Self {
        Self {
            generator,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs rounds until `input.count` suggestions are accepted or the attempt budget is spent
    ///
    /// Running out of attempts is not an error: the outcome is marked
    /// [`RunStatus::Partial`]. Only a generator transport failure aborts the run.
    pub async fn recommend(
        &self,
        input: RunInput<'_>,
        observer: Option<&dyn ProgressObserver>,
    ) -> AppResult<RunOutcome> {
        let start = Instant::now();
        let existing_keys: HashSet<String> = input
            .catalog
            .iter()
            .map(|entry| normalize(&entry.title))
            .filter(|key| !key.is_empty())
            .collect();
        let allowed = category_allowlist(input.categories);
        let mut state = RunState::default();

        tracing::info!(
            requested = input.count,
            catalog = input.catalog.len(),
            catalog_keys = existing_keys.len(),
            categories = ?input.categories,
            model = %input.model,
            provider = self.generator.name(),
            "Starting recommendation run"
        );

        let status = loop {
            if state.accepted.len() >= input.count {
                break RunStatus::Complete;
            }
            if state.attempts >= self.max_attempts {
                break RunStatus::Partial;
            }

            let prompt = if state.attempts == 0 {
                build_initial_prompt(input.catalog, input.count, input.categories)
            } else {
                build_retry_prompt(
                    input.catalog,
                    input.count - state.accepted.len(),
                    input.categories,
                    &state.rejected_titles,
                    &state.accepted,
                )
            };

            let round = self
                .play_round(&prompt, input.model, &existing_keys, &state.accepted_keys, &allowed)
                .await;
            state.attempts += 1;

            match round {
                RoundOutcome::TransportFailure(e) => {
                    tracing::error!(
                        attempt = state.attempts,
                        error = %e,
                        "Generation provider failed, aborting run"
                    );
                    return Err(e);
                }
                RoundOutcome::ParseFailure(e) => {
                    tracing::warn!(
                        attempt = state.attempts,
                        error = %e,
                        "Generated response not parseable"
                    );
                }
                RoundOutcome::Completed(outcome) => {
                    let duplicates = outcome.rejected_titles.len();
                    let added = state.absorb(outcome, input.count);
                    tracing::info!(
                        attempt = state.attempts,
                        duplicates,
                        added,
                        accepted = state.accepted.len(),
                        requested = input.count,
                        "Round completed"
                    );
                }
            }

            notify(observer, state.accepted.len(), input.count);
        };

        if status == RunStatus::Partial {
            tracing::warn!(
                accepted = state.accepted.len(),
                requested = input.count,
                attempts = state.attempts,
                "Attempt budget exhausted before reaching requested count"
            );
        }

        tracing::info!(
            accepted = state.accepted.len(),
            attempts = state.attempts,
            duplicates = state.rejected_titles.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendation run finished"
        );

        let mut suggestions = state.accepted;
        suggestions.truncate(input.count);

        Ok(RunOutcome {
            suggestions,
            status,
            attempts: state.attempts,
            filtered_duplicates: state.rejected_titles,
        })
    }

    async fn play_round(
        &self,
        prompt: &str,
        model: &str,
        existing_keys: &HashSet<String>,
        accepted_keys: &HashSet<String>,
        allowed: &HashSet<String>,
    ) -> RoundOutcome {
        let raw = match self.generator.generate(prompt, model).await {
            Ok(raw) => raw,
            Err(e) => return RoundOutcome::TransportFailure(e),
        };

        match response_parser::parse(&raw) {
            Ok(candidates) => RoundOutcome::Completed(filter_candidates(
                candidates,
                existing_keys,
                accepted_keys,
                allowed,
            )),
            Err(e) => {
                tracing::debug!(response = %raw, "Unparseable generator response");
                RoundOutcome::ParseFailure(e)
            }
        }
    }
}
