use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::api::{GenerateRequest, QuestionsRequest, QuizApi};
use crate::cache::{QuestionCache, QuestionHistory};
use crate::config::QuizConfig;
use crate::models::{Principle, QuizLength, QuizQuestion};

/// Generic decoy statements for locally synthesized questions. The
/// correct option is the principle's own one-liner.
const FALLBACK_DISTRACTORS: [&str; 3] = [
    "Users prefer complex interfaces with many options",
    "Design should always prioritize aesthetics over functionality",
    "All users behave exactly the same way",
];

/// Produces exactly one question set per invocation by trying, in order:
/// remote generation API, cached pool, locally synthesized fallback.
/// Sources are tried strictly in sequence; no concurrent fan-out.
///
/// Given a non-empty principle pool this never comes back empty; the
/// zero-principle case must be rejected by the caller.
pub struct QuizGenerator<A: QuizApi> {
    api: Arc<A>,
    questions: QuestionCache,
    history: QuestionHistory,
    config: QuizConfig,
}

impl<A: QuizApi> QuizGenerator<A> {
    pub fn new(
        api: Arc<A>,
        questions: QuestionCache,
        history: QuestionHistory,
        config: QuizConfig,
    ) -> Self {
        Self {
            api,
            questions,
            history,
            config,
        }
    }

    pub async fn generate(&self, pool: &[Principle], length: QuizLength) -> Vec<QuizQuestion> {
        // Marathon means the whole eligible pool, uncapped
        let target = length.question_count().unwrap_or(pool.len());
        let selected = Self::select_principles(pool, target);
        let selected_ids: Vec<String> = selected.iter().map(|p| p.id.clone()).collect();
        let exclude_ids = self.history.get_exclude_ids(&selected_ids, target);

        debug!(
            target,
            principles = selected.len(),
            excluded = exclude_ids.len(),
            "Generating quiz"
        );

        // 1. Remote fetch with recently-seen exclusions
        match self.fetch_remote(&selected_ids, target, exclude_ids).await {
            Ok(fetched) if fetched.len() >= target => {
                self.questions.update_cache(&fetched, &selected_ids);
                return fetched;
            }
            Ok(mut fetched) => {
                // Pool exhaustion for this principle/exclusion combination
                // (an empty success included): one supplemental server-side
                // generation for the shortfall
                let shortfall = target - fetched.len();
                if let Some(mut extra) = self.supplemental(&selected_ids, shortfall).await {
                    extra.truncate(shortfall);
                    fetched.extend(extra);
                }
                if !fetched.is_empty() {
                    self.questions.update_cache(&fetched, &selected_ids);
                    return fetched;
                }
                debug!("Remote and supplemental returned no questions, trying cache");
            }
            Err(e) => warn!(error = %e, "Remote question fetch failed, trying cache"),
        }

        // 2. Sample the offline cache
        let cached = self
            .questions
            .get_random_cached_questions(&selected_ids, target);
        if cached.len() >= target {
            info!(count = cached.len(), "Serving quiz from cache");
            return cached;
        }

        if !cached.is_empty() {
            let shortfall = target - cached.len();
            if let Some(mut extra) = self.supplemental(&selected_ids, shortfall).await {
                extra.truncate(shortfall);
                if !extra.is_empty() {
                    self.questions.update_cache(&extra, &selected_ids);
                    let mut combined = cached;
                    combined.extend(extra);
                    return combined;
                }
            }
            // Short cached set accepted rather than failing the quiz
            info!(count = cached.len(), target, "Serving short quiz from cache");
            return cached;
        }

        // 3. Deterministic local fallback; always succeeds
        info!(principles = selected.len(), "Synthesizing fallback questions");
        Self::fallback_questions(&selected, target)
    }

    /// Uniform random subset of `min(target, pool)` principles, no weighting.
    fn select_principles(pool: &[Principle], target: usize) -> Vec<Principle> {
        let mut shuffled: Vec<Principle> = pool.to_vec();
        shuffled.shuffle(&mut rand::thread_rng());
        shuffled.truncate(target.min(pool.len()));
        shuffled
    }

    async fn fetch_remote(
        &self,
        principle_ids: &[String],
        limit: usize,
        exclude_ids: Vec<String>,
    ) -> anyhow::Result<Vec<QuizQuestion>> {
        let request = QuestionsRequest {
            principle_ids: principle_ids.to_vec(),
            limit: Some(limit),
            difficulty: Some(self.config.default_difficulty),
            exclude_ids: (!exclude_ids.is_empty()).then_some(exclude_ids),
        };
        let response = self.api.fetch_questions(&request).await?;
        debug!(
            received = response.questions.len(),
            available = response.total_available,
            "Remote questions received"
        );
        Ok(response.questions)
    }

    /// One supplemental server-side generation call for a shortfall.
    /// No retry and no backoff: a second failure falls through to the
    /// next source instead of hammering the endpoint.
    async fn supplemental(&self, principle_ids: &[String], shortfall: usize) -> Option<Vec<QuizQuestion>> {
        let per_principle = shortfall.div_ceil(principle_ids.len().max(1)).max(1);
        let request = GenerateRequest {
            principle_ids: principle_ids.to_vec(),
            questions_per_principle: Some(per_principle),
            difficulty: Some(self.config.default_difficulty),
        };

        match self.api.generate_questions(&request).await {
            Ok(response) if response.success && !response.questions.is_empty() => {
                debug!(
                    generated = response.questions.len(),
                    shortfall, "Supplemental generation succeeded"
                );
                Some(response.questions)
            }
            Ok(_) => {
                debug!(shortfall, "Supplemental generation returned nothing");
                None
            }
            Err(e) => {
                warn!(error = %e, "Supplemental generation failed");
                None
            }
        }
    }

    /// Build one 4-option question per principle. The correct option is
    /// the principle's one-liner; its slot is chosen uniformly at random
    /// so a fixed position cannot be learned.
    fn fallback_questions(principles: &[Principle], target: usize) -> Vec<QuizQuestion> {
        let mut rng = rand::thread_rng();
        principles
            .iter()
            .take(target)
            .enumerate()
            .map(|(index, principle)| {
                let correct_answer = rng.gen_range(0..4);
                let mut options: Vec<String> = FALLBACK_DISTRACTORS
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                options.insert(correct_answer, principle.one_liner.clone());

                QuizQuestion {
                    id: format!("fallback_{}_{}", principle.id, index),
                    principle_id: principle.id.clone(),
                    question: format!("What is the main idea behind {}?", principle.title),
                    options,
                    correct_answer,
                    explanation: Some(format!(
                        "The correct answer is: \"{}\"",
                        principle.one_liner
                    )),
                }
            })
            .collect()
    }
}
