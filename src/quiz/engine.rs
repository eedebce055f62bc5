use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, warn};

use crate::api::QuizApi;
use crate::cache::QuestionHistory;
use crate::models::{Principle, QuizAnswer, QuizLength, QuizMode, QuizResult, QuizSession};
use crate::store::{keys, KvStore};

use super::QuizGenerator;

/// Drives one quiz session at a time: start, answer, navigate, submit.
/// Completed results are appended to a persisted history and the served
/// question ids are fed to the recency tracker on submission.
pub struct QuizEngine<A: QuizApi> {
    generator: QuizGenerator<A>,
    history: QuestionHistory,
    store: Arc<KvStore>,
    current_session: Option<QuizSession>,
    completed_sessions: Vec<QuizResult>,
}

impl<A: QuizApi> QuizEngine<A> {
    pub fn new(generator: QuizGenerator<A>, history: QuestionHistory, store: Arc<KvStore>) -> Self {
        Self {
            generator,
            history,
            store,
            current_session: None,
            completed_sessions: Vec::new(),
        }
    }

    pub fn current_session(&self) -> Option<&QuizSession> {
        self.current_session.as_ref()
    }

    pub fn completed_sessions(&self) -> &[QuizResult] {
        &self.completed_sessions
    }

    /// Start a new quiz over the eligible principle pool. The pool must
    /// be non-empty; favorites/unlock filtering happens upstream.
    pub async fn start_new_quiz(
        &mut self,
        principles: &[Principle],
        mode: QuizMode,
        length: QuizLength,
    ) -> Result<&QuizSession> {
        if principles.is_empty() {
            anyhow::bail!("No principles available for a quiz");
        }

        let questions = self.generator.generate(principles, length).await;
        let session = QuizSession {
            id: format!("quiz_{}", Utc::now().timestamp_millis()),
            principles_used: questions.iter().map(|q| q.principle_id.clone()).collect(),
            questions,
            answers: Vec::new(),
            current_question_index: 0,
            start_time: Utc::now(),
            end_time: None,
            score: 0,
            mode,
            length,
        };

        debug!(
            session = %session.id,
            questions = session.questions.len(),
            "Quiz session started"
        );
        Ok(self.current_session.insert(session))
    }

    /// Record an answer. Re-answering a question replaces the previous
    /// answer, so a session holds at most one answer per question id.
    pub fn answer_question(&mut self, question_id: &str, selected_answer: usize) {
        let Some(session) = self.current_session.as_mut() else {
            return;
        };
        let Some(question) = session.questions.iter().find(|q| q.id == question_id) else {
            return;
        };

        let answer = QuizAnswer {
            question_id: question_id.to_string(),
            selected_answer,
            is_correct: selected_answer == question.correct_answer,
            time_spent_secs: 0,
        };

        match session
            .answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
        {
            Some(existing) => *existing = answer,
            None => session.answers.push(answer),
        }

        session.score = session.answers.iter().filter(|a| a.is_correct).count();
    }

    /// Bounds-checked navigation; out-of-range indexes are ignored.
    pub fn go_to_question(&mut self, index: usize) {
        if let Some(session) = self.current_session.as_mut() {
            if index < session.questions.len() {
                session.current_question_index = index;
            }
        }
    }

    /// Finalize the session: compute the result, record the served ids in
    /// the history tracker, persist the quiz history, and clear the
    /// session. Returns `None` when no session is active.
    pub fn submit_quiz(&mut self) -> Option<QuizResult> {
        let mut session = self.current_session.take()?;

        let end_time = Utc::now();
        session.end_time = Some(end_time);

        let total_questions = session.questions.len();
        let total_secs = (end_time - session.start_time).num_seconds().max(0) as u64;
        let result = QuizResult {
            total_questions,
            correct_answers: session.score,
            score_percentage: if total_questions > 0 {
                ((session.score as f64 / total_questions as f64) * 100.0).round() as u32
            } else {
                0
            },
            average_time_per_question_secs: if total_questions > 0 {
                total_secs / total_questions as u64
            } else {
                0
            },
            session,
        };

        // Bias future selection away from what was just served
        let question_ids: Vec<String> = result
            .session
            .questions
            .iter()
            .map(|q| q.id.clone())
            .collect();
        self.history.add_questions_to_history(&question_ids);

        self.completed_sessions.push(result.clone());
        self.persist_history();

        Some(result)
    }

    /// Discard the current session without recording anything.
    pub fn reset_quiz(&mut self) {
        self.current_session = None;
    }

    pub fn load_quiz_history(&mut self) {
        let Some(blob) = self.store.get_string(keys::QUIZ_HISTORY) else {
            return;
        };
        match serde_json::from_str(&blob) {
            Ok(history) => self.completed_sessions = history,
            Err(e) => warn!(error = %e, "Failed to load quiz history"),
        }
    }

    fn persist_history(&self) {
        match serde_json::to_string(&self.completed_sessions) {
            Ok(blob) => self.store.set(keys::QUIZ_HISTORY, blob),
            Err(e) => warn!(error = %e, "Failed to save quiz history"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    use crate::api::{
        GenerateRequest, GenerateResponse, HealthResponse, PrinciplesResponse, QuestionsRequest,
        QuestionsResponse, QuizApi, SyncQuestionsResponse,
    };
    use crate::cache::QuestionCache;
    use crate::config::{CacheConfig, QuizConfig};
    use crate::models::PrincipleType;
    use crate::store::MemoryBackend;

    /// Offline backend: every remote path fails, forcing fallback synthesis.
    struct OfflineApi;

    impl QuizApi for OfflineApi {
        async fn health_check(&self) -> Result<HealthResponse> {
            anyhow::bail!("offline");
        }
        async fn fetch_principles(&self) -> Result<PrinciplesResponse> {
            anyhow::bail!("offline");
        }
        async fn fetch_questions(&self, _request: &QuestionsRequest) -> Result<QuestionsResponse> {
            anyhow::bail!("offline");
        }
        async fn sync_questions(&self, _ids: &[String]) -> Result<SyncQuestionsResponse> {
            anyhow::bail!("offline");
        }
        async fn generate_questions(&self, _request: &GenerateRequest) -> Result<GenerateResponse> {
            anyhow::bail!("offline");
        }
    }

    fn sample_principle(id: &str) -> Principle {
        Principle {
            id: id.to_string(),
            principle_type: PrincipleType::Heuristic,
            title: format!("Principle {}", id),
            one_liner: format!("One-liner {}", id),
            definition: String::new(),
            applies_when: vec![],
            do_list: vec![],
            dont_list: vec![],
            example: None,
            tags: vec![],
            category: "heuristics".to_string(),
            sources: vec![],
        }
    }

    fn engine() -> (QuizEngine<OfflineApi>, QuestionHistory, Arc<KvStore>) {
        let store = Arc::new(KvStore::new(Arc::new(MemoryBackend::default())));
        let history = QuestionHistory::new(Arc::clone(&store));
        let generator = QuizGenerator::new(
            Arc::new(OfflineApi),
            QuestionCache::new(Arc::clone(&store), CacheConfig::default()),
            history.clone(),
            QuizConfig::default(),
        );
        (
            QuizEngine::new(generator, history.clone(), Arc::clone(&store)),
            history,
            store,
        )
    }

    fn pool(count: usize) -> Vec<Principle> {
        (0..count).map(|i| sample_principle(&format!("p{}", i))).collect()
    }

    #[tokio::test]
    async fn test_start_answer_submit_flow() {
        let (mut engine, history, _store) = engine();
        let pool = pool(3);

        engine
            .start_new_quiz(&pool, QuizMode::All, QuizLength::Quick)
            .await
            .expect("start quiz");

        let session = engine.current_session().expect("active session");
        assert_eq!(session.questions.len(), 3);
        assert_eq!(session.score, 0);

        // Answer every question correctly
        let answers: Vec<(String, usize)> = session
            .questions
            .iter()
            .map(|q| (q.id.clone(), q.correct_answer))
            .collect();
        for (id, correct) in &answers {
            engine.answer_question(id, *correct);
        }
        assert_eq!(engine.current_session().expect("session").score, 3);

        let result = engine.submit_quiz().expect("result");
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.correct_answers, 3);
        assert_eq!(result.score_percentage, 100);
        assert!(engine.current_session().is_none());

        // Served ids recorded for future exclusion
        assert_eq!(history.get_recent_question_ids().len(), 3);
    }

    #[tokio::test]
    async fn test_reanswer_replaces_not_duplicates() {
        let (mut engine, _history, _store) = engine();
        engine
            .start_new_quiz(&pool(2), QuizMode::All, QuizLength::Quick)
            .await
            .expect("start quiz");

        let (question_id, correct) = {
            let q = &engine.current_session().expect("session").questions[0];
            (q.id.clone(), q.correct_answer)
        };
        let wrong = (correct + 1) % 4;

        engine.answer_question(&question_id, wrong);
        engine.answer_question(&question_id, correct);

        let session = engine.current_session().expect("session");
        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.score, 1);
    }

    #[tokio::test]
    async fn test_navigation_bounds() {
        let (mut engine, _history, _store) = engine();
        engine
            .start_new_quiz(&pool(3), QuizMode::All, QuizLength::Quick)
            .await
            .expect("start quiz");

        engine.go_to_question(2);
        assert_eq!(
            engine.current_session().expect("session").current_question_index,
            2
        );

        engine.go_to_question(99); // ignored
        assert_eq!(
            engine.current_session().expect("session").current_question_index,
            2
        );
    }

    #[tokio::test]
    async fn test_empty_pool_rejected() {
        let (mut engine, _history, _store) = engine();
        let result = engine.start_new_quiz(&[], QuizMode::All, QuizLength::Quick).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reset_discards_without_recording() {
        let (mut engine, history, _store) = engine();
        engine
            .start_new_quiz(&pool(2), QuizMode::Favorites, QuizLength::Quick)
            .await
            .expect("start quiz");

        engine.reset_quiz();
        assert!(engine.current_session().is_none());
        assert!(engine.submit_quiz().is_none());
        assert!(history.get_recent_question_ids().is_empty());
    }

    #[tokio::test]
    async fn test_history_persists_and_reloads() {
        let (mut engine, _history, store) = engine();
        engine
            .start_new_quiz(&pool(2), QuizMode::All, QuizLength::Quick)
            .await
            .expect("start quiz");
        engine.submit_quiz().expect("result");
        assert_eq!(engine.completed_sessions().len(), 1);

        // A fresh engine over the same store sees the persisted history
        let history = QuestionHistory::new(Arc::clone(&store));
        let generator = QuizGenerator::new(
            Arc::new(OfflineApi),
            QuestionCache::new(Arc::clone(&store), CacheConfig::default()),
            history.clone(),
            QuizConfig::default(),
        );
        let mut fresh = QuizEngine::new(generator, history, Arc::clone(&store));
        assert!(fresh.completed_sessions().is_empty());
        fresh.load_quiz_history();
        assert_eq!(fresh.completed_sessions().len(), 1);
    }
}
