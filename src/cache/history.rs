use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::{keys, KvStore};

/// Keep track of the last 100 served questions.
const MAX_HISTORY_SIZE: usize = 100;

/// Cap on exclusions relative to quiz size, so a large history never
/// over-constrains the remote query.
const EXCLUDE_CAP_MULTIPLIER: usize = 3;

#[derive(Debug, Clone)]
pub struct HistoryStats {
    pub total_tracked: usize,
    pub newest_id: Option<String>,
    pub oldest_id: Option<String>,
}

/// Bounded recency list of previously served question ids, most recent
/// first. A soft-avoidance signal for question selection, not a hard
/// filter: the remote API may still return fewer results than requested.
#[derive(Clone)]
pub struct QuestionHistory {
    store: Arc<KvStore>,
}

impl QuestionHistory {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    /// Most-recent-first list of served question ids; empty if none.
    pub fn get_recent_question_ids(&self) -> Vec<String> {
        let Some(blob) = self.store.get_string(keys::QUESTION_HISTORY) else {
            return Vec::new();
        };
        match serde_json::from_str(&blob) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to parse question history");
                Vec::new()
            }
        }
    }

    /// Prepend newly served ids, deduplicate keeping the most recent
    /// occurrence, truncate to the cap. Called once per completed quiz.
    pub fn add_questions_to_history(&self, question_ids: &[String]) {
        let mut seen = HashSet::new();
        let mut updated: Vec<String> = question_ids
            .iter()
            .chain(self.get_recent_question_ids().iter())
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();
        updated.truncate(MAX_HISTORY_SIZE);

        match serde_json::to_string(&updated) {
            Ok(blob) => {
                self.store.set(keys::QUESTION_HISTORY, blob);
                debug!(
                    added = question_ids.len(),
                    total = updated.len(),
                    "Recorded served questions"
                );
            }
            Err(e) => warn!(error = %e, "Failed to save question history"),
        }
    }

    /// Ids to ask the remote API to avoid for an upcoming quiz. Smaller
    /// quizzes exclude a larger share of history because they are run
    /// more often and saturate the pool faster; the result is capped at
    /// three times the quiz size. Returns the most-recent prefix.
    pub fn get_exclude_ids(
        &self,
        _available_principle_ids: &[String],
        question_count: usize,
    ) -> Vec<String> {
        let recent = self.get_recent_question_ids();
        if recent.is_empty() {
            return Vec::new();
        }

        let exclude_ratio = if question_count <= 5 {
            0.7
        } else if question_count <= 10 {
            0.5
        } else {
            0.3
        };

        let max_exclude = (recent.len() as f64 * exclude_ratio).floor() as usize;
        let safe_exclude = max_exclude.min(question_count * EXCLUDE_CAP_MULTIPLIER);

        recent.into_iter().take(safe_exclude).collect()
    }

    pub fn clear_history(&self) {
        self.store.delete(keys::QUESTION_HISTORY);
        debug!("Question history cleared");
    }

    pub fn get_stats(&self) -> HistoryStats {
        let history = self.get_recent_question_ids();
        HistoryStats {
            total_tracked: history.len(),
            newest_id: history.first().cloned(),
            oldest_id: history.last().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn history() -> QuestionHistory {
        QuestionHistory::new(Arc::new(KvStore::new(Arc::new(MemoryBackend::default()))))
    }

    fn string_ids(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_prepend_and_dedup() {
        let history = history();
        history.add_questions_to_history(&string_ids("q", 0..3));
        history.add_questions_to_history(&["q1".to_string(), "q5".to_string()]);

        let recent = history.get_recent_question_ids();
        // q1 moved to the front without growing the list
        assert_eq!(recent, vec!["q1", "q5", "q0", "q2"]);
    }

    #[test]
    fn test_capped_at_max_size() {
        let history = history();
        history.add_questions_to_history(&string_ids("a", 0..80));
        history.add_questions_to_history(&string_ids("b", 0..50));

        let recent = history.get_recent_question_ids();
        assert_eq!(recent.len(), 100);
        assert_eq!(recent[0], "b0");
        assert_eq!(recent[49], "b49");
        assert_eq!(recent[50], "a0");
    }

    #[test]
    fn test_exclude_ratio_by_quiz_size() {
        let history = history();
        history.add_questions_to_history(&string_ids("q", 0..100));

        // 100 tracked: 70% for small quizzes but capped at 3x quiz size
        assert_eq!(history.get_exclude_ids(&[], 5).len(), 15);
        // 50% for medium, capped at 30
        assert_eq!(history.get_exclude_ids(&[], 10).len(), 30);
        // 30% for large, 30 < 3*25
        assert_eq!(history.get_exclude_ids(&[], 25).len(), 30);
    }

    #[test]
    fn test_exclude_never_exceeds_history() {
        let history = history();
        history.add_questions_to_history(&string_ids("q", 0..4));

        let excluded = history.get_exclude_ids(&[], 10);
        assert_eq!(excluded.len(), 2); // floor(4 * 0.5)
        assert_eq!(excluded, vec!["q0", "q1"]); // most recent prefix
        assert!(history.get_exclude_ids(&[], 100).len() <= 4);
    }

    #[test]
    fn test_empty_history_excludes_nothing() {
        assert!(history().get_exclude_ids(&[], 10).is_empty());
    }

    #[test]
    fn test_stats_and_clear() {
        let history = history();
        history.add_questions_to_history(&string_ids("q", 0..3));

        let stats = history.get_stats();
        assert_eq!(stats.total_tracked, 3);
        assert_eq!(stats.newest_id.as_deref(), Some("q0"));
        assert_eq!(stats.oldest_id.as_deref(), Some("q2"));

        history.clear_history();
        assert_eq!(history.get_stats().total_tracked, 0);
    }
}
