use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::models::{QuestionSnapshot, QuizQuestion};
use crate::store::{keys, KvStore};

use super::Validity;

/// Hard floor for validity, distinct from the configurable minimum:
/// below this the cache cannot serve one full short quiz.
const MIN_QUESTIONS_FLOOR: usize = 10;

#[derive(Debug, Clone)]
pub struct QuestionSyncStatus {
    pub last_sync_time: Option<DateTime<Utc>>,
    pub total_cached: usize,
    pub needs_sync: bool,
}

#[derive(Debug, Clone)]
pub struct QuestionCacheStats {
    pub total_questions: usize,
    pub last_sync: Option<DateTime<Utc>>,
    pub is_valid: bool,
}

/// Pure validity check for the question snapshot: fresh enough AND
/// holding at least one short quiz worth of questions.
pub fn snapshot_validity(
    last_sync: Option<DateTime<Utc>>,
    count: usize,
    now: DateTime<Utc>,
    config: &CacheConfig,
) -> Validity {
    let Some(ts) = last_sync else {
        return Validity::invalid("never synced");
    };
    if now - ts > Duration::hours(config.max_age_hours) {
        return Validity::invalid("expired");
    }
    if count < MIN_QUESTIONS_FLOOR {
        return Validity::invalid("below minimum");
    }
    Validity::valid()
}

/// Pool of quiz questions persisted as a single snapshot, merged by
/// question id and truncated oldest-first on overflow.
#[derive(Clone)]
pub struct QuestionCache {
    store: Arc<KvStore>,
    config: CacheConfig,
}

impl QuestionCache {
    pub fn new(store: Arc<KvStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn is_cache_valid(&self) -> bool {
        let validity = snapshot_validity(
            self.last_sync(),
            self.get_cached_questions().len(),
            Utc::now(),
            &self.config,
        );
        if let Some(reason) = validity.reason {
            debug!(reason, "Question cache invalid");
        }
        validity.valid
    }

    /// Deserialize the stored snapshot; empty list if absent or corrupt.
    pub fn get_cached_questions(&self) -> Vec<QuizQuestion> {
        self.snapshot().map_or_else(Vec::new, |s| s.questions)
    }

    /// Replace the stored snapshot wholesale with a fresh timestamp.
    pub fn cache_questions(&self, questions: Vec<QuizQuestion>, principle_ids: &[String]) {
        let count = questions.len();
        let snapshot = QuestionSnapshot {
            total_cached: count,
            questions,
            timestamp: Utc::now(),
            principle_ids: principle_ids.to_vec(),
        };

        match serde_json::to_string(&snapshot) {
            Ok(blob) => {
                self.store.set(keys::CACHED_QUESTIONS, blob);
                self.store
                    .set(keys::QUESTIONS_LAST_SYNC, Utc::now().to_rfc3339());
                debug!(count, "Cached questions for offline use");
            }
            Err(e) => warn!(error = %e, "Failed to serialize question snapshot"),
        }
    }

    /// Merge new questions into the pool: append only previously-unseen
    /// ids, then drop the oldest-inserted entries past the configured
    /// maximum. Idempotent under re-application. This is the normal
    /// accretive path after every successful remote fetch.
    pub fn update_cache(&self, new_questions: &[QuizQuestion], principle_ids: &[String]) {
        let mut combined = self.get_cached_questions();
        let existing_ids: HashSet<String> = combined.iter().map(|q| q.id.clone()).collect();

        combined.extend(
            new_questions
                .iter()
                .filter(|q| !existing_ids.contains(&q.id))
                .cloned(),
        );

        if combined.len() > self.config.max_questions {
            let excess = combined.len() - self.config.max_questions;
            combined.drain(..excess);
        }

        self.cache_questions(combined, principle_ids);
    }

    /// Uniformly sample up to `limit` cached questions whose principle id
    /// is in `principle_ids` (all questions when the filter is empty).
    /// May return fewer than `limit`; callers must check the count.
    pub fn get_random_cached_questions(
        &self,
        principle_ids: &[String],
        limit: usize,
    ) -> Vec<QuizQuestion> {
        let mut filtered: Vec<QuizQuestion> = if principle_ids.is_empty() {
            self.get_cached_questions()
        } else {
            self.get_cached_questions()
                .into_iter()
                .filter(|q| principle_ids.contains(&q.principle_id))
                .collect()
        };

        filtered.shuffle(&mut rand::thread_rng());
        filtered.truncate(limit);
        filtered
    }

    pub fn get_sync_status(&self) -> QuestionSyncStatus {
        let last_sync = self.last_sync();
        let total_cached = self.get_cached_questions().len();
        let needs_sync = match last_sync {
            None => true,
            Some(ts) => {
                Utc::now() - ts > Duration::hours(self.config.max_age_hours)
                    || total_cached < self.config.min_questions
            }
        };

        QuestionSyncStatus {
            last_sync_time: last_sync,
            total_cached,
            needs_sync,
        }
    }

    pub fn clear_cache(&self) {
        self.store.delete(keys::CACHED_QUESTIONS);
        self.store.delete(keys::QUESTIONS_LAST_SYNC);
        debug!("Question cache cleared");
    }

    pub fn get_cache_stats(&self) -> QuestionCacheStats {
        QuestionCacheStats {
            total_questions: self.get_cached_questions().len(),
            last_sync: self.last_sync(),
            is_valid: self.is_cache_valid(),
        }
    }

    fn snapshot(&self) -> Option<QuestionSnapshot> {
        let blob = self.store.get_string(keys::CACHED_QUESTIONS)?;
        match serde_json::from_str(&blob) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Failed to parse cached question snapshot");
                None
            }
        }
    }

    fn last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get_string(keys::QUESTIONS_LAST_SYNC)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!(error = %e, "Unparsable question last-sync timestamp");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    pub(crate) fn sample_question(id: &str, principle_id: &str) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            principle_id: principle_id.to_string(),
            question: format!("Question {}?", id),
            options: vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ],
            correct_answer: 0,
            explanation: None,
        }
    }

    fn question_cache() -> QuestionCache {
        let store = Arc::new(KvStore::new(Arc::new(MemoryBackend::default())));
        QuestionCache::new(store, CacheConfig::default())
    }

    fn ids(prefix: &str, count: usize) -> Vec<QuizQuestion> {
        (0..count)
            .map(|i| sample_question(&format!("{}{}", prefix, i), "p"))
            .collect()
    }

    #[test]
    fn test_valid_after_ten_fresh_invalid_after_clear() {
        let cache = question_cache();
        assert!(!cache.is_cache_valid());

        cache.cache_questions(ids("q", 10), &["p".to_string()]);
        assert!(cache.is_cache_valid());

        cache.clear_cache();
        assert!(!cache.is_cache_valid());
    }

    #[test]
    fn test_below_floor_is_invalid() {
        let cache = question_cache();
        cache.cache_questions(ids("q", 9), &["p".to_string()]);
        assert!(!cache.is_cache_valid());
    }

    #[test]
    fn test_update_cache_merges_by_id() {
        let cache = question_cache();
        cache.cache_questions(ids("q", 5), &["p".to_string()]);

        // Overlap: q3, q4 already cached
        let incoming = vec![
            sample_question("q3", "p"),
            sample_question("q4", "p"),
            sample_question("n1", "p"),
        ];
        cache.update_cache(&incoming, &["p".to_string()]);

        let cached = cache.get_cached_questions();
        assert_eq!(cached.len(), 6);
        assert_eq!(cached.last().expect("last").id, "n1");
    }

    #[test]
    fn test_update_cache_idempotent() {
        let cache = question_cache();
        let incoming = ids("q", 8);

        cache.update_cache(&incoming, &["p".to_string()]);
        let first = cache.get_cached_questions();

        cache.update_cache(&incoming, &["p".to_string()]);
        let second = cache.get_cached_questions();

        assert_eq!(first.len(), second.len());
        let first_ids: Vec<&str> = first.iter().map(|q| q.id.as_str()).collect();
        let second_ids: Vec<&str> = second.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_overflow_drops_oldest_inserted() {
        // Scenario D: 150 cached, max 100, 5 new -> the 5 new plus the 95
        // most-recently-inserted of the prior 150 survive.
        let cache = question_cache();
        cache.cache_questions(ids("old", 150), &["p".to_string()]);

        cache.update_cache(&ids("new", 5), &["p".to_string()]);

        let cached = cache.get_cached_questions();
        assert_eq!(cached.len(), 100);
        assert_eq!(cached[0].id, "old55");
        assert_eq!(cached[94].id, "old149");
        assert_eq!(cached[95].id, "new0");
        assert_eq!(cached[99].id, "new4");
    }

    #[test]
    fn test_random_sample_filters_by_principle() {
        let cache = question_cache();
        let mut pool = Vec::new();
        for i in 0..4 {
            pool.push(sample_question(&format!("a{}", i), "A"));
        }
        for i in 0..6 {
            pool.push(sample_question(&format!("b{}", i), "B"));
        }
        cache.cache_questions(pool, &["A".to_string(), "B".to_string()]);

        let sampled = cache.get_random_cached_questions(&["A".to_string()], 5);
        assert_eq!(sampled.len(), 4); // min(5, available for A)
        assert!(sampled.iter().all(|q| q.principle_id == "A"));
    }

    #[test]
    fn test_empty_filter_samples_whole_pool() {
        let cache = question_cache();
        cache.cache_questions(ids("q", 12), &["p".to_string()]);
        assert_eq!(cache.get_random_cached_questions(&[], 5).len(), 5);
    }

    #[test]
    fn test_corrupt_snapshot_reads_empty() {
        let cache = question_cache();
        cache.store.set(keys::CACHED_QUESTIONS, "{broken");
        assert!(cache.get_cached_questions().is_empty());
    }

    #[test]
    fn test_sync_status_needs_sync_below_minimum() {
        let cache = question_cache();
        cache.cache_questions(ids("q", 15), &["p".to_string()]);

        // 15 >= floor(10) so the cache is valid, but < min_questions(20)
        // so a sync is still wanted
        assert!(cache.is_cache_valid());
        let status = cache.get_sync_status();
        assert_eq!(status.total_cached, 15);
        assert!(status.needs_sync);
    }

    #[test]
    fn test_snapshot_validity_expiry() {
        let config = CacheConfig::default();
        let now = Utc::now();
        let fresh = Some(now - Duration::hours(1));
        let stale = Some(now - Duration::hours(25));

        assert!(snapshot_validity(fresh, 50, now, &config).valid);
        assert_eq!(
            snapshot_validity(stale, 50, now, &config).reason,
            Some("expired")
        );
        assert_eq!(
            snapshot_validity(fresh, 9, now, &config).reason,
            Some("below minimum")
        );
        assert_eq!(
            snapshot_validity(None, 50, now, &config).reason,
            Some("never synced")
        );
    }
}
