use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question difficulty requested from the remote endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

/// A multiple-choice quiz question.
///
/// Questions are created remotely (fetch/sync/generate endpoints) or
/// synthesized locally as a last-resort fallback. `correct_answer` is an
/// index into `options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub principle_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// The single persisted record of the question cache.
///
/// Updates replace the whole snapshot (after merge) rather than appending;
/// there is no row-by-row storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
    pub questions: Vec<QuizQuestion>,
    pub timestamp: DateTime<Utc>,
    pub principle_ids: Vec<String>,
    pub total_cached: usize,
}
