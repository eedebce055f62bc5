use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::QuizQuestion;

/// Which slice of the catalog a quiz draws from. Favorites filtering
/// happens upstream; the mode is carried for history display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    All,
    Favorites,
}

/// A named quiz length preset mapping to a target question count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizLength {
    Quick,
    Standard,
    Complete,
    /// Every eligible principle, uncapped.
    Marathon,
}

impl QuizLength {
    /// Target question count for the preset; `None` means "use the whole
    /// eligible pool".
    pub fn question_count(&self) -> Option<usize> {
        match self {
            QuizLength::Quick => Some(10),
            QuizLength::Standard => Some(25),
            QuizLength::Complete => Some(50),
            QuizLength::Marathon => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuizLength::Quick => "Quick Quiz",
            QuizLength::Standard => "Standard Quiz",
            QuizLength::Complete => "Complete Quiz",
            QuizLength::Marathon => "Marathon Quiz",
        }
    }
}

/// One submitted answer. A session holds at most one answer per question id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_id: String,
    pub selected_answer: usize,
    pub is_correct: bool,
    pub time_spent_secs: u64,
}

/// A quiz run in progress. Created on start, mutated by answer/navigate
/// actions, finalized on submit, discarded on reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    pub id: String,
    pub questions: Vec<QuizQuestion>,
    pub answers: Vec<QuizAnswer>,
    pub current_question_index: usize,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub score: usize,
    pub mode: QuizMode,
    pub length: QuizLength,
    pub principles_used: Vec<String>,
}

/// Outcome of a completed session, persisted in the quiz history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub session: QuizSession,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub score_percentage: u32,
    pub average_time_per_question_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_presets() {
        assert_eq!(QuizLength::Quick.question_count(), Some(10));
        assert_eq!(QuizLength::Standard.question_count(), Some(25));
        assert_eq!(QuizLength::Complete.question_count(), Some(50));
        assert_eq!(QuizLength::Marathon.question_count(), None);
    }

    #[test]
    fn test_length_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&QuizLength::Marathon).expect("serialize"),
            "\"marathon\""
        );
    }
}
