//! Well-known keys in the key/value store.

/// Cached principles blob (JSON array of `Principle`)
pub const CACHED_PRINCIPLES: &str = "cached_principles";

/// Cached categories blob (JSON array of `Category`)
pub const CACHED_CATEGORIES: &str = "cached_categories";

/// Version tag of the cached content catalog
pub const CONTENT_VERSION: &str = "content_version";

/// RFC 3339 timestamp of the last content sync
pub const LAST_CONTENT_SYNC: &str = "last_content_sync";

/// Cached question snapshot blob (JSON `QuestionSnapshot`)
pub const CACHED_QUESTIONS: &str = "cached_questions";

/// RFC 3339 timestamp of the last question sync
pub const QUESTIONS_LAST_SYNC: &str = "questions_last_sync";

/// Recently served question ids (JSON array, most recent first)
pub const QUESTION_HISTORY: &str = "quiz_question_history";

/// RFC 3339 timestamp of the last background sync
pub const LAST_BACKGROUND_SYNC: &str = "last_background_sync";

/// Completed quiz results (JSON array of `QuizResult`)
pub const QUIZ_HISTORY: &str = "quiz_history";
