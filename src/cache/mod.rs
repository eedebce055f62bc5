//! Local caches backed by the key/value store.
//!
//! Three cooperating caches keep the app usable offline:
//!
//! - `ContentCache`: the principle/category catalog with a version tag
//! - `QuestionCache`: a merged pool of quiz questions (single snapshot)
//! - `QuestionHistory`: a bounded recency list of served question ids
//!
//! Every read/write degrades to a cache miss on storage or parse errors;
//! callers re-fetch from the API instead of crashing.

pub mod content;
pub mod history;
pub mod questions;

pub use content::ContentCache;
pub use history::QuestionHistory;
pub use questions::QuestionCache;

/// Outcome of a validity check, with the failing threshold named so the
/// logic is testable without touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    pub valid: bool,
    pub reason: Option<&'static str>,
}

impl Validity {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: &'static str) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}
