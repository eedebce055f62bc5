//! Data models for the content catalog and quiz domain.
//!
//! This module contains the data structures shared across the caches,
//! the sync service, and the quiz pipeline:
//!
//! - `Principle`, `Category`: the content catalog entries
//! - `QuizQuestion`, `QuestionSnapshot`: cached quiz material
//! - `QuizSession`, `QuizAnswer`, `QuizResult`: a quiz run in progress

pub mod principle;
pub mod question;
pub mod session;

pub use principle::{Category, Principle, PrincipleType};
pub use question::{Difficulty, QuestionSnapshot, QuizQuestion};
pub use session::{QuizAnswer, QuizLength, QuizMode, QuizResult, QuizSession};
