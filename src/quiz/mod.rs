//! Quiz question sourcing and session management.
//!
//! `QuizGenerator` produces a question set for a requested quiz through a
//! layered fallback chain (remote fetch, cached pool, local synthesis);
//! `QuizEngine` drives a session from start through answers to submission.

pub mod engine;
pub mod generator;

pub use engine::QuizEngine;
pub use generator::QuizGenerator;
