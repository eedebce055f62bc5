//! REST API client module for the quiz backend.
//!
//! This module provides the `ApiClient` for fetching the content catalog
//! and quiz questions, plus the `QuizApi` trait the sync service and the
//! generation pipeline are written against so tests can substitute a mock
//! backend.

pub mod client;
pub mod error;

use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::{Category, Difficulty, Principle, QuizQuestion};

pub use client::ApiClient;
pub use error::ApiError;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrinciplesResponse {
    pub success: bool,
    pub data: PrinciplesData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrinciplesData {
    pub principles: Vec<Principle>,
    pub categories: Vec<Category>,
    pub meta: PrinciplesMeta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinciplesMeta {
    pub total_principles: usize,
    pub total_categories: usize,
    pub last_synced: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsRequest {
    pub principle_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsResponse {
    pub questions: Vec<QuizQuestion>,
    pub total_available: usize,
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQuestionsResponse {
    pub questions: Vec<QuizQuestion>,
    pub total_synced: usize,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub principle_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_per_principle: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub questions: Vec<QuizQuestion>,
    pub generated: usize,
    pub success: bool,
}

// ============================================================================
// Backend abstraction
// ============================================================================

/// The remote quiz backend as consumed by the sync service and the
/// question generation pipeline. `ApiClient` is the production
/// implementation; tests drive the callers with scripted mocks.
pub trait QuizApi: Send + Sync {
    fn health_check(&self) -> impl Future<Output = Result<HealthResponse>> + Send;

    fn fetch_principles(&self) -> impl Future<Output = Result<PrinciplesResponse>> + Send;

    fn fetch_questions(
        &self,
        request: &QuestionsRequest,
    ) -> impl Future<Output = Result<QuestionsResponse>> + Send;

    fn sync_questions(
        &self,
        principle_ids: &[String],
    ) -> impl Future<Output = Result<SyncQuestionsResponse>> + Send;

    fn generate_questions(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse>> + Send;
}
