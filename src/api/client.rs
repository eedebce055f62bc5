use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::ApiConfig;

use super::{
    ApiError, GenerateRequest, GenerateResponse, HealthResponse, PrinciplesResponse,
    QuestionsRequest, QuestionsResponse, QuizApi, SyncQuestionsResponse,
};

// ============================================================================
// Endpoints
// ============================================================================

const HEALTH_ENDPOINT: &str = "/api/health";
const PRINCIPLES_ENDPOINT: &str = "/api/principles";
const QUESTIONS_ENDPOINT: &str = "/api/quiz/questions";
const SYNC_ENDPOINT: &str = "/api/quiz/sync";
const GENERATE_ENDPOINT: &str = "/api/quiz/generate";

/// API client for the quiz backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Check if response is successful, returning a structured error
    /// (parsed from the backend's error body) if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, endpoint: &str, body: &B) -> Result<T> {
        let url = self.url(endpoint);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

impl QuizApi for ApiClient {
    /// Liveness probe, used before sync attempts.
    async fn health_check(&self) -> Result<HealthResponse> {
        self.get(HEALTH_ENDPOINT).await
    }

    /// Fetch the full content catalog: principles, categories, and version
    /// metadata. Principles and categories are referentially linked and
    /// always downloaded together.
    async fn fetch_principles(&self) -> Result<PrinciplesResponse> {
        debug!("Fetching content catalog");
        self.get(PRINCIPLES_ENDPOINT).await
    }

    /// Request quiz questions for a principle set, optionally excluding
    /// recently served ids. May return fewer than `limit` when the
    /// eligible pool is small.
    async fn fetch_questions(&self, request: &QuestionsRequest) -> Result<QuestionsResponse> {
        debug!(
            principles = request.principle_ids.len(),
            limit = ?request.limit,
            excluded = request.exclude_ids.as_ref().map_or(0, Vec::len),
            "Fetching quiz questions"
        );
        self.post(QUESTIONS_ENDPOINT, request).await
    }

    /// Bulk fetch for offline caching.
    async fn sync_questions(&self, principle_ids: &[String]) -> Result<SyncQuestionsResponse> {
        debug!(principles = principle_ids.len(), "Syncing questions");
        let body = serde_json::json!({ "principleIds": principle_ids });
        self.post(SYNC_ENDPOINT, &body).await
    }

    /// Trigger authoritative server-side question synthesis. Distinct from
    /// the client-side fallback in the generation pipeline.
    async fn generate_questions(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        debug!(
            principles = request.principle_ids.len(),
            per_principle = ?request.questions_per_principle,
            "Requesting supplemental question generation"
        );
        self.post(GENERATE_ENDPOINT, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ApiConfig {
            base_url: "https://quiz.example.com/".to_string(),
            timeout_secs: 5,
        };
        let client = ApiClient::new(&config).expect("build client");
        assert_eq!(
            client.url(HEALTH_ENDPOINT),
            "https://quiz.example.com/api/health"
        );
    }

    #[test]
    fn test_questions_request_skips_absent_fields() {
        let request = QuestionsRequest {
            principle_ids: vec!["a".to_string()],
            limit: None,
            difficulty: None,
            exclude_ids: None,
        };
        let json = serde_json::to_string(&request).expect("serialize request");
        assert_eq!(json, r#"{"principleIds":["a"]}"#);
    }

    #[test]
    fn test_questions_request_wire_names() {
        let request = QuestionsRequest {
            principle_ids: vec!["a".to_string()],
            limit: Some(10),
            difficulty: Some(crate::models::Difficulty::Medium),
            exclude_ids: Some(vec!["q1".to_string()]),
        };
        let json = serde_json::to_string(&request).expect("serialize request");
        assert!(json.contains("\"principleIds\""));
        assert!(json.contains("\"excludeIds\""));
        assert!(json.contains("\"medium\""));
    }
}
