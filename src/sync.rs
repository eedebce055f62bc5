//! Sync orchestration between the remote API and the local caches.
//!
//! Decides when a refresh is due, performs it, and merges the results
//! into the question cache. Background paths swallow and log every
//! failure; only user-triggered force paths surface a structured error.
//!
//! No mutual exclusion is enforced between a background sync and a
//! foreground forced sync. A second in-flight sync may duplicate network
//! calls, but the cache merge is idempotent by question id so the result
//! stays correct.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::api::QuizApi;
use crate::cache::{ContentCache, QuestionCache};
use crate::config::SyncConfig;
use crate::models::{Category, Principle};
use crate::store::{keys, KvStore};

/// Result of one sync attempt. Failures are data, not panics.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub success: bool,
    pub synced: usize,
    pub error: Option<String>,
}

/// `SyncOutcome` plus the post-sync cache population, for manual refresh UIs.
#[derive(Debug, Clone)]
pub struct ForceSyncOutcome {
    pub success: bool,
    pub synced: usize,
    pub cached: usize,
    pub error: Option<String>,
}

/// Read-only composite of cache and timestamp state for diagnostics.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    pub last_sync: Option<DateTime<Utc>>,
    pub needs_sync: bool,
    pub cache_valid: bool,
    pub total_cached: usize,
}

/// The content catalog as delivered to callers, whatever source it came from.
#[derive(Debug, Clone)]
pub struct ContentBundle {
    pub principles: Vec<Principle>,
    pub categories: Vec<Category>,
    pub version: Option<String>,
}

pub struct SyncService<A: QuizApi> {
    api: Arc<A>,
    store: Arc<KvStore>,
    content: ContentCache,
    questions: QuestionCache,
    config: SyncConfig,
}

impl<A: QuizApi + 'static> SyncService<A> {
    pub fn new(
        api: Arc<A>,
        store: Arc<KvStore>,
        content: ContentCache,
        questions: QuestionCache,
        config: SyncConfig,
    ) -> Self {
        Self {
            api,
            store,
            content,
            questions,
            config,
        }
    }

    /// Whether a background sync is due: never when sync is disabled,
    /// always when no prior sync is recorded, otherwise on interval expiry.
    pub fn should_sync(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        match self.last_background_sync() {
            None => true,
            Some(ts) => Utc::now() - ts >= Duration::hours(self.config.interval_hours),
        }
    }

    /// Probe the backend, fetch questions for the given principles, and
    /// merge them into the cache. Network and parse failures come back as
    /// a structured outcome; this never panics or propagates.
    pub async fn sync_questions(&self, principle_ids: &[String]) -> SyncOutcome {
        info!(principles = principle_ids.len(), "Starting question sync");

        let result = async {
            self.api
                .health_check()
                .await
                .context("Backend health check failed")?;

            let response = self
                .api
                .sync_questions(principle_ids)
                .await
                .context("Question sync request failed")?;

            if !response.success || response.questions.is_empty() {
                anyhow::bail!("No questions received from sync");
            }
            Ok::<_, anyhow::Error>(response)
        }
        .await;

        match result {
            Ok(response) => {
                self.questions
                    .update_cache(&response.questions, principle_ids);
                self.store
                    .set(keys::LAST_BACKGROUND_SYNC, Utc::now().to_rfc3339());
                info!(synced = response.total_synced, "Question sync complete");
                SyncOutcome {
                    success: true,
                    synced: response.total_synced,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Question sync failed");
                SyncOutcome {
                    success: false,
                    synced: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Fire-and-forget sync, gated on configuration and `should_sync`.
    /// Never blocks or crashes the caller.
    pub fn background_sync(&self, principle_ids: Vec<String>) {
        if !self.config.background_sync || !self.should_sync() {
            return;
        }

        let api = Arc::clone(&self.api);
        let store = Arc::clone(&self.store);
        let content = self.content.clone();
        let questions = self.questions.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let service = SyncService {
                api,
                store,
                content,
                questions,
                config,
            };
            let outcome = service.sync_questions(&principle_ids).await;
            if !outcome.success {
                debug!(error = ?outcome.error, "Background sync failed (this is OK)");
            }
        });
    }

    /// Always sync regardless of `should_sync`, reporting the resulting
    /// cache population. Used for explicit user-triggered refresh.
    pub async fn force_sync(&self, principle_ids: &[String]) -> ForceSyncOutcome {
        let outcome = self.sync_questions(principle_ids).await;
        let cached = self.questions.get_cache_stats().total_questions;
        ForceSyncOutcome {
            success: outcome.success,
            synced: outcome.synced,
            cached,
            error: outcome.error,
        }
    }

    pub fn get_sync_status(&self) -> SyncStatus {
        let stats = self.questions.get_cache_stats();
        SyncStatus {
            last_sync: self.last_background_sync(),
            needs_sync: self.should_sync(),
            cache_valid: stats.is_valid,
            total_cached: stats.total_questions,
        }
    }

    /// Called once at process start. Checks cache validity (the cache
    /// layer already swallows storage errors, so a cold store never
    /// prevents startup) and kicks off a background sync when the
    /// question cache is invalid.
    pub fn initialize(&self, principle_ids: &[String]) {
        info!("Initializing sync service");

        if !self.content.is_cache_valid() {
            debug!("Content cache invalid or missing");
            // Content refreshes on the next load_content call
        }

        if !self.questions.is_cache_valid() {
            debug!("Question cache invalid, attempting initial sync");
            self.background_sync(principle_ids.to_vec());
        }
    }

    /// Cache-first content load: return the cached catalog while valid,
    /// otherwise refresh from the API and fall back to a stale copy when
    /// the fetch fails. A hard miss with no cache propagates the fetch
    /// error; this is a foreground, user-initiated path.
    pub async fn load_content(&self) -> Result<ContentBundle> {
        if self.content.is_cache_valid() {
            if let Some(cached) = self.content.get_cached_principles() {
                debug!(
                    principles = cached.principles.len(),
                    "Serving content from cache"
                );
                return Ok(ContentBundle {
                    principles: cached.principles,
                    categories: cached.categories,
                    version: cached.version,
                });
            }
        }

        match self.api.fetch_principles().await {
            Ok(response) => {
                let data = response.data;
                self.content.cache_principles(
                    &data.principles,
                    &data.categories,
                    &data.meta.version,
                );
                info!(
                    principles = data.principles.len(),
                    version = %data.meta.version,
                    "Content catalog refreshed"
                );
                Ok(ContentBundle {
                    principles: data.principles,
                    categories: data.categories,
                    version: Some(data.meta.version),
                })
            }
            Err(e) => match self.content.get_cached_principles() {
                Some(stale) => {
                    warn!(error = %e, "Content fetch failed, serving stale cache");
                    Ok(ContentBundle {
                        principles: stale.principles,
                        categories: stale.categories,
                        version: stale.version,
                    })
                }
                None => Err(e).context("Content fetch failed with no cached copy"),
            },
        }
    }

    fn last_background_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get_string(keys::LAST_BACKGROUND_SYNC)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!(error = %e, "Unparsable background-sync timestamp");
                None
            }
        }
    }
}
