use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::models::{Category, Principle};
use crate::store::{keys, KvStore};

use super::Validity;

/// Content cache expires after 24 hours. Content changes infrequently;
/// a day-long window avoids redundant fetches without going stale.
const CACHE_EXPIRY_HOURS: i64 = 24;

/// Everything the content cache holds, returned as one unit because
/// principles and categories are referentially linked.
#[derive(Debug, Clone)]
pub struct CachedContent {
    pub principles: Vec<Principle>,
    pub categories: Vec<Category>,
    pub version: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ContentCacheStats {
    pub is_valid: bool,
    pub principle_count: usize,
    pub category_count: usize,
    pub version: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Pure validity check: the cache is valid iff a last-sync timestamp
/// exists and is younger than the expiry window.
pub fn content_validity(last_sync: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Validity {
    match last_sync {
        None => Validity::invalid("never synced"),
        Some(ts) if now - ts < Duration::hours(CACHE_EXPIRY_HOURS) => Validity::valid(),
        Some(_) => Validity::invalid("expired"),
    }
}

/// Stores the full principle/category catalog plus version tag and
/// last-sync timestamp. All-or-nothing: the catalog is downloaded from
/// one endpoint and cached as a unit.
#[derive(Clone)]
pub struct ContentCache {
    store: Arc<KvStore>,
}

impl ContentCache {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    /// Cache the catalog. Side effect only; serialization failure is
    /// logged and swallowed so the caller never fails on a cache write.
    pub fn cache_principles(
        &self,
        principles: &[Principle],
        categories: &[Category],
        version: &str,
    ) {
        let principles_blob = match serde_json::to_string(principles) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to serialize principles for caching");
                return;
            }
        };
        let categories_blob = match serde_json::to_string(categories) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to serialize categories for caching");
                return;
            }
        };

        self.store.set(keys::CACHED_PRINCIPLES, principles_blob);
        self.store.set(keys::CACHED_CATEGORIES, categories_blob);
        self.store.set(keys::CONTENT_VERSION, version);
        self.store
            .set(keys::LAST_CONTENT_SYNC, Utc::now().to_rfc3339());

        debug!(
            principles = principles.len(),
            categories = categories.len(),
            version,
            "Cached content catalog"
        );
    }

    /// Returns `None` when either blob is absent or unparsable.
    pub fn get_cached_principles(&self) -> Option<CachedContent> {
        let principles_blob = self.store.get_string(keys::CACHED_PRINCIPLES)?;
        let categories_blob = self.store.get_string(keys::CACHED_CATEGORIES)?;

        let principles: Vec<Principle> = match serde_json::from_str(&principles_blob) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Failed to parse cached principles");
                return None;
            }
        };
        let categories: Vec<Category> = match serde_json::from_str(&categories_blob) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Failed to parse cached categories");
                return None;
            }
        };

        Some(CachedContent {
            principles,
            categories,
            version: self.store.get_string(keys::CONTENT_VERSION),
            last_sync: self.last_sync(),
        })
    }

    pub fn is_cache_valid(&self) -> bool {
        let validity = content_validity(self.last_sync(), Utc::now());
        if let Some(reason) = validity.reason {
            debug!(reason, "Content cache invalid");
        }
        validity.valid
    }

    pub fn clear_cache(&self) {
        self.store.delete(keys::CACHED_PRINCIPLES);
        self.store.delete(keys::CACHED_CATEGORIES);
        self.store.delete(keys::CONTENT_VERSION);
        self.store.delete(keys::LAST_CONTENT_SYNC);
        debug!("Content cache cleared");
    }

    pub fn get_cache_stats(&self) -> ContentCacheStats {
        let cached = self.get_cached_principles();
        ContentCacheStats {
            is_valid: self.is_cache_valid(),
            principle_count: cached.as_ref().map_or(0, |c| c.principles.len()),
            category_count: cached.as_ref().map_or(0, |c| c.categories.len()),
            version: cached.as_ref().and_then(|c| c.version.clone()),
            last_sync: cached.and_then(|c| c.last_sync),
        }
    }

    fn last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get_string(keys::LAST_CONTENT_SYNC)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!(error = %e, "Unparsable content last-sync timestamp");
                None
            }
        }
    }
}
