//! In-process validator-token cache for conditional requests.
//!
//! One entry per URL. Under correct operation each logical resource is fetched
//! by exactly one task chain, so each URL has a single logical writer; the
//! lock makes concurrent writers to the same URL safe anyway.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared url -> ETag map owned by the crawl context.
#[derive(Debug, Clone, Default)]
pub struct EtagCache {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl EtagCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the validator token recorded for a URL.
    pub fn get(&self, url: &str) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(url).cloned())
    }

    /// Record the validator token returned for a URL.
    pub fn put(&self, url: &str, etag: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(url.to_string(), etag.to_string());
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
