//! Time-based cache for rendered pages.
//!
//! Entries live for a fixed window and are never invalidated by writes, so a
//! cached page can keep showing a post that has since been deleted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CachedPage {
    body: String,
    stored_at: Instant,
}

pub struct PageCache {
    ttl: Duration,
    entries: HashMap<String, CachedPage>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Return the cached body for `key` if it is still inside the window.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&mut self, key: String, body: String) {
        self.insert_at(key, body, Instant::now());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        let page = self.entries.get(key)?;
        if now.duration_since(page.stored_at) < self.ttl {
            Some(page.body.clone())
        } else {
            None
        }
    }

    fn insert_at(&mut self, key: String, body: String, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        let ttl = self.ttl;
        self.entries
            .retain(|_, page| now.duration_since(page.stored_at) < ttl);
        self.entries.insert(
            key,
            CachedPage {
                body,
                stored_at: now,
            },
        );
    }
}

/// Cache key for a page that renders differently per viewer.
pub fn viewer_key(uri: &str, viewer_id: Option<i64>) -> String {
    match viewer_id {
        Some(id) => format!("{}#user={}", uri, id),
        None => format!("{}#anon", uri),
    }
}
