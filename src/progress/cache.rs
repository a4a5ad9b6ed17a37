//! Topic suggestion cache
//!
//! Suggested conversation topics per (CEFR level, activity), reused until
//! they age past the TTL. Owned by the engine instance; nothing here is
//! shared between engines.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::session::CefrLevel;
use crate::config::CacheSettings;

type TopicKey = (CefrLevel, String);

#[derive(Debug, Clone)]
struct CachedTopics {
    topics: Vec<String>,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TopicCache {
    entries: HashMap<TopicKey, CachedTopics>,
    ttl: Duration,
    max_entries: usize,
}

impl TopicCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.ttl(), settings.max_entries)
    }

    /// Fresh topics for the key, if any
    pub fn get(&self, level: CefrLevel, activity: &str, now: DateTime<Utc>) -> Option<&[String]> {
        let entry = self.entries.get(&(level, activity.to_string()))?;
        if now - entry.stored_at >= self.ttl {
            return None;
        }
        Some(entry.topics.as_slice())
    }

    /// Store topics, evicting the oldest entry when full
    pub fn insert(
        &mut self,
        level: CefrLevel,
        activity: &str,
        topics: Vec<String>,
        now: DateTime<Utc>,
    ) {
        let key = (level, activity.to_string());
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.stored_at < ttl);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(level = %oldest.0, activity = %oldest.1, "Evicting cached topics");
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(
            key,
            CachedTopics {
                topics,
                stored_at: now,
            },
        );
    }

    /// Drop the entry for one key. Returns whether it existed.
    pub fn invalidate(&mut self, level: CefrLevel, activity: &str) -> bool {
        self.entries
            .remove(&(level, activity.to_string()))
            .is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TopicCache {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}
