//
//  jira-bridge
//  cache/namespace.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! A single TTL- and size-bounded key/value store.
//!
//! Expiry is sliding: every hit pushes `expires_at` to `now + ttl`. When a new
//! key is inserted into a full namespace, [`Namespace::prune`] first drops
//! expired entries and then evicts the least recently accessed ones down to
//! 80% of capacity.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::clock::Clock;

/// A cached value with its timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            created_at: now,
            last_accessed_at: now,
            expires_at: expiry(now, ttl),
        }
    }

    /// An entry is expired from its `expires_at` instant onwards.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    fn touch(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.last_accessed_at = now;
        self.expires_at = expiry(now, ttl);
    }
}

/// `now + ttl`, saturating at the latest representable instant.
fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Hit/miss counters and current size of one namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl NamespaceStats {
    /// Hits over lookups, `0.0` when nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// One cache namespace.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use chrono::Duration;
/// use jira_bridge::cache::{ManualClock, Namespace};
///
/// let clock = Arc::new(ManualClock::default());
/// let mut issues = Namespace::new(Duration::seconds(60), 100, clock.clone());
///
/// issues.set("ABC-1", "cached");
/// assert_eq!(issues.get("ABC-1"), Some("cached"));
///
/// clock.advance(Duration::seconds(61));
/// assert_eq!(issues.get("ABC-1"), None);
/// ```
pub struct Namespace<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
    max_size: usize,
    hits: u64,
    misses: u64,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> Namespace<V> {
    /// Creates an empty namespace. A `max_size` of zero is treated as one and
    /// a negative `ttl` as zero.
    pub fn new(ttl: Duration, max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: ttl.max(Duration::zero()),
            max_size: max_size.max(1),
            hits: 0,
            misses: 0,
            clock,
        }
    }

    /// Size the namespace is pruned down to.
    pub fn low_water_mark(&self) -> usize {
        self.max_size * 4 / 5
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Looks up `key`, refreshing its expiry on a hit.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let ttl = self.ttl;

        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now, ttl);
                self.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores `value` under `key`, pruning first whenever the namespace is at
    /// capacity, overwrites included.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if self.entries.len() >= self.max_size {
            self.prune();
        }
        let entry = CacheEntry::new(value, self.clock.now(), self.ttl);
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops expired entries, then evicts the least recently accessed entries
    /// until the size is at most the low-water mark. Returns how many entries
    /// were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        let now = self.clock.now();
        self.entries.retain(|_, entry| !entry.is_expired(now));

        let target = self.low_water_mark();
        if self.entries.len() > target {
            let mut by_age: Vec<(DateTime<Utc>, String)> = self
                .entries
                .iter()
                .map(|(key, entry)| (entry.last_accessed_at, key.clone()))
                .collect();
            by_age.sort();

            let excess = self.entries.len() - target;
            for (_, key) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        before - self.entries.len()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> NamespaceStats {
        NamespaceStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
        }
    }

    /// Copies the live entries, for snapshotting.
    pub fn live_entries(&self) -> HashMap<String, CacheEntry<V>> {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Loads entries from a snapshot, skipping those already expired and
    /// keeping the most recently accessed ones if they exceed capacity.
    /// Returns how many entries were restored.
    pub fn restore(&mut self, entries: HashMap<String, CacheEntry<V>>) -> usize {
        let now = self.clock.now();
        let mut live: Vec<(String, CacheEntry<V>)> = entries
            .into_iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .collect();
        live.sort_by(|a, b| b.1.last_accessed_at.cmp(&a.1.last_accessed_at));
        live.truncate(self.max_size);

        let restored = live.len();
        self.entries.extend(live);
        restored
    }
}
