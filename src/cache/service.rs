//
//  jira-bridge
//  cache/service.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! The shared, namespaced cache.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::namespace::{Namespace, NamespaceStats};
use super::snapshot::{connection_scope, read_snapshot, write_snapshot};

/// Resource kinds, one cache namespace each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Issues,
    Projects,
    Users,
    Boards,
    Sprints,
    Search,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        Self::Issues,
        Self::Projects,
        Self::Users,
        Self::Boards,
        Self::Sprints,
        Self::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Projects => "projects",
            Self::Users => "users",
            Self::Boards => "boards",
            Self::Sprints => "sprints",
            Self::Search => "search",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// When false, every lookup misses and stores are ignored.
    pub enabled: bool,
    /// Sliding time-to-live of an entry.
    pub ttl: chrono::Duration,
    /// Capacity of each namespace.
    pub max_size: usize,
    /// Period of the background snapshot task; `None` disables it.
    pub snapshot_interval: Option<std::time::Duration>,
    /// Snapshot directory; `None` disables persistence.
    pub directory: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: chrono::Duration::seconds(300),
            max_size: 100,
            snapshot_interval: None,
            directory: None,
        }
    }
}

struct Inner {
    settings: CacheSettings,
    namespaces: Vec<Mutex<Namespace<Value>>>,
    scope: Mutex<Option<String>>,
}

/// Process-wide cache with one lock-guarded namespace per [`ResourceKind`].
///
/// Clones share state. Locks are held only for the duration of a single
/// namespace operation and never across an `.await`.
///
/// A cache bound to a connection with [`CacheService::load_for`] or
/// [`CacheService::rescope`] persists under `<directory>/<host>/`, so
/// snapshots of one Jira site are never restored for another.
///
/// # Example
///
/// ```rust
/// use jira_bridge::cache::{CacheService, CacheSettings, ResourceKind};
///
/// let cache = CacheService::new(CacheSettings::default());
/// cache.set_as(ResourceKind::Projects, "ABC", &vec!["Alpha"]);
///
/// let names: Option<Vec<String>> = cache.get_as(ResourceKind::Projects, "ABC");
/// assert_eq!(names, Some(vec!["Alpha".to_string()]));
/// ```
#[derive(Clone)]
pub struct CacheService {
    inner: Arc<Inner>,
}

impl CacheService {
    /// Creates an empty cache on the system clock.
    pub fn new(settings: CacheSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Creates an empty cache on the given clock.
    pub fn with_clock(settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        let namespaces = ResourceKind::ALL
            .iter()
            .map(|_| Mutex::new(Namespace::new(settings.ttl, settings.max_size, clock.clone())))
            .collect();

        Self {
            inner: Arc::new(Inner {
                settings,
                namespaces,
                scope: Mutex::new(None),
            }),
        }
    }

    /// Creates a cache and restores it from the snapshot directory, if any.
    ///
    /// Expired entries are discarded. Unreadable snapshot files are logged
    /// and skipped.
    pub async fn load(settings: CacheSettings) -> Self {
        let cache = Self::new(settings);
        cache.restore_snapshots().await;
        cache
    }

    /// Creates a cache bound to the connection at `base_url` and restores that
    /// connection's snapshots.
    pub async fn load_for(settings: CacheSettings, base_url: &str) -> Self {
        let cache = Self::new(settings);
        cache.set_scope(base_url);
        cache.restore_snapshots().await;
        cache
    }

    /// Rebinds the cache to the connection at `base_url`.
    ///
    /// Memory is cleared first; nothing of the previous connection survives.
    /// Returns how many entries were restored from the new connection's
    /// snapshots.
    pub async fn rescope(&self, base_url: &str) -> usize {
        for kind in ResourceKind::ALL {
            self.clear(kind);
        }
        self.set_scope(base_url);
        self.restore_snapshots().await
    }

    fn set_scope(&self, base_url: &str) {
        let scope = connection_scope(base_url);
        debug!("Cache scoped to {}", scope);
        *self
            .inner
            .scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(scope);
    }

    /// Restores every namespace from the snapshot directory. Returns how many
    /// entries were restored.
    pub async fn restore_snapshots(&self) -> usize {
        let Some(dir) = self.persistence_dir() else {
            return 0;
        };

        let mut restored = 0;
        for kind in ResourceKind::ALL {
            match read_snapshot(&dir, kind).await {
                Ok(Some(entries)) => restored += self.namespace(kind).restore(entries),
                Ok(None) => {}
                Err(e) => warn!("Skipping {} cache snapshot: {:#}", kind, e),
            }
        }
        debug!("Restored {} cache entries from {:?}", restored, dir);
        restored
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.settings.enabled
    }

    /// Where snapshots are read and written: the configured directory, or
    /// the connection's subdirectory of it once scoped.
    pub fn persistence_dir(&self) -> Option<PathBuf> {
        if !self.is_enabled() {
            return None;
        }
        let dir = self.inner.settings.directory.as_ref()?;
        let scope = self
            .inner
            .scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Some(match scope {
            Some(scope) => dir.join(scope),
            None => dir.clone(),
        })
    }

    fn namespace(&self, kind: ResourceKind) -> MutexGuard<'_, Namespace<Value>> {
        self.inner.namespaces[kind.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, kind: ResourceKind, key: &str) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }
        self.namespace(kind).get(key)
    }

    pub fn set(&self, kind: ResourceKind, key: impl Into<String>, value: Value) {
        if !self.is_enabled() {
            return;
        }
        self.namespace(kind).set(key, value);
    }

    /// Typed lookup. A stored value that no longer decodes into `T` counts as
    /// a miss and is removed.
    pub fn get_as<T: DeserializeOwned>(&self, kind: ResourceKind, key: &str) -> Option<T> {
        let value = self.get(kind, key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!("Dropping undecodable {} cache entry {}: {}", kind, key, e);
                self.remove(kind, key);
                None
            }
        }
    }

    /// Typed store. Values that fail to serialize are not cached.
    pub fn set_as<T: Serialize>(&self, kind: ResourceKind, key: impl Into<String>, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(kind, key, value),
            Err(e) => debug!("Not caching unserializable {} value: {}", kind, e),
        }
    }

    pub fn remove(&self, kind: ResourceKind, key: &str) -> Option<Value> {
        self.namespace(kind).remove(key)
    }

    pub fn clear(&self, kind: ResourceKind) {
        self.namespace(kind).clear();
    }

    pub fn prune(&self, kind: ResourceKind) -> usize {
        self.namespace(kind).prune()
    }

    /// Removes a cached issue and every cached search result, which may
    /// include a stale copy of it.
    pub fn invalidate_issue(&self, issue_key: &str) {
        self.remove(ResourceKind::Issues, issue_key);
        self.clear(ResourceKind::Search);
    }

    /// Per-namespace counters, in [`ResourceKind::ALL`] order.
    pub fn stats(&self) -> Vec<(ResourceKind, NamespaceStats)> {
        ResourceKind::ALL
            .iter()
            .map(|kind| (*kind, self.namespace(*kind).stats()))
            .collect()
    }

    /// Clears every namespace and persists the now-empty snapshots.
    pub async fn clear_all(&self) -> anyhow::Result<()> {
        for kind in ResourceKind::ALL {
            self.clear(kind);
        }
        self.save_snapshot().await
    }

    /// Writes every namespace's live entries to the snapshot directory.
    pub async fn save_snapshot(&self) -> anyhow::Result<()> {
        let Some(dir) = self.persistence_dir() else {
            return Ok(());
        };

        for kind in ResourceKind::ALL {
            let entries = self.namespace(kind).live_entries();
            write_snapshot(&dir, kind, &entries).await?;
        }
        debug!("Saved cache snapshot to {:?}", dir);
        Ok(())
    }

    /// Spawns a task that saves a snapshot every `snapshot_interval`.
    ///
    /// Returns `None` when persistence or the interval is not configured.
    /// Failed saves are logged and retried on the next tick. Must be called
    /// from within a tokio runtime.
    pub fn spawn_snapshot_task(&self) -> Option<JoinHandle<()>> {
        let period = self.inner.settings.snapshot_interval?;
        self.persistence_dir()?;

        let cache = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = cache.save_snapshot().await {
                    warn!("Cache snapshot failed: {:#}", e);
                }
            }
        }))
    }
}

impl fmt::Debug for CacheService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheService")
            .field("settings", &self.inner.settings)
            .finish()
    }
}
