//
//  jira-bridge
//  cache/snapshot.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! On-disk snapshots of cache namespaces.
//!
//! Each namespace is stored as `<dir>/<kind>.json`, a JSON object mapping
//! keys to `{value, createdAt, lastAccessedAt, expiresAt}`. Files are written
//! to a temporary sibling first and renamed into place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use super::namespace::CacheEntry;
use super::service::ResourceKind;

/// Contents of one snapshot file.
pub type SnapshotEntries = HashMap<String, CacheEntry<Value>>;

/// Directory name for the snapshots of one connection.
///
/// The normalized host with anything but alphanumerics, `.` and `-` replaced
/// by `_`, so `https://Acme.atlassian.net/` and `acme.atlassian.net` share a
/// directory while `localhost:8080` becomes `localhost_8080`.
pub fn connection_scope(base_url: &str) -> String {
    let scope: String = crate::config::normalize_host(base_url)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if scope.is_empty() || scope.chars().all(|c| c == '.') {
        "default".to_string()
    } else {
        scope
    }
}

/// Path of the snapshot file for a namespace.
pub fn snapshot_path(dir: &Path, kind: ResourceKind) -> PathBuf {
    dir.join(format!("{}.json", kind.as_str()))
}

/// Writes one namespace snapshot, creating the directory if needed.
pub async fn write_snapshot(dir: &Path, kind: ResourceKind, entries: &SnapshotEntries) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create cache directory: {:?}", dir))?;

    let path = snapshot_path(dir, kind);
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_vec(entries).context("Failed to serialize cache snapshot")?;

    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("Failed to write cache snapshot: {:?}", tmp))?;
    tokio::fs::rename(&tmp, &path)
        .await
        .with_context(|| format!("Failed to move cache snapshot into place: {:?}", path))?;

    Ok(())
}

/// Reads one namespace snapshot. A missing file is `Ok(None)`.
pub async fn read_snapshot(dir: &Path, kind: ResourceKind) -> Result<Option<SnapshotEntries>> {
    let path = snapshot_path(dir, kind);
    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read cache snapshot: {:?}", path))
        }
    };

    let entries = serde_json::from_slice(&content)
        .with_context(|| format!("Failed to parse cache snapshot: {:?}", path))?;
    Ok(Some(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_connection_scope() {
        assert_eq!(connection_scope("https://Acme.atlassian.net/"), "acme.atlassian.net");
        assert_eq!(connection_scope("acme.atlassian.net"), "acme.atlassian.net");
        assert_eq!(connection_scope("http://127.0.0.1:8080/jira"), "127.0.0.1_8080_jira");
        assert_eq!(connection_scope(".."), "default");
        assert_eq!(connection_scope(""), "default");
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let mut entries = SnapshotEntries::new();
        entries.insert(
            "ABC-1".to_string(),
            CacheEntry::new(serde_json::json!({"key": "ABC-1"}), Utc::now(), Duration::seconds(60)),
        );

        write_snapshot(dir.path(), ResourceKind::Issues, &entries)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(snapshot_path(dir.path(), ResourceKind::Issues)).unwrap();
        assert!(raw.contains("lastAccessedAt"));

        let loaded = read_snapshot(dir.path(), ResourceKind::Issues)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, entries);
    }

    #[tokio::test]
    async fn test_missing_file_is_none_and_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_snapshot(dir.path(), ResourceKind::Users)
            .await
            .unwrap()
            .is_none());

        std::fs::write(snapshot_path(dir.path(), ResourceKind::Users), "{not json").unwrap();
        assert!(read_snapshot(dir.path(), ResourceKind::Users).await.is_err());
    }
}
