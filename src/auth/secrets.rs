//
//  jira-bridge
//  auth/secrets.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Owner-only secrets file.
//!
//! API tokens never live in `config.toml` or in cache snapshots. They are kept
//! in a separate TOML file keyed by host:
//!
//! ```toml
//! [hosts."acme.atlassian.net"]
//! secret = "api-token"
//! ```
//!
//! On Unix the file is written with mode `0600` and refused on read when group
//! or other permission bits are set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{normalize_host, read_config_file, write_config_file};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SecretsDocument {
    #[serde(default)]
    hosts: BTreeMap<String, SecretEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SecretEntry {
    secret: String,
}

/// File-backed secret storage keyed by normalized host.
///
/// # Example
///
/// ```rust,no_run
/// use jira_bridge::auth::SecretFile;
///
/// let store = SecretFile::new(SecretFile::default_path()?);
/// store.store("https://acme.atlassian.net", "api-token")?;
/// assert_eq!(store.get("acme.atlassian.net")?.as_deref(), Some("api-token"));
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SecretFile {
    path: PathBuf,
}

impl SecretFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<config_dir>/credentials.toml`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::config::Config::config_dir()?.join("credentials.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the secret stored for `host`, if any.
    ///
    /// # Errors
    ///
    /// Fails if the file is readable by group/others (Unix), unreadable, or
    /// not valid TOML.
    pub fn get(&self, host: &str) -> Result<Option<String>> {
        let doc = self.read()?;
        Ok(doc
            .hosts
            .get(&normalize_host(host))
            .map(|entry| entry.secret.clone()))
    }

    /// Stores (or replaces) the secret for `host`.
    pub fn store(&self, host: &str, secret: &str) -> Result<()> {
        let mut doc = self.read()?;
        doc.hosts.insert(
            normalize_host(host),
            SecretEntry {
                secret: secret.to_string(),
            },
        );
        self.write(&doc)
    }

    /// Removes the secret for `host`. Missing entries are not an error.
    pub fn delete(&self, host: &str) -> Result<()> {
        let mut doc = self.read()?;
        if doc.hosts.remove(&normalize_host(host)).is_some() {
            self.write(&doc)?;
        }
        Ok(())
    }

    fn read(&self) -> Result<SecretsDocument> {
        if !self.path.exists() {
            return Ok(SecretsDocument::default());
        }
        check_permissions(&self.path)?;
        let content = read_config_file(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write(&self, doc: &SecretsDocument) -> Result<()> {
        let content = toml::to_string_pretty(doc).context("Failed to serialize secrets")?;
        write_config_file(&self.path, &content)?;
        restrict_permissions(&self.path)
    }
}

#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode();
    if mode & 0o077 != 0 {
        bail!(
            "{} is accessible by other users (mode {:o}); run `chmod 600 {}`",
            path.display(),
            mode & 0o777,
            path.display()
        );
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecretFile::new(dir.path().join("credentials.toml"));

        assert_eq!(store.get("acme.atlassian.net").unwrap(), None);

        store.store("https://ACME.atlassian.net/", "tok").unwrap();
        assert_eq!(
            store.get("acme.atlassian.net").unwrap().as_deref(),
            Some("tok")
        );

        store.delete("acme.atlassian.net").unwrap();
        assert_eq!(store.get("acme.atlassian.net").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = SecretFile::new(dir.path().join("credentials.toml"));
        store.store("jira.example.com", "tok").unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_world_readable_file_is_refused() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "[hosts.\"jira.example.com\"]\nsecret = \"tok\"\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert!(SecretFile::new(path).get("jira.example.com").is_err());
    }
}
