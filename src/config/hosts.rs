//
//  jira-bridge
//  config/hosts.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Host Utilities
//!
//! Helpers for recognizing Jira Cloud hosts and normalizing host strings so
//! they can be used as stable keys (for example in the secrets file).
//!
//! ## Cloud Detection
//!
//! A host is treated as Jira Cloud when it ends with one of
//! [`CLOUD_DOMAIN_SUFFIXES`]. Everything else is assumed to be a self-hosted
//! Server or Data Center instance.

/// Domain suffixes served by Jira Cloud.
pub const CLOUD_DOMAIN_SUFFIXES: &[&str] = &[".atlassian.net", ".jira.com", ".jira-dev.com"];

/// Determines whether a host (or URL) belongs to Jira Cloud.
///
/// # Parameters
///
/// * `host` - A bare hostname or a full URL
///
/// # Returns
///
/// `true` if the normalized host ends with a known cloud suffix.
///
/// # Examples
///
/// ```rust
/// use jira_bridge::config::is_cloud_host;
///
/// assert!(is_cloud_host("acme.atlassian.net"));
/// assert!(is_cloud_host("https://Acme.Atlassian.net/"));
/// assert!(!is_cloud_host("jira.acme.io"));
/// ```
pub fn is_cloud_host(host: &str) -> bool {
    let host = normalize_host(host);
    let host = host.split(['/', ':']).next().unwrap_or_default();
    CLOUD_DOMAIN_SUFFIXES
        .iter()
        .any(|suffix| host.ends_with(suffix))
}

/// Normalizes a host string for consistent comparison and storage.
///
/// Strips the protocol prefix and trailing slashes and lowercases the result.
///
/// # Examples
///
/// ```rust
/// use jira_bridge::config::normalize_host;
///
/// assert_eq!(normalize_host("https://Jira.Example.com/"), "jira.example.com");
/// assert_eq!(normalize_host("  acme.atlassian.net "), "acme.atlassian.net");
/// ```
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host.strip_prefix("https://").unwrap_or(host);
    let host = host.strip_prefix("http://").unwrap_or(host);
    let host = host.trim_end_matches('/');
    host.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cloud_host() {
        assert!(is_cloud_host("acme.atlassian.net"));
        assert!(is_cloud_host("acme.jira.com"));
        assert!(is_cloud_host("https://acme.atlassian.net:443/jira"));
        assert!(!is_cloud_host("atlassian.net.evil.io"));
        assert!(!is_cloud_host("127.0.0.1"));
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("HTTP://jira.local//"), "jira.local");
    }
}
