//
//  jira-bridge
//  auth/context.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Credential Context
//!
//! The credential context is the immutable, session-wide description of *where*
//! requests go and *how* they are authenticated. It is built once from
//! [`ConnectionSettings`] and rebuilt wholesale whenever the host application
//! reconfigures the connection.
//!
//! ## Endpoint Resolution
//!
//! | Version | Cloud | Self-hosted |
//! |---------|-------|-------------|
//! | `V2` | `/rest/api/2` | `/rest/api/2` |
//! | `V3` | `/rest/api/3` | `/rest/api/2` |
//! | `Agile` | `/rest/agile/1.0` | `/rest/agile/1.0` |
//!
//! Self-hosted servers do not expose the v3 API, so the v3 prefix is aliased
//! to v2 there.

use std::collections::HashMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{AuthMode, ConnectionSettings};
use crate::api::common::ApiError;
use crate::config::is_cloud_host;

/// Path prefix for the v2 REST API.
pub const V2_PREFIX: &str = "/rest/api/2";

/// Path prefix for the v3 REST API (cloud only).
pub const V3_PREFIX: &str = "/rest/api/3";

/// Path prefix for the agile (boards, sprints, epics) API.
pub const AGILE_PREFIX: &str = "/rest/agile/1.0";

/// Alternate agile root used by older servers.
pub const AGILE_LEGACY_PREFIX: &str = "/rest/agile/latest";

/// The REST API family a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// Core REST API v2 (plain-text rich fields).
    V2,
    /// Core REST API v3 (Atlassian Document Format rich fields).
    V3,
    /// Agile REST API (boards, sprints, epics).
    Agile,
}

impl ApiVersion {
    /// Short lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V3 => "v3",
            Self::Agile => "agile",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of Jira deployment behind the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerFlavor {
    /// Jira Cloud (`*.atlassian.net` and friends).
    Cloud,
    /// Jira Server or Data Center on a custom host.
    SelfHosted,
}

/// Resolved connection state shared by every request of a session.
///
/// # Example
///
/// ```rust
/// use jira_bridge::auth::{ApiVersion, AuthMode, ConnectionSettings, CredentialContext, ServerFlavor};
///
/// let ctx = CredentialContext::new(&ConnectionSettings {
///     base_url: "https://example.atlassian.net/".to_string(),
///     identity: Some("me@example.com".to_string()),
///     secret: Some("token".to_string()),
///     auth_mode: AuthMode::Basic,
///     server_flavor: None,
/// })?;
///
/// assert_eq!(ctx.server_flavor(), ServerFlavor::Cloud);
/// assert_eq!(ctx.prefix(ApiVersion::V3), "/rest/api/3");
/// assert_eq!(ctx.url(ApiVersion::V2, "/myself"), "https://example.atlassian.net/rest/api/2/myself");
/// # Ok::<(), jira_bridge::api::ApiError>(())
/// ```
#[derive(Clone)]
pub struct CredentialContext {
    base_url: String,
    auth_header: String,
    identity: Option<String>,
    server_flavor: ServerFlavor,
    versioned_paths: HashMap<ApiVersion, String>,
}

impl CredentialContext {
    /// Builds the context, failing fast on incomplete settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if:
    /// - `base_url` is empty or not a valid URL
    /// - basic mode is missing the identity or the secret
    /// - bearer mode is missing the secret
    pub fn new(settings: &ConnectionSettings) -> Result<Self, ApiError> {
        let base_url = settings.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::Configuration(
                "base URL is not configured".to_string(),
            ));
        }

        let parsed = url::Url::parse(&base_url).map_err(|e| {
            ApiError::Configuration(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        let host = parsed.host_str().unwrap_or_default();

        let secret = non_empty(settings.secret.as_deref());
        let identity = non_empty(settings.identity.as_deref());

        let auth_header = match settings.auth_mode {
            AuthMode::Bearer => {
                let secret = secret.ok_or_else(|| {
                    ApiError::Configuration("bearer authentication requires a token".to_string())
                })?;
                format!("Bearer {}", secret)
            }
            AuthMode::Basic => {
                let identity = identity.ok_or_else(|| {
                    ApiError::Configuration(
                        "basic authentication requires an identity (email or username)"
                            .to_string(),
                    )
                })?;
                let secret = secret.ok_or_else(|| {
                    ApiError::Configuration(
                        "basic authentication requires an API token or password".to_string(),
                    )
                })?;
                format!(
                    "Basic {}",
                    STANDARD.encode(format!("{}:{}", identity, secret))
                )
            }
        };

        let server_flavor = settings.server_flavor.unwrap_or(if is_cloud_host(host) {
            ServerFlavor::Cloud
        } else {
            ServerFlavor::SelfHosted
        });

        let mut versioned_paths = HashMap::new();
        versioned_paths.insert(ApiVersion::V2, V2_PREFIX.to_string());
        versioned_paths.insert(
            ApiVersion::V3,
            match server_flavor {
                ServerFlavor::Cloud => V3_PREFIX.to_string(),
                ServerFlavor::SelfHosted => V2_PREFIX.to_string(),
            },
        );
        versioned_paths.insert(ApiVersion::Agile, AGILE_PREFIX.to_string());

        Ok(Self {
            base_url,
            auth_header,
            identity: identity.map(String::from),
            server_flavor,
            versioned_paths,
        })
    }

    /// The normalized base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The precomputed `Authorization` header value.
    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    /// The configured identity, if any.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn server_flavor(&self) -> ServerFlavor {
        self.server_flavor
    }

    pub fn is_cloud(&self) -> bool {
        self.server_flavor == ServerFlavor::Cloud
    }

    /// Path prefix a version resolves to for this server.
    pub fn prefix(&self, version: ApiVersion) -> &str {
        self.versioned_paths
            .get(&version)
            .map(String::as_str)
            .unwrap_or(V2_PREFIX)
    }

    /// Full request URL for an endpoint under a version's prefix.
    pub fn url(&self, version: ApiVersion, endpoint: &str) -> String {
        self.url_with_prefix(self.prefix(version), endpoint)
    }

    /// Full request URL for an endpoint under an explicit path prefix.
    pub fn url_with_prefix(&self, prefix: &str, endpoint: &str) -> String {
        format!("{}{}{}", self.base_url, prefix, endpoint)
    }
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("base_url", &self.base_url)
            .field("auth_header", &"<redacted>")
            .field("identity", &self.identity)
            .field("server_flavor", &self.server_flavor)
            .field("versioned_paths", &self.versioned_paths)
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
