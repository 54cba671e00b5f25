//
//  jira-bridge
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! This module turns user-supplied connection settings into the precomputed
//! credential state attached to every request. It does not implement any
//! authentication protocol: the header is computed once and sent as-is.
//!
//! ## Supported Authentication Methods
//!
//! - **Basic**: identity (Jira Cloud email or Server username) plus an API
//!   token or password, sent as `Authorization: Basic <base64>`.
//! - **Bearer**: a Personal Access Token (Server/Data Center) or OAuth access
//!   token, sent as `Authorization: Bearer <token>`.
//!
//! ## Module Structure
//!
//! - [`context`]: the immutable [`CredentialContext`] and endpoint resolution
//! - [`secrets`]: the owner-only secrets file the API token is read from
//!
//! ## Example
//!
//! ```rust
//! use jira_bridge::auth::{AuthMode, ConnectionSettings, CredentialContext};
//!
//! let settings = ConnectionSettings {
//!     base_url: "https://jira.example.com".to_string(),
//!     identity: None,
//!     secret: Some("personal-access-token".to_string()),
//!     auth_mode: AuthMode::Bearer,
//!     server_flavor: None,
//! };
//!
//! let ctx = CredentialContext::new(&settings)?;
//! assert!(!ctx.is_cloud());
//! # Ok::<(), jira_bridge::api::ApiError>(())
//! ```

mod context;
mod secrets;

pub use context::*;
pub use secrets::*;

use serde::{Deserialize, Serialize};

/// How the credential header is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// HTTP Basic with `identity:secret`.
    #[default]
    Basic,
    /// Bearer token (PAT or OAuth access token).
    Bearer,
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "bearer" | "pat" | "token" => Ok(Self::Bearer),
            other => Err(format!(
                "unknown auth mode '{}' (expected 'basic' or 'bearer')",
                other
            )),
        }
    }
}

/// Raw connection settings a [`CredentialContext`] is built from.
///
/// # Fields
///
/// * `base_url` - Jira base URL, e.g. `https://acme.atlassian.net`
/// * `identity` - Email (Cloud) or username (Server); required for basic mode
/// * `secret` - API token, password or PAT
/// * `auth_mode` - How the `Authorization` header is built
/// * `server_flavor` - Explicit flavor; `None` detects it from the host
#[derive(Clone, Default)]
pub struct ConnectionSettings {
    pub base_url: String,
    pub identity: Option<String>,
    pub secret: Option<String>,
    pub auth_mode: AuthMode,
    pub server_flavor: Option<ServerFlavor>,
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("auth_mode", &self.auth_mode)
            .field("server_flavor", &self.server_flavor)
            .finish()
    }
}
