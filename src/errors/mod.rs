//
//  jira-bridge
//  errors/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Error Classification
//!
//! Maps raw error text into an [`ErrorCategory`] plus a canonical message, and
//! renders friendly messages with remediation hints for the human-facing
//! boundary.
//!
//! The classifier is independent of the dispatcher: it only ever sees text,
//! so it works equally on [`crate::api::ApiError`] display strings and on
//! errors bubbled up by host code.
//!
//! ## Module Structure
//!
//! - [`classifier`]: ordered rule list and the injectable-randomness formatter
//! - [`hints`]: fixed remediation hint pools per category

mod classifier;
mod hints;

pub use classifier::*;
pub use hints::*;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Credentials were rejected (401).
    Auth,
    /// Authenticated but not allowed (403).
    Permission,
    /// The resource does not exist or is invisible to the user (404).
    NotFound,
    /// The request was rejected as invalid (400 and other 4xx).
    Validation,
    /// The server failed (5xx, 429).
    Server,
    /// Transport failure or timeout.
    Network,
    /// Nothing matched.
    Unknown,
}

impl ErrorCategory {
    /// All categories, in classification order of their textual rules.
    pub const ALL: [ErrorCategory; 7] = [
        Self::Auth,
        Self::Permission,
        Self::NotFound,
        Self::Validation,
        Self::Server,
        Self::Network,
        Self::Unknown,
    ];

    /// Maps an HTTP status code to a category.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Auth,
            403 => Self::Permission,
            404 => Self::NotFound,
            429 => Self::Server,
            400..=499 => Self::Validation,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Server => "server",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }

    /// Canonical human-readable message for the category.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Auth => "Authentication failed",
            Self::Permission => "Permission denied",
            Self::NotFound => "Resource not found",
            Self::Validation => "Invalid request",
            Self::Server => "Jira server error",
            Self::Network => "Network error",
            Self::Unknown => "Unexpected error",
        }
    }

    /// Whether a retry without user intervention can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server | Self::Network)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
