//
//  jira-bridge
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for Jira Cloud and Server
//!
//! This module provides the error type every dispatcher call returns, the
//! helper that extracts Jira's structured error messages from a failure body,
//! and the pagination wrapper shared by the agile endpoints.
//!
//! # Example
//!
//! ```rust
//! use jira_bridge::api::common::ApiError;
//! use jira_bridge::errors::ErrorCategory;
//!
//! fn handle_result<T>(result: Result<T, ApiError>) {
//!     match result {
//!         Ok(_) => println!("Success!"),
//!         Err(e) if e.category() == Some(ErrorCategory::Auth) => {
//!             println!("Check your credentials: {}", e)
//!         }
//!         Err(e) if e.is_retryable() => println!("Temporary failure: {}", e),
//!         Err(e) => println!("Error: {}", e),
//!     }
//! }
//! ```

use thiserror::Error;

use crate::errors::ErrorCategory;

mod pagination;

pub use pagination::*;

/// Unified error type for all Jira API operations.
///
/// Every variant is introspectable; friendly formatting is only applied at the
/// boundary nearest to the human (see [`crate::errors::ErrorClassifier`]).
///
/// | Variant | Category | Retryable |
/// |---------|----------|-----------|
/// | `Configuration` | none | never |
/// | `Network` / `Timeout` | network | yes |
/// | `Http` 401 | auth | after reconfiguration only |
/// | `Http` 403 | permission | no |
/// | `Http` 404 | not found | no |
/// | `Http` other 4xx | validation | no |
/// | `Http` 5xx | server | yes |
/// | `Decode` | none | no |
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Connection settings are incomplete or invalid. Fatal for the session.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure (connection refused, DNS, TLS, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The per-request timeout elapsed.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The server answered with a status >= 400.
    ///
    /// `messages` holds Jira's `errorMessages` and `errors` entries, or the
    /// raw body when it carried no structured messages.
    #[error("API Error: {status} - {}", format_messages(.messages))]
    Http { status: u16, messages: Vec<String> },

    /// A success body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

fn format_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        "no details provided".to_string()
    } else {
        messages.join("; ")
    }
}

impl ApiError {
    /// HTTP status code, for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Structured category, when the error carries one.
    ///
    /// `Configuration` and `Decode` are local failures and are not tagged
    /// with a server taxonomy category.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Network(_) | Self::Timeout(_) => Some(ErrorCategory::Network),
            Self::Http { status, .. } => Some(ErrorCategory::from_status(*status)),
            Self::Configuration(_) | Self::Decode(_) => None,
        }
    }

    /// Whether repeating the same request can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Configuration(_) | Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Extracts Jira's structured error messages from a failure body.
///
/// Jira reports errors as:
/// ```json
/// {"errorMessages": ["Issue does not exist"], "errors": {"summary": "Summary is required"}}
/// ```
/// Field errors are rendered as `field: message`. A bare `{"message": "..."}`
/// is also understood. If the body carries none of these, the trimmed raw
/// body is returned (when non-empty).
pub fn extract_error_messages(body: &str) -> Vec<String> {
    let mut messages = Vec::new();

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(list) = json.get("errorMessages").and_then(|m| m.as_array()) {
            messages.extend(list.iter().filter_map(|m| m.as_str()).map(String::from));
        }

        if let Some(fields) = json.get("errors").and_then(|e| e.as_object()) {
            let mut field_errors: Vec<String> = fields
                .iter()
                .filter_map(|(field, msg)| msg.as_str().map(|m| format!("{}: {}", field, m)))
                .collect();
            field_errors.sort();
            messages.extend(field_errors);
        }

        if messages.is_empty() {
            if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
                messages.push(message.to_string());
            }
        }
    }

    if messages.is_empty() {
        let raw = body.trim();
        if !raw.is_empty() {
            messages.push(raw.to_string());
        }
    }

    messages
}
