//
//  jira-bridge
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Request Dispatcher for the Jira API
//!
//! This module provides the single entry point every remote call goes through.
//! It resolves the endpoint against the [`CredentialContext`], attaches the
//! precomputed credential header, decodes the body and applies the
//! alternate-endpoint fallback table.
//!
//! ## Features
//!
//! - Versioned endpoint resolution (v2, v3, agile)
//! - One fallback hop on 404 (see [`super::fallback`])
//! - Structured [`ApiError`] for every failure, including decode errors
//! - Per-request timeout surfaced as [`ApiError::Timeout`]

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::common::{extract_error_messages, ApiError};
use super::fallback::{self, retry_once};
use crate::auth::{ApiVersion, ConnectionSettings, CredentialContext};
use crate::util::truncate;

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const ERROR_BODY_LOG_CHARS: usize = 200;

/// The request dispatcher.
///
/// Cheap to clone: the HTTP connection pool and the credential context are
/// shared between clones.
///
/// # Example
///
/// ```rust,no_run
/// use jira_bridge::api::{JiraClient, DEFAULT_TIMEOUT};
/// use jira_bridge::auth::{ApiVersion, AuthMode, ConnectionSettings};
/// use reqwest::Method;
///
/// # async fn example() -> Result<(), jira_bridge::api::ApiError> {
/// let client = JiraClient::from_settings(
///     &ConnectionSettings {
///         base_url: "https://example.atlassian.net".to_string(),
///         identity: Some("me@example.com".to_string()),
///         secret: Some("api-token".to_string()),
///         auth_mode: AuthMode::Basic,
///         server_flavor: None,
///     },
///     DEFAULT_TIMEOUT,
/// )?;
///
/// let me = client.dispatch(Method::GET, "/myself", ApiVersion::V3, None).await?;
/// println!("{:?}", me);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    context: Arc<CredentialContext>,
    timeout: Duration,
}

impl JiraClient {
    /// Creates a dispatcher for an already-built credential context.
    pub fn new(context: CredentialContext, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            context: Arc::new(context),
            timeout,
        })
    }

    /// Builds the credential context from raw settings, then the dispatcher.
    pub fn from_settings(
        settings: &ConnectionSettings,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Self::new(CredentialContext::new(settings)?, timeout)
    }

    pub fn context(&self) -> &CredentialContext {
        &self.context
    }

    pub fn is_cloud(&self) -> bool {
        self.context.is_cloud()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs one logical request, with at most one fallback hop.
    ///
    /// Returns `Ok(None)` for an empty success body (for example HTTP 204).
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] for any status >= 400 that survived the fallback
    /// - [`ApiError::Network`] / [`ApiError::Timeout`] for transport failures
    /// - [`ApiError::Decode`] when a non-empty success body is not JSON
    pub async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        version: ApiVersion,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let primary_prefix = self.context.prefix(version);
        let primary_url = self.context.url_with_prefix(primary_prefix, endpoint);
        let result = self.send(&method, &primary_url, body).await;

        let Some(rule) = fallback::rule_for(version) else {
            return result;
        };
        let secondary_prefix = rule.target.prefix(&self.context);
        if secondary_prefix == primary_prefix {
            return result;
        }

        let method = &method;
        retry_once(
            result,
            |err| rule.trigger.matches(method, err),
            || {
                let secondary_url = self.context.url_with_prefix(secondary_prefix, endpoint);
                debug!("Falling back from {} to {}", primary_url, secondary_url);
                async move { self.send(method, &secondary_url, body).await }
            },
        )
        .await
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTHORIZATION, self.context.auth_header())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        debug!(status, "{} {} completed", method, url);

        if status >= 400 {
            debug!("Error body: {}", truncate(&text, ERROR_BODY_LOG_CHARS));
            return Err(ApiError::Http {
                status,
                messages: extract_error_messages(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout.as_secs())
        } else {
            ApiError::from(err)
        }
    }

    /// GET and decode into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        version: ApiVersion,
    ) -> Result<T, ApiError> {
        let value = self.dispatch(Method::GET, endpoint, version, None).await?;
        decode(value)
    }

    /// POST a JSON body and decode the response into `T`.
    ///
    /// Use `T = ()` or `T = Option<_>` for endpoints that answer 204.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        version: ApiVersion,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = encode(body)?;
        let value = self
            .dispatch(Method::POST, endpoint, version, Some(&body))
            .await?;
        decode(value)
    }

    /// PUT a JSON body and decode the response into `T`.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        version: ApiVersion,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = encode(body)?;
        let value = self
            .dispatch(Method::PUT, endpoint, version, Some(&body))
            .await?;
        decode(value)
    }

    /// DELETE, discarding any response body.
    pub async fn delete(&self, endpoint: &str, version: ApiVersion) -> Result<(), ApiError> {
        self.dispatch(Method::DELETE, endpoint, version, None)
            .await
            .map(|_| ())
    }
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("context", &self.context)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::Configuration(format!("failed to encode request body: {}", e)))
}

fn decode<T: DeserializeOwned>(value: Option<Value>) -> Result<T, ApiError> {
    serde_json::from_value(value.unwrap_or(Value::Null)).map_err(|e| ApiError::Decode(e.to_string()))
}
