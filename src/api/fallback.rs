//
//  jira-bridge
//  api/fallback.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Alternate-endpoint fallback table.
//!
//! Some endpoints exist under more than one API root depending on the Jira
//! version behind the base URL. Instead of hard-coding a retry at each call
//! site, the dispatcher consults [`FALLBACK_RULES`] and runs the secondary
//! attempt through [`retry_once`].
//!
//! | Primary | Trigger | Secondary |
//! |---------|---------|-----------|
//! | `V3` | GET answered with 404 | `V2` |
//! | `Agile` | any method answered with 404 | `/rest/agile/latest` |
//!
//! A call makes at most two hops: the secondary attempt is never itself
//! subject to fallback.

use std::future::Future;

use reqwest::Method;

use super::common::ApiError;
use crate::auth::{ApiVersion, CredentialContext, AGILE_LEGACY_PREFIX};

/// Where a fallback attempt is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTarget {
    /// Another API version, resolved through the credential context.
    Version(ApiVersion),
    /// A fixed path prefix.
    Prefix(&'static str),
}

impl FallbackTarget {
    /// Resolves the target to a path prefix for the given server.
    pub fn prefix<'a>(&self, context: &'a CredentialContext) -> &'a str {
        match self {
            Self::Version(version) => context.prefix(*version),
            Self::Prefix(prefix) => *prefix,
        }
    }
}

/// Failure that makes a fallback attempt worthwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTrigger {
    /// A GET answered with 404.
    GetNotFound,
    /// Any request answered with 404.
    NotFound,
}

impl FallbackTrigger {
    pub fn matches(&self, method: &Method, error: &ApiError) -> bool {
        match self {
            Self::GetNotFound => *method == Method::GET && error.is_not_found(),
            Self::NotFound => error.is_not_found(),
        }
    }
}

/// One row of the fallback table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackRule {
    /// Version of the primary attempt.
    pub version: ApiVersion,
    /// Where the secondary attempt goes.
    pub target: FallbackTarget,
    /// Condition on the primary failure.
    pub trigger: FallbackTrigger,
}

/// The fallback table, one rule per primary version at most.
pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        version: ApiVersion::V3,
        target: FallbackTarget::Version(ApiVersion::V2),
        trigger: FallbackTrigger::GetNotFound,
    },
    FallbackRule {
        version: ApiVersion::Agile,
        target: FallbackTarget::Prefix(AGILE_LEGACY_PREFIX),
        trigger: FallbackTrigger::NotFound,
    },
];

/// Looks up the fallback rule for a primary version.
pub fn rule_for(version: ApiVersion) -> Option<&'static FallbackRule> {
    FALLBACK_RULES.iter().find(|rule| rule.version == version)
}

/// Runs `second` once if `first` failed with an error accepted by
/// `should_retry`; otherwise returns `first` unchanged.
///
/// # Example
///
/// ```rust
/// use jira_bridge::api::{fallback::retry_once, ApiError};
///
/// # async fn example() {
/// let out = retry_once(
///     Err::<u8, _>(ApiError::Http { status: 404, messages: vec![] }),
///     ApiError::is_not_found,
///     || async { Ok(7) },
/// )
/// .await;
/// assert_eq!(out.unwrap(), 7);
/// # }
/// ```
pub async fn retry_once<T, P, F, Fut>(
    first: Result<T, ApiError>,
    should_retry: P,
    second: F,
) -> Result<T, ApiError>
where
    P: FnOnce(&ApiError) -> bool,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match first {
        Err(err) if should_retry(&err) => second().await,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthMode, ConnectionSettings, ServerFlavor, V2_PREFIX};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn not_found() -> ApiError {
        ApiError::Http {
            status: 404,
            messages: vec!["gone".to_string()],
        }
    }

    fn context(flavor: ServerFlavor) -> CredentialContext {
        CredentialContext::new(&ConnectionSettings {
            base_url: "https://jira.example.com".to_string(),
            identity: None,
            secret: Some("pat".to_string()),
            auth_mode: AuthMode::Bearer,
            server_flavor: Some(flavor),
        })
        .unwrap()
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(
            rule_for(ApiVersion::V3).map(|r| r.target),
            Some(FallbackTarget::Version(ApiVersion::V2))
        );
        assert_eq!(
            rule_for(ApiVersion::Agile).map(|r| r.target),
            Some(FallbackTarget::Prefix(AGILE_LEGACY_PREFIX))
        );
        assert!(rule_for(ApiVersion::V2).is_none());
    }

    #[test]
    fn test_v3_trigger_only_for_get_404() {
        let rule = rule_for(ApiVersion::V3).unwrap();
        assert!(rule.trigger.matches(&Method::GET, &not_found()));
        assert!(!rule.trigger.matches(&Method::POST, &not_found()));
        assert!(!rule.trigger.matches(
            &Method::GET,
            &ApiError::Http {
                status: 500,
                messages: vec![]
            }
        ));
    }

    #[test]
    fn test_agile_trigger_any_method() {
        let rule = rule_for(ApiVersion::Agile).unwrap();
        assert!(rule.trigger.matches(&Method::POST, &not_found()));
    }

    #[test]
    fn test_target_resolves_against_context() {
        let target = FallbackTarget::Version(ApiVersion::V2);
        assert_eq!(target.prefix(&context(ServerFlavor::Cloud)), V2_PREFIX);

        // On self-hosted servers v3 already resolves to the v2 prefix.
        let hosted = context(ServerFlavor::SelfHosted);
        assert_eq!(hosted.prefix(ApiVersion::V3), target.prefix(&hosted));
    }

    #[tokio::test]
    async fn test_retry_once_runs_second_on_match() {
        let calls = AtomicUsize::new(0);
        let out = retry_once(Err::<u8, _>(not_found()), ApiError::is_not_found, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        })
        .await;
        assert_eq!(out.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_once_passes_through_other_results() {
        let calls = AtomicUsize::new(0);
        let out = retry_once(
            Err::<u8, _>(ApiError::Timeout(10)),
            ApiError::is_not_found,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            },
        )
        .await;
        assert!(matches!(out, Err(ApiError::Timeout(10))));

        let out = retry_once(Ok(5u8), |_| true, || async { Ok(1) }).await;
        assert_eq!(out.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
