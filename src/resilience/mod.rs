//
//  jira-bridge
//  resilience/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Retry and Cache Wrappers
//!
//! Two decorators around any async fetch returning `Result<T, ApiError>`:
//!
//! - [`Cached`] consults the [`CacheService`] before calling the fetch and
//!   stores successful results. Errors are never cached.
//! - [`Resilient`] turns a failure into a [`ResilientError`] carrying the
//!   category, a friendly message and a [`ResilientError::retry`] hook that
//!   repeats the call with the original arguments.
//!
//! Compose them with `Cached` innermost, so a retry re-checks the cache:
//!
//! ```rust
//! use jira_bridge::api::ApiError;
//! use jira_bridge::cache::{CacheService, CacheSettings, ResourceKind};
//! use jira_bridge::errors::ErrorClassifier;
//! use jira_bridge::resilience::{Cached, Resilient};
//!
//! # async fn example() {
//! let cache = CacheService::new(CacheSettings::default());
//! let cached = Cached::new(cache, ResourceKind::Issues, |key: &String| key.clone(), |key: String| async move {
//!     Ok::<_, ApiError>(format!("issue {}", key))
//! });
//!
//! let resilient = Resilient::new(ErrorClassifier::seeded(1).shared(), move |key: String| {
//!     let cached = cached.clone();
//!     async move { cached.call(key).await }
//! });
//!
//! match resilient.call("ABC-1".to_string()).await {
//!     Ok(issue) => println!("{}", issue),
//!     Err(e) => {
//!         eprintln!("{}", e.message);
//!         let _ = e.retry().await;
//!     }
//! }
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::api::ApiError;
use crate::cache::{CacheService, ResourceKind};
use crate::errors::{classify_error, ErrorCategory, SharedClassifier};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type FetchFn<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;
type RetryFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// Cache-first wrapper around a fetch.
pub struct Cached<A, T> {
    cache: CacheService,
    kind: ResourceKind,
    key_fn: Arc<dyn Fn(&A) -> String + Send + Sync>,
    fetch: FetchFn<A, T>,
}

impl<A, T> Clone for Cached<A, T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            kind: self.kind,
            key_fn: self.key_fn.clone(),
            fetch: self.fetch.clone(),
        }
    }
}

impl<A, T> Cached<A, T>
where
    A: Send + 'static,
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new<K, F, Fut>(cache: CacheService, kind: ResourceKind, key_fn: K, fetch: F) -> Self
    where
        K: Fn(&A) -> String + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self {
            cache,
            kind,
            key_fn: Arc::new(key_fn),
            fetch: Arc::new(move |args| -> BoxFuture<'static, Result<T, ApiError>> {
                Box::pin(fetch(args))
            }),
        }
    }

    /// Returns the cached value for `args`, or fetches and caches it.
    pub async fn call(&self, args: A) -> Result<T, ApiError> {
        let key = (self.key_fn)(&args);
        if let Some(hit) = self.cache.get_as::<T>(self.kind, &key) {
            debug!("Cache hit: {}/{}", self.kind, key);
            return Ok(hit);
        }

        let value = (self.fetch)(args).await?;
        self.cache.set_as(self.kind, key, &value);
        Ok(value)
    }
}

/// A failed call with its classification and a retry hook.
pub struct ResilientError<T> {
    pub category: ErrorCategory,
    /// Friendly, human-facing rendering of the failure.
    pub message: String,
    pub source: ApiError,
    classifier: SharedClassifier,
    retry: RetryFn<T>,
}

impl<T: Send + 'static> ResilientError<T> {
    fn new(classifier: SharedClassifier, source: ApiError, retry: RetryFn<T>) -> Self {
        let category = classify_error(&source);
        let message = classifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .format_error(&source);

        Self {
            category,
            message,
            source,
            classifier,
            retry,
        }
    }

    /// Whether a retry without user intervention can succeed.
    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }

    /// Repeats the original call with the original arguments.
    pub async fn retry(&self) -> Result<T, ResilientError<T>> {
        (self.retry)()
            .await
            .map_err(|source| Self::new(self.classifier.clone(), source, self.retry.clone()))
    }
}

impl<T> fmt::Display for ResilientError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<T> fmt::Debug for ResilientError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientError")
            .field("category", &self.category)
            .field("source", &self.source)
            .finish()
    }
}

impl<T> std::error::Error for ResilientError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Wrapper that classifies failures and exposes a retry hook.
pub struct Resilient<A, T> {
    classifier: SharedClassifier,
    f: FetchFn<A, T>,
}

impl<A, T> Clone for Resilient<A, T> {
    fn clone(&self) -> Self {
        Self {
            classifier: self.classifier.clone(),
            f: self.f.clone(),
        }
    }
}

impl<A, T> Resilient<A, T>
where
    A: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new<F, Fut>(classifier: SharedClassifier, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self {
            classifier,
            f: Arc::new(move |args| -> BoxFuture<'static, Result<T, ApiError>> {
                Box::pin(f(args))
            }),
        }
    }

    pub async fn call(&self, args: A) -> Result<T, ResilientError<T>> {
        match (self.f)(args.clone()).await {
            Ok(value) => Ok(value),
            Err(source) => {
                let f = self.f.clone();
                let retry: RetryFn<T> = Arc::new(move || f(args.clone()));
                let err = ResilientError::new(self.classifier.clone(), source, retry);
                debug!("Call failed ({}): {}", err.category, err.source);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheSettings;
    use crate::errors::ErrorClassifier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn server_error() -> ApiError {
        ApiError::Http {
            status: 500,
            messages: vec!["boom".to_string()],
        }
    }

    fn counting_fetch(
        cache: CacheService,
        calls: Arc<AtomicUsize>,
    ) -> Cached<String, String> {
        Cached::new(
            cache,
            ResourceKind::Issues,
            |key: &String| key.clone(),
            move |key: String| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(format!("issue {}", key))
                }
            },
        )
    }

    #[tokio::test]
    async fn test_cached_fetches_once_then_hits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = counting_fetch(CacheService::new(CacheSettings::default()), calls.clone());

        assert_eq!(cached.call("ABC-1".into()).await.unwrap(), "issue ABC-1");
        assert_eq!(cached.call("ABC-1".into()).await.unwrap(), "issue ABC-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_fetches_every_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CacheService::new(CacheSettings {
            enabled: false,
            ..Default::default()
        });
        let cached = counting_fetch(cache, calls.clone());

        for _ in 0..3 {
            cached.call("ABC-1".into()).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = CacheService::new(CacheSettings::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cached: Cached<String, String> = Cached::new(
            cache.clone(),
            ResourceKind::Issues,
            |key: &String| key.clone(),
            move |_key: String| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Err(server_error()) }
            },
        );

        assert!(cached.call("ABC-1".into()).await.is_err());
        assert!(cached.call("ABC-1".into()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.get(ResourceKind::Issues, "ABC-1").is_none());
    }

    #[tokio::test]
    async fn test_resilient_surfaces_server_error_with_retry() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        let resilient = Resilient::new(ErrorClassifier::seeded(3).shared(), move |key: String| {
            let log = log.clone();
            async move {
                let attempt = {
                    let mut seen = log.lock().unwrap();
                    seen.push(key.clone());
                    seen.len()
                };
                if attempt == 1 {
                    Err(server_error())
                } else {
                    Ok(format!("issue {}", key))
                }
            }
        });

        let err = resilient.call("ABC-7".to_string()).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::Server);
        assert!(err.is_retryable());
        assert!(err.message.starts_with("Jira server error"));
        assert!(err.message.contains("API Error: 500 - boom"));

        assert_eq!(err.retry().await.unwrap(), "issue ABC-7");
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["ABC-7".to_string(), "ABC-7".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_retry_is_classified_again() {
        let resilient: Resilient<u32, ()> =
            Resilient::new(ErrorClassifier::seeded(3).shared(), |_id: u32| async {
                Err(ApiError::Http {
                    status: 404,
                    messages: vec!["Issue does not exist".to_string()],
                })
            });

        let err = resilient.call(1).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::NotFound);
        assert!(!err.is_retryable());

        let again = err.retry().await.unwrap_err();
        assert_eq!(again.category, ErrorCategory::NotFound);
    }
}
