//
//  jira-bridge
//  errors/classifier.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Ordered-rule error classification and friendly formatting.
//!
//! Classification walks a fixed rule list: HTTP status literals first, then
//! textual patterns. The first match wins; no match yields
//! [`ErrorCategory::Unknown`].
//!
//! # Example
//!
//! ```rust
//! use jira_bridge::errors::{classify, ErrorCategory, ErrorClassifier};
//!
//! assert_eq!(classify("API Error: 404 - issue not found").0, ErrorCategory::NotFound);
//! assert_eq!(classify("Connection refused").0, ErrorCategory::Network);
//!
//! let mut classifier = ErrorClassifier::seeded(7);
//! let text = classifier.format_friendly("API Error: 500 - boom");
//! assert!(text.starts_with("Jira server error"));
//! ```

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use super::{hints_for, ErrorCategory};
use crate::api::common::ApiError;

/// Number of hints rendered by [`ErrorClassifier::format_friendly`].
pub const HINTS_PER_MESSAGE: usize = 2;

struct Rule {
    category: ErrorCategory,
    pattern: Regex,
}

fn status_rule(category: ErrorCategory, codes: &str) -> Rule {
    Rule {
        category,
        pattern: Regex::new(&format!(r"(?:^|[^\w-])(?:{})(?:[^\w]|$)", codes))
            .expect("status pattern is valid"),
    }
}

fn text_rule(category: ErrorCategory, words: &str) -> Rule {
    Rule {
        category,
        pattern: Regex::new(&format!(r"(?i){}", words)).expect("text pattern is valid"),
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        status_rule(ErrorCategory::Auth, "401"),
        status_rule(ErrorCategory::Permission, "403"),
        status_rule(ErrorCategory::NotFound, "404"),
        status_rule(ErrorCategory::Validation, "400|405|409|413|415|422"),
        status_rule(ErrorCategory::Server, r"429|5\d\d"),
        text_rule(
            ErrorCategory::Auth,
            r"unauthori[sz]ed|authentication|not authenticated|invalid credentials|login required|token (?:has )?expired",
        ),
        text_rule(
            ErrorCategory::Permission,
            r"forbidden|permission|not allowed|access denied|insufficient privileges",
        ),
        text_rule(
            ErrorCategory::Network,
            r"connection refused|connection reset|connection closed|timed out|timeout|could not resolve|dns error|unreachable|econnrefused|failed to connect|error sending request|network",
        ),
        text_rule(
            ErrorCategory::NotFound,
            r"not found|does not exist|no such",
        ),
        text_rule(
            ErrorCategory::Server,
            r"internal server error|service unavailable|bad gateway|server error|rate limit",
        ),
        text_rule(
            ErrorCategory::Validation,
            r"invalid|is required|validation|bad request|malformed|not valid",
        ),
    ]
});

/// Classifies raw error text into a category and its canonical message.
///
/// Pure: the same input always yields the same output.
pub fn classify(raw: &str) -> (ErrorCategory, &'static str) {
    let category = RULES
        .iter()
        .find(|rule| rule.pattern.is_match(raw))
        .map(|rule| rule.category)
        .unwrap_or(ErrorCategory::Unknown);
    (category, category.message())
}

/// Classifies an [`ApiError`] by its structure.
///
/// Decode and configuration failures are local and carry no server category;
/// they are reported as [`ErrorCategory::Unknown`] rather than matched by text.
pub fn classify_error(error: &ApiError) -> ErrorCategory {
    match error {
        ApiError::Decode(_) | ApiError::Configuration(_) => ErrorCategory::Unknown,
        _ => error
            .category()
            .unwrap_or_else(|| classify(&error.to_string()).0),
    }
}

/// Renders a friendly message for a known category with the given source of
/// randomness.
///
/// Picks [`HINTS_PER_MESSAGE`] hints without replacement from the category's
/// pool, keeping the sampled order.
pub fn render_friendly<R: Rng + ?Sized>(
    category: ErrorCategory,
    raw: &str,
    rng: &mut R,
) -> String {
    let pool = hints_for(category);
    let amount = HINTS_PER_MESSAGE.min(pool.len());

    let mut out = String::new();
    out.push_str(category.message());
    out.push('\n');
    out.push_str("  ");
    out.push_str(raw.trim());
    out.push_str("\n\nTry:");
    for index in rand::seq::index::sample(rng, pool.len(), amount) {
        out.push_str("\n  • ");
        out.push_str(pool[index]);
    }
    out
}

/// Error classifier with an injected random source for hint selection.
///
/// Production code builds one with [`ErrorClassifier::from_os_rng`] at setup;
/// tests use [`ErrorClassifier::seeded`] to get reproducible hint sets.
pub struct ErrorClassifier<R: Rng = StdRng> {
    rng: R,
}

/// Classifier shared between the service and its wrappers.
pub type SharedClassifier = Arc<Mutex<ErrorClassifier>>;

impl ErrorClassifier<StdRng> {
    /// Deterministic classifier for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Classifier seeded once from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Wraps this classifier for sharing.
    pub fn shared(self) -> SharedClassifier {
        Arc::new(Mutex::new(self))
    }
}

impl<R: Rng> ErrorClassifier<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// See [`classify`].
    pub fn classify(&self, raw: &str) -> (ErrorCategory, &'static str) {
        classify(raw)
    }

    /// Classifies `raw` and renders category message, raw detail and two
    /// bulleted hints.
    pub fn format_friendly(&mut self, raw: &str) -> String {
        let (category, _) = classify(raw);
        render_friendly(category, raw, &mut self.rng)
    }

    /// Like [`format_friendly`](Self::format_friendly) for a structured error.
    pub fn format_error(&mut self, error: &ApiError) -> String {
        render_friendly(classify_error(error), &error.to_string(), &mut self.rng)
    }
}
