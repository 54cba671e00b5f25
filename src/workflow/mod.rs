//
//  jira-bridge
//  workflow/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Workflow Transitions
//!
//! Moves an issue to a requested status by name, then optionally reassigns it.
//!
//! ```text
//! Idle → FetchingTransitions ─┬→ Matched → Transitioning ─┬→ Done
//!                             └→ NoMatch                  └→ Failed
//! ```
//!
//! Transitions are fetched fresh on every request. The requested name is
//! matched case-insensitively against transition names first, then against
//! destination status names. When an assignee is requested, the assignment
//! runs after the transition succeeded; its failure is reported separately
//! and does not undo the transition.
//!
//! The machine talks to the server through [`WorkflowApi`], which
//! [`crate::JiraService`] implements.

mod transition;

pub use transition::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::jira::{Assignee, TransitionCandidate, TransitionOptions, UserRef};
use crate::api::ApiError;

/// Server operations the transition machine needs.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Transitions currently available on the issue.
    async fn get_transitions(&self, issue_key: &str)
        -> Result<Vec<TransitionCandidate>, ApiError>;

    /// Executes a transition.
    async fn do_transition(
        &self,
        issue_key: &str,
        transition_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), ApiError>;

    /// The authenticated user.
    async fn get_myself(&self) -> Result<UserRef, ApiError>;

    /// Users matching a free-text query.
    async fn search_users(&self, query: &str) -> Result<Vec<UserRef>, ApiError>;

    /// Assigns (or with `None`, unassigns) the issue.
    async fn assign(&self, issue_key: &str, user: Option<&UserRef>) -> Result<(), ApiError>;
}

/// A request to move an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionRequest {
    pub issue_key: String,
    /// Transition name or destination status name.
    pub target: String,
    pub comment: Option<String>,
    pub resolution: Option<String>,
    /// `"me"`/`"self"`, `"none"`/`"unassigned"`, or a user search query.
    pub assignee: Option<String>,
}

impl TransitionRequest {
    pub fn new(issue_key: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            issue_key: issue_key.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }
}

/// States of the transition machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Idle,
    FetchingTransitions,
    Matched,
    NoMatch,
    Transitioning,
    Done,
    Failed,
}

impl TransitionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingTransitions => "fetching transitions",
            Self::Matched => "matched",
            Self::NoMatch => "no match",
            Self::Transitioning => "transitioning",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NoMatch | Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for TransitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful transition.
#[derive(Debug)]
pub struct TransitionReport {
    pub issue_key: String,
    /// Every state the machine went through, starting at `Idle`.
    pub history: Vec<TransitionState>,
    /// The transition that was executed.
    pub transition: TransitionCandidate,
    /// Result of the assignee cascade, when one was requested.
    pub cascade: Option<Result<Assignee, CascadeError>>,
}

/// Why the transition itself did not happen.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(
        "Transition '{requested}' is not available for {issue_key}. Valid transitions: {}",
        format_names(.valid_names)
    )]
    NoMatch {
        issue_key: String,
        requested: String,
        valid_names: Vec<String>,
    },

    #[error("{source}")]
    Api {
        /// State the machine was in when the call failed.
        stage: TransitionState,
        #[source]
        source: ApiError,
    },
}

impl WorkflowError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } => Some(source),
            Self::NoMatch { .. } => None,
        }
    }
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Why the assignee cascade failed.
#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("No user matches '{0}'")]
    UserNotFound(String),

    #[error("Matched user '{0}' has no account id or username")]
    MissingIdentifier(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}
