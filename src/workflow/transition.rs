//
//  jira-bridge
//  workflow/transition.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use tracing::debug;

use super::{
    CascadeError, TransitionReport, TransitionRequest, TransitionState, WorkflowApi,
    WorkflowError,
};
use crate::api::jira::{Assignee, TransitionCandidate, TransitionOptions, UserRef};

/// Finds the transition for `target`: by transition name first, then by
/// destination status name, both case-insensitive.
pub fn match_transition<'a>(
    candidates: &'a [TransitionCandidate],
    target: &str,
) -> Option<&'a TransitionCandidate> {
    let target = target.trim().to_lowercase();
    candidates
        .iter()
        .find(|t| t.name.to_lowercase() == target)
        .or_else(|| {
            candidates
                .iter()
                .find(|t| t.to_status.name.to_lowercase() == target)
        })
}

/// Names a target may match: every transition name, then every destination
/// status name not already listed. Duplicates are dropped case-insensitively.
pub fn valid_names(candidates: &[TransitionCandidate]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let transitions = candidates.iter().map(|t| &t.name);
    let statuses = candidates.iter().map(|t| &t.to_status.name);
    for name in transitions.chain(statuses) {
        if name.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            continue;
        }
        names.push(name.clone());
    }
    names
}

/// Single-use transition state machine.
///
/// # Example
///
/// ```rust,no_run
/// use jira_bridge::workflow::{TransitionMachine, TransitionRequest, WorkflowApi};
///
/// # async fn example(api: &dyn WorkflowApi) -> Result<(), jira_bridge::workflow::WorkflowError> {
/// let report = TransitionMachine::new(api)
///     .run(&TransitionRequest::new("ABC-1", "in progress").with_assignee("me"))
///     .await?;
/// println!("{} -> {}", report.issue_key, report.transition.to_status.name);
/// # Ok(())
/// # }
/// ```
pub struct TransitionMachine<'a, W: WorkflowApi + ?Sized> {
    api: &'a W,
    state: TransitionState,
    history: Vec<TransitionState>,
}

impl<'a, W: WorkflowApi + ?Sized> TransitionMachine<'a, W> {
    pub fn new(api: &'a W) -> Self {
        Self {
            api,
            state: TransitionState::Idle,
            history: vec![TransitionState::Idle],
        }
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    fn enter(&mut self, next: TransitionState) {
        debug!("Transition machine: {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, source: crate::api::ApiError) -> WorkflowError {
        let stage = self.state;
        self.enter(TransitionState::Failed);
        WorkflowError::Api { stage, source }
    }

    /// Drives the machine to a terminal state.
    pub async fn run(mut self, request: &TransitionRequest) -> Result<TransitionReport, WorkflowError> {
        self.enter(TransitionState::FetchingTransitions);
        let candidates = match self.api.get_transitions(&request.issue_key).await {
            Ok(candidates) => candidates,
            Err(e) => return Err(self.fail(e)),
        };

        let Some(transition) = match_transition(&candidates, &request.target).cloned() else {
            self.enter(TransitionState::NoMatch);
            return Err(WorkflowError::NoMatch {
                issue_key: request.issue_key.clone(),
                requested: request.target.clone(),
                valid_names: valid_names(&candidates),
            });
        };
        self.enter(TransitionState::Matched);

        self.enter(TransitionState::Transitioning);
        let options = TransitionOptions {
            comment: request.comment.clone(),
            resolution: request.resolution.clone(),
        };
        if let Err(e) = self
            .api
            .do_transition(&request.issue_key, &transition.id, &options)
            .await
        {
            return Err(self.fail(e));
        }
        self.enter(TransitionState::Done);

        let cascade = match &request.assignee {
            Some(assignee) => Some(self.cascade_assignee(&request.issue_key, assignee).await),
            None => None,
        };

        Ok(TransitionReport {
            issue_key: request.issue_key.clone(),
            history: self.history,
            transition,
            cascade,
        })
    }

    async fn cascade_assignee(&self, issue_key: &str, requested: &str) -> Result<Assignee, CascadeError> {
        let user = match requested.trim().to_lowercase().as_str() {
            "none" | "unassigned" => {
                self.api.assign(issue_key, None).await?;
                return Ok(Assignee::Unassigned);
            }
            "me" | "self" => self.api.get_myself().await?,
            _ => self.resolve_user(requested).await?,
        };

        if user.identifier().is_none() {
            return Err(CascadeError::MissingIdentifier(user.display_name));
        }
        self.api.assign(issue_key, Some(&user)).await?;
        debug!("Assigned {} to {}", issue_key, user.display_name);
        Ok(Assignee::Person(user))
    }

    /// First search match wins; ambiguous queries are not disambiguated.
    async fn resolve_user(&self, query: &str) -> Result<UserRef, CascadeError> {
        self.api
            .search_users(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CascadeError::UserNotFound(query.to_string()))
    }
}
