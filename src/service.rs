//
//  jira-bridge
//  service.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Service Facade
//!
//! [`JiraService`] is the narrow interface host applications call: one async
//! method per remote resource, each returning `Result<T, ApiError>`. Reads go
//! through the cache; writes invalidate the entries they make stale.
//!
//! | Method | Cache namespace | Key |
//! |--------|-----------------|-----|
//! | `get_issue` | issues | issue key |
//! | `search_issues`, `get_board_issues`, `get_sprint_issues` | search | SHA-256 of the query |
//! | `get_projects`, `get_project` | projects | `*` / project key |
//! | `get_boards` | boards | project key or `*` |
//! | `get_sprints` | sprints | `board:state` |
//! | `get_current_user`, `search_users` | users | `myself` / `search:query` |
//!
//! Transitions, comments and priorities are always fetched fresh.
//!
//! Reads are built on [`Cached`]. The `*_resilient` variants wrap the same
//! read in [`Resilient`], returning a [`ResilientError`] whose `retry()`
//! repeats the call through the cache.

use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::jira::{
    search_cache_key, Board, Comment, CommentPage, CreateIssueRequest, CreatedIssue, Issue,
    Priority, Project, SearchResults, Sprint, TransitionCandidate, TransitionOptions,
    UpdateIssueRequest, UserRef,
};
use crate::api::{ApiError, JiraClient};
use crate::auth::ConnectionSettings;
use crate::cache::{CacheService, ResourceKind};
use crate::config::Config;
use crate::errors::{ErrorClassifier, SharedClassifier};
use crate::resilience::{Cached, Resilient, ResilientError};
use crate::workflow::{
    TransitionMachine, TransitionReport, TransitionRequest, WorkflowApi, WorkflowError,
};

const ALL_KEY: &str = "*";
const MYSELF_KEY: &str = "myself";

type SearchArgs = (String, u32, Option<u32>);

/// Entry point for host applications.
///
/// # Example
///
/// ```rust,no_run
/// use jira_bridge::{Config, JiraService};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// let service = JiraService::from_config(&config).await?;
/// let _snapshots = service.start_snapshot_task();
///
/// match service.get_issue("ABC-1").await {
///     Ok(issue) => println!("{}: {}", issue.key, issue.fields.summary),
///     Err(e) => eprintln!("{}", service.friendly_error(&e)),
/// }
///
/// // Classified failures with a retry hook.
/// if let Err(e) = service.get_issue_resilient("ABC-2").await {
///     eprintln!("{}", e.message);
///     if e.is_retryable() {
///         let _ = e.retry().await;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct JiraService {
    client: JiraClient,
    cache: CacheService,
    classifier: SharedClassifier,
}

impl JiraService {
    pub fn new(client: JiraClient, cache: CacheService, classifier: SharedClassifier) -> Self {
        Self {
            client,
            cache,
            classifier,
        }
    }

    /// Builds the dispatcher, restores the connection's cache snapshot and
    /// seeds the classifier from the operating system.
    pub async fn from_config(config: &Config) -> Result<Self, ApiError> {
        let settings = config.connection_settings();
        let client = JiraClient::from_settings(&settings, config.request_timeout())?;
        let cache = CacheService::load_for(config.cache_settings(), &settings.base_url).await;
        Ok(Self::new(client, cache, ErrorClassifier::from_os_rng().shared()))
    }

    pub fn client(&self) -> &JiraClient {
        &self.client
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    pub fn classifier(&self) -> SharedClassifier {
        self.classifier.clone()
    }

    /// Starts the periodic cache snapshot, if configured.
    pub fn start_snapshot_task(&self) -> Option<JoinHandle<()>> {
        self.cache.spawn_snapshot_task()
    }

    /// Replaces the credential context.
    ///
    /// Cached data belonged to the previous connection: it is cleared in
    /// memory and on disk, and the cache is rebound to the new host's
    /// snapshots. On error the previous connection stays in place.
    pub async fn reconfigure(&mut self, settings: &ConnectionSettings) -> Result<(), ApiError> {
        let client = JiraClient::from_settings(settings, self.client.timeout())?;

        if let Err(e) = self.cache.clear_all().await {
            warn!("Failed to clear cache snapshot: {:#}", e);
        }
        let restored = self.cache.rescope(&settings.base_url).await;

        self.client = client;
        debug!(
            "Reconfigured connection to {} ({} cached entries restored)",
            self.client.context().base_url(),
            restored
        );
        Ok(())
    }

    /// Friendly, human-facing rendering of an error with remediation hints.
    pub fn friendly_error(&self, error: &ApiError) -> String {
        self.classifier
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .format_error(error)
    }

    /// Cache-first read of `kind`, fetching through a clone of the client.
    fn reader<A, T, K, F, Fut>(&self, kind: ResourceKind, key_fn: K, fetch: F) -> Cached<A, T>
    where
        A: Send + 'static,
        T: Serialize + DeserializeOwned + Send + 'static,
        K: Fn(&A) -> String + Send + Sync + 'static,
        F: Fn(JiraClient, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let client = self.client.clone();
        Cached::new(self.cache.clone(), kind, key_fn, move |args| {
            fetch(client.clone(), args)
        })
    }

    /// Wraps a read so failures come back classified with a retry hook.
    /// Retries go through the cache again.
    fn resilient<A, T>(&self, reader: Cached<A, T>) -> Resilient<A, T>
    where
        A: Clone + Send + Sync + 'static,
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        Resilient::new(self.classifier.clone(), move |args: A| {
            let reader = reader.clone();
            async move { reader.call(args).await }
        })
    }

    // Issues

    fn issue_reader(&self) -> Cached<String, Issue> {
        self.reader(
            ResourceKind::Issues,
            |key: &String| key.clone(),
            |client: JiraClient, key: String| async move { client.get_issue(&key).await },
        )
    }

    fn search_reader(&self) -> Cached<SearchArgs, SearchResults> {
        self.reader(
            ResourceKind::Search,
            |(jql, start_at, max_results): &SearchArgs| {
                search_cache_key(jql, *start_at, max_results.unwrap_or(0))
            },
            |client: JiraClient, (jql, start_at, max_results): SearchArgs| async move {
                client.search_issues(&jql, start_at, max_results).await
            },
        )
    }

    pub async fn get_issue(&self, issue_key: &str) -> Result<Issue, ApiError> {
        self.issue_reader().call(issue_key.to_string()).await
    }

    /// [`JiraService::get_issue`] with a classified error and retry hook.
    pub async fn get_issue_resilient(
        &self,
        issue_key: &str,
    ) -> Result<Issue, ResilientError<Issue>> {
        self.resilient(self.issue_reader())
            .call(issue_key.to_string())
            .await
    }

    pub async fn search_issues(
        &self,
        jql: &str,
        start_at: u32,
        max_results: Option<u32>,
    ) -> Result<SearchResults, ApiError> {
        self.search_reader()
            .call((jql.to_string(), start_at, max_results))
            .await
    }

    /// [`JiraService::search_issues`] with a classified error and retry hook.
    pub async fn search_issues_resilient(
        &self,
        jql: &str,
        start_at: u32,
        max_results: Option<u32>,
    ) -> Result<SearchResults, ResilientError<SearchResults>> {
        self.resilient(self.search_reader())
            .call((jql.to_string(), start_at, max_results))
            .await
    }

    pub async fn create_issue(
        &self,
        request: &CreateIssueRequest,
    ) -> Result<CreatedIssue, ApiError> {
        let created = self.client.create_issue(request).await?;
        self.cache.clear(ResourceKind::Search);
        Ok(created)
    }

    pub async fn update_issue(
        &self,
        issue_key: &str,
        request: &UpdateIssueRequest,
    ) -> Result<(), ApiError> {
        self.client.update_issue(issue_key, request).await?;
        self.cache.invalidate_issue(issue_key);
        Ok(())
    }

    pub async fn get_transitions(
        &self,
        issue_key: &str,
    ) -> Result<Vec<TransitionCandidate>, ApiError> {
        self.client.get_transitions(issue_key).await
    }

    /// Runs the transition state machine for `request`.
    ///
    /// The issue's cache entry is invalidated once the transition went
    /// through, whatever the outcome of the assignee cascade.
    pub async fn transition_issue(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionReport, WorkflowError> {
        let report = TransitionMachine::new(self).run(request).await?;
        self.cache.invalidate_issue(&request.issue_key);
        Ok(report)
    }

    /// Assigns the issue to `user`, or unassigns it with `None`.
    pub async fn assign_issue(
        &self,
        issue_key: &str,
        user: Option<&UserRef>,
    ) -> Result<(), ApiError> {
        self.client.assign_issue(issue_key, user).await?;
        self.cache.invalidate_issue(issue_key);
        Ok(())
    }

    pub async fn add_comment(&self, issue_key: &str, body: &str) -> Result<Comment, ApiError> {
        let comment = self.client.add_comment(issue_key, body).await?;
        self.cache.invalidate_issue(issue_key);
        Ok(comment)
    }

    pub async fn get_comments(&self, issue_key: &str) -> Result<CommentPage, ApiError> {
        self.client.get_comments(issue_key).await
    }

    // Projects

    fn projects_reader(&self) -> Cached<(), Vec<Project>> {
        self.reader(
            ResourceKind::Projects,
            |_: &()| ALL_KEY.to_string(),
            |client: JiraClient, _: ()| async move { client.get_projects().await },
        )
    }

    pub async fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.projects_reader().call(()).await
    }

    /// [`JiraService::get_projects`] with a classified error and retry hook.
    pub async fn get_projects_resilient(
        &self,
    ) -> Result<Vec<Project>, ResilientError<Vec<Project>>> {
        self.resilient(self.projects_reader()).call(()).await
    }

    pub async fn get_project(&self, key: &str) -> Result<Project, ApiError> {
        self.reader(
            ResourceKind::Projects,
            |key: &String| key.clone(),
            |client: JiraClient, key: String| async move { client.get_project(&key).await },
        )
        .call(key.to_string())
        .await
    }

    pub async fn get_priorities(&self) -> Result<Vec<Priority>, ApiError> {
        self.client.get_priorities().await
    }

    // Agile

    pub async fn get_boards(&self, project_key: Option<&str>) -> Result<Vec<Board>, ApiError> {
        self.reader(
            ResourceKind::Boards,
            |project: &Option<String>| project.as_deref().unwrap_or(ALL_KEY).to_string(),
            |client: JiraClient, project: Option<String>| async move {
                client.get_boards(project.as_deref()).await
            },
        )
        .call(project_key.map(str::to_string))
        .await
    }

    pub async fn get_sprints(
        &self,
        board_id: u64,
        state: Option<&str>,
    ) -> Result<Vec<Sprint>, ApiError> {
        self.reader(
            ResourceKind::Sprints,
            |(board_id, state): &(u64, Option<String>)| {
                format!("{}:{}", board_id, state.as_deref().unwrap_or(ALL_KEY))
            },
            |client: JiraClient, (board_id, state): (u64, Option<String>)| async move {
                client.get_sprints(board_id, state.as_deref()).await
            },
        )
        .call((board_id, state.map(str::to_string)))
        .await
    }

    pub async fn get_board_issues(
        &self,
        board_id: u64,
        jql: Option<&str>,
        start_at: u32,
    ) -> Result<SearchResults, ApiError> {
        self.reader(
            ResourceKind::Search,
            |(board_id, jql, start_at): &(u64, Option<String>, u32)| {
                search_cache_key(
                    &format!("board:{} {}", board_id, jql.as_deref().unwrap_or_default()),
                    *start_at,
                    0,
                )
            },
            |client: JiraClient, (board_id, jql, start_at): (u64, Option<String>, u32)| async move {
                client.get_board_issues(board_id, jql.as_deref(), start_at).await
            },
        )
        .call((board_id, jql.map(str::to_string), start_at))
        .await
    }

    pub async fn get_sprint_issues(
        &self,
        sprint_id: u64,
        start_at: u32,
    ) -> Result<SearchResults, ApiError> {
        self.reader(
            ResourceKind::Search,
            |(sprint_id, start_at): &(u64, u32)| {
                search_cache_key(&format!("sprint:{}", sprint_id), *start_at, 0)
            },
            |client: JiraClient, (sprint_id, start_at): (u64, u32)| async move {
                client.get_sprint_issues(sprint_id, start_at).await
            },
        )
        .call((sprint_id, start_at))
        .await
    }

    // Users

    pub async fn get_current_user(&self) -> Result<UserRef, ApiError> {
        self.reader(
            ResourceKind::Users,
            |_: &()| MYSELF_KEY.to_string(),
            |client: JiraClient, _: ()| async move { client.get_myself().await },
        )
        .call(())
        .await
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserRef>, ApiError> {
        self.reader(
            ResourceKind::Users,
            |query: &String| format!("search:{}", query.trim().to_lowercase()),
            |client: JiraClient, query: String| async move { client.search_users(&query).await },
        )
        .call(query.to_string())
        .await
    }
}

#[async_trait]
impl WorkflowApi for JiraService {
    async fn get_transitions(
        &self,
        issue_key: &str,
    ) -> Result<Vec<TransitionCandidate>, ApiError> {
        self.client.get_transitions(issue_key).await
    }

    async fn do_transition(
        &self,
        issue_key: &str,
        transition_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), ApiError> {
        self.client
            .do_transition(issue_key, transition_id, options)
            .await
    }

    async fn get_myself(&self) -> Result<UserRef, ApiError> {
        self.get_current_user().await
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserRef>, ApiError> {
        JiraService::search_users(self, query).await
    }

    async fn assign(&self, issue_key: &str, user: Option<&UserRef>) -> Result<(), ApiError> {
        self.client.assign_issue(issue_key, user).await
    }
}
