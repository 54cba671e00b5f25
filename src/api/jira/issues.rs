//
//  jira-bridge
//  api/jira/issues.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Issue types, search, transitions and comments.
//!
//! Reads go to the v3 API (falling back to v2 on 404); writes go to v2 so that
//! rich-text fields can be sent as plain strings on both flavors.
//!
//! # Example
//!
//! ```rust
//! use jira_bridge::api::jira::Issue;
//!
//! let issue: Issue = serde_json::from_str(r#"{
//!     "id": "10001",
//!     "key": "ABC-1",
//!     "fields": {
//!         "summary": "Fix login",
//!         "description": "Steps to reproduce",
//!         "status": {"id": "1", "name": "To Do"},
//!         "assignee": null
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(issue.fields.status_name(), "To Do");
//! assert_eq!(issue.fields.assignee.display_name(), "Unassigned");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::users::{Assignee, UserRef};
use crate::api::client::JiraClient;
use crate::api::common::{ApiError, DEFAULT_PAGE_SIZE};
use crate::auth::ApiVersion;

/// A Jira issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    pub fields: IssueFields,
}

/// The standard fields of an issue. Unknown and custom fields land in
/// [`IssueFields::extra`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub description: Option<Description>,

    #[serde(default)]
    pub status: Option<Status>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(rename = "issuetype", default)]
    pub issue_type: Option<IssueType>,

    #[serde(default)]
    pub assignee: Assignee,

    #[serde(default)]
    pub reporter: Option<UserRef>,

    #[serde(default)]
    pub project: Option<ProjectRef>,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub resolution: Option<Resolution>,

    #[serde(default)]
    pub created: Option<String>,

    #[serde(default)]
    pub updated: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IssueFields {
    pub fn status_name(&self) -> &str {
        self.status.as_ref().map_or("", |s| s.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_category: Option<StatusCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCategory {
    pub key: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

/// Minimal project reference embedded in issue fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
}

/// A rich-text field.
///
/// The v2 API returns plain (wiki markup) strings; the v3 API returns an
/// Atlassian Document Format tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Plain(String),
    Document(Value),
}

impl Description {
    /// Flattens the field to plain text.
    ///
    /// Document trees render text nodes in order, one line per block node,
    /// with `- ` in front of list items.
    pub fn to_plain_text(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Document(doc) => {
                let mut out = String::new();
                render_adf(doc, &mut out);
                out.trim_end().to_string()
            }
        }
    }
}

fn render_adf(node: &Value, out: &mut String) {
    let kind = node.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "text" => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        "hardBreak" => out.push('\n'),
        "mention" | "emoji" => {
            if let Some(text) = node
                .get("attrs")
                .and_then(|a| a.get("text"))
                .and_then(Value::as_str)
            {
                out.push_str(text);
            }
        }
        _ => {
            if kind == "listItem" {
                out.push_str("- ");
            }
            if let Some(children) = node.get("content").and_then(Value::as_array) {
                for child in children {
                    render_adf(child, out);
                }
            }
            if matches!(kind, "paragraph" | "heading" | "codeBlock" | "rule")
                && !out.ends_with('\n')
            {
                out.push('\n');
            }
        }
    }
}

/// One page of a JQL search (also used by the board and sprint issue lists).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
}

/// A workflow transition available on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCandidate {
    pub id: String,
    pub name: String,
    #[serde(rename = "to")]
    pub to_status: Status,
}

#[derive(Debug, Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<TransitionCandidate>,
}

/// Options for executing a transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionOptions {
    pub comment: Option<String>,
    pub resolution: Option<String>,
}

/// Body for `POST /issue/{key}/transitions`.
pub fn transition_body(transition_id: &str, options: &TransitionOptions) -> Value {
    let mut body = json!({ "transition": { "id": transition_id } });
    if let Some(resolution) = &options.resolution {
        body["fields"] = json!({ "resolution": { "name": resolution } });
    }
    if let Some(comment) = &options.comment {
        body["update"] = json!({ "comment": [{ "add": { "body": comment } }] });
    }
    body
}

/// Fields for a new issue.
#[derive(Debug, Clone, Default)]
pub struct CreateIssueRequest {
    pub project_key: String,
    pub summary: String,
    pub issue_type: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub labels: Vec<String>,
}

impl CreateIssueRequest {
    /// Body for `POST /issue` on the v2 API.
    pub fn to_body(&self) -> Value {
        let mut fields = json!({
            "project": { "key": self.project_key },
            "summary": self.summary,
            "issuetype": { "name": self.issue_type },
        });
        if let Some(description) = &self.description {
            fields["description"] = json!(description);
        }
        if let Some(priority) = &self.priority {
            fields["priority"] = json!({ "name": priority });
        }
        if !self.labels.is_empty() {
            fields["labels"] = json!(self.labels);
        }
        json!({ "fields": fields })
    }
}

/// Reply of `POST /issue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
}

/// Partial update of an issue; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateIssueRequest {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub labels: Option<Vec<String>>,
}

impl UpdateIssueRequest {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.labels.is_none()
    }

    /// Body for `PUT /issue/{key}` on the v2 API.
    pub fn to_body(&self) -> Value {
        let mut fields = Map::new();
        if let Some(summary) = &self.summary {
            fields.insert("summary".into(), json!(summary));
        }
        if let Some(description) = &self.description {
            fields.insert("description".into(), json!(description));
        }
        if let Some(priority) = &self.priority {
            fields.insert("priority".into(), json!({ "name": priority }));
        }
        if let Some(labels) = &self.labels {
            fields.insert("labels".into(), json!(labels));
        }
        json!({ "fields": fields })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub body: Description,
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
}

/// Collapses whitespace and lowercases JQL so equivalent queries share a key.
pub fn normalize_jql(jql: &str) -> String {
    jql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Stable cache key for a search: a SHA-256 of the normalized JQL and paging.
pub fn search_cache_key(jql: &str, start_at: u32, max_results: u32) -> String {
    let input = format!("{}|{}|{}", normalize_jql(jql), start_at, max_results);
    let hash = Sha256::digest(input.as_bytes());
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

pub(crate) fn search_endpoint(path: &str, jql: Option<&str>, start_at: u32, max_results: u32) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(jql) = jql {
        query.append_pair("jql", jql);
    }
    query
        .append_pair("startAt", &start_at.to_string())
        .append_pair("maxResults", &max_results.to_string());
    format!("{}?{}", path, query.finish())
}

impl JiraClient {
    /// `GET /issue/{key}`
    pub async fn get_issue(&self, issue_key: &str) -> Result<Issue, ApiError> {
        self.get(&format!("/issue/{}", issue_key), ApiVersion::V3)
            .await
    }

    /// `GET /search?jql=...`
    pub async fn search_issues(
        &self,
        jql: &str,
        start_at: u32,
        max_results: Option<u32>,
    ) -> Result<SearchResults, ApiError> {
        let endpoint = search_endpoint(
            "/search",
            Some(jql),
            start_at,
            max_results.unwrap_or(DEFAULT_PAGE_SIZE),
        );
        self.get(&endpoint, ApiVersion::V3).await
    }

    /// `POST /issue`
    pub async fn create_issue(
        &self,
        request: &CreateIssueRequest,
    ) -> Result<CreatedIssue, ApiError> {
        self.post("/issue", ApiVersion::V2, &request.to_body()).await
    }

    /// `PUT /issue/{key}`
    pub async fn update_issue(
        &self,
        issue_key: &str,
        request: &UpdateIssueRequest,
    ) -> Result<(), ApiError> {
        let _: Option<Value> = self
            .put(
                &format!("/issue/{}", issue_key),
                ApiVersion::V2,
                &request.to_body(),
            )
            .await?;
        Ok(())
    }

    /// `GET /issue/{key}/transitions`
    pub async fn get_transitions(
        &self,
        issue_key: &str,
    ) -> Result<Vec<TransitionCandidate>, ApiError> {
        let response: TransitionsResponse = self
            .get(
                &format!("/issue/{}/transitions", issue_key),
                ApiVersion::V3,
            )
            .await?;
        Ok(response.transitions)
    }

    /// `POST /issue/{key}/transitions`
    pub async fn do_transition(
        &self,
        issue_key: &str,
        transition_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), ApiError> {
        let _: Option<Value> = self
            .post(
                &format!("/issue/{}/transitions", issue_key),
                ApiVersion::V2,
                &transition_body(transition_id, options),
            )
            .await?;
        Ok(())
    }

    /// `POST /issue/{key}/comment`
    pub async fn add_comment(&self, issue_key: &str, body: &str) -> Result<Comment, ApiError> {
        self.post(
            &format!("/issue/{}/comment", issue_key),
            ApiVersion::V2,
            &json!({ "body": body }),
        )
        .await
    }

    /// `GET /issue/{key}/comment`
    pub async fn get_comments(&self, issue_key: &str) -> Result<CommentPage, ApiError> {
        self.get(&format!("/issue/{}/comment", issue_key), ApiVersion::V3)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v3_description_renders_document() {
        let fields: IssueFields = serde_json::from_value(json!({
            "summary": "s",
            "description": {
                "type": "doc",
                "version": 1,
                "content": [
                    {"type": "paragraph", "content": [
                        {"type": "text", "text": "Hello "},
                        {"type": "text", "text": "world"}
                    ]},
                    {"type": "bulletList", "content": [
                        {"type": "listItem", "content": [
                            {"type": "paragraph", "content": [{"type": "text", "text": "one"}]}
                        ]}
                    ]}
                ]
            }
        }))
        .unwrap();

        let description = fields.description.unwrap();
        assert!(matches!(description, Description::Document(_)));
        assert_eq!(description.to_plain_text(), "Hello world\n- one");
    }

    #[test]
    fn test_custom_fields_are_kept() {
        let fields: IssueFields = serde_json::from_value(json!({
            "summary": "s",
            "customfield_10010": 5
        }))
        .unwrap();
        assert_eq!(fields.extra.get("customfield_10010"), Some(&json!(5)));
        assert_eq!(fields.status_name(), "");
    }

    #[test]
    fn test_transition_body_with_comment_and_resolution() {
        let body = transition_body(
            "31",
            &TransitionOptions {
                comment: Some("done".to_string()),
                resolution: Some("Fixed".to_string()),
            },
        );
        assert_eq!(
            body,
            json!({
                "transition": {"id": "31"},
                "fields": {"resolution": {"name": "Fixed"}},
                "update": {"comment": [{"add": {"body": "done"}}]}
            })
        );

        assert_eq!(
            transition_body("5", &TransitionOptions::default()),
            json!({"transition": {"id": "5"}})
        );
    }

    #[test]
    fn test_create_and_update_bodies() {
        let create = CreateIssueRequest {
            project_key: "ABC".to_string(),
            summary: "New".to_string(),
            issue_type: "Bug".to_string(),
            priority: Some("High".to_string()),
            ..Default::default()
        };
        let body = create.to_body();
        assert_eq!(body["fields"]["project"]["key"], "ABC");
        assert_eq!(body["fields"]["issuetype"]["name"], "Bug");
        assert_eq!(body["fields"]["priority"]["name"], "High");
        assert!(body["fields"].get("labels").is_none());

        let update = UpdateIssueRequest {
            summary: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(update.to_body(), json!({"fields": {"summary": "Renamed"}}));
    }

    #[test]
    fn test_search_cache_key_ignores_case_and_spacing() {
        let a = search_cache_key("project = ABC  ORDER BY created", 0, 50);
        let b = search_cache_key("PROJECT = abc order by CREATED", 0, 50);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, search_cache_key("project = ABC ORDER BY created", 50, 50));
    }

    #[test]
    fn test_search_endpoint_encodes_jql() {
        assert_eq!(
            search_endpoint("/search", Some("project = ABC"), 0, 50),
            "/search?jql=project+%3D+ABC&startAt=0&maxResults=50"
        );
    }

    #[test]
    fn test_transition_candidate_decodes_destination() {
        let response: TransitionsResponse = serde_json::from_value(json!({
            "transitions": [{"id": "21", "name": "Start Progress", "to": {"id": "3", "name": "In Progress"}}]
        }))
        .unwrap();
        assert_eq!(response.transitions[0].to_status.name, "In Progress");
    }
}
