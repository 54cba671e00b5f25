//
//  jira-bridge
//  tests/service.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use jira_bridge::api::jira::{Assignee, CreateIssueRequest, UpdateIssueRequest};
use jira_bridge::api::{JiraClient, DEFAULT_TIMEOUT};
use jira_bridge::auth::{AuthMode, ConnectionSettings, ServerFlavor};
use jira_bridge::cache::{CacheService, CacheSettings, ResourceKind};
use jira_bridge::errors::{ErrorCategory, ErrorClassifier};
use jira_bridge::workflow::{TransitionRequest, TransitionState, WorkflowError};
use jira_bridge::JiraService;
use mockito::{Matcher, Server};
use serde_json::json;
use tempfile::TempDir;

fn connection(server: &Server) -> ConnectionSettings {
    ConnectionSettings {
        base_url: server.url(),
        identity: Some("me@example.com".to_string()),
        secret: Some("api-token".to_string()),
        auth_mode: AuthMode::Basic,
        server_flavor: Some(ServerFlavor::Cloud),
    }
}

fn service_with(server: &Server, settings: CacheSettings) -> JiraService {
    let client = JiraClient::from_settings(&connection(server), DEFAULT_TIMEOUT).unwrap();
    JiraService::new(
        client,
        CacheService::new(settings),
        ErrorClassifier::seeded(7).shared(),
    )
}

fn service(server: &Server) -> JiraService {
    service_with(server, CacheSettings::default())
}

fn issue_body(key: &str, summary: &str) -> String {
    json!({
        "id": "10001",
        "key": key,
        "fields": {
            "summary": summary,
            "status": {"id": "1", "name": "To Do"},
            "assignee": null,
            "customfield_10020": 5
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_get_issue_is_cached() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/api/3/issue/ABC-1")
        .with_status(200)
        .with_body(issue_body("ABC-1", "Fix login"))
        .expect(1)
        .create_async()
        .await;

    let service = service(&server);
    let first = service.get_issue("ABC-1").await.unwrap();
    let second = service.get_issue("ABC-1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(first.fields.summary, "Fix login");
    assert_eq!(second.fields.summary, "Fix login");
    assert_eq!(second.fields.assignee, Assignee::Unassigned);
    assert_eq!(second.fields.extra.get("customfield_10020"), Some(&json!(5)));
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/api/3/issue/ABC-1")
        .with_status(200)
        .with_body(issue_body("ABC-1", "Fix login"))
        .expect(2)
        .create_async()
        .await;

    let service = service_with(
        &server,
        CacheSettings {
            enabled: false,
            ..Default::default()
        },
    );
    service.get_issue("ABC-1").await.unwrap();
    service.get_issue("ABC-1").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_invalidates_issue() {
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", "/rest/api/3/issue/ABC-1")
        .with_status(200)
        .with_body(issue_body("ABC-1", "Fix login"))
        .expect(2)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/rest/api/2/issue/ABC-1")
        .match_body(Matcher::PartialJson(json!({"fields": {"summary": "Fix login on Safari"}})))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let service = service(&server);
    service.get_issue("ABC-1").await.unwrap();
    service
        .update_issue(
            "ABC-1",
            &UpdateIssueRequest {
                summary: Some("Fix login on Safari".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    service.get_issue("ABC-1").await.unwrap();

    get.assert_async().await;
    put.assert_async().await;
}

#[tokio::test]
async fn test_search_is_cached_by_normalized_jql() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("GET", "/rest/api/3/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "startAt": 0,
                "maxResults": 50,
                "total": 1,
                "issues": [serde_json::from_str::<serde_json::Value>(&issue_body("ABC-1", "Fix login")).unwrap()]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let service = service(&server);
    let first = service
        .search_issues("project = ABC", 0, None)
        .await
        .unwrap();
    let second = service
        .search_issues("  project   =  ABC ", 0, None)
        .await
        .unwrap();

    search.assert_async().await;
    assert_eq!(first.total, 1);
    assert_eq!(second.issues[0].key, "ABC-1");
}

#[tokio::test]
async fn test_create_issue_clears_search_results() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("GET", "/rest/api/3/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"startAt":0,"maxResults":50,"total":0,"issues":[]}"#)
        .expect(2)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/rest/api/2/issue")
        .match_body(Matcher::PartialJson(json!({
            "fields": {"project": {"key": "ABC"}, "summary": "New bug"}
        })))
        .with_status(201)
        .with_body(r#"{"id":"10002","key":"ABC-2","self":"https://example.atlassian.net/rest/api/2/issue/10002"}"#)
        .expect(1)
        .create_async()
        .await;

    let service = service(&server);
    service.search_issues("project = ABC", 0, None).await.unwrap();
    let created = service
        .create_issue(&CreateIssueRequest {
            project_key: "ABC".to_string(),
            summary: "New bug".to_string(),
            issue_type: "Bug".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    service.search_issues("project = ABC", 0, None).await.unwrap();

    search.assert_async().await;
    create.assert_async().await;
    assert_eq!(created.key, "ABC-2");
}

#[tokio::test]
async fn test_transition_with_assignee_cascade() {
    let mut server = Server::new_async().await;
    let transitions = server
        .mock("GET", "/rest/api/3/issue/ABC-1/transitions")
        .with_status(200)
        .with_body(
            json!({
                "transitions": [
                    {"id": "11", "name": "Start Progress", "to": {"id": "3", "name": "In Progress"}},
                    {"id": "31", "name": "Done", "to": {"id": "4", "name": "Done"}}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let execute = server
        .mock("POST", "/rest/api/2/issue/ABC-1/transitions")
        .match_body(Matcher::PartialJson(json!({"transition": {"id": "11"}})))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let myself = server
        .mock("GET", "/rest/api/3/myself")
        .with_status(200)
        .with_body(r#"{"accountId":"u-1","displayName":"Me"}"#)
        .expect(1)
        .create_async()
        .await;
    let assign = server
        .mock("PUT", "/rest/api/2/issue/ABC-1/assignee")
        .match_body(Matcher::Json(json!({"accountId": "u-1"})))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let service = service(&server);
    let report = service
        .transition_issue(&TransitionRequest::new("ABC-1", "in progress").with_assignee("me"))
        .await
        .unwrap();

    transitions.assert_async().await;
    execute.assert_async().await;
    myself.assert_async().await;
    assign.assert_async().await;
    assert_eq!(report.transition.id, "11");
    assert_eq!(report.history.last(), Some(&TransitionState::Done));
    assert_eq!(report.cascade.unwrap().unwrap().display_name(), "Me");
}

#[tokio::test]
async fn test_transition_no_match_lists_names() {
    let mut server = Server::new_async().await;
    let _transitions = server
        .mock("GET", "/rest/api/3/issue/ABC-1/transitions")
        .with_status(200)
        .with_body(r#"{"transitions":[{"id":"31","name":"Done","to":{"name":"Done"}}]}"#)
        .create_async()
        .await;
    let execute = server
        .mock("POST", "/rest/api/2/issue/ABC-1/transitions")
        .expect(0)
        .create_async()
        .await;

    let err = service(&server)
        .transition_issue(&TransitionRequest::new("ABC-1", "Deploy"))
        .await
        .unwrap_err();

    execute.assert_async().await;
    assert!(matches!(err, WorkflowError::NoMatch { .. }));
    assert!(err.to_string().ends_with("Valid transitions: Done"));
}

#[tokio::test]
async fn test_friendly_error_for_missing_issue() {
    let mut server = Server::new_async().await;
    let _v3 = server
        .mock("GET", "/rest/api/3/issue/NOPE-1")
        .with_status(404)
        .create_async()
        .await;
    let _v2 = server
        .mock("GET", "/rest/api/2/issue/NOPE-1")
        .with_status(404)
        .with_body(r#"{"errorMessages":["Issue does not exist"]}"#)
        .create_async()
        .await;

    let service = service(&server);
    let err = service.get_issue("NOPE-1").await.unwrap_err();
    let message = service.friendly_error(&err);

    assert!(message.starts_with("Resource not found\n  API Error: 404 - Issue does not exist"));
    assert!(message.contains("\n\nTry:\n  • "));
    assert_eq!(message.matches("\n  • ").count(), 2);
    assert!(service.cache().get(ResourceKind::Issues, "NOPE-1").is_none());
}

#[tokio::test]
async fn test_reconfigure_drops_cached_data() {
    let mut first = Server::new_async().await;
    let mut second = Server::new_async().await;
    let old = first
        .mock("GET", "/rest/api/3/project/ABC")
        .with_status(200)
        .with_body(r#"{"id":"1","key":"ABC","name":"Old site"}"#)
        .expect(1)
        .create_async()
        .await;
    let new = second
        .mock("GET", "/rest/api/3/project/ABC")
        .with_status(200)
        .with_body(r#"{"id":"9","key":"ABC","name":"New site"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut service = service(&first);
    assert_eq!(service.get_project("ABC").await.unwrap().name, "Old site");

    service.reconfigure(&connection(&second)).await.unwrap();
    assert_eq!(service.get_project("ABC").await.unwrap().name, "New site");

    old.assert_async().await;
    new.assert_async().await;
}

#[tokio::test]
async fn test_reconfigure_rejects_incomplete_settings() {
    let server = Server::new_async().await;
    let mut service = service(&server);

    let err = service
        .reconfigure(&ConnectionSettings {
            base_url: server.url(),
            auth_mode: AuthMode::Basic,
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("identity"));
    assert_eq!(service.client().context().base_url(), server.url());
}

#[tokio::test]
async fn test_reconfigure_clears_persisted_snapshot() {
    let dir = TempDir::new().unwrap();
    let persisted = CacheSettings {
        directory: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let mut server = Server::new_async().await;
    let project = server
        .mock("GET", "/rest/api/3/project/ABC")
        .with_status(200)
        .with_body(r#"{"id":"1","key":"ABC","name":"Alpha"}"#)
        .expect(2)
        .create_async()
        .await;

    let client = JiraClient::from_settings(&connection(&server), DEFAULT_TIMEOUT).unwrap();
    let cache = CacheService::load_for(persisted.clone(), &server.url()).await;
    let mut service = JiraService::new(client, cache, ErrorClassifier::seeded(7).shared());

    service.get_project("ABC").await.unwrap();
    service.cache().save_snapshot().await.unwrap();

    // Same site, rotated credentials.
    service.reconfigure(&connection(&server)).await.unwrap();

    let reloaded = CacheService::load_for(persisted, &server.url()).await;
    assert!(reloaded.get(ResourceKind::Projects, "ABC").is_none());
    assert!(service.cache().get(ResourceKind::Projects, "ABC").is_none());

    service.get_project("ABC").await.unwrap();
    project.assert_async().await;
}

#[tokio::test]
async fn test_snapshots_are_not_shared_between_hosts() {
    let dir = TempDir::new().unwrap();
    let persisted = CacheSettings {
        directory: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let first = Server::new_async().await;
    let second = Server::new_async().await;

    let cache = CacheService::load_for(persisted.clone(), &first.url()).await;
    cache.set(ResourceKind::Users, "myself", json!({"displayName": "First"}));
    cache.save_snapshot().await.unwrap();

    let other = CacheService::load_for(persisted, &second.url()).await;
    assert!(other.get(ResourceKind::Users, "myself").is_none());
    assert_ne!(cache.persistence_dir(), other.persistence_dir());
}

#[tokio::test]
async fn test_resilient_read_retries_after_server_error() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/rest/api/3/issue/ABC-1")
        .with_status(500)
        .with_body(r#"{"errorMessages":["Internal server error"]}"#)
        .expect(1)
        .create_async()
        .await;

    let service = service(&server);
    let err = service.get_issue_resilient("ABC-1").await.unwrap_err();

    failing.assert_async().await;
    assert_eq!(err.category, ErrorCategory::Server);
    assert!(err.is_retryable());
    assert!(err.message.starts_with("Jira server error"));
    assert!(service.cache().get(ResourceKind::Issues, "ABC-1").is_none());

    failing.remove_async().await;
    let recovered = server
        .mock("GET", "/rest/api/3/issue/ABC-1")
        .with_status(200)
        .with_body(issue_body("ABC-1", "Fix login"))
        .expect(1)
        .create_async()
        .await;

    let issue = err.retry().await.unwrap();

    recovered.assert_async().await;
    assert_eq!(issue.fields.summary, "Fix login");
    assert!(service.cache().get(ResourceKind::Issues, "ABC-1").is_some());
}
