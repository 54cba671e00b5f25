//
//  jira-bridge
//  api/jira/agile.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Boards and sprints from the agile API.
//!
//! List endpoints are paged; [`JiraClient::get_boards`] and
//! [`JiraClient::get_sprints`] collect up to [`MAX_PAGES`] pages.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::issues::{search_endpoint, SearchResults};
use crate::api::client::JiraClient;
use crate::api::common::{ApiError, PagedResponse, DEFAULT_PAGE_SIZE, MAX_PAGES};
use crate::auth::ApiVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: u64,
    pub name: String,
    /// `scrum`, `kanban` or `simple`.
    #[serde(rename = "type", default)]
    pub board_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: u64,
    pub name: String,
    /// `future`, `active` or `closed`.
    pub state: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub origin_board_id: Option<u64>,
}

fn with_page(endpoint: &str, start_at: u32) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!(
        "{}{}startAt={}&maxResults={}",
        endpoint, separator, start_at, DEFAULT_PAGE_SIZE
    )
}

impl JiraClient {
    async fn collect_pages<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut start_at = 0;

        for _ in 0..MAX_PAGES {
            let page: PagedResponse<T> = self
                .get(&with_page(endpoint, start_at), ApiVersion::Agile)
                .await?;
            let next = page.next_start();
            items.extend(page.values);
            match next {
                Some(next) => start_at = next,
                None => break,
            }
        }

        Ok(items)
    }

    /// `GET /board`, optionally filtered by project key.
    pub async fn get_boards(&self, project_key: Option<&str>) -> Result<Vec<Board>, ApiError> {
        let endpoint = match project_key {
            Some(key) => format!(
                "/board?{}",
                url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("projectKeyOrId", key)
                    .finish()
            ),
            None => "/board".to_string(),
        };
        self.collect_pages(&endpoint).await
    }

    /// `GET /board/{id}/sprint`, optionally filtered by state.
    pub async fn get_sprints(
        &self,
        board_id: u64,
        state: Option<&str>,
    ) -> Result<Vec<Sprint>, ApiError> {
        self.collect_pages(&sprints_endpoint(board_id, state)).await
    }

    /// `GET /board/{id}/issue`, one page.
    pub async fn get_board_issues(
        &self,
        board_id: u64,
        jql: Option<&str>,
        start_at: u32,
    ) -> Result<SearchResults, ApiError> {
        let endpoint = search_endpoint(
            &format!("/board/{}/issue", board_id),
            jql,
            start_at,
            DEFAULT_PAGE_SIZE,
        );
        self.get(&endpoint, ApiVersion::Agile).await
    }

    /// `GET /sprint/{id}/issue`, one page.
    pub async fn get_sprint_issues(
        &self,
        sprint_id: u64,
        start_at: u32,
    ) -> Result<SearchResults, ApiError> {
        let endpoint = search_endpoint(
            &format!("/sprint/{}/issue", sprint_id),
            None,
            start_at,
            DEFAULT_PAGE_SIZE,
        );
        self.get(&endpoint, ApiVersion::Agile).await
    }
}

/// Sprint listing path with the state filter form-encoded.
fn sprints_endpoint(board_id: u64, state: Option<&str>) -> String {
    match state {
        Some(state) => format!(
            "/board/{}/sprint?{}",
            board_id,
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("state", state)
                .finish()
        ),
        None => format!("/board/{}/sprint", board_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprint_state_is_encoded() {
        assert_eq!(sprints_endpoint(3, None), "/board/3/sprint");
        assert_eq!(
            sprints_endpoint(3, Some("active,future")),
            "/board/3/sprint?state=active%2Cfuture"
        );
        assert_eq!(
            sprints_endpoint(3, Some("closed&maxResults=1")),
            "/board/3/sprint?state=closed%26maxResults%3D1"
        );
    }

    #[test]
    fn test_with_page_appends_to_existing_query() {
        assert_eq!(with_page("/board", 0), "/board?startAt=0&maxResults=50");
        assert_eq!(
            with_page("/board/1/sprint?state=active", 50),
            "/board/1/sprint?state=active&startAt=50&maxResults=50"
        );
    }

    #[test]
    fn test_sprint_decodes_optional_dates() {
        let sprint: Sprint =
            serde_json::from_str(r#"{"id":7,"name":"Sprint 7","state":"active"}"#).unwrap();
        assert_eq!(sprint.state, "active");
        assert!(sprint.start_date.is_none());

        let board: Board =
            serde_json::from_str(r#"{"id":1,"name":"ABC board","type":"scrum"}"#).unwrap();
        assert_eq!(board.board_type, "scrum");
    }
}
