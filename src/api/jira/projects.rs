//
//  jira-bridge
//  api/jira/projects.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Projects and priorities.

use serde::{Deserialize, Serialize};

use super::issues::{IssueType, Priority};
use super::users::UserRef;
use crate::api::client::JiraClient;
use crate::api::common::ApiError;
use crate::auth::ApiVersion;

/// A Jira project.
///
/// `lead` and `issue_types` are only returned by the single-project endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub key: String,
    pub name: String,

    /// `software`, `service_desk` or `business`.
    #[serde(default)]
    pub project_type_key: Option<String>,

    #[serde(default)]
    pub lead: Option<UserRef>,

    #[serde(default)]
    pub issue_types: Vec<IssueType>,
}

impl JiraClient {
    /// `GET /project`
    pub async fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get("/project", ApiVersion::V3).await
    }

    /// `GET /project/{keyOrId}`
    pub async fn get_project(&self, key: &str) -> Result<Project, ApiError> {
        self.get(&format!("/project/{}", key), ApiVersion::V3)
            .await
    }

    /// `GET /priority`
    pub async fn get_priorities(&self) -> Result<Vec<Priority>, ApiError> {
        self.get("/priority", ApiVersion::V3).await
    }
}
