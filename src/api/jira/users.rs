//
//  jira-bridge
//  api/jira/users.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! User references, the current user and user search.
//!
//! Jira Cloud identifies users by `accountId`; Jira Server and Data Center by
//! `name` (the username). [`UserRef`] carries both and
//! [`UserRef::identifier`] picks whichever the server populated.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::client::JiraClient;
use crate::api::common::ApiError;
use crate::auth::ApiVersion;

/// Reference to a Jira user as embedded in issues, comments and projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    /// Cloud account id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Server/Data Center username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub display_name: String,

    /// Hidden by privacy settings on most cloud sites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl UserRef {
    /// The identifier the server expects when referring to this user.
    pub fn identifier(&self) -> Option<&str> {
        self.account_id.as_deref().or(self.name.as_deref())
    }
}

/// Assignment state of an issue.
///
/// Decoded once from the optional `assignee` user record so callers never
/// deal with `null` versus a missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<UserRef>", into = "Option<UserRef>")]
pub enum Assignee {
    #[default]
    Unassigned,
    Person(UserRef),
}

impl Assignee {
    pub fn user(&self) -> Option<&UserRef> {
        match self {
            Self::Unassigned => None,
            Self::Person(user) => Some(user),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Unassigned => "Unassigned",
            Self::Person(user) => &user.display_name,
        }
    }
}

impl From<Option<UserRef>> for Assignee {
    fn from(user: Option<UserRef>) -> Self {
        user.map_or(Self::Unassigned, Self::Person)
    }
}

impl From<Assignee> for Option<UserRef> {
    fn from(assignee: Assignee) -> Self {
        match assignee {
            Assignee::Unassigned => None,
            Assignee::Person(user) => Some(user),
        }
    }
}

/// Body for `PUT /issue/{key}/assignee`.
///
/// Cloud expects `{"accountId": ...}`, Server expects `{"name": ...}`; `None`
/// unassigns.
pub fn assignee_body(is_cloud: bool, identifier: Option<&str>) -> serde_json::Value {
    if is_cloud {
        json!({ "accountId": identifier })
    } else {
        json!({ "name": identifier })
    }
}

fn user_search_endpoint(is_cloud: bool, query: &str) -> String {
    let param = if is_cloud { "query" } else { "username" };
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(param, query)
        .append_pair("maxResults", "20")
        .finish();
    format!("/user/search?{}", query)
}

impl JiraClient {
    /// `GET /myself`
    pub async fn get_myself(&self) -> Result<UserRef, ApiError> {
        self.get("/myself", ApiVersion::V3).await
    }

    /// `GET /user/search`
    pub async fn search_users(&self, query: &str) -> Result<Vec<UserRef>, ApiError> {
        self.get(&user_search_endpoint(self.is_cloud(), query), ApiVersion::V3)
            .await
    }

    /// `PUT /issue/{key}/assignee`; `None` unassigns.
    pub async fn assign_issue(
        &self,
        issue_key: &str,
        user: Option<&UserRef>,
    ) -> Result<(), ApiError> {
        let body = assignee_body(self.is_cloud(), user.and_then(UserRef::identifier));
        let _: Option<serde_json::Value> = self
            .put(
                &format!("/issue/{}/assignee", issue_key),
                ApiVersion::V2,
                &body,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignee_decodes_from_null_missing_and_object() {
        #[derive(Deserialize)]
        struct Fields {
            #[serde(default)]
            assignee: Assignee,
        }

        let null: Fields = serde_json::from_str(r#"{"assignee":null}"#).unwrap();
        assert_eq!(null.assignee, Assignee::Unassigned);

        let missing: Fields = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.assignee, Assignee::Unassigned);

        let person: Fields = serde_json::from_str(
            r#"{"assignee":{"accountId":"abc","displayName":"Ada"}}"#,
        )
        .unwrap();
        assert_eq!(person.assignee.display_name(), "Ada");
        assert_eq!(
            person.assignee.user().and_then(UserRef::identifier),
            Some("abc")
        );
    }

    #[test]
    fn test_identifier_prefers_account_id() {
        let user: UserRef =
            serde_json::from_str(r#"{"name":"ada","displayName":"Ada"}"#).unwrap();
        assert_eq!(user.identifier(), Some("ada"));
        assert!(user.active);
    }

    #[test]
    fn test_assignee_body_per_flavor() {
        assert_eq!(
            assignee_body(true, Some("abc")),
            json!({"accountId": "abc"})
        );
        assert_eq!(assignee_body(false, Some("ada")), json!({"name": "ada"}));
        assert_eq!(assignee_body(true, None), json!({"accountId": null}));
    }

    #[test]
    fn test_user_search_param_per_flavor() {
        assert_eq!(
            user_search_endpoint(true, "ada lovelace"),
            "/user/search?query=ada+lovelace&maxResults=20"
        );
        assert!(user_search_endpoint(false, "ada").starts_with("/user/search?username=ada"));
    }
}
