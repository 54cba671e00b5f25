//
//  jira-bridge
//  api/jira/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Jira REST resources.
//!
//! Each submodule holds the serde types for one resource family together with
//! the [`JiraClient`](crate::api::JiraClient) methods that fetch them.
//!
//! - [`issues`] - issues, JQL search, transitions, comments
//! - [`projects`] - projects and priorities
//! - [`users`] - user references, the current user, user search, assignment
//! - [`agile`] - boards and sprints
//!
//! # Notes
//!
//! - Timestamps are kept as the ISO 8601 strings Jira returns
//! - Rich-text fields decode into [`Description`], which renders both the v2
//!   and the v3 shape to plain text

pub mod agile;
pub mod issues;
pub mod projects;
pub mod users;

pub use agile::*;
pub use issues::*;
pub use projects::*;
pub use users::*;
