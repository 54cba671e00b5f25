//
//  jira-bridge
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the request dispatcher for Jira's REST APIs and the
//! typed resources built on top of it.
//!
//! ## Supported Platforms
//!
//! - **Jira Cloud**: core API v3 (v2 as fallback) and agile API 1.0
//! - **Jira Server/Data Center**: core API v2 and agile API 1.0 (or `latest`)
//!
//! ## Architecture
//!
//! - [`client`]: the dispatcher with authentication and decoding
//! - [`fallback`]: the declarative alternate-endpoint table
//! - [`jira`]: issue, project, user and agile resources
//! - [`common`]: error type and pagination
//!
//! ## Error Handling
//!
//! Every call returns [`ApiError`]; see its table for the category and
//! retryability of each variant.

/// Request dispatcher.
///
/// Provides the [`JiraClient`] struct which handles:
/// - Endpoint resolution per API version
/// - Authentication header injection
/// - Response decoding and status mapping
/// - One fallback hop on 404
pub mod client;

/// Alternate-endpoint fallback rules.
pub mod fallback;

/// Jira resources (issues, projects, users, boards, sprints).
pub mod jira;

/// Common types shared by all resources.
pub mod common;

pub use client::{JiraClient, DEFAULT_TIMEOUT};
pub use common::ApiError;
