//
//  jira-bridge
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Jira Bridge
//!
//! Client core for talking to Jira Cloud and Jira Server/Data Center from a
//! host application (a terminal UI, an editor plugin, a bot).
//!
//! ## Overview
//!
//! The host builds a [`JiraService`] from its [`Config`] and calls one async
//! method per remote resource. Underneath:
//!
//! - every request goes through one dispatcher that resolves versioned
//!   endpoints and retries once against an alternate endpoint on 404
//! - reads are cached per resource kind with sliding TTL and size bounds,
//!   snapshotted to disk periodically
//! - failures are classified into categories and rendered with remediation
//!   hints at the human-facing boundary
//! - status changes run through a small transition state machine with an
//!   optional assignee cascade
//!
//! ## Module Structure
//!
//! - [`api`]: dispatcher, fallback table, typed Jira resources
//! - [`auth`]: credential context and the secrets file
//! - [`cache`]: namespaced TTL cache with snapshots
//! - [`config`]: configuration file and environment overrides
//! - [`errors`]: error classification and friendly rendering
//! - [`resilience`]: cache and retry wrappers for arbitrary fetches
//! - [`service`]: the [`JiraService`] facade
//! - [`workflow`]: the transition state machine
//! - [`util`]: logging setup
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use jira_bridge::{Config, JiraService};
//!
//! # async fn example() -> anyhow::Result<()> {
//! jira_bridge::util::init_logging();
//!
//! let config = Config::load()?;
//! let service = JiraService::from_config(&config).await?;
//!
//! let results = service.search_issues("assignee = currentUser()", 0, None).await?;
//! for issue in results.issues {
//!     println!("{} [{}] {}", issue.key, issue.fields.status_name(), issue.fields.summary);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Differences
//!
//! | Feature | Cloud | Server/DC |
//! |---------|-------|-----------|
//! | REST API v3 | Yes | Aliased to v2 |
//! | Rich text | Atlassian Document Format | Plain text |
//! | User identifier | `accountId` | `name` |
//! | Bearer tokens | OAuth | Personal Access Token |

/// Request dispatcher and typed Jira resources.
pub mod api;

/// Credential context and secrets storage.
pub mod auth;

/// Namespaced TTL cache.
pub mod cache;

/// Configuration file management.
///
/// Stored in platform-specific locations:
/// - Linux: `~/.config/jira-bridge/config.toml`
/// - macOS: `~/Library/Application Support/jira-bridge/config.toml`
/// - Windows: `%APPDATA%\jira-bridge\config.toml`
pub mod config;

/// Error classification and friendly messages.
pub mod errors;

pub mod resilience;

/// The host-facing service facade.
pub mod service;

pub mod util;

/// Issue workflow transitions.
pub mod workflow;

pub use api::{ApiError, JiraClient};
pub use config::Config;
pub use errors::{ErrorCategory, ErrorClassifier};
pub use service::JiraService;

/// Application name, used for configuration paths and the user agent.
pub const APP_NAME: &str = "jira-bridge";

/// Library version, from Cargo.toml.
///
/// ```rust
/// println!("jira-bridge {}", jira_bridge::VERSION);
/// ```
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
