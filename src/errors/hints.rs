//
//  jira-bridge
//  errors/hints.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Remediation hint pools.

use super::ErrorCategory;

const AUTH_HINTS: &[&str] = &[
    "Check that your API token has not expired or been revoked",
    "Verify the identity matches the account that owns the token",
    "Cloud sites need an email plus API token; Server sites usually need a PAT with bearer mode",
    "Re-run setup to rebuild the connection with fresh credentials",
];

const PERMISSION_HINTS: &[&str] = &[
    "Ask a project administrator for the required project permission",
    "Confirm the issue's security level allows you to see it",
    "Some workflow transitions are restricted to specific roles",
    "Check whether the project has been archived or its scheme changed",
];

const NOT_FOUND_HINTS: &[&str] = &[
    "Double-check the issue key or project key for typos",
    "The issue may have been moved to another project or deleted",
    "You may lack browse permission, which hides the resource entirely",
    "Older Jira Server versions may not expose this endpoint",
];

const VALIDATION_HINTS: &[&str] = &[
    "Check that all required fields for this issue type are provided",
    "Verify field values match the allowed options (priority, issue type, resolution)",
    "JQL must be valid: quote values containing spaces",
    "Custom fields may be missing from the create or edit screen",
];

const SERVER_HINTS: &[&str] = &[
    "Jira may be temporarily overloaded; try again in a moment",
    "Check the Atlassian status page or your administrator for outages",
    "If the error persists, narrow the request (fewer results or fields)",
];

const NETWORK_HINTS: &[&str] = &[
    "Check your internet or VPN connection",
    "Verify the base URL is correct and reachable",
    "A proxy or firewall may be blocking the request",
    "The request timeout may be too short for this server",
];

const UNKNOWN_HINTS: &[&str] = &[
    "Retry the operation",
    "Enable debug logging with JIRA_BRIDGE_DEBUG=debug for details",
    "Check the configuration file for typos",
];

/// Fixed, ordered hint pool for a category (always at least three entries).
pub fn hints_for(category: ErrorCategory) -> &'static [&'static str] {
    match category {
        ErrorCategory::Auth => AUTH_HINTS,
        ErrorCategory::Permission => PERMISSION_HINTS,
        ErrorCategory::NotFound => NOT_FOUND_HINTS,
        ErrorCategory::Validation => VALIDATION_HINTS,
        ErrorCategory::Server => SERVER_HINTS,
        ErrorCategory::Network => NETWORK_HINTS,
        ErrorCategory::Unknown => UNKNOWN_HINTS,
    }
}
