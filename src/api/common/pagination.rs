//
//  jira-bridge
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pagination wrappers for Jira list endpoints.
//!
//! The agile API pages with `startAt`/`maxResults`/`isLast`; the core search
//! API pages with `startAt`/`maxResults`/`total`. Both are modeled here.

use serde::{Deserialize, Serialize};

/// Page size requested from list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Upper bound on pages fetched by the collecting helpers.
pub const MAX_PAGES: u32 = 20;

/// A page of an agile list endpoint (`/board`, `/board/{id}/sprint`, ...).
///
/// # Example
///
/// ```rust
/// use jira_bridge::api::common::PagedResponse;
///
/// let page: PagedResponse<u32> = serde_json::from_str(
///     r#"{"values":[1,2],"startAt":0,"maxResults":2,"isLast":false}"#,
/// ).unwrap();
///
/// assert!(page.has_next());
/// assert_eq!(page.next_start(), Some(2));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,

    #[serde(default)]
    pub start_at: u32,

    #[serde(default)]
    pub max_results: u32,

    #[serde(default)]
    pub total: Option<u32>,

    #[serde(default)]
    pub is_last: Option<bool>,
}

impl<T> PagedResponse<T> {
    /// Whether another page exists.
    ///
    /// Uses `isLast` when present, otherwise compares against `total`.
    pub fn has_next(&self) -> bool {
        if self.values.is_empty() {
            return false;
        }
        match (self.is_last, self.total) {
            (Some(is_last), _) => !is_last,
            (None, Some(total)) => self.start_at + (self.values.len() as u32) < total,
            (None, None) => false,
        }
    }

    /// Offset of the next page, if any.
    pub fn next_start(&self) -> Option<u32> {
        self.has_next()
            .then(|| self.start_at + self.values.len() as u32)
    }
}
