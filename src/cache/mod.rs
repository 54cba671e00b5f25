//
//  jira-bridge
//  cache/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Namespaced Cache
//!
//! In-memory, TTL- and size-bounded cache with one namespace per resource
//! kind, periodically snapshotted to disk.
//!
//! ## Module Structure
//!
//! - [`clock`]: injectable time source
//! - [`namespace`]: one key/value store with sliding expiry and pruning
//! - [`service`]: the shared [`CacheService`] over all namespaces
//! - [`snapshot`]: JSON snapshot files
//!
//! ## Eviction
//!
//! | Event | Effect |
//! |-------|--------|
//! | hit | `expires_at` slides to `now + ttl` |
//! | lookup of an expired entry | entry removed, counted as a miss |
//! | insert of a new key at capacity | expired entries dropped, then least recently accessed evicted down to 80% |

pub mod clock;
pub mod namespace;
pub mod service;
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use namespace::{CacheEntry, Namespace, NamespaceStats};
pub use service::{CacheService, CacheSettings, ResourceKind};
