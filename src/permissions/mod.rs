//! Approved-contributor and moderator lookups for a community.
//!
//! This module provides:
//! - The provider trait the hosting platform implements
//! - Case-normalized permission sets
//! - A resolver caching one roster per community and kind
//!
//! Lookups never error. A failed fetch yields an empty set.

mod provider;
mod resolver;
mod types;

pub use provider::{PermissionError, PermissionProvider};
pub use resolver::{PermissionResolver, ResolverConfig, ResolverStats};
pub use types::{normalize_community, PermissionKind, PermissionSet};
