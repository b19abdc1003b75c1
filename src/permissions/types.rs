//! Normalized permission rosters.

use std::collections::HashSet;

use serde::Serialize;

use crate::cache::ItemCount;

/// Which roster a lookup is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    ApprovedUser,
    Moderator,
}

impl PermissionKind {
    pub fn label(&self) -> &'static str {
        match self {
            PermissionKind::ApprovedUser => "approved users",
            PermissionKind::Moderator => "moderators",
        }
    }
}

/// Lowercased set of usernames holding one permission in one community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSet {
    users: HashSet<String>,
}

impl PermissionSet {
    /// Build a set from raw usernames, lowercasing and trimming each one.
    /// Blank names are dropped.
    pub fn from_usernames<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let users = usernames
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        Self { users }
    }

    /// Case-insensitive membership check.
    pub fn contains(&self, username: &str) -> bool {
        self.users.contains(&username.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl ItemCount for PermissionSet {
    fn item_count(&self) -> usize {
        self.len()
    }
}

/// Community names are matched case-insensitively.
pub fn normalize_community(community: &str) -> String {
    community.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usernames_are_lowercased_and_deduplicated() {
        let set = PermissionSet::from_usernames(["AutoModerator", "automoderator", " Alice "]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("automoderator"));
        assert!(set.contains("ALICE"));
    }

    #[test]
    fn test_blank_names_are_dropped() {
        let set = PermissionSet::from_usernames(["", "   ", "bob"]);
        assert_eq!(set.len(), 1);
        assert!(!set.contains(""));
    }

    #[test]
    fn test_empty_set_contains_nobody() {
        let set = PermissionSet::default();
        assert!(set.is_empty());
        assert!(!set.contains("anyone"));
    }

    #[test]
    fn test_normalize_community() {
        assert_eq!(normalize_community("  AskModerators "), "askmoderators");
    }
}
