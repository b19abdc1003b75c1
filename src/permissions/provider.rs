//! Seam to the hosting platform's permission API.

use async_trait::async_trait;

/// Errors a permission provider can report.
///
/// None of these reach resolver callers; the resolver logs them and answers
/// with an empty set.
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    /// Network or transport failure
    #[error("Permission provider unreachable: {0}")]
    Unavailable(String),
    /// The platform answered with an error status
    #[error("Permission provider error ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The community does not exist or is not visible to us
    #[error("Community not found: {0}")]
    CommunityNotFound(String),
}

/// Returns raw membership rosters for a community.
///
/// Implementations return usernames as the platform spells them; the
/// resolver takes care of case normalization. Calls must be free of side
/// effects, since the cache may repeat them under concurrent refreshes.
#[async_trait]
pub trait PermissionProvider: Send + Sync + 'static {
    /// Every approved contributor of `community`
    async fn approved_users(&self, community: &str) -> Result<Vec<String>, PermissionError>;

    /// Every moderator of `community`
    async fn moderators(&self, community: &str) -> Result<Vec<String>, PermissionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_error_display() {
        let err = PermissionError::Rejected {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("Forbidden"));
    }

    #[test]
    fn test_unavailable_error_display() {
        let err = PermissionError::Unavailable("connection reset".to_string());
        assert_eq!(
            err.to_string(),
            "Permission provider unreachable: connection reset"
        );
    }
}
