//! Where budget snapshots come from.

use std::path::PathBuf;

use async_trait::async_trait;

use super::types::BudgetSnapshot;

/// Errors that can occur while loading a snapshot
#[derive(Debug, thiserror::Error)]
pub enum CostSourceError {
    #[error("Failed to read cost snapshot {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse cost snapshot {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Upstream storage reported a failure
    #[error("Cost source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies already-aggregated spend figures on demand.
#[async_trait]
pub trait CostSource: Send + Sync + 'static {
    async fn snapshot(&self) -> Result<BudgetSnapshot, CostSourceError>;
}

/// Reads a snapshot exported as JSON.
#[derive(Debug, Clone)]
pub struct JsonFileCostSource {
    path: PathBuf,
}

impl JsonFileCostSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CostSource for JsonFileCostSource {
    async fn snapshot(&self) -> Result<BudgetSnapshot, CostSourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CostSourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let snapshot: BudgetSnapshot =
            serde_json::from_str(&contents).map_err(|source| CostSourceError::Parse {
                path: self.path.clone(),
                source,
            })?;

        log::debug!(
            "JsonFileCostSource: loaded snapshot from {:?} (updated at {})",
            self.path,
            snapshot.last_updated_millis
        );
        Ok(snapshot)
    }
}
