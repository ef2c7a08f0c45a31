use thiserror::Error;

use crate::anaf::AnafError;
use crate::core::EfacturaError;

/// Failure of the persistence collaborator behind [`ReconciliationStore`](super::ReconciliationStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

/// Why a reconciliation run, or one tenant or record within it, failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// The previous run of this duty has not finished yet.
    #[error("{0} sync already running")]
    AlreadyRunning(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Anaf(#[from] AnafError),

    #[error(transparent)]
    Core(#[from] EfacturaError),
}
