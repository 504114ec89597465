use chrono::{DateTime, Utc};

use super::domain::{ApplicationRecord, NewLoanRequest, RequestId};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Records are immutable once inserted; the only in-place change is
/// [`repair_missing_timestamps`](Self::repair_missing_timestamps), which moves a
/// null timestamp to a non-null one and is therefore safe to repeat.
pub trait LoanRequestRepository: Send + Sync {
    fn insert(&self, request: NewLoanRequest) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: RequestId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn delete(&self, id: RequestId) -> Result<(), RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
    /// Returns how many records were repaired.
    fn repair_missing_timestamps(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("loan request {0} not found")]
    NotFound(RequestId),
    #[error("stored loan request is corrupt: {0}")]
    Corrupt(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
