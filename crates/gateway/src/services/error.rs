//! Errors returned by the sync services.

use thiserror::Error;

use ocsync_core::{CurrencyError, PayloadError};

use crate::db::{RepositoryError, TableError};

/// Broad failure class, used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Precondition,
    Io,
    Infrastructure,
}

/// Errors from catalog, image, batch, order and table operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A referenced UID or id does not resolve to any row.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request is structurally invalid or not allowed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Finalize was called for a batch with no tagged products.
    #[error("empty batch: {0}")]
    EmptyBatch(String),

    /// No image file on disk matches a file UID.
    #[error("image file not found: {0}")]
    FileNotFound(String),

    /// Image payload is not valid base64.
    #[error("invalid image data: {0}")]
    Decode(String),

    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed.
    #[error("{0}")]
    Database(#[from] RepositoryError),

    /// A batch item failed; the remaining items were not processed.
    #[error("item {uid}: {source}")]
    Item {
        uid: String,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Wrap this error with the UID of the batch item that produced it.
    #[must_use]
    pub fn for_item(self, uid: impl Into<String>) -> Self {
        Self::Item {
            uid: uid.into(),
            source: Box::new(self),
        }
    }

    /// Failure class, looking through item wrappers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_)
            | Self::FileNotFound(_)
            | Self::Database(RepositoryError::NotFound) => ErrorKind::NotFound,
            Self::Validation(_) | Self::Decode(_) => ErrorKind::Validation,
            Self::EmptyBatch(_) => ErrorKind::Precondition,
            Self::Io(_) => ErrorKind::Io,
            Self::Database(_) => ErrorKind::Infrastructure,
            Self::Item { source, .. } => source.kind(),
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database(RepositoryError::Database(error))
    }
}

impl From<PayloadError> for SyncError {
    fn from(error: PayloadError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<CurrencyError> for SyncError {
    fn from(error: CurrencyError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<TableError> for SyncError {
    fn from(error: TableError) -> Self {
        match error {
            TableError::Database(e) => e.into(),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_wrapping_keeps_kind() {
        let err = SyncError::NotFound("product p-9".to_string()).for_item("p-9");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "item p-9: not found: product p-9");
    }

    #[test]
    fn test_table_errors_are_validation() {
        let err: SyncError = TableError::FilterRequired.into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: SyncError = TableError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[test]
    fn test_repository_not_found_is_not_found() {
        let err = SyncError::Database(RepositoryError::NotFound);
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_empty_batch_is_precondition() {
        assert_eq!(
            SyncError::EmptyBatch("b-1".to_string()).kind(),
            ErrorKind::Precondition
        );
    }
}
