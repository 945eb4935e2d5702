//! Service layer: voting engine, access control and reporting.

pub mod access;
pub mod poll;
pub mod report;

use pollbot_types::error::{PollError, RepositoryError};

/// Map an unexpected repository failure to `PollError::Storage`, logging it.
///
/// Used for repository errors that the calling operation has no domain
/// meaning for (connection loss, malformed rows, ...).
pub(crate) fn storage_error(err: RepositoryError) -> PollError {
    tracing::error!(error = %err, "poll store operation failed");
    PollError::Storage(err.to_string())
}
