use thiserror::Error;

/// Errors from the poll builder, voting engine and access layer.
///
/// Everything except `Storage` is an expected, recoverable outcome that is
/// reported back to the invoking actor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("poll '{0}' already exists")]
    DuplicateName(String),

    #[error("no such poll: '{0}'")]
    PollNotFound(String),

    #[error("no such option: #{0}")]
    OptionNotFound(u32),

    #[error("poll is closed")]
    PollClosed,

    #[error("poll is still open")]
    StillOpen,

    #[error("already voted")]
    AlreadyVoted,

    #[error("haven't voted")]
    NotVoted,

    #[error("access denied")]
    AccessDenied,

    #[error("some fields are still unset")]
    NotReady,

    #[error("could not parse '{0}'")]
    Parse(String),

    #[error("no poll is being edited")]
    NoDraft,

    #[error("no option at position {0}")]
    IndexOutOfRange(usize),

    #[error("storage error: {0}")]
    Storage(String),
}

impl PollError {
    /// Whether the error is an expected rejection rather than a store failure.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PollError::Storage(_))
    }
}

/// Errors from repository operations (used by trait definitions in pollbot-core).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("option #{0} not found")]
    OptionNotFound(u32),

    #[error("poll is closed")]
    Closed,

    #[error("poll is still open")]
    StillOpen,

    #[error("conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_error_display() {
        let err = PollError::DuplicateName("lunch".to_string());
        assert_eq!(err.to_string(), "poll 'lunch' already exists");
        assert_eq!(PollError::OptionNotFound(3).to_string(), "no such option: #3");
    }

    #[test]
    fn test_storage_is_not_recoverable() {
        assert!(!PollError::Storage("disk full".to_string()).is_recoverable());
        assert!(PollError::PollClosed.is_recoverable());
        assert!(PollError::AccessDenied.is_recoverable());
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
