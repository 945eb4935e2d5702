//! Poll repository trait definition.

use pollbot_types::error::RepositoryError;
use pollbot_types::poll::{NewPoll, Poll, PollSummary};

/// Filter criteria for listing polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollFilter {
    /// Only polls in this open/closed state.
    pub open: Option<bool>,
    /// Only polls created by this identity.
    pub author: Option<String>,
}

impl PollFilter {
    pub fn matches(&self, summary: &PollSummary, author: &str) -> bool {
        self.open.is_none_or(|open| summary.open == open)
            && self.author.as_deref().is_none_or(|a| a == author)
    }
}

/// Repository trait for poll persistence.
///
/// Every vote mutation is a single targeted statement keyed by poll name and
/// option index; callers never read a poll, edit it in memory and write it
/// back. Implementations live in pollbot-infra (e.g., SqlitePollRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait PollRepository: Send + Sync {
    /// Insert a new, closed poll with empty vote sets.
    ///
    /// Returns `Conflict` if the name is taken; uniqueness is enforced by the
    /// store itself, not by a prior lookup.
    fn create(
        &self,
        poll: &NewPoll,
    ) -> impl std::future::Future<Output = Result<Poll, RepositoryError>> + Send;

    /// Get a poll (with options and votes) by name.
    fn get(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Poll>, RepositoryError>> + Send;

    /// Delete a closed poll and its options and votes.
    ///
    /// The closed check and the delete are one atomic step: returns
    /// `StillOpen` if the poll is open at that moment, `Ok(false)` if no poll
    /// of that name exists.
    fn delete(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Set the open flag. Idempotent; `NotFound` if the poll does not exist.
    fn set_open(
        &self,
        name: &str,
        open: bool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List polls ordered by creation time, then name.
    fn list(
        &self,
        filter: &PollFilter,
    ) -> impl std::future::Future<Output = Result<Vec<PollSummary>, RepositoryError>> + Send;

    /// Total number of polls in the store, regardless of any filter.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Atomically add `voter` to the option's vote set.
    ///
    /// Returns `Conflict` if the voter already holds a vote in this poll,
    /// `Closed` if the poll is not open, `NotFound` / `OptionNotFound` if the
    /// target is missing. The open check runs in the same transaction as
    /// the insert.
    fn add_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically remove `voter` from the option's vote set.
    ///
    /// Returns whether a vote was removed; fails like `add_vote` when the
    /// poll is closed or the target is missing.
    fn remove_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Atomically drop any vote `voter` holds in the poll and cast one for
    /// `index`, in a single transaction.
    ///
    /// Returns the index of the vote that was replaced, if any. Fails like
    /// `add_vote` when the poll is closed or the target is missing.
    fn move_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> impl std::future::Future<Output = Result<Option<u32>, RepositoryError>> + Send;

    /// Insert a complete poll (state, options and votes) in one transaction.
    ///
    /// Used to bring in polls from other stores. Returns `Conflict` if the
    /// name is taken or the votes break the one-vote-per-voter rule; nothing
    /// is written in either case.
    fn import(
        &self,
        poll: &Poll,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = PollFilter::default();
        let summary = PollSummary {
            name: "lunch".to_string(),
            open: false,
        };
        assert!(filter.matches(&summary, "alice"));
    }

    #[test]
    fn test_filter_by_state_and_author() {
        let filter = PollFilter {
            open: Some(true),
            author: Some("alice".to_string()),
        };
        let open = PollSummary {
            name: "a".to_string(),
            open: true,
        };
        let closed = PollSummary {
            name: "b".to_string(),
            open: false,
        };
        assert!(filter.matches(&open, "alice"));
        assert!(!filter.matches(&open, "bob"));
        assert!(!filter.matches(&closed, "alice"));
    }
}
