//! Poll service: voting engine, open/close/delete and reporting.
//!
//! Every vote mutation is a targeted repository call (`add_vote`,
//! `remove_vote`, `move_vote`); the poll is read only to validate the request
//! and to produce a descriptive rejection. The store repeats the open/closed
//! check inside the mutation, so a state change that lands between the read
//! and the write still rejects the request.

use pollbot_types::error::{PollError, RepositoryError};
use pollbot_types::poll::{Poll, PollSummary};

use super::access::AccessPolicy;
use super::report::PollReport;
use super::storage_error;
use crate::repository::poll::{PollFilter, PollRepository};

/// How a `vote` call changed the voter's active vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The voter had no vote in this poll.
    Cast,
    /// The voter's vote moved from another option.
    Switched { from: u32 },
    /// The voter already held this option; nothing changed.
    Unchanged,
}

/// Confirmation of a successful `vote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    pub index: u32,
    pub option_name: String,
    pub outcome: VoteOutcome,
}

/// Result of `list`.
///
/// An empty store and a filter that matched nothing both produce an empty
/// `polls`; `store_size` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollListing {
    pub store_size: u64,
    pub polls: Vec<PollSummary>,
}

/// Service orchestrating committed polls.
///
/// Generic over the repository trait to maintain clean architecture --
/// pollbot-core never depends on pollbot-infra.
pub struct PollService<R: PollRepository> {
    repo: R,
    access: AccessPolicy,
}

/// Map a repository error from a targeted mutation on `name`.
fn mutation_error(name: &str, err: RepositoryError) -> PollError {
    match err {
        RepositoryError::NotFound => PollError::PollNotFound(name.to_string()),
        RepositoryError::OptionNotFound(index) => PollError::OptionNotFound(index),
        RepositoryError::Conflict(_) => PollError::AlreadyVoted,
        RepositoryError::Closed => PollError::PollClosed,
        RepositoryError::StillOpen => PollError::StillOpen,
        other => storage_error(other),
    }
}

impl<R: PollRepository> PollService<R> {
    pub fn new(repo: R, access: AccessPolicy) -> Self {
        Self { repo, access }
    }

    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    /// Fetch a poll by name.
    pub async fn get(&self, name: &str) -> Result<Poll, PollError> {
        self.repo
            .get(name)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| PollError::PollNotFound(name.to_string()))
    }

    /// Fetch a poll that must be open for voting.
    async fn get_open(&self, name: &str) -> Result<Poll, PollError> {
        let poll = self.get(name).await?;
        if !poll.open {
            return Err(PollError::PollClosed);
        }
        Ok(poll)
    }

    /// Open a poll (author or admin only). Idempotent.
    pub async fn open(&self, actor: &str, name: &str) -> Result<(), PollError> {
        self.set_open(actor, name, true).await
    }

    /// Close a poll (author or admin only). Idempotent.
    pub async fn close(&self, actor: &str, name: &str) -> Result<(), PollError> {
        self.set_open(actor, name, false).await
    }

    async fn set_open(&self, actor: &str, name: &str, open: bool) -> Result<(), PollError> {
        let poll = self.get(name).await?;
        self.access.require_manage(actor, &poll)?;

        self.repo
            .set_open(name, open)
            .await
            .map_err(|e| mutation_error(name, e))?;
        tracing::info!(actor, poll = name, open, "poll state changed");
        Ok(())
    }

    /// Delete a closed poll (author or admin only).
    pub async fn delete(&self, actor: &str, name: &str) -> Result<(), PollError> {
        let poll = self.get(name).await?;
        self.access.require_manage(actor, &poll)?;
        if poll.open {
            return Err(PollError::StillOpen);
        }

        // The store re-checks the closed state atomically with the delete.
        if !self.repo.delete(name).await.map_err(|e| mutation_error(name, e))? {
            return Err(PollError::PollNotFound(name.to_string()));
        }
        tracing::info!(actor, poll = name, "poll deleted");
        Ok(())
    }

    /// Cast or switch `voter`'s single vote to option `index`.
    ///
    /// Voting for the option already held is a no-op reported as
    /// `VoteOutcome::Unchanged`.
    pub async fn vote(&self, voter: &str, index: u32, name: &str) -> Result<VoteReceipt, PollError> {
        let poll = self.get_open(name).await?;
        let option = poll.option(index).ok_or(PollError::OptionNotFound(index))?;
        let option_name = option.name.clone();

        if option.has_voter(voter) {
            return Ok(VoteReceipt {
                index,
                option_name,
                outcome: VoteOutcome::Unchanged,
            });
        }

        let previous = self
            .repo
            .move_vote(name, index, voter)
            .await
            .map_err(|e| mutation_error(name, e))?;

        let outcome = match previous {
            Some(from) if from != index => VoteOutcome::Switched { from },
            Some(_) => VoteOutcome::Unchanged,
            None => VoteOutcome::Cast,
        };
        tracing::info!(voter, poll = name, index, ?outcome, "vote cast");

        Ok(VoteReceipt {
            index,
            option_name,
            outcome,
        })
    }

    /// Add a vote without switching. Fails `AlreadyVoted` if the voter
    /// already holds a vote in this poll.
    pub async fn add_vote(&self, voter: &str, index: u32, name: &str) -> Result<(), PollError> {
        let poll = self.get_open(name).await?;
        poll.option(index).ok_or(PollError::OptionNotFound(index))?;
        if poll.active_vote(voter).is_some() {
            return Err(PollError::AlreadyVoted);
        }

        self.repo
            .add_vote(name, index, voter)
            .await
            .map_err(|e| mutation_error(name, e))?;
        tracing::info!(voter, poll = name, index, "vote added");
        Ok(())
    }

    /// Remove the voter's vote from option `index`. Fails `NotVoted` if the
    /// voter does not hold that option.
    pub async fn del_vote(&self, voter: &str, index: u32, name: &str) -> Result<(), PollError> {
        let poll = self.get_open(name).await?;
        let option = poll.option(index).ok_or(PollError::OptionNotFound(index))?;
        if !option.has_voter(voter) {
            return Err(PollError::NotVoted);
        }

        let removed = self
            .repo
            .remove_vote(name, index, voter)
            .await
            .map_err(|e| mutation_error(name, e))?;
        if !removed {
            // Another request removed it between the read and the delete.
            return Err(PollError::NotVoted);
        }
        tracing::info!(voter, poll = name, index, "vote removed");
        Ok(())
    }

    /// Remove `voter`'s active vote, whichever option it is on.
    ///
    /// Returns the option index the vote was removed from.
    pub async fn unvote(&self, voter: &str, name: &str) -> Result<u32, PollError> {
        let poll = self.get_open(name).await?;
        let index = poll
            .active_vote(voter)
            .map(|opt| opt.index)
            .ok_or(PollError::NotVoted)?;

        self.del_vote(voter, index, name).await?;
        Ok(index)
    }

    /// Admin-only removal of another user's active vote.
    pub async fn remove_user_vote(
        &self,
        actor: &str,
        name: &str,
        voter: &str,
    ) -> Result<u32, PollError> {
        self.access.require_admin(actor)?;
        let index = self.unvote(voter, name).await?;
        tracing::info!(actor, voter, poll = name, "vote removed by admin");
        Ok(index)
    }

    /// Build the `info` report. Allowed in any state.
    pub async fn info(&self, name: &str) -> Result<PollReport, PollError> {
        let poll = self.get(name).await?;
        Ok(PollReport::from_poll(&poll))
    }

    /// List polls as (name, open) pairs.
    pub async fn list(&self, filter: &PollFilter) -> Result<PollListing, PollError> {
        let store_size = self.repo.count().await.map_err(storage_error)?;
        let polls = if store_size == 0 {
            Vec::new()
        } else {
            self.repo.list(filter).await.map_err(storage_error)?
        };
        Ok(PollListing { store_size, polls })
    }
}
