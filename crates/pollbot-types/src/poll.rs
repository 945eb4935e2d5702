use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

/// A committed poll.
///
/// Polls are keyed by their codename (`name`), which is unique across the
/// store and never changes after creation. Everything except `open` and the
/// per-option vote sets is fixed at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    /// Codename, 3-30 chars of `[A-Za-z0-9_.-]`.
    pub name: String,
    /// Identity of the actor who committed the poll.
    pub author: String,
    pub title: String,
    /// Creation time (UTC).
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    /// Whether the poll currently accepts votes.
    pub open: bool,
    /// Whether tallies are shown while the poll is open.
    pub interim: bool,
    /// Whether voter identities are hidden in reports.
    pub anonymous: bool,
    pub options: Vec<PollOption>,
}

impl Poll {
    /// Look up an option by its stable index.
    pub fn option(&self, index: u32) -> Option<&PollOption> {
        self.options.iter().find(|opt| opt.index == index)
    }

    /// The option the voter currently holds, if any.
    pub fn active_vote(&self, voter: &str) -> Option<&PollOption> {
        self.options.iter().find(|opt| opt.has_voter(voter))
    }

    /// Total number of active votes across all options.
    pub fn total_votes(&self) -> usize {
        self.options.iter().map(|opt| opt.votes.len()).sum()
    }

    pub fn summary(&self) -> PollSummary {
        PollSummary {
            name: self.name.clone(),
            open: self.open,
        }
    }
}

/// One selectable option of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// 0-based position, unique within the poll.
    pub index: u32,
    pub name: String,
    /// Voter identities in the order their votes were cast.
    pub votes: Vec<String>,
}

impl PollOption {
    pub fn has_voter(&self, voter: &str) -> bool {
        self.votes.iter().any(|v| v == voter)
    }
}

/// Input for creating a poll in the store.
///
/// Produced by the builder on commit. Options are listed in index order and
/// start with no votes; the store always inserts the poll closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPoll {
    pub name: String,
    pub author: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub interim: bool,
    pub anonymous: bool,
    pub options: Vec<String>,
}

/// Lightweight listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSummary {
    pub name: String,
    pub open: bool,
}

/// Open/closed state of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    Open,
    Closed,
}

impl From<bool> for PollState {
    fn from(open: bool) -> Self {
        if open { PollState::Open } else { PollState::Closed }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollState::Open => write!(f, "open"),
            PollState::Closed => write!(f, "closed"),
        }
    }
}
