//! In-memory `PollRepository` used by the core unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use pollbot_types::error::RepositoryError;
use pollbot_types::poll::{NewPoll, Poll, PollOption, PollSummary};

use crate::repository::poll::{PollFilter, PollRepository};

/// Mock repository sharing its state between clones, so a builder and a
/// service can be wired to the same "store".
#[derive(Clone, Default)]
pub struct MemoryPollRepository {
    polls: Arc<Mutex<BTreeMap<String, Poll>>>,
}

impl MemoryPollRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_poll<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Poll) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut polls = self.polls.lock().unwrap();
        let poll = polls.get_mut(name).ok_or(RepositoryError::NotFound)?;
        f(poll)
    }
}

fn option_mut(poll: &mut Poll, index: u32) -> Result<&mut PollOption, RepositoryError> {
    if !poll.open {
        return Err(RepositoryError::Closed);
    }
    poll.options
        .iter_mut()
        .find(|o| o.index == index)
        .ok_or(RepositoryError::OptionNotFound(index))
}

impl PollRepository for MemoryPollRepository {
    async fn create(&self, new_poll: &NewPoll) -> Result<Poll, RepositoryError> {
        let mut polls = self.polls.lock().unwrap();
        if polls.contains_key(&new_poll.name) {
            return Err(RepositoryError::Conflict(new_poll.name.clone()));
        }
        let poll = Poll {
            name: new_poll.name.clone(),
            author: new_poll.author.clone(),
            title: new_poll.title.clone(),
            created_at: new_poll.created_at,
            open: false,
            interim: new_poll.interim,
            anonymous: new_poll.anonymous,
            options: new_poll
                .options
                .iter()
                .enumerate()
                .map(|(i, name)| PollOption {
                    index: i as u32,
                    name: name.clone(),
                    votes: Vec::new(),
                })
                .collect(),
        };
        polls.insert(poll.name.clone(), poll.clone());
        Ok(poll)
    }

    async fn get(&self, name: &str) -> Result<Option<Poll>, RepositoryError> {
        Ok(self.polls.lock().unwrap().get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<bool, RepositoryError> {
        let mut polls = self.polls.lock().unwrap();
        match polls.get(name) {
            None => Ok(false),
            Some(poll) if poll.open => Err(RepositoryError::StillOpen),
            Some(_) => Ok(polls.remove(name).is_some()),
        }
    }

    async fn set_open(&self, name: &str, open: bool) -> Result<(), RepositoryError> {
        self.with_poll(name, |poll| {
            poll.open = open;
            Ok(())
        })
    }

    async fn list(&self, filter: &PollFilter) -> Result<Vec<PollSummary>, RepositoryError> {
        let polls = self.polls.lock().unwrap();
        let mut matching: Vec<&Poll> = polls
            .values()
            .filter(|p| filter.matches(&p.summary(), &p.author))
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(matching.into_iter().map(Poll::summary).collect())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.polls.lock().unwrap().len() as u64)
    }

    async fn add_vote(&self, name: &str, index: u32, voter: &str) -> Result<(), RepositoryError> {
        self.with_poll(name, |poll| {
            option_mut(poll, index)?;
            if poll.active_vote(voter).is_some() {
                return Err(RepositoryError::Conflict(voter.to_string()));
            }
            option_mut(poll, index)?.votes.push(voter.to_string());
            Ok(())
        })
    }

    async fn remove_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> Result<bool, RepositoryError> {
        self.with_poll(name, |poll| {
            let option = option_mut(poll, index)?;
            let before = option.votes.len();
            option.votes.retain(|v| v != voter);
            Ok(option.votes.len() != before)
        })
    }

    async fn move_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> Result<Option<u32>, RepositoryError> {
        self.with_poll(name, |poll| {
            option_mut(poll, index)?;
            let previous = poll.active_vote(voter).map(|o| o.index);
            for option in &mut poll.options {
                option.votes.retain(|v| v != voter);
            }
            option_mut(poll, index)?.votes.push(voter.to_string());
            Ok(previous)
        })
    }

    async fn import(&self, poll: &Poll) -> Result<(), RepositoryError> {
        let mut polls = self.polls.lock().unwrap();
        if polls.contains_key(&poll.name) {
            return Err(RepositoryError::Conflict(poll.name.clone()));
        }
        let mut voters: Vec<&String> = poll.options.iter().flat_map(|o| &o.votes).collect();
        let total = voters.len();
        voters.sort();
        voters.dedup();
        if voters.len() != total {
            return Err(RepositoryError::Conflict(poll.name.clone()));
        }
        polls.insert(poll.name.clone(), poll.clone());
        Ok(())
    }
}

/// Repository whose `get` returns a snapshot and then flips the poll's open
/// flag, so the next mutation sees a state the caller never read.
#[derive(Clone)]
pub struct FlipAfterRead {
    pub inner: MemoryPollRepository,
    pub open_after_read: bool,
}

impl PollRepository for FlipAfterRead {
    async fn create(&self, new_poll: &NewPoll) -> Result<Poll, RepositoryError> {
        self.inner.create(new_poll).await
    }

    async fn get(&self, name: &str) -> Result<Option<Poll>, RepositoryError> {
        let snapshot = self.inner.get(name).await?;
        if snapshot.is_some() {
            self.inner.set_open(name, self.open_after_read).await?;
        }
        Ok(snapshot)
    }

    async fn delete(&self, name: &str) -> Result<bool, RepositoryError> {
        self.inner.delete(name).await
    }

    async fn set_open(&self, name: &str, open: bool) -> Result<(), RepositoryError> {
        self.inner.set_open(name, open).await
    }

    async fn list(&self, filter: &PollFilter) -> Result<Vec<PollSummary>, RepositoryError> {
        self.inner.list(filter).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        self.inner.count().await
    }

    async fn add_vote(&self, name: &str, index: u32, voter: &str) -> Result<(), RepositoryError> {
        self.inner.add_vote(name, index, voter).await
    }

    async fn remove_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> Result<bool, RepositoryError> {
        self.inner.remove_vote(name, index, voter).await
    }

    async fn move_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> Result<Option<u32>, RepositoryError> {
        self.inner.move_vote(name, index, voter).await
    }

    async fn import(&self, poll: &Poll) -> Result<(), RepositoryError> {
        self.inner.import(poll).await
    }
}
