//! Poll builder service.
//!
//! Drives the `NO_DRAFT -> EDITING -> {COMMITTED | ABORTED}` lifecycle for
//! each author and hands finished drafts to the poll repository.

use chrono::Utc;

use pollbot_types::draft::{DraftSetting, DraftStatus};
use pollbot_types::error::{PollError, RepositoryError};
use pollbot_types::poll::Poll;

use super::draft_store::DraftRegistry;
use super::state::{DraftExt, validate_codename};
use crate::repository::poll::PollRepository;
use crate::service::storage_error;

/// Result of entering edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// A fresh, empty draft was created.
    Started,
    /// The author already had a draft; it was kept as-is.
    Resumed,
}

/// Service owning all in-progress drafts.
///
/// Generic over the repository trait to maintain clean architecture --
/// pollbot-core never depends on pollbot-infra.
pub struct PollBuilder<R: PollRepository> {
    repo: R,
    drafts: DraftRegistry,
}

impl<R: PollRepository> PollBuilder<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            drafts: DraftRegistry::new(),
        }
    }

    /// Whether `author` is in edit mode.
    pub fn is_editing(&self, author: &str) -> bool {
        self.drafts.contains(author)
    }

    /// Enter edit mode. Re-enters an existing draft instead of resetting it.
    pub fn begin(&self, author: &str) -> BeginOutcome {
        if self.drafts.begin(author) {
            tracing::debug!(author, "draft started");
            BeginOutcome::Started
        } else {
            BeginOutcome::Resumed
        }
    }

    /// Set the codename after checking its format and that no committed poll
    /// already uses it.
    pub async fn set_name(&self, author: &str, codename: &str) -> Result<(), PollError> {
        validate_codename(codename)?;
        // Fail fast on a missing draft before touching the store.
        if !self.drafts.contains(author) {
            return Err(PollError::NoDraft);
        }

        let existing = self.repo.get(codename).await.map_err(storage_error)?;
        if existing.is_some() {
            return Err(PollError::DuplicateName(codename.to_string()));
        }

        self.drafts.update(author, |d| d.set_name(codename)).await
    }

    pub async fn set_title(&self, author: &str, title: &str) -> Result<(), PollError> {
        self.drafts
            .update(author, |d| {
                d.set_title(title);
                Ok(())
            })
            .await
    }

    pub async fn set_interim(&self, author: &str, token: &str) -> Result<bool, PollError> {
        self.drafts.update(author, |d| d.set_interim(token)).await
    }

    /// Append an option; returns its position.
    pub async fn add_option(&self, author: &str, text: &str) -> Result<usize, PollError> {
        self.drafts.update(author, |d| d.add_option(text)).await
    }

    /// Remove the option at `index`; returns its label.
    pub async fn remove_option(&self, author: &str, index: usize) -> Result<String, PollError> {
        self.drafts.update(author, |d| d.remove_option(index)).await
    }

    pub async fn set_setting(
        &self,
        author: &str,
        key: &str,
        value: &str,
    ) -> Result<(DraftSetting, bool), PollError> {
        self.drafts.update(author, |d| d.set_setting(key, value)).await
    }

    pub async fn status(&self, author: &str) -> Result<DraftStatus, PollError> {
        let guard = self.drafts.lock(author).await?;
        Ok(guard.draft()?.status())
    }

    /// Commit a ready draft as a new, closed poll.
    ///
    /// The draft is removed only once the store accepted the poll; on
    /// `DuplicateName` (another author took the codename meanwhile) or a
    /// storage failure the draft stays in place.
    pub async fn commit(&self, author: &str) -> Result<Poll, PollError> {
        let guard = self.drafts.lock(author).await?;
        let new_poll = guard.draft()?.to_new_poll(author, Utc::now())?;

        let poll = self.repo.create(&new_poll).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => PollError::DuplicateName(new_poll.name.clone()),
            other => storage_error(other),
        })?;

        self.drafts.finish(author, guard);
        tracing::info!(author, poll = %poll.name, options = poll.options.len(), "poll created");
        Ok(poll)
    }

    /// Discard the draft unconditionally.
    pub async fn abort(&self, author: &str) -> Result<(), PollError> {
        let guard = self.drafts.lock(author).await?;
        self.drafts.finish(author, guard);
        tracing::debug!(author, "draft aborted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryPollRepository;

    async fn ready_builder(author: &str, name: &str) -> PollBuilder<MemoryPollRepository> {
        let builder = PollBuilder::new(MemoryPollRepository::new());
        fill_ready(&builder, author, name).await;
        builder
    }

    async fn fill_ready(builder: &PollBuilder<MemoryPollRepository>, author: &str, name: &str) {
        builder.begin(author);
        builder.set_name(author, name).await.unwrap();
        builder.set_title(author, "Favourite colour?").await.unwrap();
        builder.set_interim(author, "off").await.unwrap();
        builder.add_option(author, "red").await.unwrap();
        builder.add_option(author, "blue").await.unwrap();
    }

    #[tokio::test]
    async fn test_begin_then_resume() {
        let builder = PollBuilder::new(MemoryPollRepository::new());
        assert!(!builder.is_editing("alice"));
        assert_eq!(builder.begin("alice"), BeginOutcome::Started);
        builder.set_title("alice", "Kept").await.unwrap();
        assert_eq!(builder.begin("alice"), BeginOutcome::Resumed);

        let status = builder.status("alice").await.unwrap();
        assert_eq!(status.draft.title.as_deref(), Some("Kept"));
    }

    #[tokio::test]
    async fn test_operations_without_draft() {
        let builder = PollBuilder::new(MemoryPollRepository::new());
        assert_eq!(builder.set_title("alice", "x").await, Err(PollError::NoDraft));
        assert_eq!(builder.set_name("alice", "valid").await, Err(PollError::NoDraft));
        assert_eq!(builder.commit("alice").await.unwrap_err(), PollError::NoDraft);
        assert_eq!(builder.abort("alice").await, Err(PollError::NoDraft));
    }

    #[tokio::test]
    async fn test_commit_creates_closed_poll() {
        let builder = ready_builder("alice", "colours").await;
        assert!(builder.status("alice").await.unwrap().ready);

        let poll = builder.commit("alice").await.unwrap();
        assert_eq!(poll.name, "colours");
        assert_eq!(poll.author, "alice");
        assert!(!poll.open);
        assert!(!poll.interim);
        assert!(!poll.anonymous);
        assert_eq!(poll.options.len(), 2);
        assert_eq!(poll.options[1].index, 1);
        assert_eq!(poll.options[1].name, "blue");
        assert!(poll.options.iter().all(|o| o.votes.is_empty()));
        assert!(!builder.is_editing("alice"));

        let stored = builder.repo.get("colours").await.unwrap().unwrap();
        assert_eq!(stored, poll);
    }

    #[tokio::test]
    async fn test_commit_incomplete_draft() {
        let builder = PollBuilder::new(MemoryPollRepository::new());
        builder.begin("alice");
        builder.set_name("alice", "lonely").await.unwrap();
        builder.set_title("alice", "One option").await.unwrap();
        builder.set_interim("alice", "yes").await.unwrap();
        builder.add_option("alice", "only").await.unwrap();

        assert_eq!(builder.commit("alice").await.unwrap_err(), PollError::NotReady);
        assert!(builder.is_editing("alice"));
    }

    #[tokio::test]
    async fn test_set_name_rejects_invalid_and_taken() {
        let builder = ready_builder("alice", "taken").await;
        builder.commit("alice").await.unwrap();

        builder.begin("bob");
        assert!(matches!(
            builder.set_name("bob", "x").await,
            Err(PollError::Validation(_))
        ));
        assert_eq!(
            builder.set_name("bob", "taken").await,
            Err(PollError::DuplicateName("taken".to_string()))
        );
        assert!(builder.status("bob").await.unwrap().draft.name.is_none());
    }

    #[tokio::test]
    async fn test_commit_race_preserves_draft() {
        let repo = MemoryPollRepository::new();
        let builder = PollBuilder::new(repo.clone());
        fill_ready(&builder, "alice", "shared").await;
        fill_ready(&builder, "bob", "shared").await;

        builder.commit("alice").await.unwrap();
        assert_eq!(
            builder.commit("bob").await.unwrap_err(),
            PollError::DuplicateName("shared".to_string())
        );

        let status = builder.status("bob").await.unwrap();
        assert_eq!(status.draft.name.as_deref(), Some("shared"));
        assert_eq!(status.draft.options.as_ref().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_abort_discards_draft() {
        let builder = ready_builder("alice", "dropped").await;
        builder.abort("alice").await.unwrap();
        assert!(!builder.is_editing("alice"));
        assert!(builder.repo.get("dropped").await.unwrap().is_none());

        assert_eq!(builder.begin("alice"), BeginOutcome::Started);
        assert!(builder.status("alice").await.unwrap().draft.name.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_setting_flows_into_poll() {
        let builder = ready_builder("alice", "secret").await;
        builder.set_setting("alice", "anon", "yes").await.unwrap();
        let poll = builder.commit("alice").await.unwrap();
        assert!(poll.anonymous);
    }

    #[tokio::test]
    async fn test_valid_codenames_round_trip() {
        let builder = PollBuilder::new(MemoryPollRepository::new());
        for name in ["abc", "Lunch.Friday", "vote_2024-q1", "z".repeat(30).as_str()] {
            fill_ready(&builder, "alice", name).await;
            let poll = builder.commit("alice").await.unwrap();
            assert_eq!(poll.name, name);
            assert_eq!(builder.repo.get(name).await.unwrap().unwrap().name, name);
        }
    }
}
