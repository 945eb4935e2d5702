//! SQLite poll repository implementation.
//!
//! A poll spans three tables: `polls`, `poll_options` and `poll_votes`.
//! Deleting a poll cascades to its options and votes. The single-vote rule is
//! a unique index on `(poll_name, voter)`, so concurrent voters can never end
//! up holding two options of the same poll.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};

use pollbot_core::repository::poll::{PollFilter, PollRepository};
use pollbot_types::error::RepositoryError;
use pollbot_types::poll::{NewPoll, Poll, PollOption, PollSummary};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `PollRepository`.
#[derive(Clone)]
pub struct SqlitePollRepository {
    pool: DatabasePool,
}

impl SqlitePollRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct PollRow {
    name: String,
    author: String,
    title: String,
    created_at: String,
    open: bool,
    interim: bool,
    anonymous: bool,
}

impl PollRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            name: row.try_get("name")?,
            author: row.try_get("author")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            open: row.try_get("open")?,
            interim: row.try_get("interim")?,
            anonymous: row.try_get("anonymous")?,
        })
    }

    fn into_poll(self, options: Vec<PollOption>) -> Result<Poll, RepositoryError> {
        Ok(Poll {
            created_at: parse_datetime(&self.created_at)?,
            name: self.name,
            author: self.author,
            title: self.title,
            open: self.open,
            interim: self.interim,
            anonymous: self.anonymous,
            options,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamps so `ORDER BY created_at` sorts chronologically.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}

/// Ensure poll `name` is open and has option `index`.
///
/// Runs inside the writer transaction of the mutation it guards, so a
/// concurrent `close` either commits before this read or waits for the
/// mutation to finish.
async fn require_open_option(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    index: u32,
) -> Result<(), RepositoryError> {
    let open: Option<(bool,)> = sqlx::query_as("SELECT open FROM polls WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await
        .map_err(query_error)?;
    match open {
        None => return Err(RepositoryError::NotFound),
        Some((false,)) => return Err(RepositoryError::Closed),
        Some((true,)) => {}
    }

    let option = sqlx::query("SELECT 1 FROM poll_options WHERE poll_name = ? AND idx = ?")
        .bind(name)
        .bind(index)
        .fetch_optional(&mut **tx)
        .await
        .map_err(query_error)?;
    match option {
        Some(_) => Ok(()),
        None => Err(RepositoryError::OptionNotFound(index)),
    }
}

fn conflict_or_query(e: sqlx::Error, conflict: impl FnOnce() -> String) -> RepositoryError {
    if is_unique_violation(&e) {
        RepositoryError::Conflict(conflict())
    } else {
        query_error(e)
    }
}

// ---------------------------------------------------------------------------
// PollRepository implementation
// ---------------------------------------------------------------------------

impl PollRepository for SqlitePollRepository {
    async fn create(&self, new_poll: &NewPoll) -> Result<Poll, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            "INSERT INTO polls (name, author, title, created_at, open, interim, anonymous)
             VALUES (?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&new_poll.name)
        .bind(&new_poll.author)
        .bind(&new_poll.title)
        .bind(format_datetime(&new_poll.created_at))
        .bind(new_poll.interim)
        .bind(new_poll.anonymous)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or_query(e, || format!("poll '{}' already exists", new_poll.name)))?;

        let mut options = Vec::with_capacity(new_poll.options.len());
        for (index, option_name) in (0u32..).zip(&new_poll.options) {
            sqlx::query("INSERT INTO poll_options (poll_name, idx, name) VALUES (?, ?, ?)")
                .bind(&new_poll.name)
                .bind(index)
                .bind(option_name)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
            options.push(PollOption {
                index,
                name: option_name.clone(),
                votes: Vec::new(),
            });
        }

        tx.commit().await.map_err(query_error)?;

        Ok(Poll {
            name: new_poll.name.clone(),
            author: new_poll.author.clone(),
            title: new_poll.title.clone(),
            created_at: new_poll.created_at,
            open: false,
            interim: new_poll.interim,
            anonymous: new_poll.anonymous,
            options,
        })
    }

    async fn get(&self, name: &str) -> Result<Option<Poll>, RepositoryError> {
        // One read transaction so options and votes come from the same snapshot.
        let mut tx = self.pool.reader.begin().await.map_err(query_error)?;

        let row = sqlx::query("SELECT * FROM polls WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let poll_row = PollRow::from_row(&row).map_err(query_error)?;

        let option_rows =
            sqlx::query("SELECT idx, name FROM poll_options WHERE poll_name = ? ORDER BY idx")
                .bind(name)
                .fetch_all(&mut *tx)
                .await
                .map_err(query_error)?;
        let mut options = Vec::with_capacity(option_rows.len());
        for row in &option_rows {
            options.push(PollOption {
                index: row.try_get("idx").map_err(query_error)?,
                name: row.try_get("name").map_err(query_error)?,
                votes: Vec::new(),
            });
        }

        let vote_rows = sqlx::query(
            "SELECT option_idx, voter FROM poll_votes WHERE poll_name = ? ORDER BY rowid",
        )
        .bind(name)
        .fetch_all(&mut *tx)
        .await
        .map_err(query_error)?;
        for row in &vote_rows {
            let index: u32 = row.try_get("option_idx").map_err(query_error)?;
            let voter: String = row.try_get("voter").map_err(query_error)?;
            if let Some(option) = options.iter_mut().find(|o| o.index == index) {
                option.votes.push(voter);
            }
        }

        tx.commit().await.map_err(query_error)?;
        Ok(Some(poll_row.into_poll(options)?))
    }

    async fn delete(&self, name: &str) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let result = sqlx::query("DELETE FROM polls WHERE name = ? AND open = 0")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        if result.rows_affected() > 0 {
            tx.commit().await.map_err(query_error)?;
            return Ok(true);
        }

        let open: Option<(bool,)> = sqlx::query_as("SELECT open FROM polls WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;
        tx.rollback().await.map_err(query_error)?;
        match open {
            Some((true,)) => Err(RepositoryError::StillOpen),
            _ => Ok(false),
        }
    }

    async fn set_open(&self, name: &str, open: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE polls SET open = ? WHERE name = ?")
            .bind(open)
            .bind(name)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: &PollFilter) -> Result<Vec<PollSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT name, open FROM polls
             WHERE (?1 IS NULL OR open = ?1) AND (?2 IS NULL OR author = ?2)
             ORDER BY created_at, name",
        )
        .bind(filter.open)
        .bind(filter.author.as_deref())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(PollSummary {
                    name: row.try_get("name").map_err(query_error)?,
                    open: row.try_get("open").map_err(query_error)?,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM polls")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(count.max(0) as u64)
    }

    async fn add_vote(&self, name: &str, index: u32, voter: &str) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        require_open_option(&mut tx, name, index).await?;

        sqlx::query("INSERT INTO poll_votes (poll_name, option_idx, voter) VALUES (?, ?, ?)")
            .bind(name)
            .bind(index)
            .bind(voter)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_or_query(e, || format!("{voter} already voted in '{name}'")))?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn remove_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        require_open_option(&mut tx, name, index).await?;

        let result =
            sqlx::query("DELETE FROM poll_votes WHERE poll_name = ? AND option_idx = ? AND voter = ?")
                .bind(name)
                .bind(index)
                .bind(voter)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn move_vote(
        &self,
        name: &str,
        index: u32,
        voter: &str,
    ) -> Result<Option<u32>, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        require_open_option(&mut tx, name, index).await?;

        let previous: Option<(u32,)> =
            sqlx::query_as("SELECT option_idx FROM poll_votes WHERE poll_name = ? AND voter = ?")
                .bind(name)
                .bind(voter)
                .fetch_optional(&mut *tx)
                .await
                .map_err(query_error)?;

        sqlx::query("DELETE FROM poll_votes WHERE poll_name = ? AND voter = ?")
            .bind(name)
            .bind(voter)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        sqlx::query("INSERT INTO poll_votes (poll_name, option_idx, voter) VALUES (?, ?, ?)")
            .bind(name)
            .bind(index)
            .bind(voter)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(previous.map(|(idx,)| idx))
    }

    async fn import(&self, poll: &Poll) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            "INSERT INTO polls (name, author, title, created_at, open, interim, anonymous)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&poll.name)
        .bind(&poll.author)
        .bind(&poll.title)
        .bind(format_datetime(&poll.created_at))
        .bind(poll.open)
        .bind(poll.interim)
        .bind(poll.anonymous)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or_query(e, || format!("poll '{}' already exists", poll.name)))?;

        for option in &poll.options {
            sqlx::query("INSERT INTO poll_options (poll_name, idx, name) VALUES (?, ?, ?)")
                .bind(&poll.name)
                .bind(option.index)
                .bind(&option.name)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        for option in &poll.options {
            for voter in &option.votes {
                sqlx::query(
                    "INSERT INTO poll_votes (poll_name, option_idx, voter) VALUES (?, ?, ?)",
                )
                .bind(&poll.name)
                .bind(option.index)
                .bind(voter)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    conflict_or_query(e, || format!("{voter} votes twice in '{}'", poll.name))
                })?;
            }
        }

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }
}
