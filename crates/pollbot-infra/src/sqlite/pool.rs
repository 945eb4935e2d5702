//! Poll store connection pools.
//!
//! Votes from many channels may arrive at once while SQLite admits a single
//! writer. `DatabasePool` pairs a read-only pool for `info`/`list` with a
//! one-connection writer pool that serializes every mutation.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// File name of the poll store inside the data directory.
pub const DATABASE_FILE: &str = "pollbot.db";

#[derive(Clone)]
pub struct DatabasePool {
    /// Up to 8 read-only connections.
    pub reader: SqlitePool,
    /// Exactly one connection; all writes and vote transactions go here.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if needed) the store at `database_url` and bring its
    /// schema up to date, renaming legacy columns on the way.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;
        tracing::debug!(database_url, "poll store migrated");

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(base_opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }
}

/// `sqlite://` URL for the poll store inside `data_dir`.
pub fn database_url_in(data_dir: &Path) -> String {
    format!("sqlite://{}", data_dir.join(DATABASE_FILE).display())
}
