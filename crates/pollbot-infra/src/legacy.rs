//! Import of polls exported from the legacy document store.
//!
//! Accepts a JSON array of poll documents or one document per line. Older
//! documents may carry `public` instead of `interim` and may lack
//! `anonymous`; both are normalized on the way in. Polls whose name is
//! already taken are skipped, never overwritten, and documents the poll
//! builder could never have produced (bad codename, fewer than two options,
//! blank option names) are rejected. Each poll is written in one
//! transaction.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use pollbot_core::builder::state::{validate_codename, validate_option};
use pollbot_core::repository::poll::PollRepository;
use pollbot_types::error::{PollError, RepositoryError};
use pollbot_types::poll::{Poll, PollOption};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed poll document on line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    #[error("invalid date '{0}'")]
    Date(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A poll document as stored by the legacy plugin.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyPoll {
    pub name: String,
    pub author: String,
    pub title: String,
    pub date: LegacyDate,
    #[serde(default)]
    pub open: bool,
    #[serde(default, alias = "public")]
    pub interim: bool,
    #[serde(default)]
    pub anonymous: bool,
    pub options: Vec<LegacyOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyOption {
    pub index: u32,
    pub name: String,
    #[serde(default)]
    pub votes: Vec<String>,
}

/// Creation date in any of the shapes document exports produce.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LegacyDate {
    /// `{"$date": ...}` extended JSON.
    Extended {
        #[serde(rename = "$date")]
        date: ExtendedDate,
    },
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExtendedDate {
    Millis(i64),
    NumberLong {
        #[serde(rename = "$numberLong")]
        millis: String,
    },
    Text(String),
}

fn parse_text_date(s: &str) -> Result<DateTime<Utc>, ImportError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Naive timestamps were always written in UTC.
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ImportError::Date(s.to_string()))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, ImportError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| ImportError::Date(millis.to_string()))
}

impl LegacyDate {
    pub fn to_utc(&self) -> Result<DateTime<Utc>, ImportError> {
        match self {
            LegacyDate::Text(s) | LegacyDate::Extended { date: ExtendedDate::Text(s) } => {
                parse_text_date(s)
            }
            LegacyDate::Extended { date: ExtendedDate::Millis(ms) } => from_millis(*ms),
            LegacyDate::Extended { date: ExtendedDate::NumberLong { millis } } => {
                let ms = millis
                    .parse::<i64>()
                    .map_err(|_| ImportError::Date(millis.clone()))?;
                from_millis(ms)
            }
        }
    }
}

/// Parse an export: a JSON array, or one JSON document per line.
pub fn parse_documents(content: &str) -> Result<Vec<LegacyPoll>, ImportError> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|source| ImportError::Json {
            line: source.line(),
            source,
        });
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| ImportError::Json { line: i + 1, source })
        })
        .collect()
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Names that already existed in the store.
    pub skipped: Vec<String>,
    /// Documents rejected by validation, with the reason.
    pub invalid: Vec<(String, String)>,
    /// Votes dropped because the voter already held another option.
    pub dropped_votes: usize,
}

/// Check a document against the rules the poll builder enforces.
fn validate_document(doc: &LegacyPoll) -> Result<(), PollError> {
    validate_codename(&doc.name)?;
    if doc.title.is_empty() {
        return Err(PollError::Validation("title is empty".to_string()));
    }
    if doc.options.len() < 2 {
        return Err(PollError::Validation(format!(
            "{} option(s), at least 2 required",
            doc.options.len()
        )));
    }
    doc.options.iter().try_for_each(|opt| validate_option(&opt.name))
}

/// Turn a validated document into a poll, keeping each voter's first vote
/// in option order. Returns the poll and the number of dropped votes.
fn to_poll(doc: LegacyPoll, created_at: DateTime<Utc>) -> (Poll, usize) {
    let mut seen = HashSet::new();
    let mut dropped = 0;
    let options = (0u32..)
        .zip(doc.options)
        .map(|(index, opt)| {
            let mut votes = Vec::with_capacity(opt.votes.len());
            for voter in opt.votes {
                if seen.insert(voter.clone()) {
                    votes.push(voter);
                } else {
                    tracing::warn!(poll = %doc.name, voter = %voter, "dropping duplicate vote");
                    dropped += 1;
                }
            }
            PollOption {
                index,
                name: opt.name,
                votes,
            }
        })
        .collect();

    let poll = Poll {
        name: doc.name,
        author: doc.author,
        title: doc.title,
        created_at,
        open: doc.open,
        interim: doc.interim,
        anonymous: doc.anonymous,
        options,
    };
    (poll, dropped)
}

/// Store every document in `polls` through `repo`.
pub async fn import_polls<R: PollRepository>(
    repo: &R,
    polls: Vec<LegacyPoll>,
) -> Result<ImportSummary, ImportError> {
    let mut summary = ImportSummary::default();

    for mut doc in polls {
        if let Err(e) = validate_document(&doc) {
            tracing::warn!(poll = %doc.name, error = %e, "invalid poll document, skipping");
            summary.invalid.push((doc.name, e.to_string()));
            continue;
        }
        let created_at = match doc.date.to_utc() {
            Ok(dt) => dt,
            Err(e) => {
                tracing::warn!(poll = %doc.name, error = %e, "invalid poll date, skipping");
                summary.invalid.push((doc.name, e.to_string()));
                continue;
            }
        };

        doc.options.sort_by_key(|opt| opt.index);
        if doc.options.iter().zip(0u32..).any(|(opt, i)| opt.index != i) {
            tracing::warn!(poll = %doc.name, "option indices are not contiguous, renumbering");
        }

        let (poll, dropped) = to_poll(doc, created_at);
        match repo.import(&poll).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => {
                tracing::warn!(poll = %poll.name, "poll already exists, skipping");
                summary.skipped.push(poll.name);
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(poll = %poll.name, "poll imported");
        summary.dropped_votes += dropped;
        summary.imported += 1;
    }

    Ok(summary)
}

/// Read `path` and import every poll document in it.
pub async fn import_file<R: PollRepository>(
    repo: &R,
    path: &Path,
) -> Result<ImportSummary, ImportError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ImportError::Io {
            path: path.display().to_string(),
            source,
        })?;
    import_polls(repo, parse_documents(&content)?).await
}
