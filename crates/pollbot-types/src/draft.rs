//! Draft (in-progress poll) types.
//!
//! A `Draft` is the per-author accumulator used by the poll builder before a
//! poll is committed. Every field that must be filled in before commit is an
//! `Option`, so "unset" is never confused with an empty value.

use serde::{Deserialize, Serialize};

/// An in-progress poll owned by a single author.
///
/// `options` is either `None` or a non-empty list: removing the last option
/// resets it to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub name: Option<String>,
    pub title: Option<String>,
    pub interim: Option<bool>,
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub settings: DraftSettings,
}

/// Optional per-poll settings with defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSettings {
    /// Hide voter identities in reports.
    pub anonymous: bool,
}

/// Read-only snapshot of a draft plus its computed readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftStatus {
    pub draft: Draft,
    pub ready: bool,
}

/// Settings that can be changed with the `=` builder command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSetting {
    Anonymous,
}

impl std::str::FromStr for DraftSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anon" | "anonymous" => Ok(DraftSetting::Anonymous),
            other => Err(format!("unknown setting: '{other}'")),
        }
    }
}
