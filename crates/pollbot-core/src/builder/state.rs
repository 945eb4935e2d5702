//! Draft accumulator logic.
//!
//! The `Draft` struct lives in `pollbot-types`; this module provides an
//! extension trait (`DraftExt`) with the field setters, readiness predicate
//! and commit conversion, plus the input validators they share. The extension
//! trait pattern is used because Rust does not allow inherent impls for types
//! defined in another crate.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use pollbot_types::draft::{Draft, DraftSetting, DraftStatus};
use pollbot_types::error::PollError;
use pollbot_types::poll::NewPoll;

static CODENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,30}$").expect("codename regex is valid"));

static OPTION_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S.*$").expect("option regex is valid"));

/// Tokens accepted as "yes" by `@` and `=`.
pub const YES_ANSWERS: &[&str] = &["on", "yes", "+", "yep", "yup", "yeah"];

/// Tokens accepted as "no" by `@` and `=`.
pub const NO_ANSWERS: &[&str] = &["off", "no", "nope", "nop", "no way", "nein"];

/// Parse a yes/no token (case-insensitive, surrounding whitespace ignored).
pub fn parse_yes_no(token: &str) -> Option<bool> {
    let token = token.trim().to_lowercase();
    if YES_ANSWERS.contains(&token.as_str()) {
        Some(true)
    } else if NO_ANSWERS.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Check a codename against `[A-Za-z0-9_.-]{3,30}`.
pub fn validate_codename(codename: &str) -> Result<(), PollError> {
    if CODENAME.is_match(codename) {
        Ok(())
    } else {
        Err(PollError::Validation(
            "codename must be 3 to 30 characters of letters, digits, underline, period or dash"
                .to_string(),
        ))
    }
}

/// Check that an option label starts with a non-whitespace character.
pub fn validate_option(text: &str) -> Result<(), PollError> {
    if OPTION_TEXT.is_match(text) {
        Ok(())
    } else {
        Err(PollError::Validation(
            "option name must start with a non-whitespace character".to_string(),
        ))
    }
}

/// Extension trait for `Draft` field updates and readiness.
///
/// Every setter validates its input first and leaves the draft untouched on
/// error.
pub trait DraftExt {
    /// Set the codename after format validation (uniqueness is checked by
    /// the builder service against the store).
    fn set_name(&mut self, codename: &str) -> Result<(), PollError>;

    /// Set the title. Any string is accepted; an empty title never
    /// satisfies readiness.
    fn set_title(&mut self, title: &str);

    /// Set interim visibility from a yes/no token.
    fn set_interim(&mut self, token: &str) -> Result<bool, PollError>;

    /// Append an option, returning its position.
    fn add_option(&mut self, text: &str) -> Result<usize, PollError>;

    /// Remove the option at `index`, returning its label.
    ///
    /// Removing the last remaining option resets `options` to unset.
    fn remove_option(&mut self, index: usize) -> Result<String, PollError>;

    /// Change an optional setting from a key and a yes/no token.
    fn set_setting(&mut self, key: &str, value: &str) -> Result<(DraftSetting, bool), PollError>;

    /// Whether every required field is set.
    fn is_ready(&self) -> bool;

    /// Snapshot of the draft with its readiness.
    fn status(&self) -> DraftStatus;

    /// Convert a ready draft into a poll ready for insertion.
    fn to_new_poll(&self, author: &str, now: DateTime<Utc>) -> Result<NewPoll, PollError>;
}

impl DraftExt for Draft {
    fn set_name(&mut self, codename: &str) -> Result<(), PollError> {
        validate_codename(codename)?;
        self.name = Some(codename.to_string());
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn set_interim(&mut self, token: &str) -> Result<bool, PollError> {
        let interim = parse_yes_no(token).ok_or_else(|| PollError::Parse(token.to_string()))?;
        self.interim = Some(interim);
        Ok(interim)
    }

    fn add_option(&mut self, text: &str) -> Result<usize, PollError> {
        validate_option(text)?;
        let options = self.options.get_or_insert_with(Vec::new);
        options.push(text.to_string());
        Ok(options.len() - 1)
    }

    fn remove_option(&mut self, index: usize) -> Result<String, PollError> {
        let options = self
            .options
            .as_mut()
            .filter(|opts| index < opts.len())
            .ok_or(PollError::IndexOutOfRange(index))?;

        let removed = options.remove(index);
        if options.is_empty() {
            self.options = None;
        }
        Ok(removed)
    }

    fn set_setting(&mut self, key: &str, value: &str) -> Result<(DraftSetting, bool), PollError> {
        let setting: DraftSetting = key.parse().map_err(PollError::Parse)?;
        let enabled = parse_yes_no(value).ok_or_else(|| PollError::Parse(value.to_string()))?;

        match setting {
            DraftSetting::Anonymous => self.settings.anonymous = enabled,
        }
        Ok((setting, enabled))
    }

    fn is_ready(&self) -> bool {
        self.name.is_some()
            && self.title.as_deref().is_some_and(|t| !t.is_empty())
            && self.interim.is_some()
            && self.options.as_ref().is_some_and(|opts| opts.len() > 1)
    }

    fn status(&self) -> DraftStatus {
        DraftStatus {
            draft: self.clone(),
            ready: self.is_ready(),
        }
    }

    fn to_new_poll(&self, author: &str, now: DateTime<Utc>) -> Result<NewPoll, PollError> {
        match (&self.name, &self.title, self.interim, &self.options) {
            (Some(name), Some(title), Some(interim), Some(options)) if self.is_ready() => {
                Ok(NewPoll {
                    name: name.clone(),
                    author: author.to_string(),
                    title: title.clone(),
                    created_at: now,
                    interim,
                    anonymous: self.settings.anonymous,
                    options: options.clone(),
                })
            }
            _ => Err(PollError::NotReady),
        }
    }
}
