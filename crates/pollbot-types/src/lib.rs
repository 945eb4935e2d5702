//! Shared domain types for Pollbot.
//!
//! This crate contains the core domain types used across the Pollbot plugin:
//! Poll, PollOption, Draft, the global configuration, and the error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod draft;
pub mod error;
pub mod poll;
