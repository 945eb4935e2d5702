//! Infrastructure layer for Pollbot.
//!
//! Contains implementations of the repository traits defined in `pollbot-core`:
//! SQLite storage, the `config.toml` loader and the importer for poll
//! documents exported from the legacy document store.

pub mod config;
pub mod legacy;
pub mod sqlite;
