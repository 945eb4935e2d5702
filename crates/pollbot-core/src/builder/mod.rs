//! Interactive poll builder.
//!
//! Each author gets at most one in-memory `Draft` that is filled in over
//! several commands and finally committed to the poll store. This module
//! holds the pure draft logic (`state`), the per-author draft registry
//! (`draft_store`) and the builder service that ties them to the store.

pub mod draft_store;
pub mod service;
pub mod state;

pub use service::{BeginOutcome, PollBuilder};
