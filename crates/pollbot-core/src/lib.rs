//! Poll lifecycle and voting engine for Pollbot.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the builder state machine, the voting engine and the
//! report generator. It depends only on `pollbot-types` -- never on
//! `pollbot-infra` or any database/IO crate.

pub mod bar;
pub mod builder;
pub mod format;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
