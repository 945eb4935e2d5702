//! Chat command surface: parsing `.poll` command lines and dispatching them
//! to the builder and poll service.

pub mod commands;
pub mod handler;

pub use handler::{ChatTransport, PollPlugin};
