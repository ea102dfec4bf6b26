//! Backlog - multi-tenant project and task backlog
//!
//! The `bkl` binary is a thin wrapper around this library: it parses the
//! command line into a [`commands::Command`], runs it against a
//! [`backlog_db::Database`] and prints the returned text.

pub mod commands;
pub mod error;
mod id;
pub mod output;

pub use commands::Command;
pub use error::{CliError, CliResult};
