//! CLI support for mini4gl
//!
//! The `run` and `check` subcommands of the binary, usable from other tools
//! without going through a process.

mod check;
mod run;

pub use check::{CheckOptions, execute_check};
pub use run::{RunReport, RunRequest, execute_run};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Lexing, parsing or execution failed
    Program(crate::Error),
    /// Fixture could not be loaded
    Store(crate::StoreError),
    /// IO error
    Io(io::Error),
    /// No program text provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Program(e) => write!(f, "{}", e),
            CliError::Store(e) => write!(f, "Fixture error: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(
                f,
                "No program provided. Pass a FILE or pipe the program to stdin."
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Program(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<crate::Error> for CliError {
    fn from(e: crate::Error) -> Self {
        CliError::Program(e)
    }
}

impl From<crate::ParseError> for CliError {
    fn from(e: crate::ParseError) -> Self {
        CliError::Program(e.into())
    }
}

impl From<crate::StoreError> for CliError {
    fn from(e: crate::StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
