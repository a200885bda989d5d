//! Syntax-only validation

use super::CliError;
use crate::parser::Parser;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Program text
    pub source: String,
}

/// Parses the program without running it and returns the number of
/// top-level statements.
pub fn execute_check(options: &CheckOptions) -> Result<usize, CliError> {
    let mut parser = Parser::from_source(&options.source)?;
    let program = parser.parse_program()?;
    tracing::debug!(statements = program.body.len(), "syntax check passed");
    Ok(program.body.len())
}
