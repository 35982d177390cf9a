use crate::expansion::VariableExpansionError;
use crate::parser::ParseError;
use thiserror::Error;

/// Anything that can abort the evaluation of one logical command.
///
/// The REPL reports the error and carries on with the next command.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Expansion(#[from] VariableExpansionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A stage failed while running: missing file, bad arguments, failed child process.
    #[error(transparent)]
    Command(#[from] anyhow::Error),
}
