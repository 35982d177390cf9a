//! A small line-oriented shell.
//!
//! A line goes through two stages before anything runs. The [`expansion`] module
//! handles quotes and `$name` substitution and splits the line into words; a quote
//! left open at the end of a line makes it ask for the next line. The [`parser`]
//! module then groups the words into a pipeline of [`CommandDescriptor`]s, split
//! on `|`, with `name=value` recognised as an assignment.
//!
//! [`Shell`] drives the whole thing: it reads lines, runs each pipeline stage with
//! the previous stage's output as input, and prints the last result.

mod builtin;
mod command;
pub mod config;
pub mod error;
pub mod expansion;
mod external;
pub mod parser;
pub mod scope;
mod shell;

pub use builtin::ArgumentError;
pub use config::Config;
pub use error::ShellError;
pub use expansion::{
    Continuation, ExpansionState, VariableExpansionError, continue_expand, expand,
};
pub use parser::{CommandDescriptor, CommandKind, ParseError, interpret};
pub use scope::Scope;
pub use shell::{Outcome, Shell};
