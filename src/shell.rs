use crate::config::Config;
use crate::error::ShellError;
use crate::expansion::{self, VariableExpansionError};
use crate::parser::{self, CommandDescriptor, CommandKind};
use crate::scope::Scope;
use log::{debug, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Result of evaluating one logical command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to print: an empty line, or input ended inside an open quote.
    Nothing,
    /// Output of the last pipeline stage.
    Output(String),
    /// A lone `exit` was entered.
    Exit,
}

/// Interactive driver: reads lines, expands and interprets them, runs the
/// resulting pipeline and prints its output.
///
/// Example
/// ```
/// use my_cli::{Outcome, Shell};
/// let mut sh = Shell::default();
/// sh.eval("x=kitty", || None).unwrap();
/// let out = sh.eval("echo hello $x", || None).unwrap();
/// assert_eq!(out, Outcome::Output("hello kitty".to_string()));
/// ```
#[derive(Debug, Default)]
pub struct Shell {
    config: Config,
    scope: Scope,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            scope: Scope::new(),
        }
    }

    /// Variables assigned during this session.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Evaluates the logical command starting with `line`.
    ///
    /// While a quote is left open, `more` is asked for the next physical line;
    /// returning `None` from it abandons the command.
    pub fn eval(
        &mut self,
        line: &str,
        mut more: impl FnMut() -> Option<String>,
    ) -> Result<Outcome, ShellError> {
        let Some(tokens) = self.read(line, &mut more)? else {
            debug!("input ended inside an open quote, command dropped");
            return Ok(Outcome::Nothing);
        };
        debug!("tokens: {:?}", tokens);

        let pipeline = parser::interpret(tokens.as_slice())?;
        debug!("pipeline: {:?}", pipeline);
        match pipeline.as_slice() {
            [] => Ok(Outcome::Nothing),
            [single] if single.kind() == &CommandKind::Exit => Ok(Outcome::Exit),
            stages => Ok(Outcome::Output(self.run_pipeline(stages)?)),
        }
    }

    /// Expands `line`, pulling continuation lines from `more` until no quote is open.
    fn read(
        &self,
        line: &str,
        more: &mut impl FnMut() -> Option<String>,
    ) -> Result<Option<Vec<String>>, VariableExpansionError> {
        let mut progress = expansion::expand(line, &self.scope)?;
        while !progress.is_complete() {
            let Some(next) = more() else {
                return Ok(None);
            };
            progress = expansion::continue_expand(&next, &self.scope, progress)?;
        }
        Ok(Some(progress.into_tokens()))
    }

    /// Runs the stages in order, each one reading the previous one's output.
    ///
    /// A single stage works on the session scope. Stages of a longer pipeline
    /// each get a fresh, empty scope, so assignments inside them do not persist.
    fn run_pipeline(&mut self, stages: &[CommandDescriptor]) -> anyhow::Result<String> {
        if let [single] = stages {
            return single.run(None, &mut self.scope);
        }

        let mut output = None;
        for stage in stages {
            output = Some(stage.run(output, &mut Scope::new())?);
        }
        Ok(output.unwrap_or_default())
    }

    /// Read-Eval-Print Loop over the terminal.
    ///
    /// Returns when `exit` is entered or input ends (Ctrl-D).
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let continuation_prompt = self.config.continuation_prompt.clone();

        loop {
            let line = match rl.readline(&self.config.prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            };

            let mut entered = vec![line.clone()];
            let mut failure = None;
            let result = self.eval(&line, || {
                let next = continuation(rl.readline(&continuation_prompt), &mut failure)?;
                entered.push(next.clone());
                Some(next)
            });
            if let Some(err) = failure {
                return Err(err);
            }
            let command = entered.join("\n");
            if !command.trim().is_empty() {
                rl.add_history_entry(command.as_str())?;
            }

            match result {
                Ok(Outcome::Output(out)) => println!("{}", out),
                Ok(Outcome::Nothing) => {}
                Ok(Outcome::Exit) => break,
                Err(err) => {
                    warn!("`{}` failed: {:?}", command, err);
                    eprintln!("{}", err);
                }
            }
        }

        Ok(())
    }
}

/// A continuation line, or `None` to abandon the command.
///
/// Ctrl-C and Ctrl-D abandon quietly; any other error is kept in `failure` so the
/// REPL can stop with it.
fn continuation(
    read: rustyline::Result<String>,
    failure: &mut Option<ReadlineError>,
) -> Option<String> {
    match read {
        Ok(line) => Some(line),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => None,
        Err(err) => {
            *failure = Some(err);
            None
        }
    }
}
