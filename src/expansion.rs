//! Quote handling, `$name` substitution and word splitting.
//!
//! A logical command may span several physical lines when a quote is left open at
//! the end of a line. The scanner keeps no state of its own between calls: all the
//! progress it has made lives in a [`Continuation`], which the caller hands back
//! together with the next physical line.

use crate::scope::Scope;
use thiserror::Error;

/// Quoting context of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionState {
    /// Outside of any quotes. Spaces separate words.
    #[default]
    Bare,
    /// Inside `'...'`. Every character is taken literally.
    InSingleQuote,
    /// Inside `"..."`. Spaces are literal, `$name` is still substituted.
    InDoubleQuote,
}

impl ExpansionState {
    fn splits_on_whitespace(self) -> bool {
        self == ExpansionState::Bare
    }

    fn expands_variables(self) -> bool {
        matches!(self, ExpansionState::Bare | ExpansionState::InDoubleQuote)
    }
}

/// Everything needed to resume scanning a logical command on the next line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Continuation {
    /// Quote context at the end of the last scanned line.
    pub state: ExpansionState,
    /// Text of the word still being built.
    pub partial: String,
    /// Words completed so far.
    pub tokens: Vec<String>,
}

impl Continuation {
    pub fn new(state: ExpansionState, partial: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            state,
            partial: partial.into(),
            tokens,
        }
    }

    /// True once no quote is open, i.e. the logical command has been read in full.
    pub fn is_complete(&self) -> bool {
        self.state == ExpansionState::Bare
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }
}

/// A `$` that is not followed by the name of a known variable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error at position {position}")]
pub struct VariableExpansionError {
    /// Character offset of the offending `$` within the scanned line.
    pub position: usize,
}

struct ExpansionFSM<'a> {
    input: Vec<char>,
    pos: usize,
    scope: &'a Scope,
    state: ExpansionState,
    partial: String,
    tokens: Vec<String>,
}

impl<'a> ExpansionFSM<'a> {
    fn new(line: &str, scope: &'a Scope, previous: Continuation) -> Self {
        ExpansionFSM {
            input: line.chars().collect(),
            pos: 0,
            scope,
            state: previous.state,
            partial: previous.partial,
            tokens: previous.tokens,
        }
    }

    fn run(mut self) -> Result<Continuation, VariableExpansionError> {
        use ExpansionState::*;

        while let Some(ch) = self.read_char() {
            match (self.state, ch) {
                (state, ' ') if state.splits_on_whitespace() => self.flush_word(),
                (Bare, '\'') => self.state = InSingleQuote,
                (InSingleQuote, '\'') => self.state = Bare,
                (Bare, '"') => self.state = InDoubleQuote,
                (InDoubleQuote, '"') => self.state = Bare,
                (state, '$') if state.expands_variables() => self.substitute_variable()?,
                (_, c) => self.partial.push(c),
            }
        }

        if self.state.splits_on_whitespace() {
            self.flush_word();
        } else {
            // The open quote carries over, and so does the line break.
            self.partial.push('\n');
        }

        Ok(Continuation {
            state: self.state,
            partial: self.partial,
            tokens: self.tokens,
        })
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    /// Moves a non-empty partial word into the token list. Runs of spaces
    /// therefore never produce empty words.
    fn flush_word(&mut self) {
        if !self.partial.is_empty() {
            self.tokens.push(std::mem::take(&mut self.partial));
        }
    }

    /// Replaces `$name` with the variable's value.
    ///
    /// The name is the longest run of non-space characters after the `$` that is
    /// bound in the scope, so with both `t` and `ts` defined `$ts` always reads `ts`.
    fn substitute_variable(&mut self) -> Result<(), VariableExpansionError> {
        let dollar = self.pos - 1;
        let scope = self.scope;

        let mut candidate = String::new();
        let mut longest: Option<(usize, &str)> = None;
        for (consumed, &ch) in self.input[self.pos..].iter().enumerate() {
            if ch == ' ' {
                break;
            }
            candidate.push(ch);
            if let Some(value) = scope.get(&candidate) {
                longest = Some((consumed + 1, value));
            }
        }

        let (consumed, value) = longest.ok_or(VariableExpansionError { position: dollar })?;
        self.partial.push_str(value);
        self.pos += consumed;
        Ok(())
    }
}

/// Starts scanning a new logical command.
///
/// Equivalent to [`continue_expand`] with an empty [`Continuation`].
pub fn expand(line: &str, scope: &Scope) -> Result<Continuation, VariableExpansionError> {
    continue_expand(line, scope, Continuation::default())
}

/// Scans one more physical line of a logical command.
///
/// The returned [`Continuation`] is complete when no quote is left open; otherwise
/// the caller should read another line and call this again with it. On error the
/// whole logical command is lost: no partial result is returned.
pub fn continue_expand(
    line: &str,
    scope: &Scope,
    previous: Continuation,
) -> Result<Continuation, VariableExpansionError> {
    ExpansionFSM::new(line, scope, previous).run()
}
