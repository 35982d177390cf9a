use std::fmt;
use thiserror::Error;

/// Token that separates the stages of a pipeline.
pub const PIPE: &str = "|";

/// Reserved command name of the variable assignment kind.
pub const ASSIGNMENT: &str = "=";

/// What a command name resolves to.
///
/// Names are resolved once, when the pipeline is built. Every name that is not a
/// built-in is an external program; whether it actually exists is only checked
/// when the command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// `name=value`. Carries the name and the value as its two arguments.
    Assign,
    Cat,
    Echo,
    Wc,
    Pwd,
    Exit,
    Grep,
    /// Anything else, run as a child process.
    External(String),
}

impl CommandKind {
    pub fn resolve(name: &str) -> Self {
        match name {
            ASSIGNMENT => CommandKind::Assign,
            "cat" => CommandKind::Cat,
            "echo" => CommandKind::Echo,
            "wc" => CommandKind::Wc,
            "pwd" => CommandKind::Pwd,
            "exit" => CommandKind::Exit,
            "grep" => CommandKind::Grep,
            other => CommandKind::External(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CommandKind::Assign => ASSIGNMENT,
            CommandKind::Cat => "cat",
            CommandKind::Echo => "echo",
            CommandKind::Wc => "wc",
            CommandKind::Pwd => "pwd",
            CommandKind::Exit => "exit",
            CommandKind::Grep => "grep",
            CommandKind::External(name) => name,
        }
    }
}

/// One stage of a pipeline: a resolved command plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    kind: CommandKind,
    args: Vec<String>,
}

impl CommandDescriptor {
    pub fn new(kind: CommandKind, args: Vec<String>) -> Self {
        Self { kind, args }
    }

    /// Descriptor for `name` with `args`, resolving the name to its kind.
    pub fn named<S: Into<String>>(name: &str, args: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            CommandKind::resolve(name),
            args.into_iter().map(Into::into).collect(),
        )
    }

    /// Descriptor that binds `name` to `value` when run.
    pub fn assignment(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(CommandKind::Assign, vec![name.into(), value.into()])
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Errors that can occur while grouping tokens into a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The token sequence ended right after a `|`.
    #[error("Expected command after pipe")]
    ExpectedCommand,
}

#[derive(Debug)]
enum BuilderState {
    WaitingCommand,
    WaitingArgsOrPipe(CommandKind),
}

struct PipelineBuilder {
    state: BuilderState,
    args: Vec<String>,
    pipeline: Vec<CommandDescriptor>,
}

impl PipelineBuilder {
    fn new() -> Self {
        PipelineBuilder {
            state: BuilderState::WaitingCommand,
            args: Vec::new(),
            pipeline: Vec::new(),
        }
    }

    fn feed(&mut self, token: &str) {
        match std::mem::replace(&mut self.state, BuilderState::WaitingCommand) {
            BuilderState::WaitingCommand => {
                let kind = match split_assignment(token) {
                    Some((name, value)) => {
                        self.args = vec![name.to_string(), value.to_string()];
                        CommandKind::Assign
                    }
                    None => CommandKind::resolve(token),
                };
                self.state = BuilderState::WaitingArgsOrPipe(kind);
            }
            BuilderState::WaitingArgsOrPipe(kind) if token == PIPE => self.close(kind),
            BuilderState::WaitingArgsOrPipe(kind) => {
                self.args.push(token.to_string());
                self.state = BuilderState::WaitingArgsOrPipe(kind);
            }
        }
    }

    fn close(&mut self, kind: CommandKind) {
        let args = std::mem::take(&mut self.args);
        self.pipeline.push(CommandDescriptor::new(kind, args));
    }

    fn finish(mut self) -> Result<Vec<CommandDescriptor>, ParseError> {
        match std::mem::replace(&mut self.state, BuilderState::WaitingCommand) {
            BuilderState::WaitingArgsOrPipe(kind) => {
                self.close(kind);
                Ok(self.pipeline)
            }
            BuilderState::WaitingCommand => Err(ParseError::ExpectedCommand),
        }
    }
}

/// Splits `name=value` on the first `=`. The name must not be empty; the value may
/// be empty or contain further `=`.
fn split_assignment(token: &str) -> Option<(&str, &str)> {
    match token.split_once('=') {
        Some((name, value)) if !name.is_empty() => Some((name, value)),
        _ => None,
    }
}

/// Groups a fully expanded token sequence into pipeline stages.
///
/// Stages are separated by [`PIPE`] tokens. The first token of each stage is the
/// command name, unless it has the form `name=value`, which makes the stage an
/// assignment. An empty sequence gives an empty pipeline.
pub fn interpret<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<CommandDescriptor>, ParseError> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = PipelineBuilder::new();
    for token in tokens {
        builder.feed(token.as_ref());
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(name: &str, args: &[&str]) -> CommandDescriptor {
        CommandDescriptor::named(name, args.iter().copied())
    }

    #[test]
    fn test_empty_input_is_empty_pipeline() {
        let tokens: [&str; 0] = [];
        assert_eq!(interpret(&tokens), Ok(vec![]));
    }

    #[test]
    fn test_pipe_separates_stages() {
        assert_eq!(
            interpret(&["a", "|", "b", "c"]),
            Ok(vec![cmd("a", &[]), cmd("b", &["c"])])
        );
        assert_eq!(
            interpret(&["ls", "-a", "-l", "|", "echo"]),
            Ok(vec![cmd("ls", &["-a", "-l"]), cmd("echo", &[])])
        );
        assert_eq!(
            interpret(&["pwd", "|", "wc", "hello.txt"]),
            Ok(vec![cmd("pwd", &[]), cmd("wc", &["hello.txt"])])
        );
    }

    #[test]
    fn test_names_resolve_to_kinds() {
        let pipeline = interpret(&["cat", "kitty.txt", "|", "kitty=hello", "|", "exit"]).unwrap();
        let kinds: Vec<&CommandKind> = pipeline.iter().map(CommandDescriptor::kind).collect();
        assert_eq!(
            kinds,
            vec![&CommandKind::Cat, &CommandKind::Assign, &CommandKind::Exit]
        );
        assert_eq!(pipeline[1].args(), ["kitty", "hello"]);

        let pipeline = interpret(&["python3", "-c", "print(1)"]).unwrap();
        assert_eq!(
            pipeline[0].kind(),
            &CommandKind::External("python3".to_string())
        );
    }

    #[test]
    fn test_assignment_splits_on_first_equals() {
        assert_eq!(
            interpret(&["x=5"]),
            Ok(vec![CommandDescriptor::assignment("x", "5")])
        );
        assert_eq!(
            interpret(&["x="]),
            Ok(vec![CommandDescriptor::assignment("x", "")])
        );
        assert_eq!(
            interpret(&["x=a=b"]),
            Ok(vec![CommandDescriptor::assignment("x", "a=b")])
        );
        assert_eq!(interpret(&["x=1"]).unwrap()[0].name(), ASSIGNMENT);
    }

    #[test]
    fn test_equals_without_name_is_a_command() {
        assert_eq!(
            interpret(&["=5"]),
            Ok(vec![CommandDescriptor::new(
                CommandKind::External("=5".to_string()),
                vec![]
            )])
        );
    }

    #[test]
    fn test_assignment_form_only_in_command_position() {
        assert_eq!(
            interpret(&["echo", "x=5"]),
            Ok(vec![cmd("echo", &["x=5"])])
        );
    }

    #[test]
    fn test_trailing_pipe_is_an_error() {
        assert_eq!(interpret(&["a", "|"]), Err(ParseError::ExpectedCommand));
        assert_eq!(
            interpret(&["a", "|", "b", "|"]),
            Err(ParseError::ExpectedCommand)
        );
        assert_eq!(
            ParseError::ExpectedCommand.to_string(),
            "Expected command after pipe"
        );
    }

    #[test]
    fn test_descriptor_equality_and_display() {
        assert_eq!(cmd("echo", &["a", "b"]), cmd("echo", &["a", "b"]));
        assert_ne!(cmd("echo", &["a"]), cmd("echo", &["b"]));
        assert_eq!(cmd("grep", &["-i", "x"]).to_string(), "grep -i x");
    }
}
