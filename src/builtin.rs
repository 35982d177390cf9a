use crate::scope::Scope;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use regex::{Regex, RegexBuilder};
use std::fs;
use thiserror::Error;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process. They read the previous stage's output as their input and return
/// their own output as a string.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cat".
    fn name() -> &'static str;

    fn execute(self, input: Option<String>, scope: &mut Scope) -> Result<String>;
}

/// Wrong number or shape of arguments for a built-in.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ArgumentError(pub String);

/// Parses `args` for `T` and executes it.
///
/// `--help` is not an error: the usage text becomes the command's output.
pub(crate) fn run<T: BuiltinCommand>(
    args: &[&str],
    input: Option<String>,
    scope: &mut Scope,
) -> Result<String> {
    match T::from_args(&[T::name()], args) {
        Ok(cmd) => cmd.execute(input, scope),
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => Ok(output.trim_end().to_string()),
        Err(EarlyExit {
            output,
            status: Err(()),
        }) => Err(ArgumentError(output.trim_end().to_string()).into()),
    }
}

/// `name=value`, always exactly two arguments.
pub struct Assignment {
    pub name: String,
    pub value: String,
}

// Hand-written: the value is arbitrary text and may look like a flag.
impl FromArgs for Assignment {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        match args {
            [name, value] => Ok(Assignment {
                name: name.to_string(),
                value: value.to_string(),
            }),
            _ => Err(EarlyExit {
                output: "assignment expects a variable name and a value".to_string(),
                status: Err(()),
            }),
        }
    }
}

impl BuiltinCommand for Assignment {
    fn name() -> &'static str {
        crate::parser::ASSIGNMENT
    }

    fn execute(self, _input: Option<String>, scope: &mut Scope) -> Result<String> {
        scope.set(self.name, self.value);
        Ok(String::new())
    }
}

/// Returns its arguments separated by single spaces.
pub struct Echo {
    pub args: Vec<String>,
}

// Hand-written: every argument is printed verbatim, including ones starting with `-`.
impl FromArgs for Echo {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Echo {
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, _input: Option<String>, _scope: &mut Scope) -> Result<String> {
        Ok(self.args.join(" "))
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
pub struct Pwd {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, _input: Option<String>, _scope: &mut Scope) -> Result<String> {
        let cwd = std::env::current_dir().context("pwd: can't read current directory")?;
        Ok(cwd.to_string_lossy().into_owned())
    }
}

#[derive(FromArgs)]
/// Shut down the shell.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    // The REPL stops before running a lone `exit`; inside a pipeline it produces nothing.
    fn execute(self, _input: Option<String>, _scope: &mut Scope) -> Result<String> {
        Ok(String::new())
    }
}

/// Contents of `file` if given, otherwise the piped input.
fn file_or_input(command: &str, file: Option<&str>, input: Option<String>) -> Result<String> {
    match (file, input) {
        (Some(file), _) => {
            fs::read_to_string(file).with_context(|| format!("{}: {}", command, file))
        }
        (None, Some(input)) => Ok(input),
        (None, None) => {
            Err(ArgumentError(format!("{}: expected a file name or piped input", command)).into())
        }
    }
}

#[derive(FromArgs)]
/// Print a file, or pass piped input through.
pub struct Cat {
    #[argh(positional)]
    /// file to print; piped input is used when omitted
    pub file: Option<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(self, input: Option<String>, _scope: &mut Scope) -> Result<String> {
        file_or_input(Self::name(), self.file.as_deref(), input)
    }
}

#[derive(FromArgs)]
/// Count lines, words and characters.
pub struct Wc {
    #[argh(positional)]
    /// file to count; piped input is used when omitted
    pub file: Option<String>,
}

impl BuiltinCommand for Wc {
    fn name() -> &'static str {
        "wc"
    }

    fn execute(self, input: Option<String>, _scope: &mut Scope) -> Result<String> {
        let text = file_or_input(Self::name(), self.file.as_deref(), input)?;
        let lines = text.split('\n').count();
        let words = text.split_whitespace().count();
        let chars = text.chars().count();
        Ok(format!("{} {} {}", lines, words, chars))
    }
}

#[derive(FromArgs)]
/// Print lines matching a pattern.
pub struct Grep {
    #[argh(positional)]
    /// the pattern to search for (a regular expression)
    pub pattern: String,

    #[argh(positional)]
    /// file to search; piped input is used when omitted
    pub file: Option<String>,

    #[argh(switch, short = 'w')]
    /// match only whole words (using non-word characters as boundaries)
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,

    #[argh(option, short = 'A', default = "0")]
    /// print NUM lines of trailing context after matching lines
    pub after_context: usize,
}

impl Grep {
    fn regex(&self) -> Result<Regex> {
        let pattern = if self.word_regexp {
            format!(r"\b({})\b", self.pattern)
        } else {
            self.pattern.clone()
        };
        RegexBuilder::new(&pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .with_context(|| format!("grep: invalid pattern: {}", pattern))
    }

    /// Selected lines, with `--` between groups that are not adjacent when
    /// trailing context is requested.
    fn select<'t>(&self, text: &'t str, re: &Regex) -> Vec<&'t str> {
        let lines: Vec<&str> = text.lines().collect();
        let mut keep = vec![false; lines.len()];
        for (i, line) in lines.iter().enumerate() {
            if re.is_match(line) {
                let end = (i + self.after_context + 1).min(lines.len());
                keep[i..end].fill(true);
            }
        }

        let mut out = Vec::new();
        let mut last: Option<usize> = None;
        for (i, line) in lines.iter().enumerate().filter(|(i, _)| keep[*i]) {
            if self.after_context > 0 && last.is_some_and(|l| i > l + 1) {
                out.push("--");
            }
            out.push(*line);
            last = Some(i);
        }
        out
    }
}

impl BuiltinCommand for Grep {
    fn name() -> &'static str {
        "grep"
    }

    fn execute(self, input: Option<String>, _scope: &mut Scope) -> Result<String> {
        let re = self.regex()?;
        let text = file_or_input(Self::name(), self.file.as_deref(), input)?;
        Ok(self.select(&text, &re).join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("temp file");
        write!(f, "{}", content).expect("write temp file");
        f
    }

    fn path_of(f: &NamedTempFile) -> String {
        f.path().to_string_lossy().into_owned()
    }

    fn grep(pattern: &str) -> Grep {
        Grep {
            pattern: pattern.to_string(),
            file: None,
            word_regexp: false,
            ignore_case: false,
            after_context: 0,
        }
    }

    #[test]
    fn test_echo_joins_arguments() {
        let out = run::<Echo>(&["hello", "kitty"], None, &mut Scope::new()).unwrap();
        assert_eq!(out, "hello kitty");

        let out = run::<Echo>(&[], Some("input".to_string()), &mut Scope::new()).unwrap();
        assert_eq!(out, "");

        let out = run::<Echo>(&["-la", "--help"], None, &mut Scope::new()).unwrap();
        assert_eq!(out, "-la --help");
    }

    #[test]
    fn test_pwd_ignores_arguments_and_input() {
        let cwd = std::env::current_dir().unwrap().to_string_lossy().into_owned();
        assert_eq!(run::<Pwd>(&[], None, &mut Scope::new()).unwrap(), cwd);
        assert_eq!(
            run::<Pwd>(&["a", "b", "c"], None, &mut Scope::new()).unwrap(),
            cwd
        );
        assert_eq!(
            run::<Pwd>(&[], Some("abc".to_string()), &mut Scope::new()).unwrap(),
            cwd
        );
    }

    #[test]
    fn test_cat_reads_input_or_file() {
        let out = run::<Cat>(&[], Some("kitty".to_string()), &mut Scope::new()).unwrap();
        assert_eq!(out, "kitty");

        let f = file_with("hello kitty");
        let path = path_of(&f);
        assert_eq!(
            run::<Cat>(&[path.as_str()], None, &mut Scope::new()).unwrap(),
            "hello kitty"
        );
        // A file argument wins over piped input.
        assert_eq!(
            run::<Cat>(&[path.as_str()], Some("world".to_string()), &mut Scope::new()).unwrap(),
            "hello kitty"
        );
    }

    #[test]
    fn test_cat_without_file_or_input_errors() {
        let err = run::<Cat>(&[], None, &mut Scope::new()).unwrap_err();
        assert!(err.downcast_ref::<ArgumentError>().is_some());

        assert!(run::<Cat>(&["a", "b"], None, &mut Scope::new()).is_err());
    }

    #[test]
    fn test_cat_missing_file_names_it() {
        let err = run::<Cat>(&["/definitely/not/here.txt"], None, &mut Scope::new()).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }

    #[test]
    fn test_wc_counts_input_and_file() {
        let out = run::<Wc>(&[], Some("hello\nkitty".to_string()), &mut Scope::new()).unwrap();
        assert_eq!(out, "2 2 11");

        let f = file_with("hello\nkitty");
        let path = path_of(&f);
        assert_eq!(
            run::<Wc>(&[path.as_str()], None, &mut Scope::new()).unwrap(),
            "2 2 11"
        );
        assert_eq!(
            run::<Wc>(&[path.as_str()], Some("world".to_string()), &mut Scope::new()).unwrap(),
            "2 2 11"
        );
    }

    #[test]
    fn test_wc_rejects_bad_arguments() {
        assert!(run::<Wc>(&[], None, &mut Scope::new()).is_err());
        assert!(run::<Wc>(&["a", "b"], Some("x".to_string()), &mut Scope::new()).is_err());
    }

    #[test]
    fn test_exit_takes_no_arguments() {
        assert_eq!(run::<Exit>(&[], None, &mut Scope::new()).unwrap(), "");
        assert!(run::<Exit>(&["1"], None, &mut Scope::new()).is_err());
    }

    #[test]
    fn test_help_is_output_not_error() {
        let out = run::<Wc>(&["--help"], None, &mut Scope::new()).unwrap();
        assert!(out.contains("Usage: wc"));
    }

    #[test]
    fn test_assignment_sets_and_overwrites() {
        let mut scope = Scope::new();
        run::<Assignment>(&["hello", "kitty"], None, &mut scope).unwrap();
        assert_eq!(scope.get("hello"), Some("kitty"));

        run::<Assignment>(&["hello", "-world"], None, &mut scope).unwrap();
        assert_eq!(scope.get("hello"), Some("-world"));
        assert_eq!(scope.len(), 1);

        assert!(run::<Assignment>(&[], None, &mut scope).is_err());
    }

    #[test]
    fn test_grep_filters_piped_input() {
        let re = grep("pipe").regex().unwrap();
        let text = "Line 1\nLine with pipe target\nLine 3\n";
        assert_eq!(grep("pipe").select(text, &re), vec!["Line with pipe target"]);
    }

    #[test]
    fn test_grep_ignore_case_and_word() {
        let mut g = grep("target");
        g.ignore_case = true;
        let re = g.regex().unwrap();
        assert_eq!(
            g.select("Target 1\nTaRgEt 2\nNo match\n", &re),
            vec!["Target 1", "TaRgEt 2"]
        );

        let mut g = grep("cat");
        g.word_regexp = true;
        let re = g.regex().unwrap();
        assert_eq!(g.select("cat\nconcatenate\na cat here", &re), vec!["cat", "a cat here"]);
    }

    #[test]
    fn test_grep_trailing_context_separates_groups() {
        let mut g = grep("MATCH");
        g.after_context = 1;
        let re = g.regex().unwrap();
        let text = "Line 1\nMATCH 1\nLine 3\nLine 4\nMATCH 2\nLine 6\nLine 7\n";
        assert_eq!(
            g.select(text, &re),
            vec!["MATCH 1", "Line 3", "--", "MATCH 2", "Line 6"]
        );
    }

    #[test]
    fn test_grep_overlapping_context_merges() {
        let mut g = grep("MATCH");
        g.after_context = 2;
        let re = g.regex().unwrap();
        let text = "MATCH 1\nLine 2\nMATCH 2\nLine 4\nLine 5\nLine 6\n";
        assert_eq!(
            g.select(text, &re),
            vec!["MATCH 1", "Line 2", "MATCH 2", "Line 4", "Line 5"]
        );
    }

    #[test]
    fn test_grep_parses_flags_and_reads_file() {
        let f = file_with("alpha\nBeta\ngamma\n");
        let path = path_of(&f);
        let out = run::<Grep>(&["-i", "beta", path.as_str()], None, &mut Scope::new()).unwrap();
        assert_eq!(out, "Beta");

        let out = run::<Grep>(&["-A", "1", "alpha"], Some("alpha\nBeta\ngamma".into()), &mut Scope::new())
            .unwrap();
        assert_eq!(out, "alpha\nBeta");
    }

    #[test]
    fn test_grep_invalid_pattern_errors() {
        assert!(run::<Grep>(&["("], Some("x".into()), &mut Scope::new()).is_err());
    }
}
