use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// A program that is not a builtin, resolved to a path on disk.
#[derive(Debug)]
pub struct ExternalCommand {
    name: String,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    /// Looks `name` up the way a typical shell would, using the process `PATH`.
    pub fn resolve(name: &str, args: &[&str]) -> Result<Self> {
        let search_paths = std::env::var_os("PATH").unwrap_or_default();
        let program = find_command_path(&search_paths, Path::new(name))
            .with_context(|| format!("command not found: {}", name))?
            .into_owned();
        debug!("resolved `{}` to {}", name, program.display());
        Ok(Self {
            name: name.to_string(),
            program,
            args: args.iter().map(OsString::from).collect(),
        })
    }

    /// Spawns the program, feeds it `input` on stdin and collects its stdout.
    ///
    /// A non-zero exit status is an error. Trailing whitespace is stripped from
    /// the output.
    pub fn run(self, input: Option<String>) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("{}: failed to start", self.name))?;

        // Written from its own thread so a child that fills its stdout pipe before
        // draining stdin cannot deadlock against us. Dropping the handle closes
        // the pipe, so the child sees end of input.
        let writer = match (child.stdin.take(), input) {
            (Some(mut stdin), Some(input)) => Some(thread::spawn(move || {
                match stdin.write_all(input.as_bytes()) {
                    // The child may exit without reading everything; its status decides.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("{}: failed to wait", self.name))?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| anyhow!("{}: input writer panicked", self.name))?
                .with_context(|| format!("{}: failed to write input", self.name))?;
        }
        if !output.status.success() {
            bail!("{}: {}", self.name, output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

/// Resolve a command path the way a typical shell would.
///
/// - Absolute path: returns it if it exists.
/// - `./foo`: returns it if it exists.
/// - Relative with several components (e.g. `bin/sh`): returns it if it exists.
/// - Single component: the first existing match in `search_paths` (PATH).
/// - Empty path: `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() || path.starts_with("./") {
        return existing(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(single), None) => find_in_path(search_paths, single.as_os_str()).map(Cow::Owned),
        _ => existing(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| candidate.is_file())
}

fn existing(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
