//! Command descriptions and results

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// How a command is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Program plus argument vector, executed directly
    Exec { program: String, args: Vec<String> },

    /// Script string handed to the platform shell
    Shell(String),
}

/// A command together with the directory it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub invocation: Invocation,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn exec<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invocation: Invocation::Exec {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
            cwd: None,
        }
    }

    /// Builds an exec command from a non-empty argv, program first
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::exec(program.clone(), args.iter().cloned()))
    }

    pub fn shell(script: impl Into<String>) -> Self {
        Self {
            invocation: Invocation::Shell(script.into()),
            cwd: None,
        }
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn is_shell(&self) -> bool {
        matches!(self.invocation, Invocation::Shell(_))
    }

    /// Converts into a `std::process::Command` ready to be spawned
    pub(crate) fn to_command(&self) -> Command {
        let mut command = match &self.invocation {
            Invocation::Exec { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            Invocation::Shell(script) => shell_command(script),
        };

        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        command
    }
}

#[cfg(windows)]
fn shell_command(script: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(script);
    cmd
}

#[cfg(not(windows))]
fn shell_command(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.invocation {
            Invocation::Exec { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
            Invocation::Shell(script) => write!(f, "{}", script),
        }
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Handle for a process started with `spawn_detached`
///
/// The process lives outside this program's control: nothing waits on it,
/// signals it or cleans it up, and it keeps running after `stackup` exits.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DetachedProcess {
    pub label: String,
    pub pid: u32,
    pub command: String,
    pub spawned_at: DateTime<Utc>,
}
