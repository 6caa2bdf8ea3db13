//! Real process execution via `std::process`

use super::{CommandOutput, CommandRunner, CommandSpec, DetachedProcess};
use crate::error::LaunchError;
use chrono::Utc;
use std::process::Stdio;
use tracing::{debug, error, info};

/// Runs commands as child processes of the current process
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, LaunchError> {
        let command_line = spec.to_string();
        debug!(command = %command_line, cwd = ?spec.cwd, "Running command");

        let output = spec
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| {
                error!(command = %command_line, error = %source, "Failed to start command");
                LaunchError::Spawn {
                    command: command_line.clone(),
                    source,
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            info!("Success: {}", command_line);
            return Ok(CommandOutput { stdout, stderr });
        }

        error!("Error running {}:", command_line);
        error!("STDOUT: {}", stdout);
        error!("STDERR: {}", stderr);

        Err(LaunchError::CommandFailure {
            command: command_line,
            code: output.status.code(),
            stdout,
            stderr,
        })
    }

    fn spawn_detached(
        &self,
        label: &str,
        spec: &CommandSpec,
    ) -> Result<DetachedProcess, LaunchError> {
        let command_line = spec.to_string();
        debug!(label, command = %command_line, "Spawning detached process");

        let child = spec
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let process = DetachedProcess {
            label: label.to_string(),
            pid: child.id(),
            command: command_line,
            spawned_at: Utc::now(),
        };

        // Dropping the Child neither waits on nor kills the process.
        drop(child);

        info!(label, pid = process.pid, "Spawned detached process");
        Ok(process)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_captures_stdout() {
        let output = SystemRunner
            .run(&CommandSpec::shell("echo hello"))
            .expect("echo should succeed");
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_run_in_working_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let output = SystemRunner
            .run(&CommandSpec::exec("ls", Vec::<String>::new()).in_dir(dir.path()))
            .expect("ls should succeed");
        assert!(output.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_non_zero_exit_is_command_failure() {
        let err = SystemRunner
            .run(&CommandSpec::shell("echo out; echo err >&2; exit 3"))
            .unwrap_err();

        match err {
            LaunchError::CommandFailure {
                code,
                stdout,
                stderr,
                ..
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(stdout.trim(), "out");
                assert_eq!(stderr.trim(), "err");
            }
            other => panic!("Expected CommandFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = SystemRunner
            .run(&CommandSpec::exec(
                "stackup-definitely-missing-binary",
                Vec::<String>::new(),
            ))
            .unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[test]
    fn test_spawn_detached_returns_handle() {
        let process = SystemRunner
            .spawn_detached("sleeper", &CommandSpec::shell("exit 0"))
            .expect("spawn should succeed");
        assert_eq!(process.label, "sleeper");
        assert_eq!(process.command, "exit 0");
        assert!(process.pid > 0);
    }
}
