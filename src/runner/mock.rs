use super::{CommandOutput, CommandRunner, CommandSpec, DetachedProcess};
use crate::error::LaunchError;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub spec: CommandSpec,
    pub detached: bool,
}

/// Runner that records commands instead of executing them
///
/// Commands succeed unless their rendered command line or working directory
/// contains one of the patterns registered with [`MockRunner::fail_when`].
pub struct MockRunner {
    recorded: Mutex<Vec<RecordedCommand>>,
    failures: Mutex<Vec<String>>,
    next_pid: AtomicU32,
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            recorded: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            next_pid: AtomicU32::new(1000),
        }
    }

    pub fn fail_when(&self, pattern: impl Into<String>) {
        self.failures.lock().unwrap().push(pattern.into());
    }

    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.recorded.lock().unwrap().clone()
    }

    /// Rendered command lines in execution order
    pub fn command_lines(&self) -> Vec<String> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.spec.to_string())
            .collect()
    }

    fn should_fail(&self, spec: &CommandSpec) -> bool {
        let line = spec.to_string();
        let cwd = spec
            .cwd
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        self.failures
            .lock()
            .unwrap()
            .iter()
            .any(|pattern| line.contains(pattern.as_str()) || cwd.contains(pattern.as_str()))
    }

    fn record(&self, spec: &CommandSpec, detached: bool) {
        self.recorded.lock().unwrap().push(RecordedCommand {
            spec: spec.clone(),
            detached,
        });
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, LaunchError> {
        self.record(spec, false);

        if self.should_fail(spec) {
            return Err(LaunchError::CommandFailure {
                command: spec.to_string(),
                code: Some(1),
                stdout: String::new(),
                stderr: "mock failure".to_string(),
            });
        }

        Ok(CommandOutput::default())
    }

    fn spawn_detached(
        &self,
        label: &str,
        spec: &CommandSpec,
    ) -> Result<DetachedProcess, LaunchError> {
        self.record(spec, true);

        if self.should_fail(spec) {
            return Err(LaunchError::Spawn {
                command: spec.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock failure"),
            });
        }

        Ok(DetachedProcess {
            label: label.to_string(),
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            command: spec.to_string(),
            spawned_at: Utc::now(),
        })
    }
}
