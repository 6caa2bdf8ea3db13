//! CommandRunner trait definition

use super::{CommandOutput, CommandSpec, DetachedProcess};
use crate::error::LaunchError;

/// Abstraction over process execution for testability
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, capturing its output
    ///
    /// Blocks until the child exits. A non-zero exit status is reported as
    /// [`LaunchError::CommandFailure`] with the captured stdout/stderr.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, LaunchError>;

    /// Start a command without waiting for it
    ///
    /// The returned handle is informational only; the caller never waits on,
    /// signals or kills the process.
    fn spawn_detached(&self, label: &str, spec: &CommandSpec)
        -> Result<DetachedProcess, LaunchError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, LaunchError> {
        (**self).run(spec)
    }

    fn spawn_detached(
        &self,
        label: &str,
        spec: &CommandSpec,
    ) -> Result<DetachedProcess, LaunchError> {
        (**self).spawn_detached(label, spec)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<T> {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, LaunchError> {
        (**self).run(spec)
    }

    fn spawn_detached(
        &self,
        label: &str,
        spec: &CommandSpec,
    ) -> Result<DetachedProcess, LaunchError> {
        (**self).spawn_detached(label, spec)
    }
}
