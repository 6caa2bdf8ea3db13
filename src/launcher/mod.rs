//! Starting one application service

mod mock;
mod terminal;

pub use mock::MockLauncher;
pub use terminal::{
    render_terminal_command, LaunchSettings, TerminalLauncher, DEFAULT_GRACE_PERIOD,
};

use crate::error::LaunchError;
use crate::runner::DetachedProcess;
use crate::topology::ServiceSpec;
use tracing::debug;

/// Brings a single service from "not running" to "ready"
pub trait ServiceLauncher: Send + Sync {
    /// Returns the handle of any process left running for the service
    fn launch(&self, service: &ServiceSpec) -> Result<Option<DetachedProcess>, LaunchError>;
}

/// Launcher that starts nothing and reports every service as ready
///
/// Driving the scheduler with it yields the start order without side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunLauncher;

impl ServiceLauncher for DryRunLauncher {
    fn launch(&self, service: &ServiceSpec) -> Result<Option<DetachedProcess>, LaunchError> {
        debug!(service = %service.name, "Dry run: skipping launch");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_launches_nothing() {
        let service = ServiceSpec::new("config-server", 8071, "/tmp/config-server");
        assert!(DryRunLauncher.launch(&service).unwrap().is_none());
    }
}
