//! stackup - start a local microservice stack in dependency order
//!
//! Brings up infrastructure containers with docker-compose, then builds and
//! launches each application service in its own terminal window once every
//! service it depends on reports ready on its HTTP readiness endpoint.
//!
//! # Core Concepts
//!
//! - **Topology**: the ordered list of services, their ports, source
//!   directories and dependencies
//! - **Launcher**: brings one service from "not running" to "ready"
//! - **Scheduler**: repeatedly scans the topology and launches the first
//!   service whose dependencies have all started, until every service is up
//!   or no progress is possible
//!
//! # Example Usage
//!
//! ```no_run
//! use stackup::{plan, StackConfig};
//!
//! let config = StackConfig::load(None)?;
//! for service in plan(&config.topology)? {
//!     println!("{} -> {}", service.name, service.url());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Project Structure
//!
//! - [`topology`]: service descriptions and structural validation
//! - [`runner`]: external command execution
//! - [`health`]: readiness probing and polling
//! - [`launcher`]: build, terminal spawn and readiness for one service
//! - [`scheduler`]: infrastructure start and dependency-ordered startup
//! - [`config`]: defaults, TOML file and environment overrides

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod launcher;
pub mod progress;
pub mod runner;
pub mod scheduler;
pub mod topology;
pub mod util;

pub use config::{ConfigError, ReadinessSettings, StackConfig};
pub use error::{LaunchError, SchedulerError};
pub use health::{HealthProbe, HttpHealthChecker, ReadinessWaiter};
pub use launcher::{DryRunLauncher, LaunchSettings, ServiceLauncher, TerminalLauncher};
pub use progress::{LoggingHandler, NoOpHandler, ProgressEvent, ProgressHandler};
pub use runner::{CommandRunner, CommandSpec, DetachedProcess, SystemRunner};
pub use scheduler::{plan, InfrastructureSettings, StartedSet, TopologyScheduler};
pub use topology::{ServiceSpec, Topology, TopologyError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_stackup() {
        assert_eq!(NAME, "stackup");
    }
}
