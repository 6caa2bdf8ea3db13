//! Error types for launching services and scheduling a topology

use thiserror::Error;

/// Errors raised while building, spawning or waiting for a single service
#[derive(Debug, Error)]
pub enum LaunchError {
    /// An external command exited with a non-zero status
    #[error("Command `{command}` failed with exit code {}", code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    CommandFailure {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The process could not be started at all
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Health polling exhausted its retry budget
    #[error("Timed out waiting for {service} after {attempts} attempts")]
    ReadinessTimeout { service: String, attempts: u32 },
}

/// Errors that end a scheduling run
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The container-orchestration step failed
    #[error("Failed to start infrastructure services: {0}")]
    Infrastructure(#[source] LaunchError),

    /// A single service failed to start
    #[error("Failed to start {service}: {source}")]
    Launch {
        service: String,
        #[source]
        source: LaunchError,
    },

    /// No eligible service was found while some are still pending
    #[error("Circular dependency detected or unable to start services: {}", pending.join(", "))]
    Stall { pending: Vec<String> },
}

impl SchedulerError {
    /// Name of the service that failed, if the failure belongs to one
    pub fn service(&self) -> Option<&str> {
        match self {
            SchedulerError::Launch { service, .. } => Some(service),
            _ => None,
        }
    }
}
