//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{error, info};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::InfrastructureStarting { services } => {
                info!(
                    services = %services.join(","),
                    "Starting infrastructure services via Docker..."
                );
            }
            ProgressEvent::InfrastructureStarted { warmup } => {
                info!(
                    warmup_secs = warmup.as_secs(),
                    "Waiting for infrastructure services to be ready..."
                );
            }
            ProgressEvent::ServiceStarting {
                service,
                index,
                total,
            } => {
                info!(
                    service = %service,
                    progress = format!("{}/{}", index, total),
                    "Launching service"
                );
            }
            ProgressEvent::ServiceReady { service, duration } => {
                info!(
                    service = %service,
                    duration_ms = duration.as_millis(),
                    "Service started"
                );
            }
            ProgressEvent::ServiceFailed { service, error } => {
                error!(service = %service, error = %error, "Failed to start {}", service);
            }
            ProgressEvent::Stalled { pending } => {
                error!(
                    pending = %pending.join(","),
                    "Circular dependency detected or unable to start services"
                );
            }
            ProgressEvent::Completed {
                started,
                total_time,
            } => {
                info!(
                    started,
                    total_time_ms = total_time.as_millis(),
                    "All services started successfully!"
                );
            }
        }
    }
}
