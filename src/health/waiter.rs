//! Fixed-interval readiness polling

use super::HealthProbe;
use crate::error::LaunchError;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_MAX_RETRIES: u32 = 30;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Polls a probe until it reports ready or the retry budget runs out
///
/// Every failed attempt is followed by the same fixed `delay`; there is no
/// backoff and no jitter. Worst case wait is `max_retries * delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessWaiter {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for ReadinessWaiter {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ReadinessWaiter {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Returns `true` on the first healthy observation
    pub fn wait<P: HealthProbe + ?Sized>(&self, name: &str, port: u16, probe: &P) -> bool {
        info!("Waiting for {} to be ready...", name);

        for attempt in 1..=self.max_retries {
            if probe.is_ready(port) {
                info!("{} is ready!", name);
                return true;
            }
            thread::sleep(self.delay);
            info!(
                "Still waiting for {}... ({}/{})",
                name, attempt, self.max_retries
            );
        }

        error!("Timed out waiting for {}", name);
        false
    }

    pub fn wait_for<P: HealthProbe + ?Sized>(
        &self,
        name: &str,
        port: u16,
        probe: &P,
    ) -> Result<(), LaunchError> {
        if self.wait(name, port, probe) {
            Ok(())
        } else {
            Err(LaunchError::ReadinessTimeout {
                service: name.to_string(),
                attempts: self.max_retries,
            })
        }
    }

    /// Upper bound on time spent sleeping between attempts
    pub fn worst_case(&self) -> Duration {
        self.delay * self.max_retries
    }
}
