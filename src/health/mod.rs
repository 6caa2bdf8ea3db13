//! HTTP readiness probing and polling

mod checker;
mod waiter;

pub use checker::{
    body_reports_up, HealthProbe, HttpHealthChecker, DEFAULT_HEALTH_PATH, DEFAULT_PROBE_TIMEOUT,
    READY_MARKER,
};
pub use waiter::{ReadinessWaiter, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
