//! Single-shot HTTP readiness check

use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Spring Boot actuator readiness endpoint
pub const DEFAULT_HEALTH_PATH: &str = "/actuator/health/readiness";

/// Connect and request timeout for a single probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Byte sequence a healthy response body must contain
pub const READY_MARKER: &[u8] = b"UP";

/// Something that can tell whether the service on a port is ready
pub trait HealthProbe: Send + Sync {
    fn is_ready(&self, port: u16) -> bool;
}

impl<F> HealthProbe for F
where
    F: Fn(u16) -> bool + Send + Sync,
{
    fn is_ready(&self, port: u16) -> bool {
        self(port)
    }
}

pub fn body_reports_up(body: &[u8]) -> bool {
    body.windows(READY_MARKER.len()).any(|w| w == READY_MARKER)
}

/// Probes `GET http://<host>:<port><path>`
///
/// Ready means status 200 and a body containing `UP`. Every failure mode
/// (refused connection, timeout, other status, other body) maps to `false`.
/// Idle connections are never pooled, so the socket is closed by the time
/// [`HealthProbe::is_ready`] returns.
#[derive(Debug, Clone)]
pub struct HttpHealthChecker {
    client: Client,
    host: String,
    path: String,
}

impl HttpHealthChecker {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            host: "localhost".to_string(),
            path: path.into(),
        })
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self, port: u16) -> String {
        format!("http://{}:{}{}", self.host, port, self.path)
    }

    fn check(&self, port: u16) -> Result<bool, reqwest::Error> {
        let response = self.client.get(self.url(port)).send()?;
        let status = response.status();
        let body = response.bytes()?;

        debug!(port, status = status.as_u16(), "Health check response");
        Ok(status == StatusCode::OK && body_reports_up(&body))
    }
}

impl HealthProbe for HttpHealthChecker {
    fn is_ready(&self, port: u16) -> bool {
        match self.check(port) {
            Ok(ready) => ready,
            Err(e) => {
                debug!(port, error = %e, "Health check failed");
                false
            }
        }
    }
}
