//! Output formatting for multiple formats
//!
//! Every command result can be rendered as JSON, YAML or human-readable text.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::runner::DetachedProcess;
use crate::topology::{ServiceSpec, Topology};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// A running service and the terminal window it was opened in
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub name: String,
    pub port: u16,
    pub url: String,
    pub pid: Option<u32>,
}

/// Result of a successful `up`
#[derive(Debug, Clone, Serialize)]
pub struct StartupSummary {
    pub services: Vec<ServiceEndpoint>,
    pub elapsed_secs: u64,
}

impl StartupSummary {
    pub fn new(topology: &Topology, processes: &[DetachedProcess], elapsed: Duration) -> Self {
        let services = topology
            .services()
            .iter()
            .map(|service| ServiceEndpoint {
                name: service.name.clone(),
                port: service.port,
                url: service.url(),
                pid: processes
                    .iter()
                    .find(|p| p.label == service.name)
                    .map(|p| p.pid),
            })
            .collect();

        Self {
            services,
            elapsed_secs: elapsed.as_secs(),
        }
    }
}

/// One entry of a start plan
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanStep {
    pub step: usize,
    pub name: String,
    pub port: u16,
    pub path: String,
    pub depends_on: Vec<String>,
}

impl PlanStep {
    pub fn from_order(order: &[ServiceSpec]) -> Vec<Self> {
        order
            .iter()
            .enumerate()
            .map(|(i, service)| Self {
                step: i + 1,
                name: service.name.clone(),
                port: service.port,
                path: service.path.display().to_string(),
                depends_on: service.depends_on.clone(),
            })
            .collect()
    }
}

/// Readiness of a single service
#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub service: String,
    pub url: String,
    /// Whether the service reported ready
    pub available: bool,
    /// Status message
    pub message: String,
}

impl HealthStatus {
    pub fn available(service: &ServiceSpec, url: String) -> Self {
        Self {
            service: service.name.clone(),
            url,
            available: true,
            message: "Ready".to_string(),
        }
    }

    pub fn unavailable(service: &ServiceSpec, url: String) -> Self {
        Self {
            service: service.name.clone(),
            url,
            available: false,
            message: "Not ready or unreachable".to_string(),
        }
    }
}

/// Output formatter for command results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_summary(&self, summary: &StartupSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary)
                .context("Failed to serialize startup summary to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(summary).context("Failed to serialize startup summary to YAML")
            }
            OutputFormat::Human => Ok(self.format_summary_human(summary)),
        }
    }

    pub fn format_plan(&self, steps: &[PlanStep]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(steps).context("Failed to serialize plan to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(steps).context("Failed to serialize plan to YAML")
            }
            OutputFormat::Human => Ok(self.format_plan_human(steps)),
        }
    }

    pub fn format_health(&self, results: &[HealthStatus]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(results)
                .context("Failed to serialize health status to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(results).context("Failed to serialize health status to YAML")
            }
            OutputFormat::Human => Ok(self.format_health_human(results)),
        }
    }

    pub fn format_config(&self, config: &BTreeMap<String, String>) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(config).context("Failed to serialize config to YAML")
            }
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str("Stackup Configuration\n");
                output.push_str(RULE);
                output.push_str("\n\n");
                for (key, value) in config {
                    output.push_str(&format!("  {:<18} {}\n", key, value));
                }
                Ok(output)
            }
        }
    }

    fn format_summary_human(&self, summary: &StartupSummary) -> String {
        let mut output = String::new();

        output.push_str("\u{2713} All services started successfully!\n");
        output.push_str(RULE);
        output.push_str("\n\nServices running on:\n");
        for service in &summary.services {
            output.push_str(&format!("- {}: {}", service.name, service.url));
            if let Some(pid) = service.pid {
                output.push_str(&format!("  (terminal pid {})", pid));
            }
            output.push('\n');
        }
        output.push_str(&format!("\nStarted in {}s\n", summary.elapsed_secs));
        output.push_str("\nTo stop all services, press Ctrl+C in each terminal window.\n");

        output
    }

    fn format_plan_human(&self, steps: &[PlanStep]) -> String {
        let mut output = String::new();

        output.push_str("Start Order\n");
        output.push_str(RULE);
        output.push_str("\n\n");
        for step in steps {
            output.push_str(&format!("{}. {} (:{})\n", step.step, step.name, step.port));
            if step.depends_on.is_empty() {
                output.push_str("   \u{2514}\u{2500} no dependencies\n");
            } else {
                output.push_str(&format!(
                    "   \u{2514}\u{2500} after {}\n",
                    step.depends_on.join(", ")
                ));
            }
        }

        output
    }

    fn format_health_human(&self, results: &[HealthStatus]) -> String {
        let mut output = String::new();

        output.push_str("Service Health Status\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        for status in results {
            let symbol = if status.available {
                "\u{2713}"
            } else {
                "\u{2717}"
            };
            output.push_str(&format!("{} {}\n", symbol, status.service));
            output.push_str(&format!("  URL: {}\n", status.url));
            output.push_str(&format!("  Status: {}\n\n", status.message));
        }

        output
    }
}
