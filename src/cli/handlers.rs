//! Command handlers
//!
//! Each handler returns the process exit code: 0 on success or user
//! interrupt, 1 on any failure.

use super::commands::{ConfigArgs, HealthArgs, PlanArgs, UpArgs};
use super::output::{HealthStatus, OutputFormat, OutputFormatter, PlanStep, StartupSummary};
use crate::config::StackConfig;
use crate::health::HealthProbe;
use crate::launcher::TerminalLauncher;
use crate::progress::LoggingHandler;
use crate::runner::SystemRunner;
use crate::scheduler::{plan, InfrastructureSettings, TopologyScheduler};
use crate::topology::ServiceSpec;

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const FAILURE_HINT: &str = "Failed to start all services. Check the logs above for details.";

pub async fn handle_up(args: &UpArgs, config_path: Option<&Path>) -> i32 {
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    if args.skip_infra {
        info!("Skipping infrastructure services");
        config.infrastructure = InfrastructureSettings::disabled();
    }

    debug!(
        services = config.topology.len(),
        root = %config.root_dir.display(),
        "Starting stack"
    );

    let format = OutputFormat::from(args.format);
    let startup = tokio::task::spawn_blocking(move || start_stack(config));

    tokio::select! {
        joined = startup => match joined {
            Ok(Ok(summary)) => print_result(OutputFormatter::new(format).format_summary(&summary)),
            Ok(Err(e)) => {
                error!("{:#}", e);
                error!("{}", FAILURE_HINT);
                1
            }
            Err(e) => {
                error!("Startup thread failed: {}", e);
                error!("{}", FAILURE_HINT);
                1
            }
        },
        _ = interrupted() => {
            warn!("Interrupted by user. Services already started keep running.");
            0
        }
    }
}

pub fn handle_plan(args: &PlanArgs, config_path: Option<&Path>) -> i32 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    match plan(&config.topology) {
        Ok(order) => {
            let steps = PlanStep::from_order(&order);
            print_result(OutputFormatter::new(args.format.into()).format_plan(&steps))
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}

pub async fn handle_health(args: &HealthArgs, config_path: Option<&Path>) -> i32 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    let services = match select_services(&config, &args.services) {
        Ok(services) => services,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    let probed = tokio::task::spawn_blocking(move || probe_services(&config, &services)).await;
    let results = match probed {
        Ok(Ok(results)) => results,
        Ok(Err(e)) => {
            error!("{:#}", e);
            return 1;
        }
        Err(e) => {
            error!("Health check thread failed: {}", e);
            return 1;
        }
    };

    let all_available = results.iter().all(|r| r.available);
    let code = print_result(OutputFormatter::new(args.format.into()).format_health(&results));

    if code == 0 && !all_available {
        1
    } else {
        code
    }
}

pub fn handle_config(args: &ConfigArgs, config_path: Option<&Path>) -> i32 {
    match load_config(config_path) {
        Ok(config) => {
            let formatter = OutputFormatter::new(args.format.into());
            print_result(formatter.format_config(&config.to_display_map()))
        }
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<StackConfig> {
    let config = StackConfig::load(path).context("Failed to load configuration")?;
    debug!("{}", config);
    Ok(config)
}

/// Infrastructure first, then every service; blocks until done or failed
fn start_stack(config: StackConfig) -> Result<StartupSummary> {
    let started_at = Instant::now();

    let checker = config
        .readiness
        .checker()
        .context("Failed to create HTTP client for readiness checks")?;
    let launcher = TerminalLauncher::new(
        SystemRunner,
        checker,
        config.launch.clone(),
        config.readiness.waiter(),
    );

    let mut scheduler = TopologyScheduler::new(
        config.topology.clone(),
        config.infrastructure.clone(),
        launcher,
        SystemRunner,
    )
    .with_progress(LoggingHandler);

    scheduler.run()?;

    Ok(StartupSummary::new(
        scheduler.topology(),
        scheduler.processes(),
        started_at.elapsed(),
    ))
}

fn select_services(config: &StackConfig, names: &[String]) -> Result<Vec<ServiceSpec>> {
    if names.is_empty() {
        return Ok(config.topology.services().to_vec());
    }

    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match config.topology.get(name) {
            Some(service) => selected.push(service.clone()),
            None => bail!(
                "Unknown service '{}'. Known services: {}",
                name,
                config.topology.names().collect::<Vec<_>>().join(", ")
            ),
        }
    }
    Ok(selected)
}

fn probe_services(config: &StackConfig, services: &[ServiceSpec]) -> Result<Vec<HealthStatus>> {
    let checker = config
        .readiness
        .checker()
        .context("Failed to create HTTP client")?;

    Ok(services
        .iter()
        .map(|service| {
            let url = checker.url(service.port);
            if checker.is_ready(service.port) {
                HealthStatus::available(service, url)
            } else {
                HealthStatus::unavailable(service, url)
            }
        })
        .collect())
}

fn print_result(formatted: Result<String>) -> i32 {
    match formatted {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            1
        }
    }
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
