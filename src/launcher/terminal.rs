//! Build, open a terminal running the service, wait for readiness

use super::ServiceLauncher;
use crate::error::LaunchError;
use crate::health::{HealthProbe, ReadinessWaiter};
use crate::runner::{CommandRunner, CommandSpec, DetachedProcess};
use crate::topology::ServiceSpec;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

#[cfg(windows)]
const DEFAULT_WRAPPER: &str = "mvnw.cmd";
#[cfg(not(windows))]
const DEFAULT_WRAPPER: &str = "./mvnw";

#[cfg(windows)]
const DEFAULT_TERMINAL_TEMPLATE: &str = r#"start cmd /k "cd /D {path} && {run}""#;
#[cfg(not(windows))]
const DEFAULT_TERMINAL_TEMPLATE: &str =
    r#"ptyxis --new-window -- bash -c "cd {path} && {run}; exec bash""#;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Commands and timings used to launch every service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    /// Build argv, run in the service directory
    pub build_command: Vec<String>,

    /// Command the terminal window runs, substituted for `{run}`
    pub run_command: String,

    /// Shell command that opens the terminal
    ///
    /// Placeholders: `{path}`, `{run}`, `{name}`, `{port}`.
    pub terminal_template: String,

    /// Pause between opening the terminal and the first health probe
    pub grace_period: Duration,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            build_command: vec![
                DEFAULT_WRAPPER.to_string(),
                "clean".to_string(),
                "package".to_string(),
                "-DskipTests".to_string(),
            ],
            run_command: format!("{} spring-boot:run", DEFAULT_WRAPPER),
            terminal_template: DEFAULT_TERMINAL_TEMPLATE.to_string(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

pub fn render_terminal_command(template: &str, run_command: &str, service: &ServiceSpec) -> String {
    template
        .replace("{path}", &service.path.display().to_string())
        .replace("{name}", &service.name)
        .replace("{port}", &service.port.to_string())
        .replace("{run}", run_command)
}

/// The real launcher: build, open a terminal window, wait for readiness
///
/// The terminal is fire-and-forget. Its handle is returned to the caller but
/// nothing here waits on it, and a failed launch does not close windows opened
/// for earlier services.
pub struct TerminalLauncher<R, P> {
    runner: R,
    probe: P,
    settings: LaunchSettings,
    waiter: ReadinessWaiter,
}

impl<R: CommandRunner, P: HealthProbe> TerminalLauncher<R, P> {
    pub fn new(runner: R, probe: P, settings: LaunchSettings, waiter: ReadinessWaiter) -> Self {
        Self {
            runner,
            probe,
            settings,
            waiter,
        }
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn build(&self, service: &ServiceSpec) -> Result<(), LaunchError> {
        let Some(build) = CommandSpec::from_argv(&self.settings.build_command) else {
            debug!(service = %service.name, "No build command configured");
            return Ok(());
        };

        self.runner
            .run(&build.in_dir(&service.path))
            .map(|_| ())
            .map_err(|e| {
                error!("Failed to build {}", service.name);
                e
            })
    }

    fn open_terminal(&self, service: &ServiceSpec) -> Result<DetachedProcess, LaunchError> {
        let command = render_terminal_command(
            &self.settings.terminal_template,
            &self.settings.run_command,
            service,
        );

        self.runner
            .spawn_detached(&service.name, &CommandSpec::shell(command))
            .map_err(|e| {
                error!("Failed to start {}", service.name);
                e
            })
    }
}

impl<R: CommandRunner, P: HealthProbe> ServiceLauncher for TerminalLauncher<R, P> {
    fn launch(&self, service: &ServiceSpec) -> Result<Option<DetachedProcess>, LaunchError> {
        info!("Starting {}...", service.name);

        self.build(service)?;
        let process = self.open_terminal(service)?;

        thread::sleep(self.settings.grace_period);

        self.waiter
            .wait_for(&service.name, service.port, &self.probe)?;

        Ok(Some(process))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockRunner;

    fn fast_settings() -> LaunchSettings {
        LaunchSettings {
            build_command: vec!["mvn".to_string(), "package".to_string()],
            run_command: "mvn spring-boot:run".to_string(),
            terminal_template: "term --title {name} -- sh -c \"cd {path} && {run}\"".to_string(),
            grace_period: Duration::ZERO,
        }
    }

    fn service() -> ServiceSpec {
        ServiceSpec::new("customer-service", 8080, "/repos/crm/customer-service")
    }

    #[test]
    fn test_render_terminal_command() {
        let rendered = render_terminal_command(
            "open {name} on {port}: cd {path} && {run}",
            "./mvnw spring-boot:run",
            &service(),
        );
        assert_eq!(
            rendered,
            "open customer-service on 8080: cd /repos/crm/customer-service && ./mvnw spring-boot:run"
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn test_default_settings() {
        let settings = LaunchSettings::default();
        assert_eq!(
            settings.build_command,
            vec!["./mvnw", "clean", "package", "-DskipTests"]
        );
        assert_eq!(settings.run_command, "./mvnw spring-boot:run");
        assert!(settings.terminal_template.starts_with("ptyxis --new-window"));
        assert_eq!(settings.grace_period, Duration::from_secs(5));
    }

    #[test]
    fn test_launch_builds_then_opens_terminal() {
        let runner = MockRunner::new();
        let launcher = TerminalLauncher::new(
            &runner,
            |_port: u16| true,
            fast_settings(),
            ReadinessWaiter::new(1, Duration::ZERO),
        );

        let process = launcher.launch(&service()).unwrap().unwrap();
        assert_eq!(process.label, "customer-service");

        let recorded = runner.recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].spec.to_string(), "mvn package");
        assert_eq!(
            recorded[0].spec.cwd.as_deref(),
            Some(std::path::Path::new("/repos/crm/customer-service"))
        );
        assert!(recorded[1].detached);
        assert_eq!(
            recorded[1].spec.to_string(),
            "term --title customer-service -- sh -c \"cd /repos/crm/customer-service && mvn spring-boot:run\""
        );
    }

    #[test]
    fn test_build_failure_skips_terminal() {
        let runner = MockRunner::new();
        runner.fail_when("customer-service");
        let launcher = TerminalLauncher::new(
            &runner,
            |_port: u16| true,
            fast_settings(),
            ReadinessWaiter::new(1, Duration::ZERO),
        );

        let err = launcher.launch(&service()).unwrap_err();
        assert!(matches!(err, LaunchError::CommandFailure { .. }));
        assert_eq!(runner.recorded().len(), 1);
    }

    #[test]
    fn test_readiness_timeout_fails_launch() {
        let runner = MockRunner::new();
        let launcher = TerminalLauncher::new(
            &runner,
            |_port: u16| false,
            fast_settings(),
            ReadinessWaiter::new(2, Duration::ZERO),
        );

        let err = launcher.launch(&service()).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::ReadinessTimeout { attempts: 2, .. }
        ));
    }

    #[test]
    fn test_empty_build_command_skips_build() {
        let runner = MockRunner::new();
        let settings = LaunchSettings {
            build_command: Vec::new(),
            ..fast_settings()
        };
        let launcher = TerminalLauncher::new(
            &runner,
            |_port: u16| true,
            settings,
            ReadinessWaiter::new(1, Duration::ZERO),
        );

        launcher.launch(&service()).unwrap();
        let recorded = runner.recorded();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].detached);
    }
}
