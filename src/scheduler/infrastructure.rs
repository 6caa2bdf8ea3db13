use crate::runner::CommandSpec;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WARMUP: Duration = Duration::from_secs(10);

/// Container-orchestrated dependencies started before any application service
///
/// Their readiness is never checked. After `up -d` returns the scheduler only
/// sleeps for `warmup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfrastructureSettings {
    pub compose_command: Vec<String>,
    pub compose_file: PathBuf,
    pub services: Vec<String>,
    pub warmup: Duration,
}

impl Default for InfrastructureSettings {
    fn default() -> Self {
        Self {
            compose_command: vec!["docker-compose".to_string()],
            compose_file: PathBuf::from("docker-compose.yaml"),
            services: vec![
                "redis".to_string(),
                "rabbit".to_string(),
                "customerdb".to_string(),
            ],
            warmup: DEFAULT_WARMUP,
        }
    }
}

impl InfrastructureSettings {
    /// Settings that start nothing
    pub fn disabled() -> Self {
        Self {
            services: Vec::new(),
            warmup: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.services.is_empty() && !self.compose_command.is_empty()
    }

    /// `<compose> -f <file> up -d <services...>`, or `None` when disabled
    pub fn up_command(&self) -> Option<CommandSpec> {
        if !self.is_enabled() {
            return None;
        }

        let mut argv = self.compose_command.clone();
        argv.push("-f".to_string());
        argv.push(self.compose_file.display().to_string());
        argv.push("up".to_string());
        argv.push("-d".to_string());
        argv.extend(self.services.iter().cloned());

        CommandSpec::from_argv(&argv)
    }
}
