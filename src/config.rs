//! Configuration management for stackup
//!
//! Configuration is assembled in three layers, later layers winning:
//!
//! 1. Built-in defaults describing the CRM stack (config-server, eureka-server,
//!    customer-service, notification-service, gateway-server on top of redis,
//!    rabbit and customerdb).
//! 2. An optional TOML file given with `--config` or `STACKUP_CONFIG`.
//! 3. `STACKUP_*` environment variables.
//!
//! # Environment Variables
//!
//! - `STACKUP_CONFIG`: TOML file to load
//! - `STACKUP_ROOT_DIR`: Directory relative service paths are resolved against - default: current directory
//! - `STACKUP_COMPOSE_FILE`: Compose file for infrastructure, relative to the root - default: "docker-compose.yaml"
//! - `STACKUP_MAX_RETRIES`: Readiness attempts per service - default: "30"
//! - `STACKUP_RETRY_DELAY_SECS`: Seconds between readiness attempts - default: "2"
//! - `STACKUP_WARMUP_SECS`: Seconds to wait after starting infrastructure - default: "10"
//! - `STACKUP_GRACE_SECS`: Seconds to wait after opening a terminal - default: "5"
//! - `STACKUP_LOG_LEVEL`: Logging level - default: "info"
//!
//! # File format
//!
//! ```toml
//! root_dir = "/home/me/repos/crm"
//!
//! [infrastructure]
//! compose_command = ["docker", "compose"]
//! compose_file = "dev/docker-compose.yaml"
//! services = ["redis", "rabbit", "customerdb"]
//! warmup_secs = 10
//!
//! [readiness]
//! path = "/actuator/health/readiness"
//! max_retries = 30
//! delay_secs = 2
//! timeout_secs = 5
//!
//! [launch]
//! build_command = ["./mvnw", "clean", "package", "-DskipTests"]
//! run_command = "./mvnw spring-boot:run"
//! grace_secs = 5
//!
//! [[services]]
//! name = "config-server"
//! port = 8071
//! path = "config-server"
//! depends_on = []
//! ```

use crate::health::{
    HttpHealthChecker, ReadinessWaiter, DEFAULT_HEALTH_PATH, DEFAULT_MAX_RETRIES,
    DEFAULT_PROBE_TIMEOUT, DEFAULT_RETRY_DELAY,
};
use crate::launcher::LaunchSettings;
use crate::scheduler::InfrastructureSettings;
use crate::topology::{ServiceSpec, Topology, TopologyError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this schema
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Failed to parse an environment value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    /// Topology is structurally invalid
    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Health endpoint and polling parameters shared by all services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessSettings {
    pub path: String,
    pub max_retries: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_HEALTH_PATH.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ReadinessSettings {
    pub fn waiter(&self) -> ReadinessWaiter {
        ReadinessWaiter::new(self.max_retries, self.delay)
    }

    pub fn checker(&self) -> Result<HttpHealthChecker, reqwest::Error> {
        HttpHealthChecker::new(self.path.clone(), self.timeout)
    }
}

/// Everything needed to bring the stack up
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Directory relative service paths are resolved against
    pub root_dir: PathBuf,

    /// Application services in scan order, paths already resolved
    pub topology: Topology,

    pub infrastructure: InfrastructureSettings,

    pub readiness: ReadinessSettings,

    pub launch: LaunchSettings,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for StackConfig {
    /// The built-in CRM stack with compiled-in defaults, no env applied
    fn default() -> Self {
        let root_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut topology = default_topology();
        topology.resolve_paths(&root_dir);

        Self {
            root_dir,
            topology,
            infrastructure: InfrastructureSettings::default(),
            readiness: ReadinessSettings::default(),
            launch: LaunchSettings::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// config-server → eureka-server → {customer-service, notification-service} → gateway-server
pub fn default_topology() -> Topology {
    Topology::new(vec![
        ServiceSpec::new("config-server", 8071, "config-server"),
        ServiceSpec::new("eureka-server", 8070, "eureka-server").depends_on(["config-server"]),
        ServiceSpec::new("customer-service", 8080, "customer-service")
            .depends_on(["eureka-server"]),
        ServiceSpec::new("notification-service", 9000, "notification-service")
            .depends_on(["eureka-server"]),
        ServiceSpec::new("gateway-server", 8072, "gateway-server")
            .depends_on(["customer-service", "notification-service"]),
    ])
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    root_dir: Option<PathBuf>,
    infrastructure: Option<InfrastructureFile>,
    readiness: Option<ReadinessFile>,
    launch: Option<LaunchFile>,
    services: Option<Vec<ServiceSpec>>,
    log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct InfrastructureFile {
    compose_command: Option<Vec<String>>,
    compose_file: Option<PathBuf>,
    services: Option<Vec<String>>,
    warmup_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadinessFile {
    path: Option<String>,
    max_retries: Option<u32>,
    delay_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LaunchFile {
    build_command: Option<Vec<String>>,
    run_command: Option<String>,
    terminal_template: Option<String>,
    grace_secs: Option<u64>,
}

impl StackConfig {
    /// Loads defaults, then `path` (or `STACKUP_CONFIG`), then environment
    /// overrides, and validates the result
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file_path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var("STACKUP_CONFIG").ok().map(PathBuf::from));

        let file = match file_path {
            Some(p) => Self::read_file(&p)?,
            None => ConfigFile::default(),
        };

        let config = Self::assemble(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document and applies environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        let config = Self::assemble(file)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn assemble(file: ConfigFile) -> Result<Self, ConfigError> {
        let root_dir = match env::var("STACKUP_ROOT_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => match file.root_dir {
                Some(dir) => dir,
                None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            },
        };

        let mut topology = file
            .services
            .map(Topology::new)
            .unwrap_or_else(default_topology);
        topology.resolve_paths(&root_dir);

        let mut infrastructure = InfrastructureSettings::default();
        if let Some(infra) = file.infrastructure {
            if let Some(command) = infra.compose_command {
                infrastructure.compose_command = command;
            }
            if let Some(compose_file) = infra.compose_file {
                infrastructure.compose_file = compose_file;
            }
            if let Some(services) = infra.services {
                infrastructure.services = services;
            }
            if let Some(secs) = infra.warmup_secs {
                infrastructure.warmup = Duration::from_secs(secs);
            }
        }
        if let Ok(compose_file) = env::var("STACKUP_COMPOSE_FILE") {
            infrastructure.compose_file = PathBuf::from(compose_file);
        }
        infrastructure.compose_file = root_dir.join(&infrastructure.compose_file);
        if let Some(secs) = env_parse::<u64>("STACKUP_WARMUP_SECS")? {
            infrastructure.warmup = Duration::from_secs(secs);
        }

        let mut readiness = ReadinessSettings::default();
        if let Some(r) = file.readiness {
            if let Some(path) = r.path {
                readiness.path = path;
            }
            if let Some(max_retries) = r.max_retries {
                readiness.max_retries = max_retries;
            }
            if let Some(secs) = r.delay_secs {
                readiness.delay = Duration::from_secs(secs);
            }
            if let Some(secs) = r.timeout_secs {
                readiness.timeout = Duration::from_secs(secs);
            }
        }
        if let Some(max_retries) = env_parse::<u32>("STACKUP_MAX_RETRIES")? {
            readiness.max_retries = max_retries;
        }
        if let Some(secs) = env_parse::<u64>("STACKUP_RETRY_DELAY_SECS")? {
            readiness.delay = Duration::from_secs(secs);
        }

        let mut launch = LaunchSettings::default();
        if let Some(l) = file.launch {
            if let Some(build_command) = l.build_command {
                launch.build_command = build_command;
            }
            if let Some(run_command) = l.run_command {
                launch.run_command = run_command;
            }
            if let Some(template) = l.terminal_template {
                launch.terminal_template = template;
            }
            if let Some(secs) = l.grace_secs {
                launch.grace_period = Duration::from_secs(secs);
            }
        }
        if let Some(secs) = env_parse::<u64>("STACKUP_GRACE_SECS")? {
            launch.grace_period = Duration::from_secs(secs);
        }

        let log_level = env::var("STACKUP_LOG_LEVEL")
            .ok()
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Ok(Self {
            root_dir,
            topology,
            infrastructure,
            readiness,
            launch,
            log_level,
        })
    }

    /// Validates the configuration
    ///
    /// Checks the topology structure, readiness parameters, launch commands
    /// and log level. Dependency cycles pass; the scheduler reports them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.topology.validate()?;

        if self.readiness.max_retries == 0 {
            return Err(ConfigError::ValidationFailed(
                "Readiness max_retries must be at least 1".to_string(),
            ));
        }

        if !self.readiness.path.starts_with('/') {
            return Err(ConfigError::ValidationFailed(format!(
                "Health path must start with '/': {}",
                self.readiness.path
            )));
        }

        if self.readiness.timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "Health check timeout must be at least 1 second".to_string(),
            ));
        }

        if self.launch.run_command.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Run command must not be empty".to_string(),
            ));
        }

        if !self.launch.terminal_template.contains("{run}") {
            return Err(ConfigError::ValidationFailed(
                "Terminal template must contain {run}".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();

        map.insert("root_dir".to_string(), self.root_dir.display().to_string());
        map.insert(
            "services".to_string(),
            self.topology.names().collect::<Vec<_>>().join(", "),
        );
        map.insert(
            "compose_command".to_string(),
            self.infrastructure.compose_command.join(" "),
        );
        map.insert(
            "compose_file".to_string(),
            self.infrastructure.compose_file.display().to_string(),
        );
        map.insert(
            "infrastructure".to_string(),
            self.infrastructure.services.join(", "),
        );
        map.insert(
            "warmup_secs".to_string(),
            self.infrastructure.warmup.as_secs().to_string(),
        );
        map.insert("health_path".to_string(), self.readiness.path.clone());
        map.insert(
            "max_retries".to_string(),
            self.readiness.max_retries.to_string(),
        );
        map.insert(
            "retry_delay_secs".to_string(),
            self.readiness.delay.as_secs().to_string(),
        );
        map.insert(
            "build_command".to_string(),
            self.launch.build_command.join(" "),
        );
        map.insert("run_command".to_string(), self.launch.run_command.clone());
        map.insert(
            "grace_secs".to_string(),
            self.launch.grace_period.as_secs().to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl fmt::Display for StackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stackup Configuration:")?;
        writeln!(f, "  Root Dir: {}", self.root_dir.display())?;
        writeln!(
            f,
            "  Infrastructure: {} ({})",
            self.infrastructure.services.join(", "),
            self.infrastructure.compose_file.display()
        )?;
        writeln!(f, "  Warm-up: {}s", self.infrastructure.warmup.as_secs())?;
        writeln!(f, "  Health Path: {}", self.readiness.path)?;
        writeln!(
            f,
            "  Readiness: {} attempts, {}s apart",
            self.readiness.max_retries,
            self.readiness.delay.as_secs()
        )?;
        writeln!(f, "  Services:")?;
        for service in self.topology.services() {
            writeln!(
                f,
                "    {} :{} ({})",
                service.name,
                service.port,
                service.path.display()
            )?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn clear_env() -> Vec<EnvGuard> {
        [
            "STACKUP_CONFIG",
            "STACKUP_ROOT_DIR",
            "STACKUP_COMPOSE_FILE",
            "STACKUP_MAX_RETRIES",
            "STACKUP_RETRY_DELAY_SECS",
            "STACKUP_WARMUP_SECS",
            "STACKUP_GRACE_SECS",
            "STACKUP_LOG_LEVEL",
        ]
        .into_iter()
        .map(EnvGuard::unset)
        .collect()
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = clear_env();
        let _root = EnvGuard::set("STACKUP_ROOT_DIR", "/repos/crm");

        let config = StackConfig::load(None).unwrap();

        assert_eq!(config.root_dir, PathBuf::from("/repos/crm"));
        assert_eq!(config.topology.len(), 5);
        assert_eq!(
            config.topology.get("config-server").unwrap().path,
            PathBuf::from("/repos/crm/config-server")
        );
        assert_eq!(
            config.topology.get("gateway-server").unwrap().depends_on,
            vec!["customer-service", "notification-service"]
        );
        assert_eq!(config.readiness, ReadinessSettings::default());
        assert_eq!(
            config.infrastructure.compose_file,
            PathBuf::from("/repos/crm/docker-compose.yaml")
        );
        assert_eq!(
            config.infrastructure.services,
            InfrastructureSettings::default().services
        );
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = clear_env();
        let _env = vec![
            EnvGuard::set("STACKUP_ROOT_DIR", "/srv"),
            EnvGuard::set("STACKUP_COMPOSE_FILE", "/srv/compose.yaml"),
            EnvGuard::set("STACKUP_MAX_RETRIES", "5"),
            EnvGuard::set("STACKUP_RETRY_DELAY_SECS", "1"),
            EnvGuard::set("STACKUP_WARMUP_SECS", "0"),
            EnvGuard::set("STACKUP_GRACE_SECS", "3"),
            EnvGuard::set("STACKUP_LOG_LEVEL", "DEBUG"),
        ];

        let config = StackConfig::load(None).unwrap();

        assert_eq!(config.root_dir, PathBuf::from("/srv"));
        assert_eq!(
            config.infrastructure.compose_file,
            PathBuf::from("/srv/compose.yaml")
        );
        assert_eq!(config.readiness.max_retries, 5);
        assert_eq!(config.readiness.delay, Duration::from_secs(1));
        assert_eq!(config.infrastructure.warmup, Duration::ZERO);
        assert_eq!(config.launch.grace_period, Duration::from_secs(3));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_invalid_env_number() {
        let _guards = clear_env();
        let _env = EnvGuard::set("STACKUP_MAX_RETRIES", "many");

        let err = StackConfig::load(None).unwrap_err();
        assert!(
            matches!(err, ConfigError::ParseError { ref field, .. } if field == "STACKUP_MAX_RETRIES")
        );
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let _guards = clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stackup.toml");
        fs::write(
            &path,
            r#"
root_dir = "/work"

[infrastructure]
compose_command = ["docker", "compose"]
services = ["postgres"]
warmup_secs = 1

[readiness]
path = "/health"
max_retries = 4
delay_secs = 0

[launch]
build_command = ["mvn", "-q", "package"]
run_command = "mvn spring-boot:run"
grace_secs = 0

[[services]]
name = "api"
port = 8080
path = "api"
depends_on = ["auth"]

[[services]]
name = "auth"
port = 8081
path = "/elsewhere/auth"
"#,
        )
        .unwrap();

        let config = StackConfig::load(Some(&path)).unwrap();

        assert_eq!(config.root_dir, PathBuf::from("/work"));
        assert_eq!(config.topology.len(), 2);
        assert_eq!(
            config.topology.get("api").unwrap().path,
            PathBuf::from("/work/api")
        );
        assert_eq!(
            config.topology.get("auth").unwrap().path,
            PathBuf::from("/elsewhere/auth")
        );
        assert_eq!(
            config.infrastructure.compose_command,
            vec!["docker", "compose"]
        );
        assert_eq!(config.infrastructure.services, vec!["postgres"]);
        assert_eq!(config.readiness.path, "/health");
        assert_eq!(config.readiness.max_retries, 4);
        assert_eq!(config.readiness.delay, Duration::ZERO);
        assert_eq!(config.launch.build_command, vec!["mvn", "-q", "package"]);
        assert_eq!(config.launch.grace_period, Duration::ZERO);
    }

    #[test]
    #[serial]
    fn test_env_config_path() {
        let _guards = clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alt.toml");
        fs::write(
            &path,
            "[[services]]\nname = \"solo\"\nport = 7000\npath = \"solo\"\n",
        )
        .unwrap();
        let _env = EnvGuard::set("STACKUP_CONFIG", path.to_str().unwrap());

        let config = StackConfig::load(None).unwrap();
        assert_eq!(config.topology.names().collect::<Vec<_>>(), vec!["solo"]);
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        let _guards = clear_env();
        let err = StackConfig::load(Some(Path::new("/nonexistent/stackup.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    #[serial]
    fn test_unknown_field_rejected() {
        let _guards = clear_env();
        let err = StackConfig::from_toml_str("colour = \"blue\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    #[serial]
    fn test_duplicate_service_rejected() {
        let _guards = clear_env();
        let err = StackConfig::from_toml_str(
            r#"
[[services]]
name = "a"
port = 1
path = "a"

[[services]]
name = "a"
port = 2
path = "b"
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Topology(TopologyError::DuplicateService(_))
        ));
    }

    #[test]
    #[serial]
    fn test_configuration_validation_invalid_retries() {
        let _guards = clear_env();
        let mut config = StackConfig::default();
        config.readiness.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_invalid_path() {
        let mut config = StackConfig::default();
        config.readiness.path = "actuator/health".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_invalid_log_level() {
        let mut config = StackConfig::default();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_template_without_run() {
        let mut config = StackConfig::default();
        config.launch.terminal_template = "xterm".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_is_valid() {
        assert!(StackConfig::default().validate().is_ok());
    }

    #[test]
    fn test_readiness_waiter_from_settings() {
        let settings = ReadinessSettings {
            max_retries: 3,
            delay: Duration::ZERO,
            ..ReadinessSettings::default()
        };
        assert_eq!(settings.waiter(), ReadinessWaiter::new(3, Duration::ZERO));
    }

    #[test]
    fn test_config_display() {
        let config = StackConfig::default();
        let display = format!("{}", config);
        assert!(display.contains("Stackup Configuration:"));
        assert!(display.contains("gateway-server :8072"));
    }

    #[test]
    fn test_display_map() {
        let map = StackConfig::default().to_display_map();
        assert_eq!(map.get("max_retries").map(String::as_str), Some("30"));
        assert_eq!(
            map.get("infrastructure").map(String::as_str),
            Some("redis, rabbit, customerdb")
        );
    }
}
