use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Start local microservices in dependency order and wait until they are ready
#[derive(Parser, Debug)]
#[command(
    name = "stackup",
    about = "Start local microservices in dependency order and wait until they are ready",
    version,
    author,
    long_about = "stackup brings up infrastructure containers with docker-compose, then builds \
                  each application service, opens it in a new terminal window and polls its \
                  readiness endpoint before starting the services that depend on it."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        help = "TOML file describing the stack (defaults to the built-in CRM stack)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Start infrastructure and every service in dependency order",
        long_about = "Runs `docker-compose up -d` for the infrastructure services, waits for them \
                      to warm up, then builds, launches and waits for each application service \
                      once all of its dependencies are ready.\n\n\
                      Examples:\n  \
                      stackup up\n  \
                      stackup up --skip-infra\n  \
                      stackup --config dev/stack.toml up"
    )]
    Up(UpArgs),

    #[command(
        about = "Print the order services would be started in",
        long_about = "Resolves the start order without running anything. Fails when the \
                      dependency graph contains a cycle.\n\n\
                      Examples:\n  \
                      stackup plan\n  \
                      stackup plan --format json"
    )]
    Plan(PlanArgs),

    #[command(
        about = "Probe the readiness endpoint of every service once",
        long_about = "Sends a single readiness request to each configured service and reports \
                      which ones are up. Exits with status 1 if any service is not ready.\n\n\
                      Examples:\n  \
                      stackup health\n  \
                      stackup health --service gateway-server"
    )]
    Health(HealthArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct UpArgs {
    #[arg(long, help = "Do not start infrastructure containers")]
    pub skip_infra: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format for the final summary"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct HealthArgs {
    #[arg(
        short = 's',
        long = "service",
        value_name = "NAME",
        help = "Service to check (repeatable, omit to check all)"
    )]
    pub services: Vec<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
