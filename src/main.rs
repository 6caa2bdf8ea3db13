use stackup::cli::commands::{CliArgs, Commands};
use stackup::cli::handlers::{handle_config, handle_health, handle_plan, handle_up};
use stackup::util::logging::{config_from_env, init_logging, parse_level};
use stackup::{StackConfig, VERSION};

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("stackup v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let config_path = args.config.as_deref();
    let exit_code = match &args.command {
        Commands::Up(up_args) => handle_up(up_args, config_path).await,
        Commands::Plan(plan_args) => handle_plan(plan_args, config_path),
        Commands::Health(health_args) => handle_health(health_args, config_path).await,
        Commands::Config(config_args) => handle_config(config_args, config_path),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        Some(parse_level(level_str))
    } else if args.verbose {
        Some(Level::DEBUG)
    } else if args.quiet {
        Some(Level::ERROR)
    } else {
        // STACKUP_LOG_LEVEL is already folded into the loaded level
        StackConfig::load(args.config.as_deref())
            .ok()
            .map(|config| parse_level(&config.log_level))
    };

    init_logging(config_from_env(level));
}
