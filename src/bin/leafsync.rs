//! leafsync CLI Binary
//!
//! Command-line interface for the leafsync GitHub synchronization engine.

use clap::Parser;
use leafsync::logging::{init_logging, ENV_LOG, ENV_LOG_FILE, ENV_LOG_FORMAT, ENV_LOG_OUTPUT};
use leafsync::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    // CLI flags win over config by going through the env overrides
    if let Some(level) = &cli.log_level {
        std::env::set_var(ENV_LOG, level);
    }
    if let Some(format) = &cli.log_format {
        std::env::set_var(ENV_LOG_FORMAT, format);
    }
    if let Some(output) = &cli.log_output {
        std::env::set_var(ENV_LOG_OUTPUT, output);
    }
    if let Some(file) = &cli.log_file {
        std::env::set_var(ENV_LOG_FILE, file);
    }

    let context = match CliContext::new(cli.workspace.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(Some(&context.config().logging)) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {} [{}]", e, e.message_key());
            if let Some(minutes) = e.rate_limit_info().and_then(|info| info.minutes_until_reset()) {
                eprintln!("Rate limit resets in about {} minute(s)", minutes);
            }
            process::exit(1);
        }
    }
}
