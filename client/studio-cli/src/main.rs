//! studio - command-line driver for the studio lifecycle orchestrator
//!
//! # Examples
//!
//! ```bash
//! # Start the environment and wait for the preview
//! studio run <project-id>
//!
//! # Publish to my-app.<suffix>
//! studio publish <project-id> my-app --pretty
//!
//! # Preview a snapshot and decide interactively
//! studio restore <project-id> <snapshot-id>
//! ```

use studio_cli::{Cli, Runner, build_config, initialize_logger};

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match build_config(cli.server.as_deref(), cli.user_id.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = initialize_logger(&config.logging) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    config.log_summary();

    // One-shot commands do not need the push stream
    config.push.enabled &= cli.command.wants_push();

    let runner = match Runner::from_config(config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runner.run(cli.command).await {
        Ok(value) => {
            let output = if cli.pretty {
                serde_json::to_string_pretty(&value)
            } else {
                serde_json::to_string(&value)
            };

            match output {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error serializing response: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            log::debug!("Command failed: {e}");
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
