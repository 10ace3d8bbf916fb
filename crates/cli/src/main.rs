//! s3probe - S3 compatibility probe
//!
//! Runs the same sequence of S3 operations under two client profiles and
//! reports which steps each one passes.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod exit_code;
mod output;

use commands::Cli;
use exit_code::ExitCode;

/// Filter used by `--debug`, covering the SDK's request/response logging
const DEBUG_FILTER: &str = "s3probe=debug,sp_core=debug,sp_s3=debug,aws_sdk_s3=debug,\
                            aws_smithy_runtime=debug,aws_smithy_runtime_api=debug";

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "warn";

fn log_filter(debug: bool, rust_log: Option<String>) -> String {
    match (debug, rust_log) {
        (true, _) => DEBUG_FILTER.to_string(),
        (false, Some(directives)) if !directives.trim().is_empty() => directives,
        (false, _) => DEFAULT_FILTER.to_string(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::new(log_filter(
        cli.debug,
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    ));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = tokio::select! {
        code = commands::execute(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            ExitCode::Interrupted
        }
    };

    std::process::exit(exit_code.as_i32());
}
