//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Each command takes its parsed arguments plus the output configuration
//! and returns an exit code.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sp_core::probe::{DEFAULT_FILENAME, DEFAULT_LIST_LIMIT};
use sp_core::{ConfigManager, ProbeSettings, Result, Target, TargetManager};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod compare;
mod key;
mod run;
mod target;

/// s3probe - S3 compatibility probe
///
/// Runs a fixed sequence of S3 operations against a bucket under two client
/// profiles and reports where they behave differently.
#[derive(Parser, Debug)]
#[command(name = "s3probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging, including SDK requests
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Environment file loaded before reading AWS_* variables
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the probe under one client profile
    Run(run::RunArgs),

    /// Run the probe under both profiles and compare the results
    Compare(compare::CompareArgs),

    /// Allocate object keys without touching a store
    Key(key::KeyArgs),

    /// Manage named targets
    #[command(subcommand)]
    Target(target::TargetCommands),
}

/// Options shared by `run` and `compare`
#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Named target from the config file; defaults to AWS_* environment variables
    #[arg(short, long)]
    pub target: Option<String>,

    /// Filename the object key is allocated for
    #[arg(long, default_value = DEFAULT_FILENAME)]
    pub filename: String,

    /// Use this object key instead of allocating one; `compare` adds the profile label
    #[arg(long)]
    pub key: Option<String>,

    /// Presigned URL lifetime in seconds
    #[arg(long, default_value_t = 900)]
    pub presign_expiry: u64,

    /// Maximum entries returned by the listing step
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub list_limit: i32,

    /// Head attempts before an upload is reported invisible
    #[arg(long, default_value_t = 3)]
    pub verify_attempts: u32,
}

impl ProbeArgs {
    /// Probe settings for a resolved target
    pub fn settings(&self, target: &Target) -> ProbeSettings {
        let mut settings = ProbeSettings::for_target(target);
        settings.filename = self.filename.clone();
        settings.key = self.key.clone();
        settings.presign_expiry = Duration::from_secs(self.presign_expiry);
        settings.list_limit = self.list_limit;
        settings.verify_attempts = self.verify_attempts;
        settings
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let mut output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
        ..Default::default()
    };

    match ConfigManager::new().and_then(|m| m.load()) {
        Ok(config) => output_config = output_config.with_defaults(&config.defaults),
        Err(e) => tracing::warn!(error = %e, "could not load config defaults"),
    }
    output_config.apply_color_mode();

    load_env_file(&cli.env_file);

    match cli.command {
        Commands::Run(args) => run::execute(args, output_config).await,
        Commands::Compare(args) => compare::execute(args, output_config).await,
        Commands::Key(args) => key::execute(args, output_config),
        Commands::Target(cmd) => target::execute(cmd, output_config),
    }
}

/// Load `.env`-style variables without overriding the process environment
pub fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {
            tracing::warn!(path = %path.display(), "environment file not found")
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not load environment file")
        }
    }
}

/// A named target from the config file, or the environment target
pub fn resolve_target(name: Option<&str>) -> Result<Target> {
    let target = match name {
        Some(name) => TargetManager::new()?.get(name)?,
        None => Target::from_process_env()?,
    };
    target.validate()?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "s3probe",
            "run",
            "--profile",
            "legacy",
            "--filename",
            "photo.PNG",
            "--list-limit",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.probe.filename, "photo.PNG");
                assert_eq!(args.probe.list_limit, 5);
                assert_eq!(args.probe.presign_expiry, 900);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "s3probe",
            "compare",
            "--json",
            "--env-file",
            "ci.env",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.env_file, PathBuf::from("ci.env"));
    }

    #[test]
    fn test_cli_rejects_unknown_profile() {
        let result = Cli::try_parse_from(["s3probe", "run", "--profile", "v3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_probe_args_settings() {
        let args = ProbeArgs {
            target: None,
            filename: "a.gif".to_string(),
            key: Some("fixed/key.gif".to_string()),
            presign_expiry: 60,
            list_limit: 3,
            verify_attempts: 1,
        };
        let mut target = Target::new("t", "ak", "sk", "bucket");
        target.environment = "dev".to_string();

        let settings = args.settings(&target);
        assert_eq!(settings.bucket, "bucket");
        assert_eq!(settings.environment, "dev");
        assert_eq!(settings.filename, "a.gif");
        assert_eq!(settings.key.as_deref(), Some("fixed/key.gif"));
        assert_eq!(settings.presign_expiry, Duration::from_secs(60));
        assert_eq!(settings.list_limit, 3);
    }

    #[test]
    fn test_missing_env_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        load_env_file(&dir.path().join("missing.env"));
    }
}
