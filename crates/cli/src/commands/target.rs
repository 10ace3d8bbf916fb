//! Target management commands
//!
//! Targets are named buckets on S3-compatible services, stored with their
//! credentials in the config file so a probe can run without `.env` files.

use clap::Subcommand;
use serde::Serialize;
use sp_core::{Target, TargetManager};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Target subcommands
#[derive(Subcommand, Debug)]
pub enum TargetCommands {
    /// Add or update a target
    Set(SetArgs),

    /// List all configured targets
    List(ListArgs),

    /// Remove a target
    Remove(RemoveArgs),
}

/// Arguments for the `target set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Target name (e.g., "tebi", "minio", "aws")
    pub name: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Bucket the probe runs against
    pub bucket: String,

    /// S3 endpoint URL; omit for AWS S3
    #[arg(long)]
    pub endpoint: Option<String>,

    /// AWS region (default: us-east-1)
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Deployment environment tag used when allocating keys
    #[arg(long, default_value = "")]
    pub environment: String,

    /// Bucket lookup style: auto, path, or dns (default: auto)
    #[arg(long, default_value = "auto")]
    pub bucket_lookup: String,
}

/// Arguments for the `target list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details including region and bucket lookup
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `target remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the target to remove
    pub name: String,
}

/// JSON output for target list
#[derive(Serialize)]
struct TargetListOutput {
    targets: Vec<TargetInfo>,
}

/// Target information for JSON output (without sensitive data)
#[derive(Serialize)]
struct TargetInfo {
    name: String,
    endpoint: Option<String>,
    region: String,
    bucket: String,
    environment: String,
    bucket_lookup: String,
}

impl From<&Target> for TargetInfo {
    fn from(target: &Target) -> Self {
        Self {
            name: target.name.clone(),
            endpoint: target.endpoint.clone(),
            region: target.region.clone(),
            bucket: target.bucket.clone(),
            environment: target.environment.clone(),
            bucket_lookup: target.bucket_lookup.clone(),
        }
    }
}

/// JSON output for target set/remove operations
#[derive(Serialize)]
struct TargetOperationOutput {
    success: bool,
    target: String,
    message: String,
}

/// Execute a target subcommand
pub fn execute(cmd: TargetCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match TargetManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to load targets: {e}"));
            return ExitCode::GeneralError;
        }
    };

    match cmd {
        TargetCommands::Set(args) => execute_set(args, &manager, &formatter),
        TargetCommands::List(args) => execute_list(args, &manager, &formatter),
        TargetCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn target_from_args(args: SetArgs) -> Target {
    let mut target = Target::new(args.name, args.access_key, args.secret_key, args.bucket);
    target.endpoint = args.endpoint.filter(|e| !e.is_empty());
    target.region = args.region;
    target.environment = args.environment;
    target.bucket_lookup = args.bucket_lookup;
    target
}

fn execute_set(args: SetArgs, manager: &TargetManager, formatter: &Formatter) -> ExitCode {
    let target = target_from_args(args);
    let name = target.name.clone();

    match manager.set(target) {
        Ok(()) => {
            let message = format!("Target '{name}' configured successfully");
            if formatter.is_json() {
                formatter.json(&TargetOperationOutput {
                    success: true,
                    target: name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

fn execute_list(args: ListArgs, manager: &TargetManager, formatter: &Formatter) -> ExitCode {
    match manager.list() {
        Ok(targets) => {
            if formatter.is_json() {
                formatter.json(&TargetListOutput {
                    targets: targets.iter().map(TargetInfo::from).collect(),
                });
            } else if targets.is_empty() {
                formatter.println("No targets configured.");
            } else {
                for target in &targets {
                    formatter.println(&list_line(target, args.long));
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::GeneralError
        }
    }
}

fn list_line(target: &Target, long: bool) -> String {
    let endpoint = target.endpoint.as_deref().unwrap_or("(aws)");
    if long {
        format!(
            "{:<12} {}/{} (region: {}, lookup: {}, env: {})",
            target.name,
            endpoint.trim_end_matches('/'),
            target.bucket,
            target.region,
            target.bucket_lookup,
            if target.environment.is_empty() {
                "-"
            } else {
                target.environment.as_str()
            }
        )
    } else {
        format!("{:<12} {}", target.name, endpoint)
    }
}

fn execute_remove(args: RemoveArgs, manager: &TargetManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            let message = format!("Target '{}' removed successfully", args.name);
            if formatter.is_json() {
                formatter.json(&TargetOperationOutput {
                    success: true,
                    target: args.name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(sp_core::Error::TargetNotFound(_)) => {
            formatter.error(&format!("Target '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_args() -> SetArgs {
        SetArgs {
            name: "tebi".to_string(),
            access_key: "accesskey".to_string(),
            secret_key: "secretkey".to_string(),
            bucket: "sharex".to_string(),
            endpoint: Some("https://s3.tebi.io".to_string()),
            region: "us-east-1".to_string(),
            environment: "dev".to_string(),
            bucket_lookup: "auto".to_string(),
        }
    }

    #[test]
    fn test_target_from_args() {
        let target = target_from_args(set_args());
        assert_eq!(target.name, "tebi");
        assert_eq!(target.bucket, "sharex");
        assert_eq!(target.environment, "dev");
        assert!(target.uses_path_style());
        assert!(target.validate().is_ok());
    }

    #[test]
    fn test_empty_endpoint_means_aws() {
        let mut args = set_args();
        args.endpoint = Some(String::new());
        let target = target_from_args(args);
        assert!(target.endpoint.is_none());
        assert!(!target.uses_path_style());
    }

    #[test]
    fn test_target_info_hides_secrets() {
        let target = target_from_args(set_args());
        let json = serde_json::to_string(&TargetInfo::from(&target)).unwrap();
        assert!(!json.contains("secretkey"));
        assert!(!json.contains("accesskey"));
        assert!(json.contains("\"bucket\":\"sharex\""));
    }

    #[test]
    fn test_list_line() {
        let target = target_from_args(set_args());
        assert_eq!(list_line(&target, false), "tebi         https://s3.tebi.io");
        assert_eq!(
            list_line(&target, true),
            "tebi         https://s3.tebi.io/sharex (region: us-east-1, lookup: auto, env: dev)"
        );
    }
}
