//! run command - Probe a target under one client profile
//!
//! Prints the connection settings, then each step as it finishes.

use clap::Args;
use sp_core::{KeyAllocator, Probe, ProbeReport};
use sp_s3::{ClientProfile, S3Client};

use super::{ProbeArgs, resolve_target};
use crate::exit_code::ExitCode;
use crate::output::render::{render_summary, render_target};
use crate::output::{Formatter, OutputConfig, StepProgress};

/// Run the probe under one client profile
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Client profile: legacy or modern
    #[arg(short, long, default_value = "modern")]
    pub profile: ClientProfile,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

/// Execute the run command
pub async fn execute(args: RunArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let target = match resolve_target(args.probe.target.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            formatter.error(&format!("Failed to resolve target: {e}"));
            return ExitCode::from(&e);
        }
    };

    let profile = args.profile;
    formatter.heading("Configuration");
    formatter.println(&render_target(
        &target,
        &format!("{profile} ({})", profile.description()),
    ));
    formatter.println("");

    let client = match S3Client::new(&target, profile).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from(&e);
        }
    };

    let settings = args.probe.settings(&target);
    let allocator = KeyAllocator::new();
    let mut progress = StepProgress::live(&output_config, profile.label());

    let report = Probe::new(&client, &allocator, &settings)
        .run(profile.label(), &mut progress)
        .await;
    progress.finish();

    print_report(&formatter, &report);
    exit_code_for(&report)
}

fn print_report(formatter: &Formatter, report: &ProbeReport) {
    if formatter.is_json() {
        formatter.json(report);
        return;
    }

    formatter.println("");
    if report.is_success() {
        formatter.success(&render_summary(report));
    } else {
        formatter.error(&render_summary(report));
    }
}

pub(crate) fn exit_code_for(report: &ProbeReport) -> ExitCode {
    if report.is_success() {
        ExitCode::Success
    } else {
        ExitCode::ProbeFailed
    }
}
