//! compare command - Probe a target under both client profiles
//!
//! Both runs proceed concurrently, each with its own client and its own
//! object key (an explicit `--key` gets the profile label appended), then
//! the outcomes are lined up step by step.

use clap::Args;
use indicatif::MultiProgress;
use serde::Serialize;
use sp_core::{Comparison, KeyAllocator, Probe, ProbeReport, Target, compare};
use sp_s3::{ClientProfile, S3Client};

use super::{ProbeArgs, resolve_target};
use crate::exit_code::ExitCode;
use crate::output::render::{
    render_comparison, render_divergence, render_step, render_summary, render_target,
};
use crate::output::{Formatter, OutputConfig, StepProgress};

/// Run the probe under both profiles and compare
#[derive(Args, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    pub probe: ProbeArgs,
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    reports: [&'a ProbeReport; 2],
    comparison: &'a Comparison,
}

/// Execute the compare command
pub async fn execute(args: CompareArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let target = match resolve_target(args.probe.target.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            formatter.error(&format!("Failed to resolve target: {e}"));
            return ExitCode::from(&e);
        }
    };

    let [left, right] = ClientProfile::ALL;
    formatter.heading("Configuration");
    formatter.println(&render_target(&target, &format!("{left} vs {right}")));
    formatter.println("");

    let multi = MultiProgress::new();
    let (left_report, right_report) = futures::join!(
        probe_with(&target, &args.probe, left, &output_config, &multi),
        probe_with(&target, &args.probe, right, &output_config, &multi),
    );
    let (left_report, right_report) = match (left_report, right_report) {
        (Ok(l), Ok(r)) => (l, r),
        (Err(e), _) | (_, Err(e)) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from(&e);
        }
    };

    let comparison = compare(&left_report, &right_report);

    if formatter.is_json() {
        formatter.json(&CompareOutput {
            reports: [&left_report, &right_report],
            comparison: &comparison,
        });
    } else {
        let colors = formatter.colors_enabled();
        for report in [&left_report, &right_report] {
            formatter.heading(&format!("{} run", report.label));
            for outcome in &report.steps {
                formatter.println(&render_step(outcome, colors));
            }
            formatter.println(&render_summary(report));
            formatter.println("");
        }

        formatter.heading("Comparison");
        formatter.println(&render_comparison(&comparison, colors));
        if comparison.is_identical() {
            formatter.success(&render_divergence(&comparison));
        } else {
            formatter.warning(&render_divergence(&comparison));
        }
    }

    if left_report.is_success() && right_report.is_success() {
        ExitCode::Success
    } else {
        ExitCode::ProbeFailed
    }
}

async fn probe_with(
    target: &Target,
    args: &ProbeArgs,
    profile: ClientProfile,
    output_config: &OutputConfig,
    multi: &MultiProgress,
) -> sp_core::Result<ProbeReport> {
    let client = S3Client::new(target, profile).await?;
    let settings = args.settings(target).for_run(profile.label());
    let allocator = KeyAllocator::new();
    let mut progress = StepProgress::quiet_in(output_config, multi, profile.label());

    let report = Probe::new(&client, &allocator, &settings)
        .run(profile.label(), &mut progress)
        .await;
    progress.finish();
    Ok(report)
}
