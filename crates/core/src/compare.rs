//! Side-by-side comparison of two probe reports

use serde::Serialize;

use crate::probe::{ProbeReport, Step, StepStatus};

/// One step as seen by both runs
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub step: Step,
    pub left: StepStatus,
    pub right: StepStatus,
    pub left_message: String,
    pub right_message: String,
    /// Statuses differ
    pub diverges: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub left_label: String,
    pub right_label: String,
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    /// Earliest step whose outcome differs between the runs
    pub fn first_divergence(&self) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.diverges)
    }

    pub fn divergences(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(|r| r.diverges)
    }

    pub fn is_identical(&self) -> bool {
        self.first_divergence().is_none()
    }
}

/// Pair up the steps of two reports in sequence order
///
/// A step missing from a report counts as skipped.
pub fn compare(left: &ProbeReport, right: &ProbeReport) -> Comparison {
    let side = |report: &ProbeReport, step: Step| {
        report
            .outcome(step)
            .map(|o| (o.status, o.message.clone()))
            .unwrap_or((StepStatus::Skipped, String::new()))
    };

    let rows = Step::ALL
        .into_iter()
        .map(|step| {
            let (l, left_message) = side(left, step);
            let (r, right_message) = side(right, step);
            ComparisonRow {
                step,
                left: l,
                right: r,
                left_message,
                right_message,
                diverges: l != r,
            }
        })
        .collect();

    Comparison {
        left_label: left.label.clone(),
        right_label: right.label.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::StepOutcome;

    fn report(label: &str, upload: StepStatus) -> ProbeReport {
        let steps = Step::ALL
            .into_iter()
            .map(|step| match step {
                Step::Upload if upload == StepStatus::Failed => {
                    StepOutcome::failed(step, "both upload attempts failed")
                }
                _ if upload == StepStatus::Failed && step.number() > Step::Upload.number() => {
                    StepOutcome::skipped(step, "upload failed")
                }
                _ => StepOutcome::passed(step, "ok"),
            })
            .collect();
        ProbeReport {
            label: label.to_string(),
            key: None,
            steps,
        }
    }

    #[test]
    fn test_identical_runs() {
        let cmp = compare(
            &report("legacy", StepStatus::Passed),
            &report("modern", StepStatus::Passed),
        );
        assert!(cmp.is_identical());
        assert_eq!(cmp.rows.len(), 12);
        assert_eq!(cmp.left_label, "legacy");
        assert_eq!(cmp.right_label, "modern");
    }

    #[test]
    fn test_upload_divergence() {
        let cmp = compare(
            &report("legacy", StepStatus::Passed),
            &report("modern", StepStatus::Failed),
        );
        let first = cmp.first_divergence().unwrap();
        assert_eq!(first.step, Step::Upload);
        assert_eq!(first.left, StepStatus::Passed);
        assert_eq!(first.right, StepStatus::Failed);
        assert_eq!(first.right_message, "both upload attempts failed");
        assert_eq!(cmp.divergences().count(), 9);
    }

    #[test]
    fn test_missing_step_counts_as_skipped() {
        let mut right = report("modern", StepStatus::Passed);
        right.steps.retain(|s| s.step != Step::Cleanup);
        let cmp = compare(&report("legacy", StepStatus::Passed), &right);
        let first = cmp.first_divergence().unwrap();
        assert_eq!(first.step, Step::Cleanup);
        assert_eq!(first.right, StepStatus::Skipped);
        assert!(first.right_message.is_empty());
    }
}
