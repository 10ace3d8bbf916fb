//! Probe scenario
//!
//! Runs the fixed sequence of storage operations against one
//! [`ObjectStore`] and records an outcome per step. Bucket-level failures
//! are reported and the run continues; a failed key allocation or a failed
//! upload (after its single minimal fallback) skips every step that needs
//! the uploaded object.

use std::time::Duration;

use serde::Serialize;

use crate::error::Error;
use crate::key::{Clock, KeyAllocator, RandomSource};
use crate::object::ObjectRef;
use crate::target::Target;
use crate::traits::{ListOptions, ObjectStore, PutOptions};

/// Filename the probe allocates its key for
pub const DEFAULT_FILENAME: &str = "test-upload.txt";

/// Presigned URL lifetime
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Maximum entries requested by the listing step
pub const DEFAULT_LIST_LIMIT: i32 = 10;

const DEFAULT_PAYLOAD: &str =
    "Hello from s3probe!\nThis object is created and removed by a probe run.";

/// One step of the probe, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ListBuckets,
    HeadBucket,
    GenerateKey,
    Upload,
    VerifyUpload,
    Metadata,
    PublicUrl,
    PresignedUrl,
    ListObjects,
    SoftDelete,
    VerifySoftDelete,
    Cleanup,
}

impl Step {
    pub const ALL: [Step; 12] = [
        Step::ListBuckets,
        Step::HeadBucket,
        Step::GenerateKey,
        Step::Upload,
        Step::VerifyUpload,
        Step::Metadata,
        Step::PublicUrl,
        Step::PresignedUrl,
        Step::ListObjects,
        Step::SoftDelete,
        Step::VerifySoftDelete,
        Step::Cleanup,
    ];

    /// 1-based position in the sequence
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::ListBuckets => "List Buckets",
            Step::HeadBucket => "Head Bucket",
            Step::GenerateKey => "Generate File Key",
            Step::Upload => "Upload File",
            Step::VerifyUpload => "Verify Upload",
            Step::Metadata => "Get File Metadata",
            Step::PublicUrl => "Generate Public URL",
            Step::PresignedUrl => "Generate Presigned URL",
            Step::ListObjects => "List Files",
            Step::SoftDelete => "Soft Delete",
            Step::VerifySoftDelete => "Verify Soft Delete",
            Step::Cleanup => "Cleanup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        }
    }
}

/// What happened in one step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl StepOutcome {
    pub fn passed(step: Step, message: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Passed, message)
    }

    pub fn failed(step: Step, message: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Failed, message)
    }

    pub fn skipped(step: Step, message: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Skipped, message)
    }

    fn new(step: Step, status: StepStatus, message: impl Into<String>) -> Self {
        Self {
            step,
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// Outcome of a whole probe run
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Client profile or other label identifying the run
    pub label: String,
    /// Key the object steps operated on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub steps: Vec<StepOutcome>,
}

impl ProbeReport {
    /// True when no step failed
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.status != StepStatus::Failed)
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.status == StepStatus::Failed)
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Inputs for a probe run
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    /// Filename the key is allocated for
    pub filename: String,
    /// Deployment environment tag passed to the allocator
    pub environment: String,
    /// Use this key instead of allocating one
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub presign_expiry: Duration,
    pub list_limit: i32,
    /// Head attempts before the upload is declared invisible
    pub verify_attempts: u32,
    pub verify_interval: Duration,
}

impl ProbeSettings {
    pub fn for_target(target: &Target) -> Self {
        Self {
            bucket: target.bucket.clone(),
            endpoint: target.endpoint.clone(),
            region: target.region.clone(),
            filename: DEFAULT_FILENAME.to_string(),
            environment: target.environment.clone(),
            key: None,
            payload: DEFAULT_PAYLOAD.as_bytes().to_vec(),
            presign_expiry: DEFAULT_PRESIGN_EXPIRY,
            list_limit: DEFAULT_LIST_LIMIT,
            verify_attempts: 3,
            verify_interval: Duration::from_secs(1),
        }
    }

    /// Settings for one of several runs sharing a bucket
    ///
    /// An explicit key gets `-<label>` before its extension, so concurrent
    /// runs never operate on each other's objects.
    pub fn for_run(&self, label: &str) -> Self {
        let mut settings = self.clone();
        if let Some(key) = &self.key {
            settings.key = Some(labelled_key(key, label));
        }
        settings
    }
}

fn labelled_key(key: &str, label: &str) -> String {
    let name_start = key.rfind('/').map_or(0, |i| i + 1);
    match key[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, ext) = key.split_at(name_start + dot);
            format!("{stem}-{label}{ext}")
        }
        _ => format!("{key}-{label}"),
    }
}

/// Receives progress while a probe runs
pub trait ProbeObserver: Send {
    fn step_started(&mut self, _step: Step) {}

    fn step_finished(&mut self, _outcome: &StepOutcome) {}
}

/// Observer that ignores everything
impl ProbeObserver for () {}

/// State left behind by the soft delete step
#[derive(Debug, Default, Clone, Copy)]
struct SoftDeleteState {
    copied: bool,
    original_removed: bool,
}

struct Recorder<'o> {
    steps: Vec<StepOutcome>,
    observer: &'o mut dyn ProbeObserver,
}

impl Recorder<'_> {
    fn start(&mut self, step: Step) {
        tracing::debug!(step = step.title(), "probe step started");
        self.observer.step_started(step);
    }

    fn finish(&mut self, outcome: StepOutcome) {
        tracing::debug!(
            step = outcome.step.title(),
            status = outcome.status.as_str(),
            "probe step finished"
        );
        self.observer.step_finished(&outcome);
        self.steps.push(outcome);
    }

    /// Record every step after `after` as skipped
    fn skip_after(&mut self, after: Step, reason: &str) {
        for step in Step::ALL.into_iter().filter(|s| s.number() > after.number()) {
            self.finish(StepOutcome::skipped(step, reason));
        }
    }
}

/// Runs the probe sequence against one store
pub struct Probe<'a, C, R> {
    store: &'a dyn ObjectStore,
    allocator: &'a KeyAllocator<C, R>,
    settings: &'a ProbeSettings,
}

impl<'a, C: Clock, R: RandomSource> Probe<'a, C, R> {
    pub fn new(
        store: &'a dyn ObjectStore,
        allocator: &'a KeyAllocator<C, R>,
        settings: &'a ProbeSettings,
    ) -> Self {
        Self {
            store,
            allocator,
            settings,
        }
    }

    /// Run every step and return the report
    pub async fn run(&self, label: &str, observer: &mut dyn ProbeObserver) -> ProbeReport {
        let mut rec = Recorder {
            steps: Vec::with_capacity(Step::ALL.len()),
            observer,
        };

        rec.start(Step::ListBuckets);
        rec.finish(self.list_buckets().await);

        rec.start(Step::HeadBucket);
        rec.finish(self.head_bucket().await);

        rec.start(Step::GenerateKey);
        let key = match self.generate_key() {
            Ok((key, outcome)) => {
                rec.finish(outcome);
                key
            }
            Err(outcome) => {
                rec.finish(outcome);
                rec.skip_after(Step::GenerateKey, "no object key");
                return Self::report(label, None, rec);
            }
        };

        rec.start(Step::Upload);
        let object = match self.upload(ObjectRef::new(&self.settings.bucket, &key)).await {
            (outcome, Some(object)) => {
                rec.finish(outcome);
                object
            }
            (outcome, None) => {
                rec.finish(outcome);
                rec.skip_after(Step::Upload, "upload failed");
                return Self::report(label, Some(key), rec);
            }
        };

        rec.start(Step::VerifyUpload);
        rec.finish(self.verify_upload(&object).await);

        rec.start(Step::Metadata);
        rec.finish(self.metadata(&object).await);

        rec.start(Step::PublicUrl);
        rec.finish(self.public_url(&object));

        rec.start(Step::PresignedUrl);
        rec.finish(self.presigned_url(&object).await);

        rec.start(Step::ListObjects);
        rec.finish(self.list_objects(&object).await);

        rec.start(Step::SoftDelete);
        let (outcome, state) = self.soft_delete(&object).await;
        rec.finish(outcome);

        rec.start(Step::VerifySoftDelete);
        rec.finish(self.verify_soft_delete(&object).await);

        rec.start(Step::Cleanup);
        rec.finish(self.cleanup(&object, state).await);

        Self::report(label, Some(object.key), rec)
    }

    fn report(label: &str, key: Option<String>, rec: Recorder<'_>) -> ProbeReport {
        ProbeReport {
            label: label.to_string(),
            key,
            steps: rec.steps,
        }
    }

    async fn list_buckets(&self) -> StepOutcome {
        match self.store.list_buckets().await {
            Ok(buckets) => StepOutcome::passed(
                Step::ListBuckets,
                format!("{} buckets found", buckets.len()),
            )
            .with_details(buckets.into_iter().map(|b| b.key).collect()),
            Err(e) => StepOutcome::failed(Step::ListBuckets, format!("error listing buckets: {e}")),
        }
    }

    async fn head_bucket(&self) -> StepOutcome {
        let bucket = &self.settings.bucket;
        match self.store.bucket_exists(bucket).await {
            Ok(true) => StepOutcome::passed(
                Step::HeadBucket,
                format!("bucket '{bucket}' exists and is accessible"),
            ),
            Ok(false) => {
                StepOutcome::failed(Step::HeadBucket, format!("bucket '{bucket}' does not exist"))
            }
            Err(e) => StepOutcome::failed(
                Step::HeadBucket,
                format!("error checking bucket '{bucket}': {e}"),
            ),
        }
    }

    fn generate_key(&self) -> Result<(String, StepOutcome), StepOutcome> {
        if let Some(key) = &self.settings.key {
            let outcome = StepOutcome::passed(Step::GenerateKey, format!("using key {key}"));
            return Ok((key.clone(), outcome));
        }

        match self
            .allocator
            .allocate(&self.settings.filename, &self.settings.environment)
        {
            Ok(key) => {
                let outcome =
                    StepOutcome::passed(Step::GenerateKey, format!("generated key {key}"));
                Ok((key.into_string(), outcome))
            }
            Err(e) => Err(StepOutcome::failed(
                Step::GenerateKey,
                format!("error generating key: {e}"),
            )),
        }
    }

    /// Full upload, then a single minimal attempt under `<key>-minimal`
    async fn upload(&self, object: ObjectRef) -> (StepOutcome, Option<ObjectRef>) {
        let payload = &self.settings.payload;
        let content_type = mime_guess::from_path(&object.key)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let full_err = match self
            .store
            .put_object(&object, payload.clone(), &PutOptions::full(content_type))
            .await
        {
            Ok(_) => {
                let outcome = StepOutcome::passed(
                    Step::Upload,
                    format!("uploaded {} ({} bytes)", object.key, payload.len()),
                );
                return (outcome, Some(object));
            }
            Err(e) => e,
        };

        tracing::warn!(
            key = %object.key,
            error = %full_err,
            "upload failed, trying minimal upload"
        );
        let minimal = object.minimal();
        match self
            .store
            .put_object(&minimal, payload.clone(), &PutOptions::minimal())
            .await
        {
            Ok(_) => {
                let outcome = StepOutcome::passed(
                    Step::Upload,
                    format!(
                        "minimal upload succeeded with key {} ({} bytes)",
                        minimal.key,
                        payload.len()
                    ),
                )
                .with_details(vec![format!("full upload: {full_err}")]);
                (outcome, Some(minimal))
            }
            Err(minimal_err) => {
                let outcome = StepOutcome::failed(Step::Upload, "both upload attempts failed")
                    .with_details(vec![
                        format!("full upload: {full_err}"),
                        format!("minimal upload: {minimal_err}"),
                    ]);
                (outcome, None)
            }
        }
    }

    async fn verify_upload(&self, object: &ObjectRef) -> StepOutcome {
        let attempts = self.settings.verify_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match self.store.head_object(object).await {
                Ok(_) => {
                    let outcome =
                        StepOutcome::passed(Step::VerifyUpload, "object exists and is accessible");
                    return if attempt > 1 {
                        outcome.with_details(vec![format!("visible after {attempt} attempts")])
                    } else {
                        outcome
                    };
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "object not visible yet");
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.verify_interval).await;
                    }
                }
            }
        }

        let reason = last_err.map(|e| e.to_string()).unwrap_or_default();
        StepOutcome::failed(
            Step::VerifyUpload,
            format!("object not visible after {attempts} attempts: {reason}"),
        )
    }

    async fn metadata(&self, object: &ObjectRef) -> StepOutcome {
        match self.store.head_object(object).await {
            Ok(info) => {
                let mut details = Vec::new();
                if let Some(size) = info.size_bytes {
                    details.push(format!("Content Length: {size} bytes"));
                }
                if let Some(modified) = info.last_modified {
                    details.push(format!("Last Modified: {modified}"));
                }
                if let Some(etag) = info.etag {
                    details.push(format!("ETag: {etag}"));
                }
                if let Some(ct) = info.content_type {
                    details.push(format!("Content Type: {ct}"));
                }
                StepOutcome::passed(Step::Metadata, "file metadata retrieved").with_details(details)
            }
            Err(e) => StepOutcome::failed(Step::Metadata, format!("error getting metadata: {e}")),
        }
    }

    fn public_url(&self, object: &ObjectRef) -> StepOutcome {
        let url = object.public_url(self.settings.endpoint.as_deref(), &self.settings.region);
        StepOutcome::passed(Step::PublicUrl, url)
    }

    async fn presigned_url(&self, object: &ObjectRef) -> StepOutcome {
        match self
            .store
            .presign_get(object, self.settings.presign_expiry)
            .await
        {
            Ok(url) => StepOutcome::passed(Step::PresignedUrl, url),
            Err(e) => StepOutcome::failed(
                Step::PresignedUrl,
                format!("error generating presigned URL: {e}"),
            ),
        }
    }

    async fn list_objects(&self, object: &ObjectRef) -> StepOutcome {
        let prefix = object.listing_prefix();
        let options = ListOptions {
            prefix: Some(prefix.clone()),
            max_keys: Some(self.settings.list_limit),
        };

        match self.store.list_objects(&object.bucket, options).await {
            Ok(result) => {
                let details = result
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let modified = item
                            .last_modified
                            .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "-".to_string());
                        format!(
                            "{}. {} ({} bytes, {modified})",
                            i + 1,
                            item.key,
                            item.size_bytes.unwrap_or(0)
                        )
                    })
                    .collect();
                StepOutcome::passed(
                    Step::ListObjects,
                    format!("found {} files with prefix '{prefix}'", result.items.len()),
                )
                .with_details(details)
            }
            Err(e) => StepOutcome::failed(Step::ListObjects, format!("error listing files: {e}")),
        }
    }

    async fn soft_delete(&self, object: &ObjectRef) -> (StepOutcome, SoftDeleteState) {
        let deleted = object.soft_deleted();
        let mut state = SoftDeleteState::default();

        if let Err(e) = self.store.copy_object(object, &deleted).await {
            let outcome = StepOutcome::failed(
                Step::SoftDelete,
                format!("error copying to {}: {e}", deleted.key),
            );
            return (outcome, state);
        }
        state.copied = true;

        let outcome = match self.store.delete_object(object).await {
            Ok(()) => {
                state.original_removed = true;
                StepOutcome::passed(Step::SoftDelete, format!("moved to {}", deleted.key))
            }
            Err(e) => StepOutcome::failed(
                Step::SoftDelete,
                format!("copied to {} but deleting the original failed: {e}", deleted.key),
            ),
        };
        (outcome, state)
    }

    async fn verify_soft_delete(&self, object: &ObjectRef) -> StepOutcome {
        let deleted = object.soft_deleted();
        let mut ok = true;
        let mut details = Vec::new();

        // Any head error counts as gone, not only NotFound
        match self.store.head_object(object).await {
            Err(_) => details.push("original no longer exists".to_string()),
            Ok(_) => {
                ok = false;
                details.push("original still exists".to_string());
            }
        }

        match self.store.head_object(&deleted).await {
            Ok(_) => details.push(format!("{} exists", deleted.key)),
            Err(e) => {
                ok = false;
                details.push(format!("{} missing: {e}", deleted.key));
            }
        }

        if ok {
            StepOutcome::passed(Step::VerifySoftDelete, "soft delete verified")
                .with_details(details)
        } else {
            StepOutcome::failed(Step::VerifySoftDelete, "soft delete not reflected")
                .with_details(details)
        }
    }

    async fn cleanup(&self, object: &ObjectRef, state: SoftDeleteState) -> StepOutcome {
        let mut targets = Vec::new();
        if state.copied {
            targets.push(object.soft_deleted());
        }
        if !state.original_removed {
            targets.push(object.clone());
        }

        let mut removed = Vec::new();
        let mut errors = Vec::new();
        for target in &targets {
            match self.store.delete_object(target).await {
                Ok(()) => removed.push(format!("removed {}", target.key)),
                Err(Error::NotFound(_)) => removed.push(format!("{} already gone", target.key)),
                Err(e) => errors.push(format!("removing {} failed: {e}", target.key)),
            }
        }

        if errors.is_empty() {
            StepOutcome::passed(Step::Cleanup, "cleanup complete").with_details(removed)
        } else {
            removed.extend(errors);
            StepOutcome::failed(Step::Cleanup, "cleanup incomplete").with_details(removed)
        }
    }
}
