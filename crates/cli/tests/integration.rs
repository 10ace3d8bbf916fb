//! Integration tests for s3probe
//!
//! These tests require a running S3-compatible server and an existing bucket.
//!
//! Run with:
//! ```bash
//! # Start a local server
//! docker run -d --name minio -p 9000:9000 \
//!     -e MINIO_ROOT_USER=accesskey \
//!     -e MINIO_ROOT_PASSWORD=secretkey \
//!     minio/minio server /data
//!
//! # Run tests
//! TEST_S3_ENDPOINT=http://localhost:9000 \
//! TEST_S3_ACCESS_KEY=accesskey \
//! TEST_S3_SECRET_KEY=secretkey \
//! TEST_S3_BUCKET=probe \
//!     cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

/// S3 connection settings from the environment
struct TestConfig {
    endpoint: String,
    access_key: String,
    secret_key: String,
    bucket: String,
}

fn get_test_config() -> Option<TestConfig> {
    Some(TestConfig {
        endpoint: std::env::var("TEST_S3_ENDPOINT").ok()?,
        access_key: std::env::var("TEST_S3_ACCESS_KEY").ok()?,
        secret_key: std::env::var("TEST_S3_SECRET_KEY").ok()?,
        bucket: std::env::var("TEST_S3_BUCKET").ok()?,
    })
}

/// Run s3probe with an isolated config directory and no inherited AWS_* settings
fn run_s3probe(args: &[&str], config_dir: &Path, envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_s3probe"));
    cmd.args(args)
        .arg("--env-file")
        .arg(config_dir.join("absent.env"))
        .env("S3PROBE_CONFIG_DIR", config_dir);

    for var in [
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_DEFAULT_REGION",
        "AWS_BUCKET_NAME",
        "AWS_ENDPOINT_URL",
        "ENV",
    ] {
        cmd.env_remove(var);
    }
    for (key, value) in envs {
        cmd.env(key, value);
    }

    cmd.output().expect("Failed to execute s3probe")
}

/// Register the test server as target `test` and return the config directory
fn setup_target(config: &TestConfig, environment: &str) -> tempfile::TempDir {
    let config_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_s3probe(
        &[
            "target",
            "set",
            "test",
            &config.access_key,
            &config.secret_key,
            &config.bucket,
            "--endpoint",
            &config.endpoint,
            "--environment",
            environment,
            "--bucket-lookup",
            "path",
        ],
        config_dir.path(),
        &[],
    );
    assert!(
        output.status.success(),
        "Failed to set target: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    config_dir
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON ({e}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

fn statuses(report: &Value) -> Vec<String> {
    report["steps"]
        .as_array()
        .expect("steps array")
        .iter()
        .map(|s| s["status"].as_str().unwrap_or_default().to_string())
        .collect()
}

mod probe_runs {
    use super::*;

    #[test]
    fn test_run_legacy_profile() {
        let Some(config) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let config_dir = setup_target(&config, "dev");

        let output = run_s3probe(
            &["run", "--target", "test", "--profile", "legacy", "--json"],
            config_dir.path(),
            &[],
        );
        let report = parse_json(&output);

        assert_eq!(report["label"], "legacy");
        assert_eq!(report["steps"].as_array().map(Vec::len), Some(12));
        let key = report["key"].as_str().expect("key");
        assert!(key.starts_with("dev/"), "unexpected key {key}");
        assert!(
            output.status.success(),
            "probe failed: {:?}",
            statuses(&report)
        );
    }

    #[test]
    fn test_run_from_environment_variables() {
        let Some(config) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let config_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let output = run_s3probe(
            &["run", "--json", "--filename", "photo.PNG"],
            config_dir.path(),
            &[
                ("AWS_ACCESS_KEY_ID", config.access_key.as_str()),
                ("AWS_SECRET_ACCESS_KEY", config.secret_key.as_str()),
                ("AWS_DEFAULT_REGION", "us-east-1"),
                ("AWS_BUCKET_NAME", config.bucket.as_str()),
                ("AWS_ENDPOINT_URL", config.endpoint.as_str()),
            ],
        );
        let report = parse_json(&output);

        let key = report["key"].as_str().expect("key");
        assert!(!key.starts_with("dev/"));
        assert!(key.ends_with(".PNG") || key.ends_with(".PNG-minimal"));
        assert_eq!(statuses(&report)[0], "passed");
    }

    #[test]
    fn test_compare_profiles() {
        let Some(config) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let config_dir = setup_target(&config, "");

        let output = run_s3probe(
            &["compare", "--target", "test", "--json"],
            config_dir.path(),
            &[],
        );
        let json = parse_json(&output);

        assert_eq!(json["reports"][0]["label"], "legacy");
        assert_eq!(json["reports"][1]["label"], "modern");
        assert_eq!(json["comparison"]["rows"].as_array().map(Vec::len), Some(12));
        assert_ne!(json["reports"][0]["key"], json["reports"][1]["key"]);
    }

    #[test]
    fn test_missing_bucket_fails_probe() {
        let Some(mut config) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        config.bucket = "s3probe-bucket-that-does-not-exist".to_string();
        let config_dir = setup_target(&config, "");

        let output = run_s3probe(
            &["run", "--target", "test", "--json", "--verify-attempts", "1"],
            config_dir.path(),
            &[],
        );
        let report = parse_json(&output);

        assert_eq!(output.status.code(), Some(6));
        assert_eq!(report["steps"][1]["step"], "head_bucket");
        assert_eq!(report["steps"][1]["status"], "failed");
    }
}
