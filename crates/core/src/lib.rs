//! sp-core: Core library for the s3probe diagnostic tool
//!
//! This crate provides the SDK-independent parts of s3probe:
//! - Object key allocation
//! - Target and configuration management
//! - The probe scenario and report comparison
//! - ObjectStore trait for S3 operations
//!
//! Nothing here depends on the AWS SDK, so the probe can be driven by a mock
//! or in-memory store in tests.

pub mod compare;
pub mod config;
pub mod error;
pub mod key;
pub mod object;
pub mod probe;
pub mod target;
pub mod traits;

pub use compare::{Comparison, ComparisonRow, compare};
pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use key::{
    Clock, FixedClock, GenerationError, KeyAllocator, ObjectKey, OsRandom, RandomSource,
    SystemClock, UtcClock,
};
pub use object::ObjectRef;
pub use probe::{
    Probe, ProbeObserver, ProbeReport, ProbeSettings, Step, StepOutcome, StepStatus,
};
pub use target::{Target, TargetManager, TimeoutConfig};
pub use traits::{ListOptions, ListResult, ObjectInfo, ObjectStore, PutOptions};
