//! Object key allocation
//!
//! Keys have the shape `[dev/]YYYYMM/<random-id>.<ext>`. The month segment
//! keeps uploads sortable and groups them for prefix listing, the random id
//! makes same-month collisions negligible.
//!
//! Time and randomness are injected through [`Clock`] and [`RandomSource`]
//! so callers can pin both in tests without touching production call sites.

use std::fmt;

use jiff::Zoned;
use jiff::tz::TimeZone;
use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use thiserror::Error;

/// Number of characters in the random id segment
pub const ID_LENGTH: usize = 15;

/// Extension used when the filename has no `.`
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Prefix prepended for development environments
pub const DEV_PREFIX: &str = "dev";

/// URL-safe id alphabet. 64 symbols, so `byte & 63` picks uniformly.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// The random source could not produce an id
#[derive(Error, Debug)]
#[error("failed to generate object id: {0}")]
pub struct GenerationError(String);

impl GenerationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> Zoned;
}

/// Wall clock in the process's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Zoned {
        Zoned::now()
    }
}

/// Wall clock pinned to UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcClock;

impl Clock for UtcClock {
    fn now(&self) -> Zoned {
        jiff::Timestamp::now().to_zoned(TimeZone::UTC)
    }
}

/// Clock that always reports the same instant
#[derive(Debug, Clone)]
pub struct FixedClock(pub Zoned);

impl Clock for FixedClock {
    fn now(&self) -> Zoned {
        self.0.clone()
    }
}

/// Source of random bytes for the id segment
///
/// Implementations must be callable from many threads at once.
pub trait RandomSource: Send + Sync {
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), GenerationError>;
}

/// Operating system CSPRNG
///
/// Holds no generator state; every call goes straight to the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), GenerationError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| GenerationError::new(e.to_string()))
    }
}

/// A generated object key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the key carries the development prefix
    pub fn is_dev(&self) -> bool {
        self.segments().len() == 3
    }

    /// The `YYYYMM` segment
    pub fn month(&self) -> &str {
        let segments = self.segments();
        segments[segments.len() - 2]
    }

    /// The random id segment, without extension
    pub fn id(&self) -> &str {
        self.file_part()
            .split_once('.')
            .map(|(id, _)| id)
            .unwrap_or_default()
    }

    /// The extension, as taken from the input filename
    pub fn extension(&self) -> &str {
        self.file_part()
            .split_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default()
    }

    fn file_part(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    fn segments(&self) -> Vec<&str> {
        self.0.split('/').collect()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.0
    }
}

/// Builds object keys from a filename and an environment tag
#[derive(Debug, Clone, Default)]
pub struct KeyAllocator<C = SystemClock, R = OsRandom> {
    clock: C,
    random: R,
}

impl KeyAllocator {
    /// Allocator on the local wall clock and the OS random source
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyAllocator<UtcClock, OsRandom> {
    /// Allocator whose month segment is computed in UTC
    pub fn utc() -> Self {
        Self::with_sources(UtcClock, OsRandom)
    }
}

impl<C: Clock, R: RandomSource> KeyAllocator<C, R> {
    pub fn with_sources(clock: C, random: R) -> Self {
        Self { clock, random }
    }

    /// Allocate a key for `filename`
    ///
    /// `environment` must be exactly `"dev"` or `"development"` for the
    /// `dev/` prefix; no case folding is applied. Only the random source can
    /// fail; every filename, including the empty one, yields a key.
    pub fn allocate(
        &self,
        filename: &str,
        environment: &str,
    ) -> Result<ObjectKey, GenerationError> {
        let extension = extension_of(filename);
        let month = self.clock.now().strftime("%Y%m").to_string();
        let id = self.random_id()?;

        let key = if is_dev_environment(environment) {
            format!("{DEV_PREFIX}/{month}/{id}.{extension}")
        } else {
            format!("{month}/{id}.{extension}")
        };

        Ok(ObjectKey(key))
    }

    fn random_id(&self) -> Result<String, GenerationError> {
        let mut bytes = [0u8; ID_LENGTH];
        self.random.try_fill(&mut bytes)?;
        Ok(bytes
            .iter()
            .map(|b| ALPHABET[(b & 63) as usize] as char)
            .collect())
    }
}

/// Allocate a key with the default clock and random source
pub fn allocate(filename: &str, environment: &str) -> Result<ObjectKey, GenerationError> {
    KeyAllocator::new().allocate(filename, environment)
}

/// Whether `environment` selects the development prefix
pub fn is_dev_environment(environment: &str) -> bool {
    environment == "dev" || environment == "development"
}

/// Extension after the last `.` of the final path component, or `jpg`
fn extension_of(filename: &str) -> &str {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => DEFAULT_EXTENSION,
    }
}
