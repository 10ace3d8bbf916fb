//! Object references
//!
//! An [`ObjectRef`] addresses one key in one bucket and derives the related
//! names the probe needs: copy source, soft-delete key, listing prefix and
//! public URL.

use std::fmt;

/// Suffix appended to a key when it is soft-deleted
pub const DELETED_SUFFIX: &str = ".deleted";

/// Suffix used for the minimal fallback upload
pub const MINIMAL_SUFFIX: &str = "-minimal";

/// A key within a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Same bucket, different key
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self::new(self.bucket.clone(), key)
    }

    /// The `.deleted` copy used by soft delete
    pub fn soft_deleted(&self) -> Self {
        self.with_key(format!("{}{DELETED_SUFFIX}", self.key))
    }

    /// The key used by the minimal fallback upload
    pub fn minimal(&self) -> Self {
        self.with_key(format!("{}{MINIMAL_SUFFIX}", self.key))
    }

    /// `bucket/key`, the form CopyObject expects
    pub fn copy_source(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }

    /// First key segment with its trailing slash, or empty for top-level keys
    pub fn listing_prefix(&self) -> String {
        match self.key.split_once('/') {
            Some((first, _)) => format!("{first}/"),
            None => String::new(),
        }
    }

    /// Unsigned URL of the object
    ///
    /// Custom endpoints use path style (`endpoint/bucket/key`); without an
    /// endpoint the AWS virtual-host form is used.
    pub fn public_url(&self, endpoint: Option<&str>, region: &str) -> String {
        match endpoint.filter(|e| !e.is_empty()) {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                self.key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, region, self.key
            ),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}
