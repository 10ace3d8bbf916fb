//! ObjectStore trait definition
//!
//! This trait defines the storage operations the probe exercises.
//! It keeps the probe decoupled from the S3 SDK so the scenario can run
//! against an in-memory store or a mock in tests.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::object::ObjectRef;

/// Metadata for an object or bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp (creation date for buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag without surrounding quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Storage class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Whether this is a bucket
    pub is_bucket: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size.max(0) as u64, humansize::BINARY)),
            last_modified: None,
            etag: None,
            storage_class: None,
            content_type: None,
            is_bucket: false,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self {
            key: name.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            storage_class: None,
            content_type: None,
            is_bucket: true,
        }
    }
}

/// Result of a list operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResult {
    /// Listed objects
    pub items: Vec<ObjectInfo>,

    /// Whether the result is truncated (more items available)
    pub truncated: bool,
}

/// Options for list operations
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Prefix to filter by
    pub prefix: Option<String>,

    /// Maximum number of keys to return
    pub max_keys: Option<i32>,
}

/// Options for uploads
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Content type header
    pub content_type: Option<String>,

    /// Send an explicit Content-Length header
    pub content_length: bool,
}

impl PutOptions {
    /// Content type plus explicit length
    pub fn full(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            content_length: true,
        }
    }

    /// Bare upload, no optional headers
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Upload an object
    async fn put_object(
        &self,
        object: &ObjectRef,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<ObjectInfo>;

    /// Get object metadata
    async fn head_object(&self, object: &ObjectRef) -> Result<ObjectInfo>;

    /// List objects in a bucket
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult>;

    /// Server-side copy
    async fn copy_object(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<ObjectInfo>;

    /// Delete an object
    async fn delete_object(&self, object: &ObjectRef) -> Result<()>;

    /// Presigned GET URL valid for `expires`
    async fn presign_get(&self, object: &ObjectRef, expires: Duration) -> Result<String>;
}
