//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from sp-core.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use sp_core::{
    Error, ListOptions, ListResult, ObjectInfo, ObjectRef, ObjectStore, PutOptions, Result,
    Target,
};

use crate::profile::ClientProfile;

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    profile: ClientProfile,
}

impl S3Client {
    /// Create a new S3 client for a target under the given profile
    pub async fn new(target: &Target, profile: ClientProfile) -> Result<Self> {
        target.validate()?;

        let credentials = aws_credential_types::Credentials::new(
            target.access_key.clone(),
            target.secret_key.clone(),
            None, // session token
            None, // expiry
            "s3probe-static-credentials",
        );

        let timeouts = target.timeout_config();
        let timeout_config = aws_smithy_types::timeout::TimeoutConfig::builder()
            .connect_timeout(Duration::from_millis(timeouts.connect_ms))
            .read_timeout(Duration::from_millis(timeouts.read_ms))
            .build();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(target.region.clone()))
            .timeout_config(timeout_config);
        if let Some(endpoint) = &target.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        let builder = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(target.uses_path_style());
        let s3_config = profile.apply(builder).build();

        tracing::debug!(
            target_name = %target.name,
            profile = profile.label(),
            path_style = target.uses_path_style(),
            "created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            profile,
        })
    }

    pub fn profile(&self) -> ClientProfile {
        self.profile
    }
}

/// Map an SDK failure onto the core error kinds
fn sdk_error<E>(err: SdkError<E>, resource: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.as_service_error().and_then(|e| e.code()).map(str::to_string);
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = DisplayErrorContext(&err).to_string();
    classify(code.as_deref(), status, message, resource)
}

fn classify(code: Option<&str>, status: Option<u16>, message: String, resource: &str) -> Error {
    const NOT_FOUND: [&str; 3] = ["NotFound", "NoSuchKey", "NoSuchBucket"];
    const AUTH: [&str; 3] = ["AccessDenied", "InvalidAccessKeyId", "SignatureDoesNotMatch"];

    let matches = |names: &[&str]| {
        names
            .iter()
            .any(|n| code == Some(*n) || message.contains(n))
    };

    if status == Some(404) || matches(&NOT_FOUND) {
        Error::NotFound(resource.to_string())
    } else if status == Some(403) || matches(&AUTH) {
        Error::Auth(message)
    } else {
        Error::Network(message)
    }
}

fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

fn timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(dt.secs()).ok()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        tracing::debug!(profile = self.profile.label(), "list_buckets");
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| sdk_error(e, "buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::bucket(b.name().unwrap_or_default());
                info.last_modified = b.creation_date().and_then(timestamp);
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        tracing::debug!(profile = self.profile.label(), bucket, "head_bucket");
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match sdk_error(e, bucket) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn put_object(
        &self,
        object: &ObjectRef,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<ObjectInfo> {
        tracing::debug!(
            profile = self.profile.label(),
            key = %object,
            content_type = options.content_type.as_deref(),
            content_length = options.content_length,
            "put_object"
        );
        let size = data.len() as i64;

        let mut request = self
            .inner
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .body(ByteStream::from(data));

        if let Some(ct) = &options.content_type {
            request = request.content_type(ct);
        }
        if options.content_length {
            request = request.content_length(size);
        }

        let response = request
            .send()
            .await
            .map_err(|e| sdk_error(e, &object.to_string()))?;

        let mut info = ObjectInfo::file(&object.key, size);
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = options.content_type.clone();
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn head_object(&self, object: &ObjectRef) -> Result<ObjectInfo> {
        tracing::debug!(profile = self.profile.label(), key = %object, "head_object");
        let response = self
            .inner
            .head_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| sdk_error(e, &object.to_string()))?;

        let size = response.content_length().unwrap_or(0);
        let mut info = ObjectInfo::file(&object.key, size);
        info.last_modified = response.last_modified().and_then(timestamp);
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = response.content_type().map(str::to_string);
        info.storage_class = response.storage_class().map(|sc| sc.as_str().to_string());

        Ok(info)
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        tracing::debug!(
            profile = self.profile.label(),
            bucket,
            prefix = options.prefix.as_deref(),
            "list_objects_v2"
        );
        let mut request = self.inner.list_objects_v2().bucket(bucket);

        if let Some(prefix) = options.prefix {
            request = request.prefix(prefix);
        }
        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        let response = request.send().await.map_err(|e| sdk_error(e, bucket))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let mut info =
                    ObjectInfo::file(object.key().unwrap_or_default(), object.size().unwrap_or(0));
                info.last_modified = object.last_modified().and_then(timestamp);
                info.etag = object.e_tag().map(trim_etag);
                info.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
                info
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
        })
    }

    async fn copy_object(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<ObjectInfo> {
        tracing::debug!(profile = self.profile.label(), src = %src, dst = %dst, "copy_object");
        let response = self
            .inner
            .copy_object()
            .copy_source(src.copy_source())
            .bucket(&dst.bucket)
            .key(&dst.key)
            .send()
            .await
            .map_err(|e| sdk_error(e, &src.to_string()))?;

        let result = response.copy_object_result();
        let mut info = ObjectInfo::file(&dst.key, 0);
        info.size_bytes = None;
        info.size_human = None;
        info.etag = result.and_then(|r| r.e_tag()).map(trim_etag);
        info.last_modified = result.and_then(|r| r.last_modified()).and_then(timestamp);

        Ok(info)
    }

    async fn delete_object(&self, object: &ObjectRef) -> Result<()> {
        tracing::debug!(profile = self.profile.label(), key = %object, "delete_object");
        self.inner
            .delete_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| sdk_error(e, &object.to_string()))?;

        Ok(())
    }

    async fn presign_get(&self, object: &ObjectRef, expires: Duration) -> Result<String> {
        tracing::debug!(
            profile = self.profile.label(),
            key = %object,
            expires_secs = expires.as_secs(),
            "presign get_object"
        );
        let config = PresigningConfig::expires_in(expires)
            .map_err(|e| Error::General(format!("invalid presign expiry: {e}")))?;

        let request = self
            .inner
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .presigned(config)
            .await
            .map_err(|e| sdk_error(e, &object.to_string()))?;

        Ok(request.uri().to_string())
    }
}
