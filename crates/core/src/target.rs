//! Connection targets
//!
//! A target is everything needed to reach one bucket on an S3-compatible
//! provider: endpoint, credentials, region, bucket and the deployment
//! environment tag used for key allocation. Targets come either from the
//! process environment (optionally seeded from a `.env` file) or from named
//! entries in the config file.

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};

pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_REGION: &str = "AWS_DEFAULT_REGION";
pub const ENV_BUCKET: &str = "AWS_BUCKET_NAME";
pub const ENV_ENDPOINT: &str = "AWS_ENDPOINT_URL";
pub const ENV_ENVIRONMENT: &str = "ENV";

/// Name given to the target assembled from environment variables
pub const ENV_TARGET_NAME: &str = "env";

/// Timeout configuration for a target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Read timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    30000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            read_ms: default_read_timeout(),
        }
    }
}

/// A named S3-compatible bucket with credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Unique name for this target
    pub name: String,

    /// Custom endpoint URL; `None` means AWS S3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Bucket the probe runs against
    pub bucket: String,

    /// Deployment environment tag, `dev`/`development` prefix keys with `dev/`
    #[serde(default)]
    pub environment: String,

    /// Bucket lookup style: "auto", "path", or "dns"
    #[serde(default = "default_bucket_lookup")]
    pub bucket_lookup: String,

    /// Timeout configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket_lookup() -> String {
    "auto".to_string()
}

impl Target {
    /// Create a new target with required fields
    pub fn new(
        name: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: default_region(),
            bucket: bucket.into(),
            environment: String::new(),
            bucket_lookup: default_bucket_lookup(),
            timeout: None,
        }
    }

    /// Build a target from the process environment
    pub fn from_process_env() -> Result<Self> {
        Self::from_env(|name| std::env::var(name).ok())
    }

    /// Build a target from an environment lookup
    ///
    /// Empty values count as missing. All four of access key, secret key,
    /// region and bucket are required; endpoint and environment are optional.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let required = [ENV_ACCESS_KEY, ENV_SECRET_KEY, ENV_REGION, ENV_BUCKET];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|&name| get(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let target = Self {
            name: ENV_TARGET_NAME.to_string(),
            endpoint: get(ENV_ENDPOINT),
            access_key: get(ENV_ACCESS_KEY).unwrap_or_default(),
            secret_key: get(ENV_SECRET_KEY).unwrap_or_default(),
            region: get(ENV_REGION).unwrap_or_else(default_region),
            bucket: get(ENV_BUCKET).unwrap_or_default(),
            environment: get(ENV_ENVIRONMENT).unwrap_or_default(),
            bucket_lookup: default_bucket_lookup(),
            timeout: None,
        };
        target.validate()?;
        Ok(target)
    }

    /// Check the fields a client needs
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidTarget("name cannot be empty".into()));
        }
        if self.bucket.is_empty() {
            return Err(Error::InvalidTarget("bucket cannot be empty".into()));
        }
        if !matches!(self.bucket_lookup.as_str(), "auto" | "path" | "dns") {
            return Err(Error::InvalidTarget(
                "bucket lookup must be 'auto', 'path', or 'dns'".into(),
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(Error::InvalidTarget(format!(
                    "endpoint must be http or https: {endpoint}"
                )));
            }
        }
        Ok(())
    }

    /// Whether requests address buckets in the path rather than the host
    ///
    /// `auto` picks path style for custom endpoints, the common case for
    /// S3-compatible providers.
    pub fn uses_path_style(&self) -> bool {
        match self.bucket_lookup.as_str() {
            "path" => true,
            "dns" => false,
            _ => self.endpoint.is_some(),
        }
    }

    /// Secret key reduced to a prefix that is safe to print
    pub fn masked_secret(&self) -> String {
        let len = self.secret_key.chars().count();
        if len > 5 {
            let prefix: String = self.secret_key.chars().take(5).collect();
            format!("{prefix}*** (length: {len})")
        } else {
            format!("*** (length: {len})")
        }
    }

    /// Get the effective timeout configuration
    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeout.clone().unwrap_or_default()
    }
}

/// Manager for named targets in the config file
pub struct TargetManager {
    config_manager: ConfigManager,
}

impl TargetManager {
    /// Create a new TargetManager with a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a new TargetManager using the default config location
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::new()?;
        Ok(Self { config_manager })
    }

    /// List all configured targets
    pub fn list(&self) -> Result<Vec<Target>> {
        let config = self.config_manager.load()?;
        Ok(config.targets)
    }

    /// Get a target by name
    pub fn get(&self, name: &str) -> Result<Target> {
        let config = self.config_manager.load()?;
        config
            .targets
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::TargetNotFound(name.to_string()))
    }

    /// Add or update a target
    pub fn set(&self, target: Target) -> Result<()> {
        target.validate()?;
        let mut config = self.config_manager.load()?;

        config.targets.retain(|t| t.name != target.name);
        config.targets.push(target);

        self.config_manager.save(&config)
    }

    /// Remove a target
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.targets.len();

        config.targets.retain(|t| t.name != name);

        if config.targets.len() == original_len {
            return Err(Error::TargetNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }

    /// Check if a target exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        let config = self.config_manager.load()?;
        Ok(config.targets.iter().any(|t| t.name == name))
    }
}
