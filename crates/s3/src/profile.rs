//! Client profiles
//!
//! A profile is a fixed set of SDK settings the probe runs under. `legacy`
//! behaves like older S3 clients: checksums only when an operation requires
//! them, so uploads go out as plain signed bodies. `modern` keeps the current
//! SDK defaults, which add flexible checksums and aws-chunked uploads that some
//! S3-compatible providers reject.

use std::fmt;
use std::str::FromStr;

use aws_sdk_s3::config::{Builder, RequestChecksumCalculation, ResponseChecksumValidation};
use sp_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientProfile {
    Legacy,
    Modern,
}

impl ClientProfile {
    pub const ALL: [ClientProfile; 2] = [ClientProfile::Legacy, ClientProfile::Modern];

    pub fn label(self) -> &'static str {
        match self {
            ClientProfile::Legacy => "legacy",
            ClientProfile::Modern => "modern",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ClientProfile::Legacy => "checksums only when required",
            ClientProfile::Modern => "SDK default checksums",
        }
    }

    /// Apply this profile's settings to an S3 config builder
    pub fn apply(self, builder: Builder) -> Builder {
        match self {
            ClientProfile::Legacy => builder
                .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
                .response_checksum_validation(ResponseChecksumValidation::WhenRequired),
            ClientProfile::Modern => builder
                .request_checksum_calculation(RequestChecksumCalculation::WhenSupported)
                .response_checksum_validation(ResponseChecksumValidation::WhenSupported),
        }
    }
}

impl fmt::Display for ClientProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClientProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" | "v1" => Ok(ClientProfile::Legacy),
            "modern" | "v2" => Ok(ClientProfile::Modern),
            other => Err(Error::Config(format!(
                "unknown client profile '{other}', expected 'legacy' or 'modern'"
            ))),
        }
    }
}
