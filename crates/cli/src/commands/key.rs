//! key command - Allocate object keys offline
//!
//! Useful for checking what key a filename and environment produce without
//! credentials or network access.

use clap::Args;
use serde::Serialize;
use sp_core::key::is_dev_environment;
use sp_core::target::ENV_ENVIRONMENT;
use sp_core::{Clock, GenerationError, KeyAllocator, ObjectKey, RandomSource};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Allocate object keys
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Filename whose extension the key keeps
    pub filename: String,

    /// Deployment environment; defaults to $ENV
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Compute the month segment in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Number of keys to allocate
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Debug, Serialize)]
struct KeyOutput {
    key: ObjectKey,
    month: String,
    id: String,
    extension: String,
    dev: bool,
}

impl From<ObjectKey> for KeyOutput {
    fn from(key: ObjectKey) -> Self {
        Self {
            month: key.month().to_string(),
            id: key.id().to_string(),
            extension: key.extension().to_string(),
            dev: key.is_dev(),
            key,
        }
    }
}

/// Execute the key command
pub fn execute(args: KeyArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let environment = args
        .environment
        .clone()
        .or_else(|| std::env::var(ENV_ENVIRONMENT).ok())
        .unwrap_or_default();
    tracing::debug!(
        environment = %environment,
        dev = is_dev_environment(&environment),
        "allocating keys"
    );

    let keys = if args.utc {
        allocate_keys(&KeyAllocator::utc(), &args.filename, &environment, args.count)
    } else {
        allocate_keys(&KeyAllocator::new(), &args.filename, &environment, args.count)
    };

    match keys {
        Ok(keys) => {
            if formatter.is_json() {
                formatter.json(&keys);
            } else {
                for key in &keys {
                    formatter.println(key.key.as_str());
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::GeneralError
        }
    }
}

fn allocate_keys<C: Clock, R: RandomSource>(
    allocator: &KeyAllocator<C, R>,
    filename: &str,
    environment: &str,
    count: usize,
) -> Result<Vec<KeyOutput>, GenerationError> {
    (0..count)
        .map(|_| allocator.allocate(filename, environment).map(KeyOutput::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use jiff::tz::TimeZone;
    use sp_core::FixedClock;

    /// Bytes 0, 1, 2, ... so the id is the first letters of the alphabet
    struct Counting;

    impl RandomSource for Counting {
        fn try_fill(&self, dest: &mut [u8]) -> Result<(), GenerationError> {
            for (i, b) in dest.iter_mut().enumerate() {
                *b = i as u8;
            }
            Ok(())
        }
    }

    fn allocator() -> KeyAllocator<FixedClock, Counting> {
        let now = date(2024, 11, 3)
            .at(12, 0, 0, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap();
        KeyAllocator::with_sources(FixedClock(now), Counting)
    }

    #[test]
    fn test_key_output_json() {
        let keys = allocate_keys(&allocator(), "photo.PNG", "development", 1).unwrap();
        insta::assert_snapshot!(serde_json::to_string(&keys).unwrap(), @r#"[{"key":"dev/202411/ABCDEFGHIJKLMNO.PNG","month":"202411","id":"ABCDEFGHIJKLMNO","extension":"PNG","dev":true}]"#);
    }

    #[test]
    fn test_allocate_count() {
        let keys = allocate_keys(&allocator(), "notes", "production", 3).unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| k.key.as_str() == "202411/ABCDEFGHIJKLMNO.jpg"));
        assert!(keys.iter().all(|k| !k.dev));
    }

    #[test]
    fn test_allocate_zero() {
        let keys = allocate_keys(&allocator(), "a.txt", "", 0).unwrap();
        assert!(keys.is_empty());
    }
}
