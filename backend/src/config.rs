//! Report pipeline configuration.
//!
//! Values come from the environment or from the `[report]` section of
//! `repository.toml` (see [`crate::db::repo_config`]).
//!
//! Environment variables:
//! - `REPORT_BATCH_SIZE`: Locations processed per page (default: 500)
//! - `REPORT_FALLBACK_TIMEZONE`: IANA zone for locations without an assignment
//!   (default: `America/Chicago`)

use chrono_tz::Tz;
use std::env;

/// Default number of locations per processing page.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default zone for locations that have no timezone assignment.
pub const DEFAULT_FALLBACK_TIMEZONE: Tz = chrono_tz::America::Chicago;

/// Settings consumed by the report pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Locations fetched and computed per page
    pub batch_size: usize,
    /// Zone used when a location has no (or an unknown) assignment
    pub fallback_timezone: Tz,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            fallback_timezone: DEFAULT_FALLBACK_TIMEZONE,
        }
    }
}

impl ReportConfig {
    /// Build a configuration from explicit values, validating both.
    pub fn new(batch_size: usize, fallback_timezone: &str) -> Result<Self, String> {
        if batch_size == 0 {
            return Err("report batch size must be greater than zero".to_string());
        }
        let fallback_timezone = parse_timezone(fallback_timezone)?;
        Ok(Self {
            batch_size,
            fallback_timezone,
        })
    }

    /// Load configuration from environment variables, falling back to defaults
    /// for unset values.
    ///
    /// # Errors
    /// Returns an error if a variable is set but invalid.
    pub fn from_env() -> Result<Self, String> {
        let batch_size = match env::var("REPORT_BATCH_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("REPORT_BATCH_SIZE must be a positive integer, got '{raw}'"))?,
            Err(_) => DEFAULT_BATCH_SIZE,
        };
        let fallback = env::var("REPORT_FALLBACK_TIMEZONE")
            .unwrap_or_else(|_| DEFAULT_FALLBACK_TIMEZONE.name().to_string());

        Self::new(batch_size, &fallback)
    }

    /// Override the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Parse an IANA zone name.
pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| format!("unknown timezone '{}'", name))
}
