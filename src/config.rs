//! Declarative loader configuration.
//!
//! [`LoaderConfig`] is plain data with millisecond fields, suited to config
//! files and environment-driven settings. Enable the `serde` feature to
//! deserialize it; missing fields fall back to the defaults.
//!
//! ```rust
//! use loadwell::{Load, LoaderConfig};
//!
//! # tokio_test::block_on(async {
//! let config = LoaderConfig {
//!     max_retries: 2,
//!     timeout_ms: 5_000,
//!     ..LoaderConfig::default()
//! };
//!
//! let loader = config.apply(|| async { Ok::<_, String>("chart.js") })?;
//! assert_eq!(loader.load().await, Ok("chart.js"));
//! # Ok::<(), loadwell::ConfigError>(())
//! # }).unwrap();
//! ```

use std::fmt;
use std::time::Duration;

use crate::loader::{Load, Retry, RetryTimeoutOptions, Timeout};
use crate::retry::{RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_MAX_RETRIES};

/// Invalid loader configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The backoff multiplier is below 1.0 or not a finite number.
    InvalidMultiplier(f64),
    /// The per-attempt timeout is zero.
    ZeroTimeout,
    /// The jitter factor is outside `0.0..=1.0`.
    InvalidJitter(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMultiplier(m) => {
                write!(f, "backoff multiplier must be finite and >= 1.0, got {}", m)
            }
            Self::ZeroTimeout => write!(f, "timeout must be greater than zero"),
            Self::InvalidJitter(j) => write!(f, "jitter factor must be within 0.0..=1.0, got {}", j),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Retry and timeout settings in serializable form.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoaderConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,
    /// Optional cap on any single delay, in milliseconds.
    pub max_delay_ms: Option<u64>,
    /// Deadline for each attempt, in milliseconds.
    pub timeout_ms: u64,
    /// Optional proportional jitter factor (requires the `jitter` feature to
    /// take effect).
    pub jitter: Option<f64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: 1_000,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay_ms: None,
            timeout_ms: 10_000,
            jitter: None,
        }
    }
}

impl LoaderConfig {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(self.backoff_multiplier));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(j) = self.jitter {
            if !(0.0..=1.0).contains(&j) {
                return Err(ConfigError::InvalidJitter(j));
            }
        }
        Ok(())
    }

    /// The per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Build the retry policy, validating the configuration first.
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        self.validate()?;

        let mut policy = RetryPolicy::exponential(Duration::from_millis(self.initial_delay_ms))
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_max_retries(self.max_retries);
        if let Some(max) = self.max_delay_ms {
            policy = policy.with_max_delay(Duration::from_millis(max));
        }
        if let Some(factor) = self.jitter {
            policy = policy.with_jitter(factor);
        }
        Ok(policy)
    }

    /// Wrap `loader` with the configured timeout and retry policy.
    pub fn apply<L: Load>(&self, loader: L) -> Result<Retry<Timeout<L>>, ConfigError> {
        let policy = self.retry_policy()?;
        Ok(Retry::new(Timeout::new(loader, self.timeout()), policy))
    }
}

impl TryFrom<&LoaderConfig> for RetryTimeoutOptions {
    type Error = ConfigError;

    fn try_from(config: &LoaderConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(RetryTimeoutOptions {
            max_retries: config.max_retries,
            timeout: config.timeout(),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
        })
    }
}

impl From<&RetryTimeoutOptions> for LoaderConfig {
    fn from(options: &RetryTimeoutOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            initial_delay_ms: options.initial_delay.as_millis() as u64,
            backoff_multiplier: options.backoff_multiplier,
            max_delay_ms: None,
            timeout_ms: options.timeout.as_millis() as u64,
            jitter: None,
        }
    }
}
