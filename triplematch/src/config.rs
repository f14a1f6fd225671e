//! Engine configuration module.
//!
//! This module provides configuration loading for the query engine from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `TRIPLEMATCH_PIPE_CAPACITY`: Domains buffered per pipe (default: `5`)
//! - `TRIPLEMATCH_MAX_WORKERS`: Upper bound on stage worker threads (default: `512`)
//! - `TRIPLEMATCH_WORKER_KEEP_ALIVE_MS`: How long an idle worker is kept for
//!   reuse (default: `10000`)
//!
//! # Invariants
//!
//! - `pipe_capacity` is at least 1
//! - `max_workers` is at least 2, so an initial and a pattern stage can run
//!   side by side

use std::time::Duration;

/// Engine configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()`, every field satisfies the module
/// invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Capacity of every pipe between stages. This is the backpressure
    /// bound: a producer blocks once this many domains are buffered.
    pub pipe_capacity: usize,
    /// Maximum number of stage workers alive at once. Each running stage
    /// holds one, so this bounds the number of concurrent stages.
    pub max_workers: usize,
    /// How long an idle worker thread waits for new work before exiting.
    pub worker_keep_alive: Duration,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipe_capacity: Self::DEFAULT_PIPE_CAPACITY,
            max_workers: Self::DEFAULT_MAX_WORKERS,
            worker_keep_alive: Duration::from_millis(Self::DEFAULT_WORKER_KEEP_ALIVE_MS),
        }
    }
}

impl EngineConfig {
    /// Default pipe capacity.
    pub const DEFAULT_PIPE_CAPACITY: usize = 5;
    /// Default worker limit.
    pub const DEFAULT_MAX_WORKERS: usize = 512;
    /// Default idle worker keep-alive, in milliseconds.
    pub const DEFAULT_WORKER_KEEP_ALIVE_MS: u64 = 10_000;

    const PIPE_CAPACITY_VAR: &'static str = "TRIPLEMATCH_PIPE_CAPACITY";
    const MAX_WORKERS_VAR: &'static str = "TRIPLEMATCH_MAX_WORKERS";
    const WORKER_KEEP_ALIVE_VAR: &'static str = "TRIPLEMATCH_WORKER_KEEP_ALIVE_MS";

    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but is not a number, or is
    /// below its minimum.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let pipe_capacity = Self::load_number(
            &lookup,
            Self::PIPE_CAPACITY_VAR,
            Self::DEFAULT_PIPE_CAPACITY,
            1,
        )?;
        let max_workers = Self::load_number(
            &lookup,
            Self::MAX_WORKERS_VAR,
            Self::DEFAULT_MAX_WORKERS,
            2,
        )?;
        let keep_alive_ms = Self::load_number(
            &lookup,
            Self::WORKER_KEEP_ALIVE_VAR,
            Self::DEFAULT_WORKER_KEEP_ALIVE_MS,
            0,
        )?;

        Ok(Self {
            pipe_capacity,
            max_workers,
            worker_keep_alive: Duration::from_millis(keep_alive_ms),
        })
    }

    /// Load a numeric variable, falling back to `default` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not parse or is below `minimum`.
    fn load_number<T>(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        default: T,
        minimum: T,
    ) -> Result<T, ConfigError>
    where
        T: std::str::FromStr + PartialOrd + std::fmt::Display,
    {
        let Some(value) = lookup(name) else {
            return Ok(default);
        };
        let parsed = value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                message: format!("'{value}' is not a valid number"),
            })?;
        if parsed < minimum {
            return Err(ConfigError::InvalidValue {
                name: name.to_string(),
                message: format!("must be at least {minimum}"),
            });
        }
        Ok(parsed)
    }

    /// Set the pipe capacity.
    #[must_use]
    pub const fn with_pipe_capacity(mut self, pipe_capacity: usize) -> Self {
        self.pipe_capacity = pipe_capacity;
        self
    }

    /// Set the worker limit.
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the idle worker keep-alive.
    #[must_use]
    pub const fn with_worker_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.worker_keep_alive = keep_alive;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = EngineConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.pipe_capacity, 5);
        assert_eq!(config.max_workers, 512);
        assert_eq!(config.worker_keep_alive, Duration::from_secs(10));
    }

    #[test]
    fn test_values_from_lookup() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("TRIPLEMATCH_PIPE_CAPACITY", "2"),
            ("TRIPLEMATCH_MAX_WORKERS", " 16 "),
            ("TRIPLEMATCH_WORKER_KEEP_ALIVE_MS", "250"),
        ]))
        .expect("config");
        assert_eq!(config.pipe_capacity, 2);
        assert_eq!(config.max_workers, 16);
        assert_eq!(config.worker_keep_alive, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_number() {
        let error = EngineConfig::from_lookup(lookup(&[("TRIPLEMATCH_PIPE_CAPACITY", "lots")]))
            .expect_err("invalid");
        assert_eq!(
            error.to_string(),
            "invalid value for TRIPLEMATCH_PIPE_CAPACITY: 'lots' is not a valid number"
        );
    }

    #[test]
    fn test_below_minimum() {
        let error = EngineConfig::from_lookup(lookup(&[("TRIPLEMATCH_MAX_WORKERS", "1")]))
            .expect_err("too small");
        assert_eq!(
            error,
            ConfigError::InvalidValue {
                name: "TRIPLEMATCH_MAX_WORKERS".to_string(),
                message: "must be at least 2".to_string(),
            }
        );
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_pipe_capacity(1)
            .with_max_workers(4)
            .with_worker_keep_alive(Duration::ZERO);
        assert_eq!(config.pipe_capacity, 1);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.worker_keep_alive, Duration::ZERO);
    }
}
