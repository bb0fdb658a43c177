//! Pool configuration options

use std::time::Duration;

use crate::errors::{PoolError, PoolResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for pool capacity and resource lifetime
///
/// # Examples
///
/// ```
/// use genpool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_min_capacity(3)
///     .with_max_capacity(5)
///     .with_ttl(Duration::from_secs(5));
///
/// assert_eq!(config.max_capacity, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfiguration {
    /// Number of resources created eagerly at construction
    pub min_capacity: usize,

    /// Upper bound on live resources (idle plus checked out)
    pub max_capacity: usize,

    /// Maximum age of a resource; `None` or zero means it never expires
    pub time_to_live: Option<Duration>,

    /// Wait bound used by `acquire_async`
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            min_capacity: 0,
            max_capacity: 10,
            time_to_live: None,
            acquire_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of resources to warm up
    pub fn with_min_capacity(mut self, min: usize) -> Self {
        self.min_capacity = min;
        self
    }

    /// Set the maximum number of live resources
    ///
    /// # Examples
    ///
    /// ```
    /// use genpool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_max_capacity(50);
    /// assert_eq!(config.max_capacity, 50);
    /// ```
    pub fn with_max_capacity(mut self, max: usize) -> Self {
        self.max_capacity = max;
        self
    }

    /// Set time-to-live for resources
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Set the wait bound for async acquisition
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Effective TTL, with zero folded into "never expires".
    pub fn ttl(&self) -> Option<Duration> {
        self.time_to_live.filter(|ttl| !ttl.is_zero())
    }

    /// Check the capacity bounds.
    pub fn validate(&self) -> PoolResult<()> {
        if self.max_capacity == 0 {
            return Err(PoolError::InvalidConfiguration(
                "max_capacity must be greater than 0".to_string(),
            ));
        }
        if self.min_capacity > self.max_capacity {
            return Err(PoolError::InvalidConfiguration(format!(
                "min_capacity ({}) must not exceed max_capacity ({})",
                self.min_capacity, self.max_capacity
            )));
        }
        Ok(())
    }
}
