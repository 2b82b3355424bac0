//! Configuration types for batch lookups

use crate::batch::BatchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of concurrent lookup workers
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Configuration for a batch lookup run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of concurrent lookup workers (default: 10, must be at least 1)
    pub concurrency: usize,
    /// Include AS name, country, IP block and registry in rows (default: false)
    pub full_details: bool,
    /// Upper bound for a single lookup; `None` leaves timing to the client
    pub lookup_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            full_details: false,
            lookup_timeout: None,
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig builder
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.concurrency < 1 {
            return Err(BatchError::ConfigError(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.lookup_timeout == Some(Duration::ZERO) {
            return Err(BatchError::ConfigError(
                "lookup_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for BatchConfig
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: BatchConfig::default(),
        }
    }

    /// Set the number of concurrent workers
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.config.concurrency = workers;
        self
    }

    /// Enable or disable full-detail rows
    pub fn full_details(mut self, enable: bool) -> Self {
        self.config.full_details = enable;
        self
    }

    /// Bound every lookup by `timeout`
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.config.lookup_timeout = Some(timeout);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
