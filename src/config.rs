//! Configuration for a file-system facade.
//!
//! Each [`FileSystem`](crate::FileSystem) carries its own [`Config`], so
//! multiple roots (and tests) stay isolated. Use [`ConfigBuilder`] to build
//! one fluently.

use std::time::Duration;

/// Runtime configuration for a facade and its backing store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache metadata snapshots between queries.
    ///
    /// When disabled every `exists()`/`metadata()` call probes the store.
    pub cache_metadata: bool,
    /// On create/delete, also drop cached snapshots of every ancestor.
    pub invalidate_ancestors: bool,
    /// How often a caller waiting on another caller's in-flight probe
    /// re-checks its own cancellation token.
    pub cancel_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_metadata: true,
            invalidate_ancestors: true,
            cancel_poll_interval: Duration::from_millis(10),
        }
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    cache_metadata: Option<bool>,
    invalidate_ancestors: Option<bool>,
    cancel_poll_interval: Option<Duration>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the metadata cache.
    ///
    /// Default: enabled
    pub fn cache_metadata(mut self, enabled: bool) -> Self {
        self.cache_metadata = Some(enabled);
        self
    }

    /// Enable or disable ancestor invalidation on mutation.
    ///
    /// Default: enabled
    pub fn invalidate_ancestors(mut self, enabled: bool) -> Self {
        self.invalidate_ancestors = Some(enabled);
        self
    }

    /// Set the cancellation poll interval for waiting callers.
    ///
    /// Default: 10ms
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use resource_vfs::config::ConfigBuilder;
    ///
    /// let config = ConfigBuilder::new()
    ///     .cancel_poll_interval(Duration::from_millis(1))
    ///     .build();
    /// assert!(config.cache_metadata);
    /// ```
    pub fn cancel_poll_interval(mut self, interval: Duration) -> Self {
        self.cancel_poll_interval = Some(interval);
        self
    }

    /// Build the configuration, filling unset fields with defaults.
    pub fn build(self) -> Config {
        let default = Config::default();
        Config {
            cache_metadata: self.cache_metadata.unwrap_or(default.cache_metadata),
            invalidate_ancestors: self
                .invalidate_ancestors
                .unwrap_or(default.invalidate_ancestors),
            cancel_poll_interval: self
                .cancel_poll_interval
                .unwrap_or(default.cancel_poll_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.cache_metadata);
        assert!(config.invalidate_ancestors);
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new()
            .cache_metadata(false)
            .cancel_poll_interval(Duration::from_millis(1))
            .build();
        assert!(!config.cache_metadata);
        assert!(config.invalidate_ancestors);
        assert_eq!(config.cancel_poll_interval, Duration::from_millis(1));
    }
}
