//! Engine Configuration

use serde::Deserialize;

/// Environment variable overriding [`EngineConfig::thread_pool_size`]
pub const ENV_THREAD_POOL_SIZE: &str = "SMALLSCREEN_THREAD_POOL_SIZE";

/// Environment variable overriding [`EngineConfig::completion_capacity`]
pub const ENV_COMPLETION_CAPACITY: &str = "SMALLSCREEN_COMPLETION_CAPACITY";

/// Task engine configuration options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial number of worker threads (0 = hardware concurrency)
    pub thread_pool_size: usize,

    /// Worker thread name prefix
    pub thread_name_prefix: String,

    /// Capacity of the completion channel (None = unbounded)
    pub completion_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_pool_size: 0,
            thread_name_prefix: "smallscreen-worker".to_string(),
            completion_capacity: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `SMALLSCREEN_*` environment variables
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = size;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_completion_capacity(mut self, capacity: Option<usize>) -> Self {
        self.completion_capacity = capacity;
        self
    }

    fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(size) = parse_var(&lookup, ENV_THREAD_POOL_SIZE) {
            self.thread_pool_size = size;
        }
        if let Some(capacity) = parse_var(&lookup, ENV_COMPLETION_CAPACITY) {
            // 0 keeps the channel unbounded
            self.completion_capacity = (capacity > 0).then_some(capacity);
        }
        self
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a non-negative integer", key, raw);
            None
        }
    }
}
