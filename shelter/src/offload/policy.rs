//! Offload task policies and configuration.

use std::time::Duration;

use crate::config::WorkerConfig;

/// Policy for handling long-running tasks. Tasks are never cancelled.
#[derive(Debug, Clone, Default)]
pub enum TimeoutPolicy {
    /// No timeout - task runs until completion.
    #[default]
    None,
    /// Log warning after duration but let task continue.
    Warn(Duration),
}

/// Configuration for the OffloadManager.
#[derive(Debug, Clone)]
pub struct OffloadConfig {
    /// Timeout policy for spawned tasks.
    pub timeout_policy: TimeoutPolicy,
    /// Skip keyed tasks while one with the same key is in flight.
    pub deduplicate: bool,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            timeout_policy: TimeoutPolicy::None,
            deduplicate: true,
        }
    }
}

impl OffloadConfig {
    /// Create a new builder for OffloadConfig.
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Background refreshes are only ever warned about, network fetches carry
/// no timeout of their own.
impl From<&WorkerConfig> for OffloadConfig {
    fn from(config: &WorkerConfig) -> Self {
        let timeout_policy = config
            .revalidate_warn_after
            .map(TimeoutPolicy::Warn)
            .unwrap_or_default();
        Self {
            timeout_policy,
            deduplicate: true,
        }
    }
}

/// Builder for OffloadConfig.
#[derive(Debug, Clone)]
pub struct OffloadConfigBuilder {
    timeout_policy: TimeoutPolicy,
    deduplicate: bool,
}

impl Default for OffloadConfigBuilder {
    fn default() -> Self {
        Self {
            timeout_policy: TimeoutPolicy::None,
            deduplicate: true,
        }
    }
}

impl OffloadConfigBuilder {
    /// Set timeout policy.
    pub fn timeout_policy(self, policy: TimeoutPolicy) -> Self {
        Self {
            timeout_policy: policy,
            ..self
        }
    }

    /// Enable or disable task deduplication.
    pub fn deduplicate(self, enabled: bool) -> Self {
        Self {
            deduplicate: enabled,
            ..self
        }
    }

    /// Build the OffloadConfig.
    pub fn build(self) -> OffloadConfig {
        OffloadConfig {
            timeout_policy: self.timeout_policy,
            deduplicate: self.deduplicate,
        }
    }
}
