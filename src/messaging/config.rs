/*!
 * Message Loop Configuration
 * Tunables with environment overrides
 */

use crate::core::errors::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};

/// Default queue length at which a warning is logged
pub const DEFAULT_QUEUE_WARN_THRESHOLD: usize = 10_000;

pub const ENV_QUEUE_WARN: &str = "DISPATCH_QUEUE_WARN";
pub const ENV_TRACE: &str = "DISPATCH_TRACE";

/// Message loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Queue length that triggers a warning; 0 disables it.
    /// The queue itself is unbounded.
    pub queue_warn_threshold: usize,
    /// Log every dispatch at debug level
    pub trace_dispatch: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            queue_warn_threshold: DEFAULT_QUEUE_WARN_THRESHOLD,
            trace_dispatch: false,
        }
    }
}

impl LoopConfig {
    /// Load overrides from `DISPATCH_QUEUE_WARN` and `DISPATCH_TRACE`
    pub fn from_env() -> DispatchResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load overrides through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DispatchResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_QUEUE_WARN) {
            config.queue_warn_threshold = raw.trim().parse().map_err(|_| {
                DispatchError::Configuration(
                    format!("{}={:?} is not a count", ENV_QUEUE_WARN, raw).into(),
                )
            })?;
        }

        if let Some(raw) = lookup(ENV_TRACE) {
            config.trace_dispatch = match raw.trim() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(DispatchError::Configuration(
                        format!("{}={:?} is not a boolean", ENV_TRACE, other).into(),
                    ))
                }
            };
        }

        Ok(config)
    }
}
