/*!
 * Message Loop Types
 * Counters exposed by the message loop
 */

use serde::{Deserialize, Serialize};

/// Message loop statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Entries currently queued, tombstones included
    pub pending: usize,
    pub total_sent: u64,
    pub total_posted: u64,
    pub total_conflated: u64,
    pub total_delivered: u64,
    pub total_vetoed: u64,
    pub tombstones_skipped: u64,
    pub flushes: u64,
    pub hook_panics: u64,
    pub handler_panics: u64,
}
