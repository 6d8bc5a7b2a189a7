/*!
 * ID Generation System
 * Type-safe identities for signal senders, receivers and signal channels
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Type-Safe ID Wrappers
// ============================================================================

/// Identity of an object taking part in signal dispatch (sender or receiver)
///
/// IDs are minted from a process-wide counter and never recycled, so an id
/// can never alias an object created later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

/// Identity of a signal channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub u64);

static OBJECT_IDS: IdCounter = IdCounter::new();
static SIGNAL_IDS: IdCounter = IdCounter::new();

impl ObjectId {
    /// Mint a fresh object identity
    #[inline]
    pub fn next() -> Self {
        Self(OBJECT_IDS.next())
    }
}

impl SignalId {
    /// Mint a fresh signal identity
    #[inline]
    pub fn next() -> Self {
        Self(SIGNAL_IDS.next())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sig#{}", self.0)
    }
}

// ============================================================================
// Atomic Counter
// ============================================================================

/// Monotonic counter starting at 1
struct IdCounter {
    counter: AtomicU64,
}

impl IdCounter {
    const fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    #[inline]
    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}
