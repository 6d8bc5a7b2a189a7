/*!
 * Signals Module
 * Typed publish/subscribe between objects with reentrancy-safe dispatch
 */

mod hub;
mod registry;
mod signal;
pub mod types;

// Re-export public API
pub use hub::SignalHub;
pub use signal::Signal;
pub use types::{slot, ReceiverKey, SignalStats, Slot, SlotRef};
