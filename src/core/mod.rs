/*!
 * Core Module
 * Identities, error types and callback containment shared by the
 * dispatch subsystems
 */

pub mod containment;
pub mod data_structures;
pub mod errors;
pub mod id;

// Re-export for convenience
pub use containment::{contain, default_exception_handler, ExceptionHandler};
pub use data_structures::InlineString;
pub use errors::*;
pub use id::{ObjectId, SignalId};
