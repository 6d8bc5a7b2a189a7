/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::data_structures::InlineString;
use crate::core::id::{ObjectId, SignalId};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dispatch result type
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while dispatching signals and messages
///
/// Callback failures never escape `emit`, `send_message` or a flush. They are
/// converted into one of these values and handed to the owning component's
/// exception handler.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum DispatchError {
    #[error("Slot panicked while handling {signal} from {sender}: {reason}")]
    #[diagnostic(
        code(signals::slot_panicked),
        help("The remaining slots of this emission were still invoked.")
    )]
    SlotPanicked {
        sender: ObjectId,
        signal: SignalId,
        reason: InlineString,
    },

    #[error("Message hook panicked on '{kind}': {reason}")]
    #[diagnostic(
        code(messaging::hook_panicked),
        help("A panicking hook is treated as passing the message through.")
    )]
    HookPanicked {
        kind: InlineString,
        reason: InlineString,
    },

    #[error("Handler panicked while processing '{kind}': {reason}")]
    #[diagnostic(
        code(messaging::handler_panicked),
        help("Dispatch continued with the next queued message.")
    )]
    HandlerPanicked {
        kind: InlineString,
        reason: InlineString,
    },

    #[error("Conflation check panicked on '{kind}': {reason}")]
    #[diagnostic(
        code(messaging::conflate_panicked),
        help("The new message was queued as if it could not be conflated.")
    )]
    ConflatePanicked {
        kind: InlineString,
        reason: InlineString,
    },

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(dispatch::configuration_error),
        help("Check the DISPATCH_* environment variables.")
    )]
    Configuration(InlineString),
}

impl DispatchError {
    /// Check if the error came from a user callback
    pub fn is_callback_failure(&self) -> bool {
        !matches!(self, DispatchError::Configuration(_))
    }
}
