/*!
 * Dispatch Core Library
 * In-process notification substrate: typed signals and a message loop
 */

pub mod core;
pub mod messaging;
pub mod monitoring;
pub mod signals;

// Re-exports
pub use crate::core::{
    contain, default_exception_handler, DispatchError, DispatchResult, ExceptionHandler,
    InlineString, ObjectId, SignalId,
};
pub use messaging::{
    handler, hook, BasicMessage, ConflatableMessage, FlushScheduler, HandlerRef, HookRef,
    LocalTaskScheduler, LoopConfig, LoopStats, ManualScheduler, Message, MessageHandler,
    MessageHook, MessageLoop, MessageRef,
};
pub use monitoring::{init_tracing, try_init_tracing};
pub use signals::{slot, Signal, SignalHub, SignalStats, Slot, SlotRef};
