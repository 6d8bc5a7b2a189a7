/*!
 * Messaging Module
 * Handler-oriented message dispatch with hooks, posting and conflation
 */

pub mod config;
mod handler;
mod hooks;
mod message;
mod message_loop;
pub mod queue;
pub mod scheduler;
pub mod types;

// Re-export public API
pub use config::LoopConfig;
pub use handler::{handler, hook, HandlerRef, HookRef, MessageHandler, MessageHook};
pub use message::{AsAny, BasicMessage, ConflatableMessage, Message, MessageRef};
pub use message_loop::MessageLoop;
pub use queue::FifoQueue;
pub use scheduler::{FlushScheduler, FlushTask, LocalTaskScheduler, ManualScheduler};
pub use types::LoopStats;
