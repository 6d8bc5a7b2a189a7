/*!
 * Handler and Hook Contracts
 * Receivers of messages and the interceptors that may veto them
 */

use super::message::Message;
use std::rc::Rc;

/// Entity that processes messages
///
/// Handler identity is the allocation behind its [`HandlerRef`].
pub trait MessageHandler: 'static {
    fn process_message(&self, msg: &dyn Message);
}

impl<F> MessageHandler for F
where
    F: Fn(&dyn Message) + 'static,
{
    #[inline]
    fn process_message(&self, msg: &dyn Message) {
        self(msg)
    }
}

/// Shared handler handle
pub type HandlerRef = Rc<dyn MessageHandler>;

/// Wrap a closure as a handler handle
pub fn handler<F>(f: F) -> HandlerRef
where
    F: Fn(&dyn Message) + 'static,
{
    Rc::new(f)
}

/// Interceptor consulted before a message reaches its handler
///
/// Returning `false` stops the hook chain and suppresses delivery.
pub trait MessageHook: 'static {
    fn message_hook(&self, handler: &HandlerRef, msg: &dyn Message) -> bool;
}

impl<F> MessageHook for F
where
    F: Fn(&HandlerRef, &dyn Message) -> bool + 'static,
{
    #[inline]
    fn message_hook(&self, handler: &HandlerRef, msg: &dyn Message) -> bool {
        self(handler, msg)
    }
}

/// Shared hook handle; identity is the allocation behind the `Rc`
pub type HookRef = Rc<dyn MessageHook>;

/// Wrap a closure as a hook handle
pub fn hook<F>(f: F) -> HookRef
where
    F: Fn(&HandlerRef, &dyn Message) -> bool + 'static,
{
    Rc::new(f)
}

#[inline]
pub(crate) fn handler_identity(handler: &HandlerRef) -> usize {
    Rc::as_ptr(handler) as *const () as usize
}

#[inline]
pub(crate) fn hook_identity(hook: &HookRef) -> usize {
    Rc::as_ptr(hook) as *const () as usize
}
