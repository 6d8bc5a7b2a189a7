/*!
 * Callback Containment
 * Runs user callbacks behind a panic boundary and routes failures to an
 * exception handler
 */

use super::data_structures::InlineString;
use super::errors::DispatchError;
use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::error;

/// Receives every callback failure contained during dispatch
pub type ExceptionHandler = Rc<dyn Fn(&DispatchError)>;

/// Handler installed by default: logs the failure and carries on
pub fn default_exception_handler() -> ExceptionHandler {
    Rc::new(|err: &DispatchError| {
        error!(error = %err, "callback failed during dispatch");
    })
}

/// Run `f`, converting a panic into its rendered payload
///
/// The registries never hold a `RefCell` borrow while calling this, so
/// unwinding through `f` cannot leave shared state half-mutated.
pub fn contain<R>(f: impl FnOnce() -> R) -> Result<R, InlineString> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_reason(payload.as_ref()))
}

/// Longest panic message kept in an error report
const MAX_REASON_BYTES: usize = 256;

fn panic_reason(payload: &(dyn Any + Send)) -> InlineString {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        InlineString::bounded(s, MAX_REASON_BYTES)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        InlineString::bounded(s, MAX_REASON_BYTES)
    } else {
        InlineString::from("non-string panic payload")
    }
}

/// Replaceable exception handler slot owned by a dispatch component
pub(crate) struct ExceptionSink {
    handler: RefCell<ExceptionHandler>,
}

impl ExceptionSink {
    pub(crate) fn new() -> Self {
        Self {
            handler: RefCell::new(default_exception_handler()),
        }
    }

    /// Install a new handler, returning the previous one
    pub(crate) fn replace(&self, handler: ExceptionHandler) -> ExceptionHandler {
        self.handler.replace(handler)
    }

    /// Hand an error to the current handler
    ///
    /// The handler is cloned out first so it may replace itself. A panicking
    /// handler is logged and swallowed.
    pub(crate) fn report(&self, err: DispatchError) {
        let handler = Rc::clone(&self.handler.borrow());
        if let Err(reason) = contain(|| handler(&err)) {
            error!(error = %err, %reason, "exception handler panicked");
        }
    }
}
