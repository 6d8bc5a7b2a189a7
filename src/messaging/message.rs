/*!
 * Message Types
 * Immutable notifications dispatched to a single handler
 */

use crate::core::data_structures::InlineString;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Access to the concrete message type behind `dyn Message`
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A notification value delivered to a [`MessageHandler`](super::MessageHandler)
///
/// Messages of the same `kind` posted to the same handler may be conflated
/// when both report `is_conflatable`.
pub trait Message: AsAny {
    fn kind(&self) -> &str;

    fn is_conflatable(&self) -> bool {
        false
    }

    /// Decide whether `other` can be merged into this message
    ///
    /// Only consulted for conflatable messages of the same kind queued for
    /// the same handler.
    fn conflate(&self, _other: &dyn Message) -> bool {
        false
    }
}

impl<'a> dyn Message + 'a {
    /// Downcast to the concrete message type
    pub fn downcast_ref<T: Message + Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Message + Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl<'a> fmt::Debug for dyn Message + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("kind", &self.kind())
            .field("conflatable", &self.is_conflatable())
            .finish()
    }
}

/// Shared message handle, as stored in the posted queue
pub type MessageRef = Rc<dyn Message>;

/// Plain message identified only by its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicMessage {
    kind: InlineString,
}

impl BasicMessage {
    pub fn new(kind: impl Into<InlineString>) -> Self {
        Self { kind: kind.into() }
    }

    pub fn shared(kind: impl Into<InlineString>) -> MessageRef {
        Rc::new(Self::new(kind))
    }
}

impl Message for BasicMessage {
    fn kind(&self) -> &str {
        self.kind.as_str()
    }
}

/// Message that merges with any queued message of the same kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflatableMessage {
    kind: InlineString,
}

impl ConflatableMessage {
    pub fn new(kind: impl Into<InlineString>) -> Self {
        Self { kind: kind.into() }
    }

    pub fn shared(kind: impl Into<InlineString>) -> MessageRef {
        Rc::new(Self::new(kind))
    }
}

impl Message for ConflatableMessage {
    fn kind(&self) -> &str {
        self.kind.as_str()
    }

    fn is_conflatable(&self) -> bool {
        true
    }

    fn conflate(&self, _other: &dyn Message) -> bool {
        true
    }
}
