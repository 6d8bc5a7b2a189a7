/*!
 * Signal Types
 * Slot contract, receiver identities and statistics
 */

use crate::core::id::ObjectId;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::rc::Rc;

/// Callable invoked when a connected signal is emitted
///
/// Any `Fn(ObjectId, &A)` closure is a slot; implement the trait directly
/// for stateful receivers.
pub trait Slot<A>: 'static {
    fn invoke(&self, sender: ObjectId, args: &A);
}

impl<A, F> Slot<A> for F
where
    F: Fn(ObjectId, &A) + 'static,
{
    #[inline]
    fn invoke(&self, sender: ObjectId, args: &A) {
        self(sender, args)
    }
}

/// Shared slot handle
///
/// Connection identity is the allocation behind the `Rc`: keep the handle
/// around to disconnect the same slot later.
pub type SlotRef<A> = Rc<dyn Slot<A>>;

/// Wrap a closure as a slot handle
pub fn slot<A, F>(f: F) -> SlotRef<A>
where
    A: 'static,
    F: Fn(ObjectId, &A) + 'static,
{
    Rc::new(f)
}

#[inline]
pub(crate) fn slot_identity<A: 'static>(slot: &SlotRef<A>) -> usize {
    Rc::as_ptr(slot) as *const () as usize
}

/// Type-erased slot stored in the connection arena
pub(crate) trait ErasedSlot {
    fn call(&self, sender: ObjectId, args: &dyn Any);
}

pub(crate) struct TypedSlot<A: 'static> {
    slot: SlotRef<A>,
}

impl<A: 'static> TypedSlot<A> {
    pub(crate) fn erase(slot: &SlotRef<A>) -> Rc<dyn ErasedSlot> {
        Rc::new(Self {
            slot: Rc::clone(slot),
        })
    }
}

impl<A: 'static> ErasedSlot for TypedSlot<A> {
    fn call(&self, sender: ObjectId, args: &dyn Any) {
        match args.downcast_ref::<A>() {
            Some(args) => self.slot.invoke(sender, args),
            None => debug_assert!(false, "signal emitted with mismatched argument type"),
        }
    }
}

/// Key of a receiver chain: the connection context if given, else the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverKey {
    Object(ObjectId),
    Slot(usize),
}

/// Signal statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalStats {
    pub live_connections: usize,
    pub total_connects: u64,
    pub total_disconnects: u64,
    pub total_emits: u64,
    pub slot_invocations: u64,
    pub slot_panics: u64,
}
