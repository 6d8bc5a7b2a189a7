/*!
 * Typed Signal
 * A notification channel bound to its sender object
 */

use super::hub::SignalHub;
use super::types::SlotRef;
use crate::core::id::{ObjectId, SignalId};
use std::fmt;
use std::marker::PhantomData;

/// Typed signal owned by a sender object
///
/// Each `Signal` has its own identity; the sender object typically stores
/// one field per notification it publishes.
pub struct Signal<A> {
    hub: SignalHub,
    sender: ObjectId,
    id: SignalId,
    _args: PhantomData<fn(&A)>,
}

impl<A: 'static> Signal<A> {
    pub fn new(hub: &SignalHub, sender: ObjectId) -> Self {
        Self {
            hub: hub.clone(),
            sender,
            id: SignalId::next(),
            _args: PhantomData,
        }
    }

    pub fn sender(&self) -> ObjectId {
        self.sender
    }

    pub fn id(&self) -> SignalId {
        self.id
    }

    pub fn hub(&self) -> &SignalHub {
        &self.hub
    }

    pub fn connect(&self, slot: &SlotRef<A>, context: Option<ObjectId>) -> bool {
        self.hub.connect(self.sender, self.id, slot, context)
    }

    pub fn disconnect(&self, slot: &SlotRef<A>, context: Option<ObjectId>) -> bool {
        self.hub.disconnect(self.sender, self.id, slot, context)
    }

    pub fn emit(&self, args: &A) {
        self.hub.emit(self.sender, self.id, args)
    }

    pub fn receiver_count(&self) -> usize {
        self.hub.receiver_count(self.sender, self.id)
    }
}

impl<A> Clone for Signal<A> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
            sender: self.sender,
            id: self.id,
            _args: PhantomData,
        }
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("sender", &self.sender)
            .field("id", &self.id)
            .finish()
    }
}
