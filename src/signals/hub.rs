/*!
 * Signal Hub
 * Connect, disconnect and emit against the connection registry
 */

use super::registry::{Connection, ConnectionKey, ConnectionRegistry};
use super::signal::Signal;
use super::types::{slot_identity, ReceiverKey, SignalStats, SlotRef, TypedSlot};
use crate::core::containment::{contain, ExceptionHandler, ExceptionSink};
use crate::core::errors::DispatchError;
use crate::core::id::{ObjectId, SignalId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, trace};

/// Dispatch context for signals
///
/// Cloning is cheap and yields a handle to the same registry. The hub is
/// single-threaded (`!Send`); every object taking part in its connections
/// must be torn down through [`SignalHub::disconnect_all`] or
/// [`SignalHub::clear_data`] when it is destroyed.
#[derive(Clone)]
pub struct SignalHub {
    inner: Rc<HubInner>,
}

struct HubInner {
    registry: RefCell<ConnectionRegistry>,
    current_sender: Cell<Option<ObjectId>>,
    exceptions: ExceptionSink,
    stats: RefCell<SignalStats>,
}

/// Restores the previously emitting sender when an emission unwinds
struct SenderScope<'a> {
    slot: &'a Cell<Option<ObjectId>>,
    previous: Option<ObjectId>,
}

impl<'a> SenderScope<'a> {
    fn enter(slot: &'a Cell<Option<ObjectId>>, sender: ObjectId) -> Self {
        let previous = slot.replace(Some(sender));
        Self { slot, previous }
    }
}

impl Drop for SenderScope<'_> {
    fn drop(&mut self) {
        self.slot.set(self.previous);
    }
}

impl SignalHub {
    pub fn new() -> Self {
        debug!("Signal hub initialized");
        Self {
            inner: Rc::new(HubInner {
                registry: RefCell::new(ConnectionRegistry::new()),
                current_sender: Cell::new(None),
                exceptions: ExceptionSink::new(),
                stats: RefCell::new(SignalStats::default()),
            }),
        }
    }

    /// Mint a typed signal owned by `sender`
    pub fn signal<A: 'static>(&self, sender: ObjectId) -> Signal<A> {
        Signal::new(self, sender)
    }

    /// Object whose emission is currently running, if any
    ///
    /// Only meaningful inside a slot; nested emissions restore the outer
    /// sender when they return.
    pub fn sender(&self) -> Option<ObjectId> {
        self.inner.current_sender.get()
    }

    /// Connect a slot to a signal
    ///
    /// Returns `false` if the same (slot, context) pair is already connected.
    pub fn connect<A: 'static>(
        &self,
        sender: ObjectId,
        signal: SignalId,
        slot: &SlotRef<A>,
        context: Option<ObjectId>,
    ) -> bool {
        let slot_id = slot_identity(slot);
        let inserted = self.inner.registry.borrow_mut().insert(
            sender,
            signal,
            slot_id,
            context,
            TypedSlot::erase(slot),
        );

        match inserted {
            Some(_) => {
                self.inner.stats.borrow_mut().total_connects += 1;
                debug!(%sender, %signal, ?context, "Connected slot");
                true
            }
            None => {
                debug!(%sender, %signal, ?context, "Slot already connected");
                false
            }
        }
    }

    /// Disconnect a slot from a signal
    ///
    /// Returns `false` if no matching connection exists. An emission already
    /// in progress will not invoke the slot once this returns.
    pub fn disconnect<A: 'static>(
        &self,
        sender: ObjectId,
        signal: SignalId,
        slot: &SlotRef<A>,
        context: Option<ObjectId>,
    ) -> bool {
        let slot_id = slot_identity(slot);
        let record = {
            let mut registry = self.inner.registry.borrow_mut();
            match registry.find(sender, signal, slot_id, context) {
                Some(key) => registry.remove(key),
                None => None,
            }
        };
        let removed = record.is_some();
        // Released with no borrow held; the slot's captures may call back in
        drop(record);

        if removed {
            self.inner.stats.borrow_mut().total_disconnects += 1;
            debug!(%sender, %signal, ?context, "Disconnected slot");
        }
        removed
    }

    /// Invoke every connected slot, oldest connection first
    ///
    /// The receiver set is fixed when the call starts: slots connected from
    /// inside a slot are not reached, and slots disconnected from inside a
    /// slot are skipped if they have not run yet. A panicking slot is
    /// reported to the exception handler and the remaining slots still run.
    pub fn emit<A: 'static>(&self, sender: ObjectId, signal: SignalId, args: &A) {
        let snapshot = self.inner.registry.borrow().snapshot(sender, signal);
        self.inner.stats.borrow_mut().total_emits += 1;
        trace!(%sender, %signal, receivers = snapshot.len(), "Emitting signal");

        if snapshot.is_empty() {
            return;
        }

        let _scope = SenderScope::enter(&self.inner.current_sender, sender);
        for key in snapshot {
            // Re-check liveness immediately before the call
            let Some(slot) = self.inner.registry.borrow().live_slot(key) else {
                continue;
            };

            self.inner.stats.borrow_mut().slot_invocations += 1;
            if let Err(reason) = contain(|| slot.call(sender, args)) {
                self.inner.stats.borrow_mut().slot_panics += 1;
                self.inner.exceptions.report(DispatchError::SlotPanicked {
                    sender,
                    signal,
                    reason,
                });
            }
        }
    }

    /// Remove every connection from `sender` to slots bound to `receiver`
    pub fn disconnect_between(&self, sender: ObjectId, receiver: ObjectId) -> usize {
        let keys: Vec<ConnectionKey> = {
            let registry = self.inner.registry.borrow();
            registry
                .receiver_chain(ReceiverKey::Object(receiver))
                .into_iter()
                .filter(|&key| registry.get(key).is_some_and(|c| c.sender == sender))
                .collect()
        };
        let removed = self.remove_all(keys);
        debug!(%sender, %receiver, removed, "Disconnected sender from receiver");
        removed
    }

    /// Remove every connection whose sender is `sender`
    pub fn disconnect_sender(&self, sender: ObjectId) -> usize {
        let keys = self.inner.registry.borrow().sender_connections(sender);
        let removed = self.remove_all(keys);
        debug!(%sender, removed, "Disconnected sender");
        removed
    }

    /// Remove every connection bound to `receiver` as context
    pub fn disconnect_receiver(&self, receiver: ObjectId) -> usize {
        let keys = self
            .inner
            .registry
            .borrow()
            .receiver_chain(ReceiverKey::Object(receiver));
        let removed = self.remove_all(keys);
        debug!(%receiver, removed, "Disconnected receiver");
        removed
    }

    /// Remove every connection `object` takes part in, as sender or receiver
    pub fn disconnect_all(&self, object: ObjectId) -> usize {
        self.disconnect_sender(object) + self.disconnect_receiver(object)
    }

    /// Release all registry data held for a destroyed object
    pub fn clear_data(&self, object: ObjectId) -> usize {
        self.disconnect_all(object)
    }

    /// Live connections of one signal
    pub fn receiver_count(&self, sender: ObjectId, signal: SignalId) -> usize {
        self.inner.registry.borrow().sender_chain(sender, signal).len()
    }

    /// Live connections across all signals
    pub fn connection_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Install a new exception handler, returning the previous one
    pub fn set_exception_handler(&self, handler: ExceptionHandler) -> ExceptionHandler {
        self.inner.exceptions.replace(handler)
    }

    pub fn stats(&self) -> SignalStats {
        let mut stats = self.inner.stats.borrow().clone();
        stats.live_connections = self.connection_count();
        stats
    }

    fn remove_all(&self, keys: Vec<ConnectionKey>) -> usize {
        let records: Vec<Connection> = {
            let mut registry = self.inner.registry.borrow_mut();
            let records = keys.into_iter().filter_map(|key| registry.remove(key)).collect();
            records
        };
        let removed = records.len();
        self.inner.stats.borrow_mut().total_disconnects += removed as u64;
        // Released with no borrow held; the slots' captures may call back in
        drop(records);
        removed
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}
