/*!
 * Connection Registry
 * Arena of connection records threaded into two intrusive chains
 *
 * Every record sits in exactly one sender chain, keyed by (sender, signal),
 * and exactly one receiver chain, keyed by the connection context (or the
 * slot when no context was given). Both chains are singly linked with the
 * newest record at the head, so insertion is O(1) and removal is O(k) in
 * the chain length. Removing a record frees its arena slot; the versioned
 * key makes any copy held elsewhere resolve to nothing.
 */

use super::types::{ErasedSlot, ReceiverKey};
use crate::core::id::{ObjectId, SignalId};
use ahash::HashMap;
use slotmap::{new_key_type, SlotMap};
use std::rc::Rc;

new_key_type! {
    /// Handle to a connection record
    pub(crate) struct ConnectionKey;
}

pub(crate) struct Connection {
    pub sender: ObjectId,
    pub signal: SignalId,
    pub slot_id: usize,
    pub context: Option<ObjectId>,
    pub slot: Rc<dyn ErasedSlot>,
    next_in_sender: Option<ConnectionKey>,
    next_in_receiver: Option<ConnectionKey>,
}

impl Connection {
    pub fn receiver_key(&self) -> ReceiverKey {
        match self.context {
            Some(object) => ReceiverKey::Object(object),
            None => ReceiverKey::Slot(self.slot_id),
        }
    }
}

#[derive(Default)]
pub(crate) struct ConnectionRegistry {
    connections: SlotMap<ConnectionKey, Connection>,
    sender_heads: HashMap<(ObjectId, SignalId), ConnectionKey>,
    receiver_heads: HashMap<ReceiverKey, ConnectionKey>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn get(&self, key: ConnectionKey) -> Option<&Connection> {
        self.connections.get(key)
    }

    /// Slot of a connection that is still live
    pub fn live_slot(&self, key: ConnectionKey) -> Option<Rc<dyn ErasedSlot>> {
        self.connections.get(key).map(|c| Rc::clone(&c.slot))
    }

    /// Find the connection for an exact (slot, context) pair
    pub fn find(
        &self,
        sender: ObjectId,
        signal: SignalId,
        slot_id: usize,
        context: Option<ObjectId>,
    ) -> Option<ConnectionKey> {
        self.sender_chain(sender, signal).into_iter().find(|&key| {
            self.connections
                .get(key)
                .is_some_and(|c| c.slot_id == slot_id && c.context == context)
        })
    }

    /// Link a new connection at the head of both chains
    ///
    /// Returns `None` if the (slot, context) pair is already connected.
    pub fn insert(
        &mut self,
        sender: ObjectId,
        signal: SignalId,
        slot_id: usize,
        context: Option<ObjectId>,
        slot: Rc<dyn ErasedSlot>,
    ) -> Option<ConnectionKey> {
        if self.find(sender, signal, slot_id, context).is_some() {
            return None;
        }

        let sender_key = (sender, signal);
        let next_in_sender = self.sender_heads.get(&sender_key).copied();
        let mut connection = Connection {
            sender,
            signal,
            slot_id,
            context,
            slot,
            next_in_sender,
            next_in_receiver: None,
        };
        let receiver_key = connection.receiver_key();
        connection.next_in_receiver = self.receiver_heads.get(&receiver_key).copied();

        let key = self.connections.insert(connection);
        self.sender_heads.insert(sender_key, key);
        self.receiver_heads.insert(receiver_key, key);
        Some(key)
    }

    /// Unlink a connection from both chains and free its arena slot
    ///
    /// The record is handed back so the caller can drop its slot once no
    /// registry borrow is held.
    pub fn remove(&mut self, key: ConnectionKey) -> Option<Connection> {
        if !self.connections.contains_key(key) {
            return None;
        }
        self.unlink_sender(key);
        self.unlink_receiver(key);
        self.connections.remove(key)
    }

    /// Sender chain of a signal, oldest connection first
    pub fn snapshot(&self, sender: ObjectId, signal: SignalId) -> Vec<ConnectionKey> {
        let mut keys = self.sender_chain(sender, signal);
        keys.reverse();
        keys
    }

    /// Sender chain of a signal, newest connection first
    pub fn sender_chain(&self, sender: ObjectId, signal: SignalId) -> Vec<ConnectionKey> {
        let mut keys = Vec::new();
        let mut cursor = self.sender_heads.get(&(sender, signal)).copied();
        while let Some(key) = cursor {
            keys.push(key);
            cursor = self.connections.get(key).and_then(|c| c.next_in_sender);
        }
        keys
    }

    /// Receiver chain, newest connection first
    pub fn receiver_chain(&self, receiver: ReceiverKey) -> Vec<ConnectionKey> {
        let mut keys = Vec::new();
        let mut cursor = self.receiver_heads.get(&receiver).copied();
        while let Some(key) = cursor {
            keys.push(key);
            cursor = self.connections.get(key).and_then(|c| c.next_in_receiver);
        }
        keys
    }

    /// Every connection whose sender is `sender`, across all of its signals
    pub fn sender_connections(&self, sender: ObjectId) -> Vec<ConnectionKey> {
        let mut signals: Vec<SignalId> = self
            .sender_heads
            .keys()
            .filter(|(owner, _)| *owner == sender)
            .map(|(_, signal)| *signal)
            .collect();
        signals.sort_unstable();
        signals
            .into_iter()
            .flat_map(|signal| self.sender_chain(sender, signal))
            .collect()
    }

    fn unlink_sender(&mut self, key: ConnectionKey) {
        let Some(target) = self.connections.get(key) else {
            return;
        };
        let head_key = (target.sender, target.signal);
        let next = target.next_in_sender;

        let Some(head) = self.sender_heads.get(&head_key).copied() else {
            debug_assert!(false, "connection has no sender chain");
            return;
        };
        if head == key {
            match next {
                Some(next) => self.sender_heads.insert(head_key, next),
                None => self.sender_heads.remove(&head_key),
            };
            return;
        }

        let mut cursor = head;
        loop {
            let Some(node) = self.connections.get_mut(cursor) else {
                debug_assert!(false, "sender chain references a freed connection");
                return;
            };
            match node.next_in_sender {
                Some(candidate) if candidate == key => {
                    node.next_in_sender = next;
                    return;
                }
                Some(candidate) => cursor = candidate,
                None => {
                    debug_assert!(false, "connection missing from its sender chain");
                    return;
                }
            }
        }
    }

    fn unlink_receiver(&mut self, key: ConnectionKey) {
        let Some(target) = self.connections.get(key) else {
            return;
        };
        let head_key = target.receiver_key();
        let next = target.next_in_receiver;

        let Some(head) = self.receiver_heads.get(&head_key).copied() else {
            debug_assert!(false, "connection has no receiver chain");
            return;
        };
        if head == key {
            match next {
                Some(next) => self.receiver_heads.insert(head_key, next),
                None => self.receiver_heads.remove(&head_key),
            };
            return;
        }

        let mut cursor = head;
        loop {
            let Some(node) = self.connections.get_mut(cursor) else {
                debug_assert!(false, "receiver chain references a freed connection");
                return;
            };
            match node.next_in_receiver {
                Some(candidate) if candidate == key => {
                    node.next_in_receiver = next;
                    return;
                }
                Some(candidate) => cursor = candidate,
                None => {
                    debug_assert!(false, "connection missing from its receiver chain");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::id::ObjectId;
    use std::any::Any;

    struct Noop;

    impl ErasedSlot for Noop {
        fn call(&self, _sender: ObjectId, _args: &dyn Any) {}
    }

    fn noop() -> Rc<dyn ErasedSlot> {
        Rc::new(Noop)
    }

    #[test]
    fn test_insert_links_newest_first() {
        let mut registry = ConnectionRegistry::new();
        let sender = ObjectId(1);
        let signal = SignalId(1);

        let a = registry.insert(sender, signal, 10, None, noop()).unwrap();
        let b = registry.insert(sender, signal, 11, None, noop()).unwrap();
        let c = registry.insert(sender, signal, 12, None, noop()).unwrap();

        assert_eq!(registry.sender_chain(sender, signal), vec![c, b, a]);
        assert_eq!(registry.snapshot(sender, signal), vec![a, b, c]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let mut registry = ConnectionRegistry::new();
        let sender = ObjectId(1);
        let signal = SignalId(1);
        let context = Some(ObjectId(9));

        assert!(registry.insert(sender, signal, 10, context, noop()).is_some());
        assert!(registry.insert(sender, signal, 10, context, noop()).is_none());
        // Same slot, different context is a distinct connection
        assert!(registry.insert(sender, signal, 10, None, noop()).is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_middle_keeps_both_chains_intact() {
        let mut registry = ConnectionRegistry::new();
        let sender = ObjectId(1);
        let signal = SignalId(1);
        let receiver = ObjectId(5);

        let a = registry.insert(sender, signal, 10, Some(receiver), noop()).unwrap();
        let b = registry.insert(sender, signal, 11, Some(receiver), noop()).unwrap();
        let c = registry.insert(sender, signal, 12, Some(receiver), noop()).unwrap();

        assert!(registry.remove(b).is_some());
        assert!(registry.remove(b).is_none());
        assert!(registry.get(b).is_none());
        assert!(registry.live_slot(b).is_none());

        assert_eq!(registry.snapshot(sender, signal), vec![a, c]);
        assert_eq!(
            registry.receiver_chain(ReceiverKey::Object(receiver)),
            vec![c, a]
        );
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut registry = ConnectionRegistry::new();
        let sender = ObjectId(1);
        let signal = SignalId(1);

        let a = registry.insert(sender, signal, 10, None, noop()).unwrap();
        let b = registry.insert(sender, signal, 11, None, noop()).unwrap();

        assert!(registry.remove(b).is_some());
        assert_eq!(registry.sender_chain(sender, signal), vec![a]);
        assert!(registry.remove(a).is_some());
        assert!(registry.sender_chain(sender, signal).is_empty());
        assert!(registry.receiver_chain(ReceiverKey::Slot(10)).is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_stale_key_after_reinsert() {
        let mut registry = ConnectionRegistry::new();
        let sender = ObjectId(1);
        let signal = SignalId(1);

        let old = registry.insert(sender, signal, 10, None, noop()).unwrap();
        registry.remove(old);
        let new = registry.insert(sender, signal, 10, None, noop()).unwrap();

        assert_ne!(old, new);
        assert!(registry.live_slot(old).is_none());
        assert!(registry.live_slot(new).is_some());
    }

    #[test]
    fn test_sender_connections_spans_signals() {
        let mut registry = ConnectionRegistry::new();
        let sender = ObjectId(1);
        let other = ObjectId(2);

        registry.insert(sender, SignalId(1), 10, None, noop());
        registry.insert(sender, SignalId(2), 11, None, noop());
        registry.insert(other, SignalId(3), 12, None, noop());

        assert_eq!(registry.sender_connections(sender).len(), 2);
        assert_eq!(registry.sender_connections(other).len(), 1);
    }
}
