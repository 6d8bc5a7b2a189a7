/*!
 * Hook Chain Registry
 * Per-handler interceptor chains, newest-installed first
 */

use super::handler::{handler_identity, hook_identity, HandlerRef, HookRef, MessageHandler};
use ahash::HashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One installed hook
///
/// Removal clears the entry in place, so a dispatch that already captured
/// the chain sees it as inert.
pub(crate) struct HookEntry {
    id: usize,
    hook: RefCell<Option<HookRef>>,
}

impl HookEntry {
    fn new(hook: &HookRef) -> Self {
        Self {
            id: hook_identity(hook),
            hook: RefCell::new(Some(Rc::clone(hook))),
        }
    }

    /// The hook, unless it has been removed
    pub fn current(&self) -> Option<HookRef> {
        self.hook.borrow().clone()
    }

    /// Empty the entry, handing back the hook it held
    fn release(&self) -> Option<HookRef> {
        self.hook.borrow_mut().take()
    }
}

struct HookChain {
    owner: Weak<dyn MessageHandler>,
    // Oldest first; iterated in reverse
    entries: Vec<Rc<HookEntry>>,
}

#[derive(Default)]
pub(crate) struct HookRegistry {
    chains: HashMap<usize, HookChain>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `hook` at the front of the handler's chain
    ///
    /// A hook already present is moved to the front. Hooks displaced along
    /// the way are returned for the caller to drop.
    pub fn install(&mut self, handler: &HandlerRef, hook: &HookRef) -> Vec<HookRef> {
        let mut released: Vec<HookRef> = self.remove(handler, hook).into_iter().collect();
        let chain = self.chain_mut(handler, &mut released);
        chain.entries.push(Rc::new(HookEntry::new(hook)));
        released
    }

    /// Remove `hook` from the handler's chain, handing it back if present
    pub fn remove(&mut self, handler: &HandlerRef, hook: &HookRef) -> Option<HookRef> {
        let key = handler_identity(handler);
        let id = hook_identity(hook);
        let chain = self.chains.get_mut(&key)?;
        let index = chain.entries.iter().position(|entry| entry.id == id)?;

        let entry = chain.entries.remove(index);
        if chain.entries.is_empty() {
            self.chains.remove(&key);
        }
        entry.release()
    }

    /// Empty and drop the handler's whole chain, handing back its hooks
    pub fn clear(&mut self, handler: &HandlerRef) -> Vec<HookRef> {
        match self.chains.remove(&handler_identity(handler)) {
            Some(chain) => release_all(&chain.entries),
            None => Vec::new(),
        }
    }

    /// Hooks to run for one dispatch, newest first
    pub fn snapshot(&self, handler: &HandlerRef) -> Vec<Rc<HookEntry>> {
        match self.chains.get(&handler_identity(handler)) {
            Some(chain) if chain.owner.strong_count() > 0 => {
                chain.entries.iter().rev().cloned().collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn hook_count(&self, handler: &HandlerRef) -> usize {
        self.snapshot(handler).len()
    }

    /// Drop chains whose handler no longer exists
    ///
    /// Returns the number of chains dropped and the hooks they held.
    pub fn purge_dead(&mut self) -> (usize, Vec<HookRef>) {
        let dead: Vec<usize> = self
            .chains
            .iter()
            .filter(|(_, chain)| chain.owner.strong_count() == 0)
            .map(|(key, _)| *key)
            .collect();

        let mut released = Vec::new();
        for key in &dead {
            if let Some(chain) = self.chains.remove(key) {
                released.extend(release_all(&chain.entries));
            }
        }
        (dead.len(), released)
    }

    fn chain_mut(
        &mut self,
        handler: &HandlerRef,
        released: &mut Vec<HookRef>,
    ) -> &mut HookChain {
        let chain = self
            .chains
            .entry(handler_identity(handler))
            .or_insert_with(|| HookChain {
                owner: Rc::downgrade(handler),
                entries: Vec::new(),
            });
        if chain.owner.strong_count() == 0 {
            // Chain left behind by a handler dropped without clearing
            chain.owner = Rc::downgrade(handler);
            released.extend(release_all(&chain.entries));
            chain.entries.clear();
        }
        chain
    }
}

fn release_all(entries: &[Rc<HookEntry>]) -> Vec<HookRef> {
    entries.iter().filter_map(|entry| entry.release()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::handler::{handler, hook};
    use crate::messaging::message::Message;

    fn noop_handler() -> HandlerRef {
        handler(|_msg: &dyn Message| {})
    }

    fn pass_hook() -> HookRef {
        hook(|_handler: &HandlerRef, _msg: &dyn Message| true)
    }

    fn ids(entries: &[Rc<HookEntry>]) -> Vec<usize> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_install_orders_newest_first() {
        let mut registry = HookRegistry::new();
        let target = noop_handler();
        let h1 = pass_hook();
        let h2 = pass_hook();

        registry.install(&target, &h1);
        registry.install(&target, &h2);

        assert_eq!(
            ids(&registry.snapshot(&target)),
            vec![hook_identity(&h2), hook_identity(&h1)]
        );
    }

    #[test]
    fn test_reinstall_moves_to_front() {
        let mut registry = HookRegistry::new();
        let target = noop_handler();
        let h1 = pass_hook();
        let h2 = pass_hook();

        registry.install(&target, &h1);
        registry.install(&target, &h2);
        registry.install(&target, &h1);

        assert_eq!(registry.hook_count(&target), 2);
        assert_eq!(
            ids(&registry.snapshot(&target)),
            vec![hook_identity(&h1), hook_identity(&h2)]
        );
    }

    #[test]
    fn test_remove_clears_captured_entry() {
        let mut registry = HookRegistry::new();
        let target = noop_handler();
        let h1 = pass_hook();

        registry.install(&target, &h1);
        let captured = registry.snapshot(&target);
        assert!(captured[0].current().is_some());

        assert!(registry.remove(&target, &h1).is_some());
        assert!(registry.remove(&target, &h1).is_none());
        assert!(captured[0].current().is_none());
        assert_eq!(registry.hook_count(&target), 0);
    }

    #[test]
    fn test_clear_drops_chain() {
        let mut registry = HookRegistry::new();
        let target = noop_handler();
        registry.install(&target, &pass_hook());
        registry.install(&target, &pass_hook());

        let captured = registry.snapshot(&target);
        assert_eq!(registry.clear(&target).len(), 2);
        assert!(captured.iter().all(|e| e.current().is_none()));
        assert!(registry.clear(&target).is_empty());
    }

    #[test]
    fn test_dead_handler_chain_ignored() {
        let mut registry = HookRegistry::new();
        let target = noop_handler();
        registry.install(&target, &pass_hook());
        drop(target);

        let (chains, hooks) = registry.purge_dead();
        assert_eq!(chains, 1);
        assert_eq!(hooks.len(), 1);
    }
}
