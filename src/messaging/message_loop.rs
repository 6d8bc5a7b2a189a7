/*!
 * Message Loop
 * Synchronous send, deferred post with conflation, and hook-gated dispatch
 *
 * All posted messages share one global FIFO queue, so a flush delivers them
 * in arrival order across every handler. A flush drains exactly the entries
 * present when it starts; anything posted while it runs waits for the next
 * one.
 */

use super::config::LoopConfig;
use super::handler::{HandlerRef, HookRef};
use super::hooks::HookRegistry;
use super::message::{Message, MessageRef};
use super::queue::{FifoQueue, PostedEntry};
use super::scheduler::FlushScheduler;
use super::types::LoopStats;
use crate::core::containment::{contain, ExceptionHandler, ExceptionSink};
use crate::core::errors::DispatchError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Handler-oriented dispatch loop
///
/// Cloning is cheap and yields a handle to the same loop. The loop is
/// single-threaded (`!Send`).
#[derive(Clone)]
pub struct MessageLoop {
    inner: Rc<LoopInner>,
}

struct LoopInner {
    hooks: RefCell<HookRegistry>,
    queue: RefCell<FifoQueue<PostedEntry>>,
    scheduler: Rc<dyn FlushScheduler>,
    flush_pending: Cell<bool>,
    flushing: Cell<bool>,
    config: LoopConfig,
    exceptions: ExceptionSink,
    stats: RefCell<LoopStats>,
}

/// Marks a flush in progress until dropped
struct FlushGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> FlushGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

impl MessageLoop {
    pub fn new(scheduler: Rc<dyn FlushScheduler>) -> Self {
        Self::with_config(scheduler, LoopConfig::default())
    }

    pub fn with_config(scheduler: Rc<dyn FlushScheduler>, config: LoopConfig) -> Self {
        debug!(?config, "Message loop initialized");
        Self {
            inner: Rc::new(LoopInner {
                hooks: RefCell::new(HookRegistry::new()),
                queue: RefCell::new(FifoQueue::new()),
                scheduler,
                flush_pending: Cell::new(false),
                flushing: Cell::new(false),
                config,
                exceptions: ExceptionSink::new(),
                stats: RefCell::new(LoopStats::default()),
            }),
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.inner.config
    }

    /// Deliver a message immediately
    ///
    /// Hooks run newest-installed first; the first one returning `false`
    /// stops the chain and the handler never sees the message. Panics in
    /// hooks or in the handler are reported, never propagated.
    pub fn send_message(&self, handler: &HandlerRef, msg: &dyn Message) {
        self.inner.stats.borrow_mut().total_sent += 1;
        self.dispatch(handler, msg);
    }

    /// Queue a message for the next flush
    ///
    /// A conflatable message is dropped if it merges with a message already
    /// queued for the same handler; the queued one keeps its position.
    pub fn post_message(&self, handler: &HandlerRef, msg: MessageRef) {
        self.inner.stats.borrow_mut().total_posted += 1;

        if msg.is_conflatable() && self.try_conflate(handler, &msg) {
            self.inner.stats.borrow_mut().total_conflated += 1;
            trace!(kind = msg.kind(), "Conflated posted message");
            return;
        }

        let len = {
            let mut queue = self.inner.queue.borrow_mut();
            queue.push_back(PostedEntry::new(handler, msg));
            queue.len()
        };

        let threshold = self.inner.config.queue_warn_threshold;
        if threshold > 0 && len == threshold {
            warn!(len, "Posted message queue reached warning threshold");
        }

        self.schedule_flush();
    }

    /// Install a hook at the front of the handler's chain
    ///
    /// Reinstalling a hook moves it to the front. A dispatch already in
    /// progress is unaffected.
    pub fn install_message_hook(&self, handler: &HandlerRef, hook: &HookRef) {
        let displaced = self.inner.hooks.borrow_mut().install(handler, hook);
        debug!("Installed message hook");
        drop(displaced);
    }

    /// Remove a hook; safe to call from inside that hook
    pub fn remove_message_hook(&self, handler: &HandlerRef, hook: &HookRef) {
        let removed = self.inner.hooks.borrow_mut().remove(handler, hook);
        if removed.is_some() {
            debug!("Removed message hook");
        }
        // Released with no borrow held; the hook's captures may call back in
        drop(removed);
    }

    /// Drop every hook of the handler and tombstone its queued messages
    pub fn clear_message_data(&self, handler: &HandlerRef) {
        let hooks = self.inner.hooks.borrow_mut().clear(handler);

        let mut tombstoned: Vec<HandlerRef> = Vec::new();
        for entry in self.inner.queue.borrow_mut().iter_mut() {
            if entry.targets(handler) {
                tombstoned.extend(entry.handler.take());
            }
        }

        debug!(
            hooks = hooks.len(),
            tombstoned = tombstoned.len(),
            "Cleared message data for handler"
        );
        // Released with no borrow held; user state may call back in on drop
        drop(hooks);
        drop(tombstoned);
    }

    /// Run the pending flush now
    ///
    /// Ignored when called from inside a flush.
    pub fn flush(&self) {
        if self.inner.flushing.get() {
            return;
        }
        self.inner.flush_pending.set(false);

        let _guard = FlushGuard::enter(&self.inner.flushing);
        let budget = self.inner.queue.borrow().len();
        if budget == 0 {
            return;
        }

        self.inner.stats.borrow_mut().flushes += 1;
        trace!(budget, "Flushing posted messages");

        for _ in 0..budget {
            let Some(entry) = self.inner.queue.borrow_mut().pop_front() else {
                break;
            };
            match entry.handler {
                Some(handler) => self.dispatch(&handler, entry.message.as_ref()),
                None => self.inner.stats.borrow_mut().tombstones_skipped += 1,
            }
        }
    }

    /// Queued entries, tombstones included
    pub fn pending_count(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    pub fn is_flush_pending(&self) -> bool {
        self.inner.flush_pending.get()
    }

    pub fn hook_count(&self, handler: &HandlerRef) -> usize {
        self.inner.hooks.borrow().hook_count(handler)
    }

    /// Drop hook chains of handlers that were released without clearing
    pub fn purge_dead_hooks(&self) -> usize {
        let (purged, released) = self.inner.hooks.borrow_mut().purge_dead();
        if purged > 0 {
            debug!(purged, hooks = released.len(), "Purged hook chains of dropped handlers");
        }
        drop(released);
        purged
    }

    /// Install a new exception handler, returning the previous one
    pub fn set_exception_handler(&self, handler: ExceptionHandler) -> ExceptionHandler {
        self.inner.exceptions.replace(handler)
    }

    pub fn stats(&self) -> LoopStats {
        let mut stats = self.inner.stats.borrow().clone();
        stats.pending = self.pending_count();
        stats
    }

    fn dispatch(&self, handler: &HandlerRef, msg: &dyn Message) {
        if self.inner.config.trace_dispatch {
            debug!(kind = msg.kind(), "Dispatching message");
        }

        let hooks = self.inner.hooks.borrow().snapshot(handler);
        for entry in hooks {
            // Removed since the snapshot was taken
            let Some(hook) = entry.current() else {
                continue;
            };

            match contain(|| hook.message_hook(handler, msg)) {
                Ok(true) => {}
                Ok(false) => {
                    self.inner.stats.borrow_mut().total_vetoed += 1;
                    trace!(kind = msg.kind(), "Message vetoed by hook");
                    return;
                }
                Err(reason) => {
                    self.inner.stats.borrow_mut().hook_panics += 1;
                    self.inner.exceptions.report(DispatchError::HookPanicked {
                        kind: msg.kind().into(),
                        reason,
                    });
                }
            }
        }

        match contain(|| handler.process_message(msg)) {
            Ok(()) => self.inner.stats.borrow_mut().total_delivered += 1,
            Err(reason) => {
                self.inner.stats.borrow_mut().handler_panics += 1;
                self.inner.exceptions.report(DispatchError::HandlerPanicked {
                    kind: msg.kind().into(),
                    reason,
                });
            }
        }
    }

    /// Merge `msg` into the most recent compatible entry for `handler`
    fn try_conflate(&self, handler: &HandlerRef, msg: &MessageRef) -> bool {
        // Collected first so user `conflate` code runs without a queue borrow
        let candidates: Vec<MessageRef> = self
            .inner
            .queue
            .borrow()
            .iter()
            .rev()
            .filter(|entry| entry.targets(handler))
            .filter(|entry| entry.message.is_conflatable() && entry.message.kind() == msg.kind())
            .map(|entry| Rc::clone(&entry.message))
            .collect();

        for queued in candidates {
            let merged = contain(|| queued.conflate(msg.as_ref()) || msg.conflate(queued.as_ref()));
            match merged {
                Ok(true) => return true,
                Ok(false) => {}
                Err(reason) => {
                    self.inner.exceptions.report(DispatchError::ConflatePanicked {
                        kind: msg.kind().into(),
                        reason,
                    });
                    return false;
                }
            }
        }
        false
    }

    fn schedule_flush(&self) {
        if self.inner.flush_pending.replace(true) {
            return;
        }

        let target = Rc::downgrade(&self.inner);
        self.inner.scheduler.schedule(Box::new(move || {
            if let Some(inner) = target.upgrade() {
                MessageLoop { inner }.run_scheduled();
            }
        }));
    }

    fn run_scheduled(&self) {
        if !self.inner.flush_pending.get() {
            // Already drained by an explicit flush
            return;
        }
        if self.inner.flushing.get() {
            // Host ticked the scheduler from inside a dispatch
            self.inner.flush_pending.set(false);
            self.schedule_flush();
            return;
        }
        self.flush();
    }
}
