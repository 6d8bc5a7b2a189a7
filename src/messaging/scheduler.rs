/*!
 * Flush Scheduling
 * Deferred-callback primitives that drive the posted-message flush
 *
 * The message loop coalesces scheduling itself: it asks for at most one
 * outstanding task at a time, so schedulers only need to run each task once
 * on a later turn of the host's event loop.
 */

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::trace;

/// Deferred work handed to a scheduler
pub type FlushTask = Box<dyn FnOnce()>;

/// Runs a task on a later turn of the host loop
pub trait FlushScheduler {
    fn schedule(&self, task: FlushTask);
}

/// Scheduler driven explicitly by the host, one tick at a time
///
/// Suits hosts with their own frame loop, and tests.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    tasks: Rc<RefCell<VecDeque<FlushTask>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the tasks queued before this call; returns how many ran
    ///
    /// Tasks scheduled while these run wait for the next tick.
    pub fn run_pending(&self) -> usize {
        let budget = self.pending();
        let mut ran = 0;
        for _ in 0..budget {
            let Some(task) = self.tasks.borrow_mut().pop_front() else {
                break;
            };
            task();
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "Manual scheduler tick");
        }
        ran
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl FlushScheduler for ManualScheduler {
    fn schedule(&self, task: FlushTask) {
        self.tasks.borrow_mut().push_back(task);
    }
}

/// Scheduler that spawns each task on the current tokio `LocalSet`
///
/// Must be used from within `LocalSet::run_until` (or a task spawned on a
/// `LocalSet`); `tokio::task::spawn_local` panics anywhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTaskScheduler;

impl LocalTaskScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl FlushScheduler for LocalTaskScheduler {
    fn schedule(&self, task: FlushTask) {
        tokio::task::spawn_local(async move {
            task();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_manual_scheduler_runs_one_tick() {
        let scheduler = ManualScheduler::new();
        let ran = Rc::new(Cell::new(0));

        let counter = Rc::clone(&ran);
        let inner = scheduler.clone();
        scheduler.schedule(Box::new(move || {
            counter.set(counter.get() + 1);
            let counter = Rc::clone(&counter);
            // Scheduled from inside a task: deferred to the next tick
            inner.schedule(Box::new(move || counter.set(counter.get() + 10)));
        }));

        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(ran.get(), 1);
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(ran.get(), 11);
        assert_eq!(scheduler.run_pending(), 0);
    }
}
