/*!
 * Ordering Properties
 * Randomized checks of emission order under reentrant disconnects and of
 * posted-message ordering
 */

use dispatch_core::messaging::{
    handler, BasicMessage, ConflatableMessage, ManualScheduler, Message, MessageLoop,
};
use dispatch_core::signals::{slot, SignalHub, SlotRef};
use dispatch_core::ObjectId;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

/// Expected invocation order when receiver `i` disconnects `targets[i]`
/// right after it runs
fn model_emission(targets: &[Option<usize>]) -> Vec<usize> {
    let mut live = vec![true; targets.len()];
    let mut invoked = Vec::new();
    for (i, target) in targets.iter().enumerate() {
        if !live[i] {
            continue;
        }
        invoked.push(i);
        if let Some(t) = target {
            live[*t] = false;
        }
    }
    invoked
}

proptest! {
    #[test]
    fn prop_emission_respects_reentrant_disconnects(
        raw in prop::collection::vec(prop::option::of(0usize..8), 1..8)
    ) {
        let n = raw.len();
        let targets: Vec<Option<usize>> = raw.iter().map(|t| t.map(|t| t % n)).collect();

        let hub = SignalHub::new();
        let signal = hub.signal::<u32>(ObjectId::next());
        let log = Rc::new(RefCell::new(Vec::new()));
        let slots: Rc<RefCell<Vec<SlotRef<u32>>>> = Rc::default();

        for (i, target) in targets.iter().copied().enumerate() {
            let log = Rc::clone(&log);
            let slots_ref = Rc::clone(&slots);
            let signal_ref = signal.clone();
            let receiver = slot(move |_sender: ObjectId, _args: &u32| {
                log.borrow_mut().push(i);
                if let Some(t) = target {
                    let victim = slots_ref.borrow().get(t).cloned();
                    if let Some(victim) = victim {
                        signal_ref.disconnect(&victim, None);
                    }
                }
            });
            slots.borrow_mut().push(receiver);
        }
        for receiver in slots.borrow().iter() {
            prop_assert!(signal.connect(receiver, None));
        }

        signal.emit(&0);
        prop_assert_eq!(log.borrow().clone(), model_emission(&targets));

        // Survivors run in connection order on the next emission
        let mut disconnected = vec![false; n];
        for i in model_emission(&targets) {
            if let Some(t) = targets[i] {
                disconnected[t] = true;
            }
        }
        let survivors: Vec<usize> = (0..n).filter(|i| !disconnected[*i]).collect();
        prop_assert_eq!(signal.receiver_count(), survivors.len());

        // Emptying the lookup table disarms the disconnects and breaks the cycle
        log.borrow_mut().clear();
        slots.borrow_mut().clear();
        signal.emit(&0);
        prop_assert_eq!(log.borrow().clone(), survivors);
    }

    #[test]
    fn prop_posts_delivered_in_global_order(
        posts in prop::collection::vec(0usize..4, 0..32)
    ) {
        let scheduler = ManualScheduler::new();
        let message_loop = MessageLoop::new(Rc::new(scheduler.clone()));
        let log = Rc::new(RefCell::new(Vec::new()));

        let handlers: Vec<_> = (0..4)
            .map(|h| {
                let log = Rc::clone(&log);
                handler(move |msg: &dyn Message| {
                    log.borrow_mut().push((h, msg.kind().to_string()))
                })
            })
            .collect();

        let mut expected = Vec::new();
        for (seq, h) in posts.iter().copied().enumerate() {
            let kind = format!("m{seq}");
            message_loop.post_message(&handlers[h], BasicMessage::shared(kind.as_str()));
            expected.push((h, kind));
        }

        scheduler.run_pending();
        prop_assert_eq!(log.borrow().clone(), expected);
        prop_assert_eq!(message_loop.pending_count(), 0);
    }

    #[test]
    fn prop_conflation_keeps_first_post_per_handler(
        posts in prop::collection::vec(0usize..4, 1..32)
    ) {
        let scheduler = ManualScheduler::new();
        let message_loop = MessageLoop::new(Rc::new(scheduler.clone()));
        let log = Rc::new(RefCell::new(Vec::new()));

        let handlers: Vec<_> = (0..4)
            .map(|h| {
                let log = Rc::clone(&log);
                handler(move |_msg: &dyn Message| log.borrow_mut().push(h))
            })
            .collect();

        for h in posts.iter().copied() {
            message_loop.post_message(&handlers[h], ConflatableMessage::shared("update"));
        }

        let mut expected = Vec::new();
        for h in posts.iter().copied() {
            if !expected.contains(&h) {
                expected.push(h);
            }
        }

        scheduler.run_pending();
        prop_assert_eq!(log.borrow().clone(), expected.clone());
        prop_assert_eq!(
            message_loop.stats().total_conflated as usize,
            posts.len() - expected.len()
        );
    }
}
