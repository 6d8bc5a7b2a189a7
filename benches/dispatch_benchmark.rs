/*!
 * Dispatch Benchmarks
 *
 * Measure signal emission fan-out and posted-message flush throughput
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispatch_core::messaging::{
    handler, BasicMessage, ConflatableMessage, ManualScheduler, Message, MessageLoop,
};
use dispatch_core::signals::{slot, SignalHub};
use dispatch_core::ObjectId;
use std::cell::Cell;
use std::rc::Rc;

fn bench_emit_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_fanout");

    for receivers in [1usize, 8, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(receivers),
            &receivers,
            |b, &receivers| {
                let hub = SignalHub::new();
                let signal = hub.signal::<u64>(ObjectId::next());
                let total = Rc::new(Cell::new(0u64));

                let slots: Vec<_> = (0..receivers)
                    .map(|_| {
                        let total = Rc::clone(&total);
                        slot(move |_sender: ObjectId, value: &u64| total.set(total.get() + value))
                    })
                    .collect();
                for receiver in &slots {
                    signal.connect(receiver, None);
                }

                b.iter(|| signal.emit(black_box(&1)));
                black_box(total.get());
            },
        );
    }

    group.finish();
}

fn bench_connect_disconnect(c: &mut Criterion) {
    c.bench_function("connect_disconnect", |b| {
        let hub = SignalHub::new();
        let signal = hub.signal::<u64>(ObjectId::next());
        let receiver = slot(|_sender: ObjectId, _value: &u64| {});

        b.iter(|| {
            signal.connect(&receiver, None);
            signal.disconnect(&receiver, None);
        });
    });
}

fn bench_post_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("post_flush");

    for burst in [16usize, 256] {
        group.bench_with_input(BenchmarkId::new("basic", burst), &burst, |b, &burst| {
            let scheduler = ManualScheduler::new();
            let message_loop = MessageLoop::new(Rc::new(scheduler.clone()));
            let target = handler(|msg: &dyn Message| {
                black_box(msg.kind());
            });

            b.iter(|| {
                for _ in 0..burst {
                    message_loop.post_message(&target, BasicMessage::shared("tick"));
                }
                scheduler.run_pending();
            });
        });

        group.bench_with_input(BenchmarkId::new("conflated", burst), &burst, |b, &burst| {
            let scheduler = ManualScheduler::new();
            let message_loop = MessageLoop::new(Rc::new(scheduler.clone()));
            let target = handler(|msg: &dyn Message| {
                black_box(msg.kind());
            });

            b.iter(|| {
                for _ in 0..burst {
                    message_loop.post_message(&target, ConflatableMessage::shared("update"));
                }
                scheduler.run_pending();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_emit_fanout,
    bench_connect_disconnect,
    bench_post_flush
);
criterion_main!(benches);
