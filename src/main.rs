/*!
 * Dispatch Demo - Main Entry Point
 *
 * Wires a signal and a message handler on a tokio LocalSet:
 * - Emits a signal to two receivers
 * - Posts a burst of conflatable messages that collapse into one delivery
 * - Prints the resulting statistics as JSON
 */

use dispatch_core::{
    handler, init_tracing, slot, ConflatableMessage, LocalTaskScheduler, LoopConfig, Message,
    MessageLoop, ObjectId, SignalHub,
};
use std::cell::Cell;
use std::rc::Rc;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let local = tokio::task::LocalSet::new();
    local.run_until(run()).await
}

async fn run() -> anyhow::Result<()> {
    info!("Dispatch demo starting...");

    // Signals
    let hub = SignalHub::new();
    let button = ObjectId::next();
    let label = ObjectId::next();
    let clicked = hub.signal::<u32>(button);

    let status = slot(|sender: ObjectId, count: &u32| {
        info!(%sender, count, "status bar saw click");
    });
    let counter = slot(|sender: ObjectId, count: &u32| {
        info!(%sender, count, "label saw click");
    });
    clicked.connect(&status, None);
    clicked.connect(&counter, Some(label));

    clicked.emit(&1);
    hub.disconnect_receiver(label);
    clicked.emit(&2);

    // Message loop
    let config = LoopConfig::from_env()?;
    let message_loop = MessageLoop::with_config(Rc::new(LocalTaskScheduler::new()), config);

    let updates = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&updates);
    let widget = handler(move |msg: &dyn Message| {
        seen.set(seen.get() + 1);
        info!(kind = msg.kind(), "widget processed message");
    });

    for _ in 0..4 {
        message_loop.post_message(&widget, ConflatableMessage::shared("update-request"));
    }

    // Queued after the flush task, so the flush has run once this completes
    tokio::task::spawn_local(async {}).await?;

    info!(updates = updates.get(), "Posted burst delivered");
    println!("{}", serde_json::to_string_pretty(&hub.stats())?);
    println!("{}", serde_json::to_string_pretty(&message_loop.stats())?);

    Ok(())
}
