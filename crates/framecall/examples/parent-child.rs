//! A parent document calling into a frame that has not finished loading.
//!
//! Run with:
//!   cargo run --example parent-child --features peer

use std::rc::Rc;

use framecall::channel::{MemoryChannel, MemoryFactory};
use framecall::peer::{Listener, ManualScheduler, Messenger, MessengerConfig, MethodTable};
use serde_json::json;

const PARENT_URL: &str = "https://parent.example/app.html";
const CHILD_URL: &str = "https://child.example/proxy.html";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (to_child, to_parent) = MemoryChannel::pair(PARENT_URL, CHILD_URL)?;
    let scheduler = Rc::new(ManualScheduler::new());

    let parent = Messenger::builder(MemoryFactory::new().with_endpoint(to_child), scheduler.clone())
        .with_config(MessengerConfig::default().with_proxy("child", CHILD_URL))
        .with_diagnostics(|err| eprintln!("parent: {err}"))
        .build();
    let child = Messenger::new(MemoryFactory::new().with_endpoint(to_parent), scheduler);

    // The child answers every greeting.
    let reply = child.clone();
    let greeter: Rc<dyn Listener> = Rc::new(MethodTable::new().on("greet", move |args| {
        let name = args.first().and_then(|v| v.as_str()).unwrap_or("stranger");
        println!("child: hello, {name}");
        reply.send("parent", "greeted", vec![json!(name)]);
        Ok(())
    }));
    child.listen_to(PARENT_URL, Some(greeter));

    let receipts: Rc<dyn Listener> = Rc::new(MethodTable::new().on("greeted", |args| {
        println!("parent: child greeted {}", args[0]);
        Ok(())
    }));
    parent.listen_to("child", Some(receipts));

    parent.send("child", "greet", vec![json!("Alice")]);
    parent.send("child", "greet", vec![json!("Bob")]);
    println!("parent: {} calls queued", parent.pending_calls("child"));

    // The host's page-load hook.
    parent.ready_notifier().notify("child");
    Ok(())
}
