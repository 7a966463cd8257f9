//! Readiness fallback driven by the tokio timer.
//!
//! Run with:
//!   cargo run --example async-parent-child --features peer,async

use std::rc::Rc;
use std::time::Duration;

use framecall::channel::{MemoryChannel, MemoryFactory};
use framecall::peer::{Listener, Messenger, MessengerConfig, MethodTable, TokioScheduler};
use serde_json::json;

const PARENT_URL: &str = "https://parent.example/app.html";
const CHILD_URL: &str = "https://child.example/proxy.html";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (to_child, to_parent) = MemoryChannel::pair(PARENT_URL, CHILD_URL)?;
            let config = MessengerConfig {
                ready_fallback: Duration::from_millis(200),
                ..MessengerConfig::default()
            }
            .with_proxy("child", CHILD_URL);

            let parent = Messenger::builder(
                MemoryFactory::new().with_endpoint(to_child),
                Rc::new(TokioScheduler),
            )
            .with_config(config)
            .build();
            let child = Messenger::new(
                MemoryFactory::new().with_endpoint(to_parent),
                Rc::new(TokioScheduler),
            );

            let greeter: Rc<dyn Listener> = Rc::new(MethodTable::new().on("greet", |args| {
                println!("child: hello, {}", args[0]);
                Ok(())
            }));
            child.listen_to(PARENT_URL, Some(greeter));

            parent.send("child", "greet", vec![json!("Alice")]);
            println!("parent: waiting for the fallback to flush");
            tokio::time::sleep(Duration::from_millis(300)).await;
            println!("parent: child ready = {}", parent.is_ready("child"));
            Ok::<(), Box<dyn std::error::Error>>(())
        })
        .await
}
