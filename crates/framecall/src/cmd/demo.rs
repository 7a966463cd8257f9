//! In-memory parent/child walkthrough.
//!
//! The parent queues two greetings before the child frame is ready, then
//! either signals readiness or lets the fallback timer fire. The child
//! prints every call it receives, in arrival order.

use std::cell::RefCell;
use std::rc::Rc;

use framecall_channel::{MemoryChannel, MemoryFactory};
use framecall_envelope::CallEnvelope;
use framecall_peer::{Listener, ManualScheduler, Messenger, MessengerConfig, MethodTable};
use framecall_schema::MethodSchemaRegistry;
use serde_json::json;
use tracing::{info, warn};

use crate::cmd::DemoArgs;
use crate::exit::{channel_error, peer_error, schema_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_call, OutputFormat};

const PARENT_URL: &str = "https://parent.example/app.html";
const CHILD_URL: &str = "https://child.example/proxy.html";
const CHILD_NAME: &str = "child";
const GREET_SCHEMA: &str = r#"{"type":"array","prefixItems":[{"type":"string"}],"minItems":1}"#;

pub fn run(args: DemoArgs, format: OutputFormat) -> CliResult<i32> {
    let config = match &args.config {
        Some(path) => MessengerConfig::from_json_file(path)
            .map_err(|err| peer_error("load config", err))?,
        None => MessengerConfig::default(),
    };
    let fallback = config.ready_fallback;

    let (to_child, to_parent) =
        MemoryChannel::pair(PARENT_URL, CHILD_URL).map_err(|err| channel_error("pair", err))?;
    let scheduler = Rc::new(ManualScheduler::new());
    let schemas = MethodSchemaRegistry::from_embedded(&[("greet", GREET_SCHEMA)])
        .map_err(|err| schema_error("compile demo schema", err))?;

    let parent = Messenger::builder(MemoryFactory::new().with_endpoint(to_child), scheduler.clone())
        .with_config(config.with_proxy(CHILD_NAME, CHILD_URL))
        .build();
    let child = Messenger::builder(MemoryFactory::new().with_endpoint(to_parent), scheduler.clone())
        .with_schema_registry(Rc::new(schemas))
        .build();

    let delivered: Rc<RefCell<Vec<CallEnvelope>>> = Rc::default();
    let sink = delivered.clone();
    let greeter: Rc<dyn Listener> = Rc::new(MethodTable::new().on("greet", move |args| {
        sink.borrow_mut()
            .push(CallEnvelope::new("greet", args.to_vec()));
        Ok(())
    }));
    child.listen_to(PARENT_URL, Some(greeter));

    parent.send(CHILD_NAME, "greet", vec![json!("Alice")]);
    parent.send(CHILD_NAME, "greet", vec![json!("Bob")]);
    info!(queued = parent.pending_calls(CHILD_NAME), "greetings queued");

    if args.skip_ready {
        let fired = scheduler.advance(fallback);
        info!(?fallback, fired, "fallback window elapsed");
    } else {
        parent.mark_ready(CHILD_NAME);
    }

    let delivered = delivered.borrow();
    for call in delivered.iter() {
        print_call(call, parent.config().parent_name.as_str(), format);
    }

    if delivered.len() == 2 {
        Ok(SUCCESS)
    } else {
        warn!(delivered = delivered.len(), "expected two greetings");
        Ok(FAILURE)
    }
}
