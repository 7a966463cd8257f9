//! Named method calls between a document and its peers.
//!
//! This is the routing layer of framecall. A [`Messenger`] keeps one
//! channel per logical peer name, buffers calls to peers that have not
//! finished loading, and fans inbound calls out to every registered
//! [`Listener`] that implements the called method.
//!
//! The runtime model is single-threaded and event driven: the host
//! environment forwards page-ready signals through [`Messenger::mark_ready`]
//! (or a [`ReadyNotifier`]), channels deliver inbound payloads through
//! their message callback, and a [`Scheduler`] fires the readiness fallback.

pub mod config;
pub mod control;
pub mod deferred;
pub mod directory;
pub mod error;
pub mod listener;
pub mod messenger;
pub mod registry;
pub mod router;
pub mod scheduler;

pub use config::{MessengerConfig, DEFAULT_PARENT_NAME, DEFAULT_READY_FALLBACK};
pub use control::{ready_announcement, CONTROL_READY};
pub use deferred::{DeferredCall, DeferredQueue};
pub use directory::{ProxyDirectory, StaticDirectory};
pub use error::{PeerError, Result};
pub use listener::{HandlerResult, Listener, ListenerError, MethodTable};
pub use messenger::{DiagnosticSink, Messenger, MessengerBuilder, ReadyNotifier};
pub use registry::{PeerRecord, PeerRegistry};
pub use scheduler::{ManualScheduler, Scheduler, Task};

#[cfg(feature = "async")]
pub use scheduler::TokioScheduler;
