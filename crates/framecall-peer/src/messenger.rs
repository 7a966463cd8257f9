use std::cell::RefCell;
use std::rc::{Rc, Weak};

use framecall_channel::{origin_of, ChannelFactory};
use framecall_envelope::{encode_envelope_with_config, CallEnvelope};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::MessengerConfig;
use crate::control::ready_announcement;
use crate::deferred::{DeferredCall, DeferredQueue};
use crate::directory::{ProxyDirectory, StaticDirectory};
use crate::error::{PeerError, Result};
use crate::listener::Listener;
use crate::registry::PeerRegistry;
use crate::scheduler::Scheduler;

#[cfg(feature = "schema")]
use framecall_schema::MethodSchemaRegistry;

/// Callback receiving every error the messenger swallows.
pub type DiagnosticSink = Rc<dyn Fn(&PeerError)>;

/// State shared by every [`Messenger`] handle and by the callbacks it
/// installs. Callbacks hold a `Weak` so dropping the last handle tears
/// everything down.
pub(crate) struct Shared {
    pub(crate) config: MessengerConfig,
    pub(crate) factory: Box<dyn ChannelFactory>,
    pub(crate) directory: Box<dyn ProxyDirectory>,
    pub(crate) scheduler: Rc<dyn Scheduler>,
    pub(crate) registry: RefCell<PeerRegistry>,
    pub(crate) deferred: RefCell<DeferredQueue>,
    pub(crate) diagnostics: Option<DiagnosticSink>,
    #[cfg(feature = "schema")]
    pub(crate) schemas: Option<Rc<MethodSchemaRegistry>>,
}

impl Shared {
    /// Queue or transmit a call depending on the peer's readiness.
    pub(crate) fn submit(self: &Rc<Self>, peer: &str, call: DeferredCall) {
        let direct = self.deferred.borrow_mut().submit(peer, call);
        match direct {
            Some(call) => self.transmit(peer, call),
            None => {
                let queued = self.deferred.borrow().pending_len(peer);
                debug!(%peer, queued, "peer not ready; call deferred");
                // Opening the channel early arms the readiness fallback.
                match self.resolve(peer, None) {
                    Ok(()) => {}
                    Err(PeerError::UnresolvedPeer(_)) => {
                        debug!(%peer, "deferred peer not declared yet");
                    }
                    Err(err) => self.report(err),
                }
            }
        }
    }

    /// Encode and send one call. Failures are reported, never returned.
    pub(crate) fn transmit(self: &Rc<Self>, peer: &str, call: DeferredCall) {
        if let Err(err) = self.try_transmit(peer, call) {
            self.report(err);
        }
    }

    fn try_transmit(self: &Rc<Self>, peer: &str, call: DeferredCall) -> Result<()> {
        self.resolve(peer, None)?;
        let channel = self
            .registry
            .borrow()
            .channel(peer)
            .ok_or_else(|| PeerError::UnresolvedPeer(peer.to_string()))?;

        let envelope = CallEnvelope::new(call.method, call.args);
        let payload = encode_envelope_with_config(&envelope, &self.config.envelope)?;
        channel.send(&payload)?;
        trace!(%peer, method = %envelope.method, size = payload.len(), "call sent");
        Ok(())
    }

    /// Log `err` and hand it to the diagnostic sink.
    pub(crate) fn report(&self, err: PeerError) {
        match &err {
            PeerError::MalformedEnvelope { .. } => debug!(error = %err, "inbound payload dropped"),
            PeerError::UnresolvedPeer(_) => warn!(error = %err, "call dropped"),
            PeerError::OriginMismatch { .. } => warn!(error = %err, "dispatching despite origin mismatch"),
            _ => warn!(error = %err, "peer operation failed"),
        }
        if let Some(sink) = &self.diagnostics {
            sink(&err);
        }
    }
}

/// Builder for [`Messenger`].
pub struct MessengerBuilder {
    config: MessengerConfig,
    factory: Box<dyn ChannelFactory>,
    scheduler: Rc<dyn Scheduler>,
    directory: Option<Box<dyn ProxyDirectory>>,
    diagnostics: Option<DiagnosticSink>,
    #[cfg(feature = "schema")]
    schemas: Option<Rc<MethodSchemaRegistry>>,
}

impl MessengerBuilder {
    /// Replace the default configuration.
    pub fn with_config(mut self, config: MessengerConfig) -> Self {
        self.config = config;
        self
    }

    /// Look proxy URLs up in `directory` instead of the config's `proxies`.
    pub fn with_directory(mut self, directory: impl ProxyDirectory + 'static) -> Self {
        self.directory = Some(Box::new(directory));
        self
    }

    /// Receive every error the messenger logs and swallows.
    pub fn with_diagnostics(mut self, sink: impl Fn(&PeerError) + 'static) -> Self {
        self.diagnostics = Some(Rc::new(sink));
        self
    }

    /// Validate inbound call arguments before dispatch.
    #[cfg(feature = "schema")]
    pub fn with_schema_registry(mut self, schemas: Rc<MethodSchemaRegistry>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    /// Build the messenger. The parent peer starts ready.
    pub fn build(self) -> Messenger {
        let directory: Box<dyn ProxyDirectory> = match self.directory {
            Some(directory) => directory,
            None => Box::new(StaticDirectory::from_config(&self.config)),
        };
        let deferred = DeferredQueue::new([self.config.parent_name.as_str()]);

        Messenger {
            shared: Rc::new(Shared {
                config: self.config,
                factory: self.factory,
                directory,
                scheduler: self.scheduler,
                registry: RefCell::new(PeerRegistry::new()),
                deferred: RefCell::new(deferred),
                diagnostics: self.diagnostics,
                #[cfg(feature = "schema")]
                schemas: self.schemas,
            }),
        }
    }
}

/// Cross-document messenger.
///
/// Cloning yields another handle to the same registry and queues, which is
/// how listeners send calls of their own.
#[derive(Clone)]
pub struct Messenger {
    shared: Rc<Shared>,
}

impl Messenger {
    /// Start building a messenger over `factory`, with `scheduler` driving
    /// the readiness fallback.
    pub fn builder(factory: impl ChannelFactory + 'static, scheduler: Rc<dyn Scheduler>) -> MessengerBuilder {
        MessengerBuilder {
            config: MessengerConfig::default(),
            factory: Box::new(factory),
            scheduler,
            directory: None,
            diagnostics: None,
            #[cfg(feature = "schema")]
            schemas: None,
        }
    }

    /// Messenger with default configuration.
    pub fn new(factory: impl ChannelFactory + 'static, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::builder(factory, scheduler).build()
    }

    /// Start routing inbound calls from `peer_ref` to `listener`.
    ///
    /// `peer_ref` is either a logical peer name or the URL of the embedding
    /// document; a URL registers the parent peer. Listeners accumulate, so
    /// calling this again adds another listener. A peer that cannot be
    /// resolved yet is reported and may be retried later.
    pub fn listen_to(&self, peer_ref: &str, listener: Option<Rc<dyn Listener>>) {
        let shared = &self.shared;
        let (name, explicit_url) = match origin_of(peer_ref) {
            Some(_) => (shared.config.parent_name.as_str(), Some(peer_ref)),
            None => (peer_ref, None),
        };

        if let Err(err) = shared.resolve(name, explicit_url) {
            shared.report(err);
            return;
        }

        if let Some(listener) = listener {
            shared.registry.borrow_mut().add_listener(name, listener);
        }

        if explicit_url.is_some() && shared.config.announce_ready_to_parent {
            let announcement = ready_announcement();
            shared.submit(name, DeferredCall::new(announcement.method, announcement.args));
        }
    }

    /// Call `method` on `peer` with `args`.
    ///
    /// Never fails from the caller's point of view: calls to a peer that is
    /// not ready are queued, and transport problems are reported to the
    /// diagnostic sink.
    pub fn send(&self, peer: &str, method: &str, args: Vec<Value>) {
        self.shared.submit(peer, DeferredCall::new(method, args));
    }

    /// Signal that `peer` has finished loading and flush its queued calls.
    pub fn mark_ready(&self, peer: &str) {
        self.shared.mark_ready(peer);
    }

    /// Detached handle for delivering ready signals from host callbacks.
    pub fn ready_notifier(&self) -> ReadyNotifier {
        ReadyNotifier {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Whether `peer` accepts calls without queueing.
    pub fn is_ready(&self, peer: &str) -> bool {
        self.shared.deferred.borrow().is_ready(peer)
    }

    /// Number of calls queued for `peer`.
    pub fn pending_calls(&self, peer: &str) -> usize {
        self.shared.deferred.borrow().pending_len(peer)
    }

    /// Resolved peer names, sorted.
    pub fn peers(&self) -> Vec<String> {
        self.shared.registry.borrow().names()
    }

    /// Number of listeners registered for `peer`.
    pub fn listener_count(&self, peer: &str) -> usize {
        self.shared.registry.borrow().listener_count(peer)
    }

    /// Active configuration.
    pub fn config(&self) -> &MessengerConfig {
        &self.shared.config
    }
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("parent_name", &self.shared.config.parent_name)
            .field("peers", &self.peers())
            .finish()
    }
}

/// Weak handle that marks peers ready.
///
/// Does nothing once every [`Messenger`] handle has been dropped.
#[derive(Clone)]
pub struct ReadyNotifier {
    shared: Weak<Shared>,
}

impl ReadyNotifier {
    /// Mark `peer` ready. Returns false if the messenger is gone.
    pub fn notify(&self, peer: &str) -> bool {
        match self.shared.upgrade() {
            Some(shared) => {
                shared.mark_ready(peer);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ReadyNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyNotifier")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}
