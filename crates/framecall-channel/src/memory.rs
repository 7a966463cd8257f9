use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{ChannelError, Result};
use crate::traits::{origin_of, Channel, ChannelFactory, InboundMessage, MessageHandler};

/// In-process channel endpoint.
///
/// Created in connected pairs with [`MemoryChannel::pair`]. Sending on one
/// side synchronously invokes the other side's message handler, reporting
/// the sending document's origin. Payloads sent while the remote side has
/// no handler installed are discarded, the same way a message posted to a
/// document that is still loading is lost.
#[derive(Clone)]
pub struct MemoryChannel {
    inner: Rc<Endpoint>,
}

struct Endpoint {
    remote_url: String,
    local_origin: String,
    handler: RefCell<Option<Rc<dyn Fn(InboundMessage)>>>,
    remote: RefCell<Weak<Endpoint>>,
    sent: RefCell<Vec<Bytes>>,
}

impl MemoryChannel {
    /// Create a connected pair for documents served at `a_url` and `b_url`.
    ///
    /// The first channel is held by document A and talks to B; the second
    /// is held by document B and talks to A.
    pub fn pair(a_url: &str, b_url: &str) -> Result<(Self, Self)> {
        let a_origin = origin_of(a_url).ok_or_else(|| ChannelError::InvalidUrl(a_url.into()))?;
        let b_origin = origin_of(b_url).ok_or_else(|| ChannelError::InvalidUrl(b_url.into()))?;

        let a_side = Rc::new(Endpoint::new(b_url, a_origin));
        let b_side = Rc::new(Endpoint::new(a_url, b_origin));
        *a_side.remote.borrow_mut() = Rc::downgrade(&b_side);
        *b_side.remote.borrow_mut() = Rc::downgrade(&a_side);

        Ok((Self { inner: a_side }, Self { inner: b_side }))
    }

    /// Payloads transmitted from this side, in send order.
    pub fn sent_payloads(&self) -> Vec<Bytes> {
        self.inner.sent.borrow().clone()
    }

    /// Whether a message handler is installed on this side.
    pub fn has_handler(&self) -> bool {
        self.inner.handler.borrow().is_some()
    }
}

impl Endpoint {
    fn new(remote_url: &str, local_origin: &str) -> Self {
        Self {
            remote_url: remote_url.to_string(),
            local_origin: local_origin.to_string(),
            handler: RefCell::new(None),
            remote: RefCell::new(Weak::new()),
            sent: RefCell::new(Vec::new()),
        }
    }
}

impl Channel for MemoryChannel {
    fn send(&self, payload: &[u8]) -> Result<()> {
        let remote = self
            .inner
            .remote
            .borrow()
            .upgrade()
            .ok_or_else(|| ChannelError::Closed {
                url: self.inner.remote_url.clone(),
            })?;

        let payload = Bytes::copy_from_slice(payload);
        self.inner.sent.borrow_mut().push(payload.clone());

        // Clone the handler out so it may send or re-register while running.
        let handler = remote.handler.borrow().clone();
        match handler {
            Some(handler) => {
                trace!(url = %self.inner.remote_url, size = payload.len(), "delivering payload");
                handler(InboundMessage::new(payload, self.inner.local_origin.clone()));
            }
            None => {
                debug!(url = %self.inner.remote_url, "remote not listening; payload discarded");
            }
        }
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) {
        *self.inner.handler.borrow_mut() = Some(Rc::from(handler));
    }

    fn remote_url(&self) -> &str {
        &self.inner.remote_url
    }
}

impl std::fmt::Debug for MemoryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChannel")
            .field("remote_url", &self.inner.remote_url)
            .field("local_origin", &self.inner.local_origin)
            .finish()
    }
}

/// Channel factory backed by pre-connected in-memory endpoints.
#[derive(Default)]
pub struct MemoryFactory {
    endpoints: RefCell<HashMap<String, MemoryChannel>>,
    opened: RefCell<Vec<String>>,
}

impl MemoryFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `channel` available under its remote URL.
    pub fn with_endpoint(self, channel: MemoryChannel) -> Self {
        self.insert(channel);
        self
    }

    /// Make `channel` available under its remote URL.
    pub fn insert(&self, channel: MemoryChannel) {
        self.endpoints
            .borrow_mut()
            .insert(channel.remote_url().to_string(), channel);
    }

    /// Make `channel` available under an explicit URL.
    pub fn insert_at(&self, url: impl Into<String>, channel: MemoryChannel) {
        self.endpoints.borrow_mut().insert(url.into(), channel);
    }

    /// URLs passed to `open`, in call order.
    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }
}

impl ChannelFactory for MemoryFactory {
    fn open(&self, url: &str) -> Result<Rc<dyn Channel>> {
        self.opened.borrow_mut().push(url.to_string());
        let channel = self
            .endpoints
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| ChannelError::Open {
                url: url.to_string(),
                reason: "no in-memory endpoint registered".to_string(),
            })?;
        debug!(%url, "opened in-memory channel");
        Ok(Rc::new(channel))
    }
}
