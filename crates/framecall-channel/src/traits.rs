use std::rc::Rc;

use bytes::Bytes;

use crate::error::Result;

/// A payload received on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Raw transport payload.
    pub payload: Bytes,
    /// Origin reported by the sending document (scheme + host + port).
    pub origin: String,
}

impl InboundMessage {
    /// Create a new inbound message.
    pub fn new(payload: impl Into<Bytes>, origin: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            origin: origin.into(),
        }
    }
}

/// Callback invoked for every inbound message on a channel.
pub type MessageHandler = Box<dyn Fn(InboundMessage)>;

/// A bidirectional transport to one remote document.
///
/// Transmission is fire-and-forget: `send` returning `Ok` only means the
/// payload was handed to the transport.
pub trait Channel {
    /// Transmit one payload to the remote document.
    fn send(&self, payload: &[u8]) -> Result<()>;

    /// Install the inbound message callback, replacing any previous one.
    fn on_message(&self, handler: MessageHandler);

    /// The remote URL this channel was opened to.
    fn remote_url(&self) -> &str;
}

/// Opens channels to remote documents by URL.
pub trait ChannelFactory {
    /// Open a channel to the document served at `url`.
    fn open(&self, url: &str) -> Result<Rc<dyn Channel>>;
}

impl<F: ChannelFactory + ?Sized> ChannelFactory for Rc<F> {
    fn open(&self, url: &str) -> Result<Rc<dyn Channel>> {
        (**self).open(url)
    }
}

/// Returns the origin (`scheme://host[:port]`) portion of a URL, or `None`
/// if `url` does not carry a scheme.
pub fn origin_of(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")?;
    if scheme_end == 0 {
        return None;
    }
    let rest = &url[scheme_end + 3..];
    let authority_len = rest
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(rest.len());
    if authority_len == 0 {
        return None;
    }
    Some(&url[..scheme_end + 3 + authority_len])
}
