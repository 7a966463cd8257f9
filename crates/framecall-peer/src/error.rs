use framecall_channel::ChannelError;
use framecall_envelope::EnvelopeError;

/// Errors and diagnostics produced by peer operations.
///
/// None of these reach the caller of [`crate::Messenger::send`] or
/// [`crate::Messenger::listen_to`]; they are logged and handed to the
/// optional diagnostic sink.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// No proxy URL is known for the peer yet.
    #[error("peer {0} is not resolvable")]
    UnresolvedPeer(String),

    /// An inbound payload could not be decoded into a call.
    #[error("malformed envelope from {peer}: {source}")]
    MalformedEnvelope {
        peer: String,
        #[source]
        source: EnvelopeError,
    },

    /// An outbound call could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] EnvelopeError),

    /// The sender's reported origin does not prefix the expected origin.
    #[error("origin mismatch for {peer}: expected {expected}, got {actual}")]
    OriginMismatch {
        peer: String,
        expected: String,
        actual: String,
    },

    /// A listener failed while handling a call.
    #[error("listener for {peer} failed in {method}: {message}")]
    ListenerFailure {
        peer: String,
        method: String,
        message: String,
    },

    /// Channel-level error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Inbound arguments failed schema validation.
    #[cfg(feature = "schema")]
    #[error("schema rejected call from {peer}: {source}")]
    Schema {
        peer: String,
        #[source]
        source: framecall_schema::SchemaError,
    },

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PeerError>;
