//! Method-call envelope codec.
//!
//! Every call crossing a channel is a single JSON text payload:
//!
//! ```text
//! {"method": "<name>", "args": [<json values>...]}
//! ```
//!
//! There is no versioning and no correlation id; envelopes are
//! fire-and-forget call signals.

pub mod codec;
pub mod error;

pub use codec::{
    decode_envelope, decode_envelope_with_config, encode_envelope, encode_envelope_with_config,
    CallEnvelope, EnvelopeConfig, DEFAULT_MAX_PAYLOAD,
};
pub use error::{EnvelopeError, Result};
