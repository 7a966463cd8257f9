use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{EnvelopeError, Result};

/// Default maximum payload size: 1 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// A named method call with an ordered argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEnvelope {
    /// The method to invoke on the receiving side.
    pub method: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl CallEnvelope {
    /// Create a new envelope.
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Configuration for the envelope codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Maximum payload size in bytes, enforced both ways. Default: 1 MiB.
    pub max_payload_size: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Encode an envelope into its wire payload using default configuration.
pub fn encode_envelope(envelope: &CallEnvelope) -> Result<Bytes> {
    encode_envelope_with_config(envelope, &EnvelopeConfig::default())
}

/// Encode an envelope into its wire payload.
pub fn encode_envelope_with_config(
    envelope: &CallEnvelope,
    config: &EnvelopeConfig,
) -> Result<Bytes> {
    let payload = serde_json::to_vec(envelope)?;
    if payload.len() > config.max_payload_size {
        return Err(EnvelopeError::PayloadTooLarge {
            size: payload.len(),
            max: config.max_payload_size,
        });
    }
    Ok(Bytes::from(payload))
}

/// Decode a wire payload using default configuration.
pub fn decode_envelope(payload: &[u8]) -> Result<CallEnvelope> {
    decode_envelope_with_config(payload, &EnvelopeConfig::default())
}

/// Decode a wire payload into an envelope.
///
/// Any JSON value without a string `method` member is rejected with
/// [`EnvelopeError::MissingMethod`]; a missing `args` member decodes as an
/// empty argument list.
pub fn decode_envelope_with_config(payload: &[u8], config: &EnvelopeConfig) -> Result<CallEnvelope> {
    if payload.len() > config.max_payload_size {
        return Err(EnvelopeError::PayloadTooLarge {
            size: payload.len(),
            max: config.max_payload_size,
        });
    }

    let value: Value = serde_json::from_slice(payload)?;
    let has_method = value
        .get("method")
        .map(Value::is_string)
        .unwrap_or(false);
    if !has_method {
        trace!("json payload without method");
        return Err(EnvelopeError::MissingMethod);
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn encodes_wire_shape() {
        let envelope = CallEnvelope::new("greet", vec![json!("Alice"), json!(3)]);
        let payload = encode_envelope(&envelope).unwrap();

        let value: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value, json!({"method": "greet", "args": ["Alice", 3]}));
        assert_eq!(decode_envelope(&payload).unwrap(), envelope);
    }

    #[test]
    fn decode_defaults_missing_args() {
        let envelope = decode_envelope(br#"{"method":"ping"}"#).unwrap();
        assert_eq!(envelope.method, "ping");
        assert!(envelope.args.is_empty());
    }

    #[test]
    fn decode_ignores_unknown_members() {
        let envelope = decode_envelope(br#"{"method":"ping","args":[],"extra":true}"#).unwrap();
        assert_eq!(envelope.method, "ping");
    }

    #[test]
    fn decode_rejects_non_json() {
        let result = decode_envelope(b"not json at all");
        assert!(matches!(result, Err(EnvelopeError::InvalidJson(_))));
    }

    #[test]
    fn decode_rejects_missing_or_non_string_method() {
        assert!(matches!(
            decode_envelope(br#"{"args":[1]}"#),
            Err(EnvelopeError::MissingMethod)
        ));
        assert!(matches!(
            decode_envelope(br#"{"method":42}"#),
            Err(EnvelopeError::MissingMethod)
        ));
        assert!(matches!(
            decode_envelope(br#"["method"]"#),
            Err(EnvelopeError::MissingMethod)
        ));
    }

    #[test]
    fn decode_rejects_non_array_args() {
        let result = decode_envelope(br#"{"method":"ping","args":"nope"}"#);
        assert!(matches!(result, Err(EnvelopeError::InvalidJson(_))));
    }

    #[test]
    fn payload_limit_applies_both_ways() {
        let config = EnvelopeConfig {
            max_payload_size: 16,
        };
        let envelope = CallEnvelope::new("a-long-method-name", Vec::new());
        assert!(matches!(
            encode_envelope_with_config(&envelope, &config),
            Err(EnvelopeError::PayloadTooLarge { .. })
        ));
        assert!(matches!(
            decode_envelope_with_config(br#"{"method":"a-long-method-name"}"#, &config),
            Err(EnvelopeError::PayloadTooLarge { size: 31, max: 16 })
        ));
    }
}
