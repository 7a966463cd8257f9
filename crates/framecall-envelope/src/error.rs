/// Errors that can occur during envelope encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The payload is not valid JSON, or has the wrong shape.
    #[error("payload is not a valid envelope: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload is JSON but carries no string `method` field.
    #[error("envelope has no method")]
    MissingMethod,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
