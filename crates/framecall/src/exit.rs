use std::fmt;
use std::io;

use framecall_channel::ChannelError;
use framecall_envelope::EnvelopeError;
use framecall_peer::PeerError;
use framecall_schema::SchemaError;

// Stable process exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn envelope_error(context: &str, err: EnvelopeError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    match err {
        ChannelError::InvalidUrl(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::LoadFailed(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SchemaError::CompileFailed(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn peer_error(context: &str, err: PeerError) -> CliError {
    match err {
        PeerError::Config(_) => CliError::new(USAGE, format!("{context}: {err}")),
        PeerError::Json(_) | PeerError::MalformedEnvelope { .. } | PeerError::Encode(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        PeerError::Channel(err) => channel_error(context, err),
        PeerError::Schema { source, .. } => schema_error(context, source),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_exit_codes() {
        assert_eq!(
            envelope_error("decode", EnvelopeError::MissingMethod).code,
            DATA_INVALID
        );
        assert_eq!(
            peer_error("config", PeerError::Config("bad".into())).code,
            USAGE
        );
        assert_eq!(
            peer_error("send", PeerError::UnresolvedPeer("child".into())).code,
            FAILURE
        );
        assert_eq!(
            channel_error("pair", ChannelError::InvalidUrl("nope".into())).code,
            USAGE
        );
        assert_eq!(
            io_error("read", io::Error::new(io::ErrorKind::NotFound, "gone")).code,
            USAGE
        );
    }
}
