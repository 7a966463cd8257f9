/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// No channel could be opened to the given URL.
    #[error("failed to open channel to {url}: {reason}")]
    Open { url: String, reason: String },

    /// The remote side of the channel is gone.
    #[error("channel to {url} closed")]
    Closed { url: String },

    /// The remote URL is not usable for a channel.
    #[error("invalid channel url: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
