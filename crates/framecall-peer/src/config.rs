use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use framecall_envelope::EnvelopeConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PeerError, Result};

/// Name of the peer that represents the embedding (parent) document.
pub const DEFAULT_PARENT_NAME: &str = "parent";

/// Delay after which a resolved peer is forced ready if no ready signal arrived.
pub const DEFAULT_READY_FALLBACK: Duration = Duration::from_secs(10);

const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Messenger behavior configuration.
///
/// Deserializes from JSON; every field is optional:
///
/// ```text
/// {
///   "parent_name": "parent",
///   "ready_fallback_ms": 10000,
///   "envelope": { "max_payload_size": 1048576 },
///   "accept_ready_announcements": false,
///   "announce_ready_to_parent": false,
///   "proxies": { "child": "https://child.example/proxy.html" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessengerConfig {
    /// Peer name of the embedding document. Ready from the start.
    pub parent_name: String,
    /// One-shot fallback after which a resolved peer is forced ready.
    #[serde(rename = "ready_fallback_ms", with = "duration_ms")]
    pub ready_fallback: Duration,
    /// Envelope codec limits.
    pub envelope: EnvelopeConfig,
    /// Treat inbound ready control calls as the peer's ready signal.
    pub accept_ready_announcements: bool,
    /// Announce readiness to the parent when listening to it by URL.
    pub announce_ready_to_parent: bool,
    /// Declared proxy URL per logical peer name.
    pub proxies: BTreeMap<String, String>,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            parent_name: DEFAULT_PARENT_NAME.to_string(),
            ready_fallback: DEFAULT_READY_FALLBACK,
            envelope: EnvelopeConfig::default(),
            accept_ready_announcements: false,
            announce_ready_to_parent: false,
            proxies: BTreeMap::new(),
        }
    }
}

impl MessengerConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|err| PeerError::Config(format!("{}: {err}", path.display())))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(PeerError::Config(format!(
                "{}: config file too large ({} bytes)",
                path.display(),
                metadata.len()
            )));
        }
        let json = std::fs::read_to_string(path)
            .map_err(|err| PeerError::Config(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Add a declared proxy URL for a peer.
    pub fn with_proxy(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.proxies.insert(name.into(), url.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.parent_name.is_empty() {
            return Err(PeerError::Config("parent_name must not be empty".to_string()));
        }
        if let Some((name, _)) = self.proxies.iter().find(|(_, url)| url.is_empty()) {
            return Err(PeerError::Config(format!("proxy url for {name} is empty")));
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
