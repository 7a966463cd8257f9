use std::collections::HashMap;
use std::rc::{Rc, Weak};

use framecall_channel::Channel;
use tracing::{debug, warn};

use crate::error::{PeerError, Result};
use crate::listener::Listener;
use crate::messenger::Shared;

/// Everything known about one logical peer.
#[derive(Clone)]
pub struct PeerRecord {
    /// Logical peer name.
    pub name: String,
    /// URL the channel was opened to; inbound origins must prefix it.
    pub expected_origin: String,
    /// Channel to the peer's document.
    pub channel: Rc<dyn Channel>,
    /// Listeners in registration order.
    pub listeners: Vec<Rc<dyn Listener>>,
}

impl std::fmt::Debug for PeerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRecord")
            .field("name", &self.name)
            .field("expected_origin", &self.expected_origin)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Name → [`PeerRecord`] map. Records are created once and never removed.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<String, PeerRecord>,
}

impl PeerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.peers.contains_key(name)
    }

    /// Record for `name`, if resolved.
    pub fn get(&self, name: &str) -> Option<&PeerRecord> {
        self.peers.get(name)
    }

    /// Store a new record. An existing record for the same name wins.
    ///
    /// Returns true if `record` was stored.
    pub fn insert(&mut self, record: PeerRecord) -> bool {
        if self.peers.contains_key(&record.name) {
            return false;
        }
        self.peers.insert(record.name.clone(), record);
        true
    }

    /// Append a listener to `name`'s list. Returns false if unresolved.
    pub fn add_listener(&mut self, name: &str, listener: Rc<dyn Listener>) -> bool {
        match self.peers.get_mut(name) {
            Some(record) => {
                record.listeners.push(listener);
                true
            }
            None => false,
        }
    }

    /// Channel to `name`, if resolved.
    pub fn channel(&self, name: &str) -> Option<Rc<dyn Channel>> {
        self.peers.get(name).map(|record| record.channel.clone())
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.peers.get(name).map_or(0, |record| record.listeners.len())
    }

    /// Resolved peer names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.peers.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl Shared {
    /// Ensure a record exists for `name`, opening its channel on first use.
    ///
    /// The URL comes from `explicit_url` when given, otherwise from the
    /// proxy directory. A name with neither yields
    /// [`PeerError::UnresolvedPeer`] and can be retried later.
    pub(crate) fn resolve(self: &Rc<Self>, name: &str, explicit_url: Option<&str>) -> Result<()> {
        if self.registry.borrow().contains(name) {
            if explicit_url.is_some() {
                debug!(peer = %name, "peer already resolved; explicit url ignored");
            }
            return Ok(());
        }

        let url = match explicit_url {
            Some(url) => url.to_string(),
            None => self
                .directory
                .proxy_url(name)
                .ok_or_else(|| PeerError::UnresolvedPeer(name.to_string()))?,
        };

        let channel = self.factory.open(&url)?;
        let stored = self.registry.borrow_mut().insert(PeerRecord {
            name: name.to_string(),
            expected_origin: url.clone(),
            channel: channel.clone(),
            listeners: Vec::new(),
        });
        if !stored {
            warn!(peer = %name, "peer resolved concurrently; keeping first record");
            return Ok(());
        }
        debug!(peer = %name, %url, "resolved peer");

        // The record must exist before the handler: a channel may deliver
        // buffered messages as soon as it is installed.
        let weak: Weak<Shared> = Rc::downgrade(self);
        let peer = name.to_string();
        channel.on_message(Box::new(move |message| {
            if let Some(shared) = weak.upgrade() {
                shared.route_inbound(&peer, message);
            }
        }));

        self.arm_ready_fallback(name);
        Ok(())
    }

    fn arm_ready_fallback(self: &Rc<Self>, name: &str) {
        let weak = Rc::downgrade(self);
        let peer = name.to_string();
        self.scheduler.schedule(
            self.config.ready_fallback,
            Box::new(move || {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let already_ready = shared.deferred.borrow().is_ready(&peer);
                if !already_ready {
                    warn!(%peer, "no ready signal within fallback window; forcing ready");
                }
                shared.mark_ready(&peer);
            }),
        );
    }
}
