use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info};

use crate::messenger::Shared;

/// An outbound call held until its peer is ready.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredCall {
    pub method: String,
    pub args: Vec<Value>,
}

impl DeferredCall {
    /// Create a deferred call.
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Per-peer readiness.
///
/// `Pending → Flushing → Ready`, never backwards. While `Flushing`, new
/// calls join the tail of the queue being replayed, so nothing overtakes
/// an older deferred call.
#[derive(Debug)]
enum Readiness {
    Pending(VecDeque<DeferredCall>),
    Flushing(VecDeque<DeferredCall>),
    Ready,
}

/// Readiness set plus per-peer queues of deferred calls.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    peers: HashMap<String, Readiness>,
}

impl DeferredQueue {
    /// Create a queue where `ready` peers accept calls from the start.
    pub fn new<'a>(ready: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            peers: ready
                .into_iter()
                .map(|name| (name.to_string(), Readiness::Ready))
                .collect(),
        }
    }

    /// Hand a call to the queue.
    ///
    /// Returns the call back if `peer` is ready and it should be sent now;
    /// otherwise the call is appended to the peer's queue and `None` is
    /// returned.
    pub fn submit(&mut self, peer: &str, call: DeferredCall) -> Option<DeferredCall> {
        match self
            .peers
            .entry(peer.to_string())
            .or_insert_with(|| Readiness::Pending(VecDeque::new()))
        {
            Readiness::Ready => Some(call),
            Readiness::Pending(queue) | Readiness::Flushing(queue) => {
                queue.push_back(call);
                None
            }
        }
    }

    /// Move `peer` into the ready set and start replaying its queue.
    ///
    /// Returns false if the peer was already ready or flushing.
    pub fn begin_flush(&mut self, peer: &str) -> bool {
        let state = self
            .peers
            .entry(peer.to_string())
            .or_insert_with(|| Readiness::Pending(VecDeque::new()));
        match state {
            Readiness::Pending(queue) => {
                let queue = std::mem::take(queue);
                *state = Readiness::Flushing(queue);
                true
            }
            Readiness::Flushing(_) | Readiness::Ready => false,
        }
    }

    /// Next call to replay for a flushing peer.
    ///
    /// Returns `None` and completes the transition to ready once the queue
    /// is drained.
    pub fn next_flushed(&mut self, peer: &str) -> Option<DeferredCall> {
        let state = self.peers.get_mut(peer)?;
        let Readiness::Flushing(queue) = state else {
            return None;
        };
        match queue.pop_front() {
            Some(call) => Some(call),
            None => {
                *state = Readiness::Ready;
                None
            }
        }
    }

    /// Whether `peer` is in the ready set.
    pub fn is_ready(&self, peer: &str) -> bool {
        matches!(
            self.peers.get(peer),
            Some(Readiness::Ready | Readiness::Flushing(_))
        )
    }

    /// Number of calls waiting for `peer`.
    pub fn pending_len(&self, peer: &str) -> usize {
        match self.peers.get(peer) {
            Some(Readiness::Pending(queue) | Readiness::Flushing(queue)) => queue.len(),
            _ => 0,
        }
    }
}

impl Shared {
    /// Mark `peer` ready and replay its deferred calls in submission order.
    ///
    /// The whole queue, including calls submitted while replaying, goes out
    /// before this returns. Calling it again for the same peer is a no-op.
    pub(crate) fn mark_ready(self: &Rc<Self>, peer: &str) {
        if !self.deferred.borrow_mut().begin_flush(peer) {
            debug!(%peer, "peer already ready");
            return;
        }

        let queued = self.deferred.borrow().pending_len(peer);
        info!(%peer, queued, "peer ready; replaying deferred calls");

        loop {
            let next = self.deferred.borrow_mut().next_flushed(peer);
            match next {
                Some(call) => self.transmit(peer, call),
                None => break,
            }
        }
    }
}
