//! Inbound call routing.
//!
//! Every payload arriving on a peer's channel is decoded, origin-checked,
//! checked for a ready announcement, optionally schema-checked, and then offered to each of the peer's
//! listeners in registration order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use framecall_channel::InboundMessage;
use framecall_envelope::{decode_envelope_with_config, CallEnvelope};
use serde_json::Value;
use tracing::{debug, trace};

use crate::control::CONTROL_READY;
use crate::error::PeerError;
use crate::listener::Listener;
use crate::messenger::Shared;

/// Returns true if a sender reporting `actual` may speak for a peer opened
/// at `expected`. The configured URL must begin with the reported origin.
pub fn origin_matches(expected: &str, actual: &str) -> bool {
    expected.starts_with(actual)
}

impl Shared {
    pub(crate) fn route_inbound(self: &Rc<Self>, peer: &str, message: InboundMessage) {
        let envelope = match decode_envelope_with_config(&message.payload, &self.config.envelope) {
            Ok(envelope) => envelope,
            Err(source) => {
                self.report(PeerError::MalformedEnvelope {
                    peer: peer.to_string(),
                    source,
                });
                return;
            }
        };

        let (expected_origin, listeners) = {
            let registry = self.registry.borrow();
            match registry.get(peer) {
                Some(record) => (record.expected_origin.clone(), record.listeners.clone()),
                None => {
                    debug!(%peer, "inbound call for unknown peer dropped");
                    return;
                }
            }
        };

        // Advisory only: a mismatch is reported but the call is still dispatched.
        if !origin_matches(&expected_origin, &message.origin) {
            self.report(PeerError::OriginMismatch {
                peer: peer.to_string(),
                expected: expected_origin,
                actual: message.origin.clone(),
            });
        }

        if self.is_ready_announcement(&envelope) {
            debug!(%peer, "ready announcement received");
            self.mark_ready(peer);
            return;
        }

        if self.rejected_by_schema(peer, &envelope) {
            return;
        }

        let invoked = self.fan_out(peer, &listeners, &envelope.method, &envelope.args);
        trace!(%peer, method = %envelope.method, invoked, "dispatched inbound call");
    }

    /// Whether `envelope` is a ready announcement this messenger accepts.
    /// Anything else, including an unaccepted announcement, is dispatched.
    fn is_ready_announcement(&self, envelope: &CallEnvelope) -> bool {
        self.config.accept_ready_announcements && envelope.method == CONTROL_READY
    }

    #[cfg(feature = "schema")]
    fn rejected_by_schema(&self, peer: &str, envelope: &CallEnvelope) -> bool {
        let Some(schemas) = &self.schemas else {
            return false;
        };
        match schemas.validate_envelope(envelope) {
            Ok(()) => false,
            Err(source) => {
                self.report(PeerError::Schema {
                    peer: peer.to_string(),
                    source,
                });
                true
            }
        }
    }

    #[cfg(not(feature = "schema"))]
    fn rejected_by_schema(&self, _peer: &str, _envelope: &CallEnvelope) -> bool {
        false
    }

    /// Invoke `method` on every listener that implements it.
    ///
    /// A failing or panicking listener is reported and skipped; the rest
    /// still run. Returns the number of listeners invoked.
    fn fan_out(
        &self,
        peer: &str,
        listeners: &[Rc<dyn Listener>],
        method: &str,
        args: &[Value],
    ) -> usize {
        let mut invoked = 0usize;
        for listener in listeners.iter().filter(|l| l.implements(method)) {
            invoked += 1;
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.invoke(method, args)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            self.report(PeerError::ListenerFailure {
                peer: peer.to_string(),
                method: method.to_string(),
                message,
            });
        }
        invoked
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
