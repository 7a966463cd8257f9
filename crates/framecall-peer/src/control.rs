//! Ready announcement control call.
//!
//! Intercepted only by messengers configured to accept announcements;
//! everywhere else it is an ordinary method name.

use framecall_envelope::CallEnvelope;

/// Control call: the sending document has finished loading.
pub const CONTROL_READY: &str = "__framecall_ready";

/// Build the ready announcement envelope.
pub fn ready_announcement() -> CallEnvelope {
    CallEnvelope::new(CONTROL_READY, Vec::new())
}
