//! Named method calls between a document and its embedded frames.
//!
//! framecall lets a parent document and the frames it embeds invoke named
//! methods on one another over a message channel, buffering calls until the
//! target frame has loaded and fanning inbound calls out to every listener
//! that implements them.
//!
//! # Crate Structure
//!
//! - [`channel`]: the cross-document channel abstraction and an in-memory implementation
//! - [`envelope`]: JSON call envelope codec
//! - [`schema`]: optional per-method argument validation (behind `schema` feature)
//! - [`peer`]: peer registry, deferred sends and inbound routing (behind `peer` feature)

/// Re-export channel types.
pub mod channel {
    pub use framecall_channel::*;
}

/// Re-export envelope types.
pub mod envelope {
    pub use framecall_envelope::*;
}

/// Re-export schema types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use framecall_schema::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use framecall_peer::*;
}
