//! Opaque cross-document channel abstraction.
//!
//! A channel is the raw transport between two documents: it can send a
//! text payload to the remote side and report inbound payloads together
//! with the origin the sender claims. Everything else in framecall builds
//! on the [`Channel`] and [`ChannelFactory`] traits defined here.
//!
//! [`MemoryChannel`] provides an in-process pair for tests and demos.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{ChannelError, Result};
pub use memory::{MemoryChannel, MemoryFactory};
pub use traits::{origin_of, Channel, ChannelFactory, InboundMessage, MessageHandler};
