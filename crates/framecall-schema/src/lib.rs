//! Optional JSON Schema validation of method arguments.
//!
//! Each method name may carry a JSON Schema (2020-12) describing its
//! argument array. Inbound calls whose arguments do not match are
//! rejected before any listener sees them.

pub mod config;
pub mod error;
pub mod registry;
pub mod validator;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use registry::MethodSchemaRegistry;
