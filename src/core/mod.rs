//! Core resolution and probing functionality
//!
//! - [`services`]: Service-name database and its lookup traits
//! - [`ports`]: Port, port range and service name resolution
//! - [`zone`]: Whole-zone field validation built on the resolvers
//! - [`liveness`]: PID-file based daemon liveness probe
//! - [`error`]: Error types and user-facing translations

pub mod error;
pub mod liveness;
pub mod ports;
pub mod services;
pub mod zone;
