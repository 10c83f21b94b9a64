//! fwspec - firewall specification resolver
//!
//! Turns the strings people type into firewall zone settings (ports, port
//! ranges, service names, IPv4 addresses, interface names) into validated,
//! normalized values, and rejects malformed or ambiguous input before it
//! reaches rule installation.
//!
//! # Architecture
//!
//! - [`core`] - Port/range/service resolution, zone validation, liveness probe
//! - [`validators`] - Address and interface name checks
//! - [`config`] - Configuration persistence
//! - [`utils`] - Utility functions (XDG directories, interfaces)

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod core;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use crate::core::error::{Error, Result};
pub use crate::core::ports::{PortId, PortRange, PortSpec, Resolution};
