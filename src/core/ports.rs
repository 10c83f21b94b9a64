//! Port, port range and service name resolution
//!
//! Firewall rule fields accept ports as integers, decimal strings, symbolic
//! service names, or hyphenated ranges of any of those. Because service names
//! may themselves contain `-`, a range string can split more than one way;
//! [`resolve_port_range`] tries every split and reports [`Resolution::Ambiguous`]
//! instead of guessing.
//!
//! All functions here are pure: they read only the service table they are
//! given and never log.
//!
//! # Example
//!
//! ```
//! use fwspec::core::ports::{resolve_port_range, PortRange, Resolution};
//! use fwspec::core::services::ServiceTable;
//!
//! let services = ServiceTable::from_entries([("ssh", 22, "tcp"), ("http", 80, "tcp")]);
//!
//! let range = resolve_port_range(&services, &"http-ssh".into());
//! assert_eq!(range.resolved().map(|r| r.bounds()), Some((22, 80)));
//!
//! assert_eq!(resolve_port_range(&services, &"gopher".into()), Resolution::NotFound);
//! ```

use crate::core::error::{Error, Result};
use crate::core::services::{PortLookup, ServiceNameLookup};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::IntErrorKind;

/// Raw port specification as supplied by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Number(i64),
    Text(String),
}

impl From<i64> for PortSpec {
    fn from(n: i64) -> Self {
        PortSpec::Number(n)
    }
}

impl From<u16> for PortSpec {
    fn from(n: u16) -> Self {
        PortSpec::Number(i64::from(n))
    }
}

impl From<&str> for PortSpec {
    fn from(s: &str) -> Self {
        PortSpec::Text(s.to_string())
    }
}

impl From<String> for PortSpec {
    fn from(s: String) -> Self {
        PortSpec::Text(s)
    }
}

impl From<PortId> for PortSpec {
    fn from(id: PortId) -> Self {
        PortSpec::from(id.get())
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSpec::Number(n) => write!(f, "{n}"),
            PortSpec::Text(s) => f.write_str(s),
        }
    }
}

/// A port number in `0..=65535` that has passed resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u16")]
pub struct PortId(u16);

impl PortId {
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl From<PortId> for u16 {
    fn from(id: PortId) -> Self {
        id.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single port or an ordered span with `lo < hi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PortRange {
    Single(PortId),
    Span { lo: PortId, hi: PortId },
}

impl PortRange {
    /// Orders the bounds; equal bounds collapse to [`PortRange::Single`].
    fn between(a: PortId, b: PortId) -> Self {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => PortRange::Span { lo: a, hi: b },
            std::cmp::Ordering::Greater => PortRange::Span { lo: b, hi: a },
            std::cmp::Ordering::Equal => PortRange::Single(a),
        }
    }

    pub fn start(&self) -> PortId {
        match *self {
            PortRange::Single(p) => p,
            PortRange::Span { lo, .. } => lo,
        }
    }

    pub fn end(&self) -> PortId {
        match *self {
            PortRange::Single(p) => p,
            PortRange::Span { hi, .. } => hi,
        }
    }

    pub fn bounds(&self) -> (u16, u16) {
        (self.start().get(), self.end().get())
    }

    pub fn is_single(&self) -> bool {
        matches!(self, PortRange::Single(_))
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRange::Single(p) => write!(f, "{p}"),
            PortRange::Span { lo, hi } => write!(f, "{lo}-{hi}"),
        }
    }
}

/// Outcome of resolving a port specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    /// Neither a number nor a known service name
    NotFound,
    /// A number above 65535
    TooLarge,
    /// Two or more splits of a range produced different valid results
    Ambiguous,
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn resolved(self) -> Option<T> {
        match self {
            Resolution::Resolved(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(v) => Resolution::Resolved(f(v)),
            Resolution::NotFound => Resolution::NotFound,
            Resolution::TooLarge => Resolution::TooLarge,
            Resolution::Ambiguous => Resolution::Ambiguous,
        }
    }

    /// Converts the outcome into a [`Result`], naming `field` and the
    /// original `value` in the error.
    ///
    /// # Errors
    ///
    /// Returns the matching [`Error`] variant for every non-resolved outcome.
    pub fn into_result(self, field: &str, value: &PortSpec) -> Result<T> {
        let (field, value) = (field.to_string(), value.to_string());
        match self {
            Resolution::Resolved(v) => Ok(v),
            Resolution::NotFound => Err(Error::PortNotFound { field, value }),
            Resolution::TooLarge => Err(Error::PortTooLarge { field, value }),
            Resolution::Ambiguous => Err(Error::AmbiguousRange { field, value }),
        }
    }
}

fn from_number(n: i64) -> Resolution<PortId> {
    match u16::try_from(n) {
        Ok(port) => Resolution::Resolved(PortId(port)),
        Err(_) if n < 0 => Resolution::NotFound,
        Err(_) => Resolution::TooLarge,
    }
}

fn resolve_token<L: PortLookup + ?Sized>(services: &L, token: &str) -> Resolution<PortId> {
    let token = token.trim();

    match token.parse::<i64>() {
        Ok(n) => from_number(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Resolution::TooLarge,
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => Resolution::NotFound,
        Err(_) => services
            .lookup_port(token)
            .map_or(Resolution::NotFound, |port| Resolution::Resolved(PortId(port))),
    }
}

/// Resolves a single port number or service name.
///
/// Integers are used as-is. Strings are trimmed, parsed as decimal, and
/// looked up in `services` when they are not numeric. Negative numbers are
/// [`Resolution::NotFound`]; numbers above 65535 are [`Resolution::TooLarge`].
/// Never returns [`Resolution::Ambiguous`].
pub fn resolve_port_id<L: PortLookup + ?Sized>(
    services: &L,
    spec: &PortSpec,
) -> Resolution<PortId> {
    match spec {
        PortSpec::Number(n) => from_number(*n),
        PortSpec::Text(s) => resolve_token(services, s),
    }
}

/// Resolves a port or a `-` separated port range.
///
/// The string is split on every `-`. Split points are tried from "whole
/// string as one token" down to "first segment only"; each split whose
/// halves both resolve contributes a candidate. If the whole string
/// resolves as a single token on the first try, that wins outright.
///
/// Zero candidates is [`Resolution::NotFound`], unless the whole string is a
/// single number above 65535, which is [`Resolution::TooLarge`]. One distinct
/// candidate is resolved, more than one is [`Resolution::Ambiguous`].
pub fn resolve_port_range<L: PortLookup + ?Sized>(
    services: &L,
    spec: &PortSpec,
) -> Resolution<PortRange> {
    let text = match spec {
        PortSpec::Number(n) => return from_number(*n).map(PortRange::Single),
        PortSpec::Text(s) => s.as_str(),
    };

    let segments: Vec<&str> = text.split('-').collect();
    let mut candidates: Vec<PortRange> = Vec::new();
    let mut whole_too_large = false;

    for i in (1..=segments.len()).rev() {
        let first = segments[..i].join("-");
        let second = segments[i..].join("-");

        if second.is_empty() {
            match resolve_token(services, &first) {
                Resolution::Resolved(id) => {
                    push_distinct(&mut candidates, PortRange::Single(id));
                    if i == segments.len() {
                        break;
                    }
                }
                Resolution::TooLarge if i == segments.len() => whole_too_large = true,
                _ => {}
            }
            continue;
        }

        if let (Resolution::Resolved(a), Resolution::Resolved(b)) = (
            resolve_token(services, &first),
            resolve_token(services, &second),
        ) {
            push_distinct(&mut candidates, PortRange::between(a, b));
        }
    }

    match candidates.as_slice() {
        [] if whole_too_large => Resolution::TooLarge,
        [] => Resolution::NotFound,
        [only] => Resolution::Resolved(*only),
        _ => Resolution::Ambiguous,
    }
}

fn push_distinct(candidates: &mut Vec<PortRange>, range: PortRange) {
    if !candidates.contains(&range) {
        candidates.push(range);
    }
}

/// Looks up the canonical service name for a port and protocol.
///
/// The port may be an integer or a decimal string; service names are not
/// accepted here. Every failure (non-numeric port, out of range, unknown
/// pair, wrong protocol) collapses to `None`.
pub fn service_name<L: ServiceNameLookup + ?Sized>(
    services: &L,
    port: &PortSpec,
    protocol: &str,
) -> Option<String> {
    let number = match port {
        PortSpec::Number(n) => *n,
        PortSpec::Text(s) => s.trim().parse::<i64>().ok()?,
    };
    let port = u16::try_from(number).ok()?;
    services.lookup_name(port, protocol)
}
