//! Zone rule field validation
//!
//! A zone is a named set of firewall rules. Before a configuration tool
//! accepts an updated zone it runs every user-supplied field through the
//! resolvers and validators, collecting all failures so the user sees them
//! at once.
//!
//! # Example
//!
//! ```
//! use fwspec::core::services::ServiceTable;
//! use fwspec::core::zone::{validate_zone, ZoneSettings};
//! use fwspec::validators::InterfaceLimits;
//!
//! let settings: ZoneSettings = serde_json::from_str(r#"{
//!     "name": "public",
//!     "ports": [{"port": "ssh", "protocol": "tcp"}, {"port": "6000-6010", "protocol": "udp"}],
//!     "interfaces": ["eth0"],
//!     "sources": ["10.0.0.1"]
//! }"#).unwrap();
//!
//! let services = ServiceTable::from_entries([("ssh", 22, "tcp")]);
//! let report = validate_zone(&settings, &services, &InterfaceLimits::default());
//! assert!(report.is_valid());
//! assert_eq!(report.ports[1].range.to_string(), "6000-6010");
//! ```

use crate::core::error::{Error, ErrorTranslation, translate};
use crate::core::ports::{PortRange, PortSpec, resolve_port_range};
use crate::core::services::PortLookup;
use crate::validators::{InterfaceLimits, check_ip};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum zone name length (chain names derived from it must fit in 28 characters)
pub const MAX_ZONE_NAME_LEN: usize = 17;

/// Transport protocols a port entry may name
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[strum(serialize = "tcp")]
    Tcp,
    #[strum(serialize = "udp")]
    Udp,
    #[strum(serialize = "sctp")]
    Sctp,
    #[strum(serialize = "dccp")]
    Dccp,
}

/// A port entry as submitted: unresolved spec plus protocol name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortEntry {
    pub port: PortSpec,
    pub protocol: String,
}

/// User-submitted zone fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    pub name: String,
    pub services: Vec<String>,
    pub ports: Vec<PortEntry>,
    pub interfaces: Vec<String>,
    pub sources: Vec<String>,
}

/// A port entry after successful resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedPort {
    pub range: PortRange,
    pub protocol: Protocol,
}

/// Result of validating a whole zone
#[derive(Debug, Default)]
pub struct ZoneReport {
    pub ports: Vec<ResolvedPort>,
    pub errors: Vec<Error>,
    pub warnings: Vec<String>,
}

impl ZoneReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// User-facing messages for every error, in field order
    pub fn translations(&self) -> Vec<ErrorTranslation> {
        self.errors.iter().map(translate).collect()
    }
}

fn invalid(field: &str, value: &str) -> Error {
    Error::InvalidFormat {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Checks a zone name: non-empty, at most [`MAX_ZONE_NAME_LEN`] characters,
/// ASCII alphanumerics, `_` and `-` only.
///
/// # Errors
///
/// Returns `Error::Validation` describing the first violated constraint.
pub fn validate_zone_name(name: &str) -> Result<(), Error> {
    let fail = |message: &str| -> Result<(), Error> {
        Err(Error::Validation {
            field: "name".to_string(),
            message: message.to_string(),
        })
    };

    if name.is_empty() {
        return fail("Name cannot be empty");
    }
    if name.len() > MAX_ZONE_NAME_LEN {
        return fail("Name too long (max 17 chars)");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return fail("Name contains invalid characters (use only a-z, 0-9, _, -)");
    }
    Ok(())
}

/// Validates every field of `settings`.
///
/// Ports are resolved against `services`, interfaces checked against
/// `limits`, sources checked as IPv4 literals. Service names that are not
/// in the table only produce a warning.
pub fn validate_zone<L: PortLookup + ?Sized>(
    settings: &ZoneSettings,
    services: &L,
    limits: &InterfaceLimits,
) -> ZoneReport {
    let mut report = ZoneReport::default();

    if let Err(e) = validate_zone_name(&settings.name) {
        report.errors.push(e);
    }

    for service in &settings.services {
        if service.trim().is_empty() {
            report.errors.push(invalid("services", service));
        } else if services.lookup_port(service.trim()).is_none() {
            report
                .warnings
                .push(format!("Service '{service}' is not in the service database"));
        }
    }

    for entry in &settings.ports {
        let protocol = Protocol::from_str(entry.protocol.trim());
        let range = resolve_port_range(services, &entry.port).into_result("ports", &entry.port);

        match (range, protocol) {
            (Ok(range), Ok(protocol)) => report.ports.push(ResolvedPort { range, protocol }),
            (range, protocol) => {
                if let Err(e) = range {
                    report.errors.push(e);
                }
                if protocol.is_err() {
                    report.errors.push(invalid("protocol", &entry.protocol));
                }
            }
        }
    }

    for iface in &settings.interfaces {
        if !limits.check(iface) {
            report.errors.push(invalid("interfaces", iface));
        }
    }

    for source in &settings.sources {
        // An empty source would mean "unspecified", which is meaningless in a list
        if source.is_empty() || !check_ip(source) {
            report.errors.push(invalid("sources", source));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::ServiceTable;
    use strum::IntoEnumIterator;

    fn services() -> ServiceTable {
        ServiceTable::from_entries([
            ("ssh", 22, "tcp"),
            ("a", 1, "tcp"),
            ("a-b", 2, "tcp"),
            ("b-c", 3, "tcp"),
            ("c", 4, "tcp"),
        ])
    }

    fn entry(port: impl Into<PortSpec>, protocol: &str) -> PortEntry {
        PortEntry {
            port: port.into(),
            protocol: protocol.to_string(),
        }
    }

    fn zone() -> ZoneSettings {
        ZoneSettings {
            name: "public".to_string(),
            services: vec!["ssh".to_string()],
            ports: vec![entry("ssh", "tcp"), entry(8080i64, "udp")],
            interfaces: vec!["eth0".to_string()],
            sources: vec!["192.168.1.0".to_string()],
        }
    }

    #[test]
    fn test_valid_zone() {
        let report = validate_zone(&zone(), &services(), &InterfaceLimits::default());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
        assert_eq!(report.ports.len(), 2);
        assert_eq!(report.ports[0].range.bounds(), (22, 22));
        assert_eq!(report.ports[1].protocol, Protocol::Udp);
    }

    #[test]
    fn test_collects_every_error() {
        let mut settings = zone();
        settings.ports = vec![
            entry("gopher", "tcp"),
            entry("70000", "tcp"),
            entry("a-b-c", "tcp"),
            entry("22", "icmp"),
        ];
        settings.interfaces.push("eth/0".to_string());
        settings.sources.push("256.0.0.1".to_string());

        let report = validate_zone(&settings, &services(), &InterfaceLimits::default());
        assert!(report.ports.is_empty());
        assert_eq!(report.errors.len(), 6);
        assert!(matches!(report.errors[0], Error::PortNotFound { .. }));
        assert!(matches!(report.errors[1], Error::PortTooLarge { .. }));
        assert!(matches!(report.errors[2], Error::AmbiguousRange { .. }));
        assert!(matches!(report.errors[3], Error::InvalidFormat { ref field, .. } if field == "protocol"));
        assert!(matches!(report.errors[4], Error::InvalidFormat { ref field, .. } if field == "interfaces"));
        assert!(matches!(report.errors[5], Error::InvalidFormat { ref field, .. } if field == "sources"));
        assert_eq!(report.translations().len(), 6);
    }

    #[test]
    fn test_unknown_service_is_warning() {
        let mut settings = zone();
        settings.services.push("gopher".to_string());
        let report = validate_zone(&settings, &services(), &InterfaceLimits::default());
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_empty_source_rejected() {
        let mut settings = zone();
        settings.sources.push(String::new());
        let report = validate_zone(&settings, &services(), &InterfaceLimits::default());
        assert!(!report.is_valid());
    }

    #[test]
    fn test_zone_name_rules() {
        assert!(validate_zone_name("public").is_ok());
        assert!(validate_zone_name("my_zone-1").is_ok());
        assert!(validate_zone_name("").is_err());
        assert!(validate_zone_name(&"z".repeat(18)).is_err());
        assert!(validate_zone_name("../etc").is_err());
    }

    #[test]
    fn test_protocol_roundtrip_names() {
        for protocol in Protocol::iter() {
            assert_eq!(Protocol::from_str(protocol.as_ref()).ok(), Some(protocol));
        }
        assert!(Protocol::from_str("icmp").is_err());
    }

    #[test]
    fn test_settings_deserialize_defaults() {
        let settings: ZoneSettings = serde_json::from_str(r#"{"name": "work"}"#).unwrap();
        assert_eq!(settings.name, "work");
        assert!(settings.ports.is_empty());
    }
}
