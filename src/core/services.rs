//! Service-name database
//!
//! Symbolic port names come from an environment-provided table, normally
//! `/etc/services`. The resolvers only see it through two single-method
//! traits, so tests and embedders can substitute a fixed in-memory table:
//!
//! - [`PortLookup`]: service name (or alias) to port, any protocol
//! - [`ServiceNameLookup`]: `(port, protocol)` to canonical service name
//!
//! # Example
//!
//! ```
//! use fwspec::core::services::{PortLookup, ServiceNameLookup, ServiceTable};
//!
//! let table = ServiceTable::parse("http 80/tcp www # World Wide Web\n");
//! assert_eq!(table.lookup_port("www"), Some(80));
//! assert_eq!(table.lookup_name(80, "tcp").as_deref(), Some("http"));
//! assert_eq!(table.lookup_name(80, "udp"), None);
//! ```

use crate::core::error::Result;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Default location of the system service-name database
pub const DEFAULT_SERVICES_PATH: &str = "/etc/services";

/// Name to port lookup against a service-name table.
pub trait PortLookup {
    /// Returns the port registered for `name` (canonical name or alias).
    fn lookup_port(&self, name: &str) -> Option<u16>;
}

/// Reverse lookup of the canonical service name for a port/protocol pair.
pub trait ServiceNameLookup {
    fn lookup_name(&self, port: u16, protocol: &str) -> Option<String>;
}

impl<T: PortLookup + ?Sized> PortLookup for &T {
    fn lookup_port(&self, name: &str) -> Option<u16> {
        (**self).lookup_port(name)
    }
}

impl<T: ServiceNameLookup + ?Sized> ServiceNameLookup for &T {
    fn lookup_name(&self, port: u16, protocol: &str) -> Option<String> {
        (**self).lookup_name(port, protocol)
    }
}

/// One line of a services table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub port: u16,
    pub protocol: String,
    pub aliases: Vec<String>,
}

impl ServiceEntry {
    fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

/// An immutable, ordered service-name table.
///
/// Lookups return the first matching entry in table order.
#[derive(Debug, Clone, Default)]
pub struct ServiceTable {
    entries: Vec<ServiceEntry>,
}

impl ServiceTable {
    /// Builds a table from `(name, port, protocol)` triples, without aliases.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, u16, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, port, protocol)| ServiceEntry {
                    name: name.to_string(),
                    port,
                    protocol: protocol.to_string(),
                    aliases: Vec::new(),
                })
                .collect(),
        }
    }

    /// Parses `/etc/services` formatted text.
    ///
    /// Each line is `name port/protocol [aliases...] [# comment]`.
    /// Lines that do not fit the format are skipped.
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();

        for (lineno, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default();
            let mut fields = line.split_whitespace();

            let Some(name) = fields.next() else {
                continue;
            };
            let Some(port_proto) = fields.next() else {
                debug!("services line {}: missing port/protocol", lineno + 1);
                continue;
            };
            let Some((port, protocol)) = port_proto.split_once('/') else {
                debug!("services line {}: malformed '{}'", lineno + 1, port_proto);
                continue;
            };
            let Ok(port) = port.parse::<u16>() else {
                debug!("services line {}: bad port '{}'", lineno + 1, port);
                continue;
            };
            if protocol.is_empty() {
                continue;
            }

            entries.push(ServiceEntry {
                name: name.to_string(),
                port,
                protocol: protocol.to_string(),
                aliases: fields.map(str::to_string).collect(),
            });
        }

        Self { entries }
    }

    /// Reads and parses a services file.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::parse(&content);
        debug!("Loaded {} service entries from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }
}

impl PortLookup for ServiceTable {
    fn lookup_port(&self, name: &str) -> Option<u16> {
        self.entries
            .iter()
            .find(|e| e.matches_name(name))
            .map(|e| e.port)
    }
}

impl ServiceNameLookup for ServiceTable {
    fn lookup_name(&self, port: u16, protocol: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.port == port && e.protocol == protocol)
            .map(|e| e.name.clone())
    }
}

/// The system services database, loaded on first use.
///
/// If the file cannot be read the table is treated as empty, so every
/// symbolic lookup resolves to "not found".
#[derive(Debug)]
pub struct SystemServices {
    path: PathBuf,
    table: OnceLock<ServiceTable>,
}

impl SystemServices {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the loaded table, reading the file on the first call.
    pub fn table(&self) -> &ServiceTable {
        self.table.get_or_init(|| match ServiceTable::load(&self.path) {
            Ok(table) => table,
            Err(e) => {
                warn!("Service database {:?} unavailable: {}", self.path, e);
                ServiceTable::default()
            }
        })
    }
}

impl Default for SystemServices {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICES_PATH)
    }
}

impl PortLookup for SystemServices {
    fn lookup_port(&self, name: &str) -> Option<u16> {
        self.table().lookup_port(name)
    }
}

impl ServiceNameLookup for SystemServices {
    fn lookup_name(&self, port: u16, protocol: &str) -> Option<String> {
        self.table().lookup_name(port, protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Network services, Internet style
tcpmux          1/tcp                           # TCP port service multiplexer
ssh             22/tcp                          # SSH Remote Login Protocol
domain          53/tcp
domain          53/udp
http            80/tcp          www             # WorldWideWeb HTTP
http-alt        8080/tcp        webcache        # WWW caching service
broken          notaport/tcp
alsobroken      99
";

    #[test]
    fn test_parse_skips_comments_and_malformed_lines() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(table.len(), 6);
        assert!(table.entries().iter().all(|e| e.name != "broken"));
    }

    #[test]
    fn test_lookup_port_by_name_and_alias() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(table.lookup_port("ssh"), Some(22));
        assert_eq!(table.lookup_port("www"), Some(80));
        assert_eq!(table.lookup_port("http-alt"), Some(8080));
        assert_eq!(table.lookup_port("webcache"), Some(8080));
        assert_eq!(table.lookup_port("gopher"), None);
    }

    #[test]
    fn test_lookup_port_is_case_sensitive() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(table.lookup_port("SSH"), None);
    }

    #[test]
    fn test_lookup_name_respects_protocol() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(table.lookup_name(53, "udp").as_deref(), Some("domain"));
        assert_eq!(table.lookup_name(22, "udp"), None);
        assert_eq!(table.lookup_name(8080, "tcp").as_deref(), Some("http-alt"));
    }

    #[test]
    fn test_from_entries_first_match_wins() {
        let table = ServiceTable::from_entries([("dup", 10, "tcp"), ("dup", 20, "udp")]);
        assert_eq!(table.lookup_port("dup"), Some(10));
    }

    #[test]
    fn test_system_services_missing_file_is_empty() {
        let services = SystemServices::new("/nonexistent/fwspec/services");
        assert_eq!(services.lookup_port("ssh"), None);
        assert!(services.table().is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services");
        std::fs::write(&path, SAMPLE).unwrap();

        let services = SystemServices::new(&path);
        assert_eq!(services.lookup_port("domain"), Some(53));
        assert_eq!(services.path(), path.as_path());
    }
}
