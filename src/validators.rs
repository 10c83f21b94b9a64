//! Lexical validation of address and interface fields
//!
//! These checks run before any value is accepted into a firewall rule.
//! They only answer valid/invalid; turning a rejection into a message is
//! left to the caller (see [`crate::core::error::translate`]).

use crate::core::ports::PortId;
use serde::{Deserialize, Serialize};

/// Validates a dotted-quad IPv4 literal.
///
/// An empty string means "unspecified" and is accepted. Otherwise there must
/// be exactly four components, each made only of ASCII digits with a value
/// in `0..=255`. Leading zeros are kept as-is; IPv6 is not accepted.
///
/// # Examples
///
/// ```
/// use fwspec::validators::check_ip;
///
/// assert!(check_ip("192.168.1.1"));
/// assert!(check_ip(""));
/// assert!(!check_ip("256.1.1.1"));
/// assert!(!check_ip("1.2.3"));
/// ```
pub fn check_ip(ip: &str) -> bool {
    if ip.is_empty() {
        return true;
    }

    let components: Vec<&str> = ip.split('.').collect();
    if components.len() != 4 {
        return false;
    }

    components.iter().all(|c| {
        // SECURITY: ASCII digits only, so signs, whitespace and Unicode digits are rejected
        !c.is_empty()
            && c.bytes().all(|b| b.is_ascii_digit())
            && c.parse::<u32>().is_ok_and(|n| n <= 255)
    })
}

/// Limits placed on interface names by the packet-filter tooling.
///
/// Older iptables releases (<= 1.4.5) rejected `!`, `:` and `*` in interface
/// names; the defaults keep those restrictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceLimits {
    /// Maximum length in characters
    pub max_len: usize,
    /// Characters that may not appear anywhere in the name
    pub forbidden: Vec<char>,
}

impl InterfaceLimits {
    pub const DEFAULT_MAX_LEN: usize = 16;
    pub const DEFAULT_FORBIDDEN: [char; 5] = [' ', '/', '!', ':', '*'];

    /// Returns `true` if `name` is non-empty, within `max_len` characters,
    /// and free of forbidden characters.
    pub fn check(&self, name: &str) -> bool {
        !name.is_empty()
            && name.chars().count() <= self.max_len
            && !name.chars().any(|c| self.forbidden.contains(&c))
    }
}

impl Default for InterfaceLimits {
    fn default() -> Self {
        Self {
            max_len: Self::DEFAULT_MAX_LEN,
            forbidden: Self::DEFAULT_FORBIDDEN.to_vec(),
        }
    }
}

/// Validates an interface name against the default [`InterfaceLimits`].
///
/// # Examples
///
/// ```
/// use fwspec::validators::check_interface;
///
/// assert!(check_interface("eth0"));
/// assert!(!check_interface("eth/0"));
/// assert!(!check_interface(""));
/// ```
pub fn check_interface(name: &str) -> bool {
    InterfaceLimits::default().check(name)
}

/// Checks if a port is well-known and returns informational message.
///
/// This is informational only and does not block a rule.
pub fn check_well_known_port(port: PortId) -> Option<String> {
    let port = port.get();
    if port < 1024 {
        let name = match port {
            22 => "SSH",
            80 => "HTTP",
            443 => "HTTPS",
            53 => "DNS",
            25 => "SMTP",
            21 => "FTP",
            0 => return Some("Port 0 is reserved".to_string()),
            _ => return Some(format!("Privileged port {} (requires admin)", port)),
        };
        Some(format!("Port {}: {}", port, name))
    } else {
        None
    }
}
