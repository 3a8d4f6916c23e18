//! Input validation and sanitization
//!
//! Guards every user-supplied value before it reaches the configuration file
//! or an external command line

use crate::error::{Ps2NetError, Ps2NetResult};
use std::net::Ipv4Addr;

/// Maximum length for NetBIOS names (protocol limit)
const MAX_NETBIOS_NAME_LEN: usize = 15;

/// Maximum length for interface names (Linux kernel limit is 15)
const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Validate a NetBIOS name
///
/// Names are 1-15 characters of letters, digits, dashes and dots, and must
/// start and end with a letter or digit. A single-character name is valid.
pub fn validate_netbios_name(name: &str) -> Ps2NetResult<()> {
    if name.is_empty() {
        return Err(Ps2NetError::InvalidParameter(
            "NetBIOS name cannot be empty".to_string()
        ));
    }

    if name.len() > MAX_NETBIOS_NAME_LEN {
        return Err(Ps2NetError::InvalidParameter(
            format!("NetBIOS name cannot exceed {} characters", MAX_NETBIOS_NAME_LEN)
        ));
    }

    let bytes = name.as_bytes();
    let first_ok = bytes[0].is_ascii_alphanumeric();
    let last_ok = bytes[bytes.len() - 1].is_ascii_alphanumeric();
    let middle_ok = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');

    if !first_ok || !last_ok || !middle_ok {
        return Err(Ps2NetError::InvalidParameter(format!(
            "Invalid NetBIOS name '{}': only letters, digits, dashes and dots are allowed, \
             and the name must start and end with a letter or digit",
            name
        )));
    }

    Ok(())
}

/// Validate an IPv4 address in dotted-quad form
pub fn validate_ipv4_address(addr: &str) -> Ps2NetResult<Ipv4Addr> {
    addr.parse::<Ipv4Addr>()
        .map_err(|_| Ps2NetError::InvalidParameter(
            format!("Invalid IPv4 address: {}", addr)
        ))
}

/// Validate interface name to prevent command injection
///
/// Interface names must be alphanumeric with optional dashes and underscores,
/// and no longer than 15 characters (Linux kernel limit)
pub fn validate_interface_name(name: &str) -> Ps2NetResult<()> {
    if name.is_empty() {
        return Err(Ps2NetError::InvalidParameter(
            "Interface name cannot be empty".to_string()
        ));
    }

    if name.len() > MAX_INTERFACE_NAME_LEN {
        return Err(Ps2NetError::InvalidParameter(
            format!("Interface name too long (max {} characters)", MAX_INTERFACE_NAME_LEN)
        ));
    }

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
            return Err(Ps2NetError::InvalidParameter(
                format!("Invalid interface name '{}': contains invalid character '{}'", name, c)
            ));
        }
    }

    // Don't allow names starting with dash (could be interpreted as option)
    if name.starts_with('-') {
        return Err(Ps2NetError::InvalidParameter(
            "Interface name cannot start with dash".to_string()
        ));
    }

    Ok(())
}

/// Validate a prefix length for an IPv4 address
pub fn validate_ipv4_prefix_len(prefix: u8) -> Ps2NetResult<()> {
    if prefix > 32 {
        return Err(Ps2NetError::InvalidParameter(
            format!("Prefix length {} exceeds maximum 32", prefix)
        ));
    }
    Ok(())
}

/// Reject setting values that would corrupt the configuration file
///
/// Newlines or other control characters inside a value would break the
/// line-oriented smb.conf grammar
pub fn validate_setting_value(value: &str) -> Ps2NetResult<()> {
    if value.chars().any(|c| c.is_control()) {
        return Err(Ps2NetError::InvalidParameter(
            "Setting value contains control characters".to_string()
        ));
    }

    Ok(())
}
