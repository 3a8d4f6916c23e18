//! Interface binding reconciliation
//!
//! The daemons are pinned to one interface and one IPv4 address through the
//! `interfaces` and `bind interfaces only` settings in [global]. The pair is
//! written and erased together; a half-binding in the file is something to
//! reconcile, never a state to persist.

use crate::error::Ps2NetResult;
use crate::section;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use tracing::warn;

const INTERFACES_KEY: &str = "interfaces";
const BIND_ONLY_KEY: &str = "bind interfaces only";

/// Where the configured binding stands against live OS state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingState {
    /// No usable binding configured
    Unbound,
    /// A known interface without a usable address
    InterfaceOnly { interface: String },
    /// A known interface with a well-formed address that is not assigned on
    /// it; the caller may offer to assign the address and upgrade to Bound
    Candidate { interface: String, ip: Ipv4Addr },
    /// Interface and address exist and match
    Bound { interface: String, ip: Ipv4Addr },
}

impl BindingState {
    pub fn is_bound(&self) -> bool {
        matches!(self, BindingState::Bound { .. })
    }

    pub fn interface(&self) -> Option<&str> {
        match self {
            BindingState::Unbound => None,
            BindingState::InterfaceOnly { interface }
            | BindingState::Candidate { interface, .. }
            | BindingState::Bound { interface, .. } => Some(interface),
        }
    }
}

/// The raw whitespace-split tokens of the `interfaces` setting
///
/// Empty when the setting (or the whole [global] section) is absent. By
/// convention the first token names the interface and the optional second
/// token is an IPv4 address.
pub fn read_binding_tokens(conf_data: &str) -> Vec<String> {
    match section::read_setting("global", INTERFACES_KEY, conf_data) {
        Ok(value) => value.split_whitespace().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

/// Classify the configured tokens against live OS state
///
/// `known_interfaces` is the non-loopback interface list;
/// `interface_addresses` holds the IPv4 addresses of the interface named by
/// the first token (empty when that interface is unknown).
///
/// The grading is deliberate: zero tokens mean no binding, more than two mean
/// an ambiguous setting treated as absent, one token is an interface-only
/// binding if the interface exists, and two tokens walk through interface
/// existence, address syntax and address assignment, degrading one step at
/// each failed check.
pub fn classify(
    tokens: &[String],
    known_interfaces: &[String],
    interface_addresses: &[Ipv4Addr],
) -> BindingState {
    match tokens {
        [] => BindingState::Unbound,
        [interface] => {
            if known_interfaces.iter().any(|name| name == interface) {
                BindingState::InterfaceOnly { interface: interface.clone() }
            } else {
                warn!("Configured interface '{}' does not exist", interface);
                BindingState::Unbound
            }
        }
        [interface, ip] => {
            if !known_interfaces.iter().any(|name| name == interface) {
                warn!("Configured interface '{}' does not exist", interface);
                return BindingState::Unbound;
            }
            let ip = match ip.parse::<Ipv4Addr>() {
                Ok(ip) => ip,
                Err(_) => {
                    warn!("Configured address '{}' is not a valid IPv4 address", ip);
                    return BindingState::InterfaceOnly { interface: interface.clone() };
                }
            };
            if interface_addresses.contains(&ip) {
                BindingState::Bound { interface: interface.clone(), ip }
            } else {
                BindingState::Candidate { interface: interface.clone(), ip }
            }
        }
        _ => {
            warn!("Ambiguous 'interfaces' setting with {} tokens, treating as unbound", tokens.len());
            BindingState::Unbound
        }
    }
}

/// Persist a full binding, or erase the pair when either half is absent
pub fn persist(
    interface: Option<&str>,
    ip: Option<Ipv4Addr>,
    conf_data: &str,
) -> Ps2NetResult<String> {
    match (interface, ip) {
        (Some(interface), Some(ip)) => {
            let conf = section::upsert_setting(
                "global",
                INTERFACES_KEY,
                &format!("{} {}", interface, ip),
                conf_data,
            )?;
            section::upsert_setting("global", BIND_ONLY_KEY, "yes", &conf)
        }
        _ => {
            let conf = section::remove_setting("global", INTERFACES_KEY, conf_data)?;
            section::remove_setting("global", BIND_ONLY_KEY, &conf)
        }
    }
}
