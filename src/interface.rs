//! Live network interface state
//!
//! Interface enumeration through sysfs, IPv4 address queries through
//! `ip -json`, and address assignment through `ip addr add`

use crate::error::{Ps2NetError, Ps2NetResult};
use crate::validation;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

/// An IPv4 address assigned to an interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Info {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub prefix_len: u8,
}

/// Interface queries and address assignment
#[derive(Debug)]
pub struct InterfaceController {
    sys_net_path: &'static str,
}

impl InterfaceController {
    pub fn new() -> Self {
        Self { sys_net_path: "/sys/class/net" }
    }

    /// List all network interfaces, excluding the loopback
    pub async fn list(&self) -> Ps2NetResult<Vec<String>> {
        let net_path = Path::new(self.sys_net_path);

        if !net_path.exists() {
            return Err(Ps2NetError::InvalidState(
                format!("{} not available", self.sys_net_path)
            ));
        }

        let mut entries = fs::read_dir(net_path).await?;
        let mut interfaces = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if name != "lo" {
                    interfaces.push(name.to_string());
                }
            }
        }

        interfaces.sort();
        Ok(interfaces)
    }

    /// True if a non-loopback interface with this name exists
    pub fn exists(&self, interface: &str) -> bool {
        interface != "lo" && Path::new(self.sys_net_path).join(interface).exists()
    }

    /// The IPv4 addresses assigned to an interface
    pub async fn ipv4_addresses(&self, interface: &str) -> Ps2NetResult<Vec<Ipv4Info>> {
        validation::validate_interface_name(interface)?;

        if !self.exists(interface) {
            return Err(Ps2NetError::InterfaceNotFound(interface.to_string()));
        }

        let cmd_str = format!("ip -json addr show {}", interface);
        let output = Command::new("ip")
            .args(["-json", "addr", "show", interface])
            .output()
            .await
            .map_err(|e| Ps2NetError::CommandFailed {
                cmd: cmd_str,
                code: None,
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Ok(Vec::new());
        }

        let json_str = String::from_utf8(output.stdout)
            .map_err(|e| Ps2NetError::ParseError(format!("Invalid UTF-8 in JSON output: {}", e)))?;
        let json: serde_json::Value = serde_json::from_str(&json_str)?;

        let mut addresses = Vec::new();

        if let Some(arr) = json.as_array() {
            if let Some(iface) = arr.first() {
                if let Some(addr_info) = iface.get("addr_info").and_then(|v| v.as_array()) {
                    for addr in addr_info {
                        let family = addr.get("family").and_then(|v| v.as_str());
                        if family != Some("inet") {
                            continue;
                        }
                        if let (Some(local), Some(prefixlen)) = (
                            addr.get("local").and_then(|v| v.as_str()),
                            addr.get("prefixlen").and_then(|v| v.as_u64()),
                        ) {
                            let address = local.parse::<Ipv4Addr>().map_err(|_| {
                                Ps2NetError::ParseError(format!("Invalid IPv4 address: {}", local))
                            })?;
                            let prefix_len = prefixlen as u8;
                            addresses.push(Ipv4Info {
                                address,
                                netmask: netmask_from_prefix(prefix_len),
                                prefix_len,
                            });
                        }
                    }
                }
            }
        }

        Ok(addresses)
    }

    /// True if the IPv4 address is assigned on the given interface
    pub async fn is_ipv4_bound(&self, ip: Ipv4Addr, interface: &str) -> Ps2NetResult<bool> {
        let addresses = self.ipv4_addresses(interface).await?;
        Ok(addresses.iter().any(|info| info.address == ip))
    }

    /// Assign a new IPv4 address to an interface
    pub async fn add_ipv4(&self, interface: &str, ip: Ipv4Addr, prefix_len: u8) -> Ps2NetResult<()> {
        validation::validate_interface_name(interface)?;
        validation::validate_ipv4_prefix_len(prefix_len)?;

        if !self.exists(interface) {
            return Err(Ps2NetError::InterfaceNotFound(interface.to_string()));
        }

        let addr = format!("{}/{}", ip, prefix_len);
        self.run_ip(&["addr", "add", &addr, "dev", interface]).await
    }

    async fn run_ip(&self, args: &[&str]) -> Ps2NetResult<()> {
        let cmd_str = format!("ip {}", args.join(" "));
        let output = Command::new("ip")
            .args(args)
            .output()
            .await
            .map_err(|e| Ps2NetError::CommandFailed {
                cmd: cmd_str.clone(),
                code: None,
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8(output.stderr)
                .unwrap_or_else(|e| String::from_utf8_lossy(&e.into_bytes()).to_string());
            return Err(Ps2NetError::CommandFailed {
                cmd: cmd_str,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(())
    }
}

impl Default for InterfaceController {
    fn default() -> Self {
        Self::new()
    }
}

fn netmask_from_prefix(prefix_len: u8) -> Ipv4Addr {
    let bits: u32 = if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len.min(32)))
    };
    Ipv4Addr::from(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netmask_from_prefix() {
        assert_eq!(netmask_from_prefix(24), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(netmask_from_prefix(16), Ipv4Addr::new(255, 255, 0, 0));
        assert_eq!(netmask_from_prefix(32), Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(netmask_from_prefix(0), Ipv4Addr::new(0, 0, 0, 0));
    }

    #[test]
    fn test_loopback_never_exists() {
        let controller = InterfaceController::new();
        assert!(!controller.exists("lo"));
    }

    #[tokio::test]
    async fn test_list_excludes_loopback() {
        let controller = InterfaceController::new();
        // Skip on systems without sysfs networking
        if let Ok(interfaces) = controller.list().await {
            assert!(!interfaces.iter().any(|name| name == "lo"));
        }
    }
}
