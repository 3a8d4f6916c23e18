//! ps2net - PS2 Samba Share Manager Library
//!
//! Async library for configuring a Samba server so a PlayStation 2 (which
//! only speaks SMBv1/NT1) can browse and use a shared folder on a Linux
//! host:
//! - smb.conf reading, validation and section-level rewriting
//! - [global] repair for PS2 compatibility (NetBIOS name, NT1 floors)
//! - The [PS2SMB] share section and its backing folder on disk
//! - Interface/IP binding reconciled against live OS network state
//! - smbd/nmbd supervision through systemctl
//! - Transfer speed monitoring for the bound interface

pub mod error;
pub mod validation;
pub mod conf;
pub mod section;
pub mod global_conf;
pub mod share_conf;
pub mod share_folder;
pub mod interface;
pub mod binding;
pub mod service;
pub mod manager;
pub mod speed_monitor;

// Re-export commonly used types
pub use error::{Ps2NetError, Ps2NetResult};
pub use conf::{ConfStore, SAMBA_CONF_PATH};
pub use global_conf::DEFAULT_NETBIOS_NAME;
pub use share_conf::SHARE_NAME;
pub use share_folder::ShareUser;
pub use interface::{InterfaceController, Ipv4Info};
pub use binding::BindingState;
pub use service::{ServerState, ServiceController};
pub use manager::SambaManager;
pub use speed_monitor::{NetSpeedMonitor, SpeedEvent};
