//! The Samba manager facade
//!
//! One `SambaManager` owns the configuration store, the live-state
//! controllers and the single-value caches, and exposes the operations the
//! GUI/CLI layer drives. The manager is not synchronized: callers treat an
//! instance as exclusively owned by one control flow at a time, and every
//! operation reads the configuration fresh before mutating it.

use crate::binding::{self, BindingState};
use crate::conf::{ConfStore, SAMBA_CONF_PATH};
use crate::error::{Ps2NetError, Ps2NetResult};
use crate::global_conf;
use crate::interface::{InterfaceController, Ipv4Info};
use crate::section;
use crate::service::{ServerState, ServiceController};
use crate::share_conf::{self, SHARE_NAME};
use crate::share_folder::{self, ShareUser};
use crate::validation;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct SambaManager {
    store: ConfStore,
    netif: InterfaceController,
    service: ServiceController,
    netbios_name: Option<String>,
    share_path: Option<PathBuf>,
    bound: Option<(String, Ipv4Addr)>,
}

impl SambaManager {
    /// Open a manager over the given smb.conf; fails if the file is missing
    pub fn new(conf_path: impl Into<PathBuf>) -> Ps2NetResult<Self> {
        Ok(Self {
            store: ConfStore::new(conf_path)?,
            netif: InterfaceController::new(),
            service: ServiceController::new(),
            netbios_name: None,
            share_path: None,
            bound: None,
        })
    }

    /// Open a manager over the system smb.conf
    pub fn open_system() -> Ps2NetResult<Self> {
        Self::new(SAMBA_CONF_PATH)
    }

    pub fn conf_path(&self) -> &Path {
        self.store.path()
    }

    pub fn share_name(&self) -> &'static str {
        SHARE_NAME
    }

    /// Drop every cached value; the next query re-reads the configuration
    pub fn reload(&mut self) {
        self.netbios_name = None;
        self.share_path = None;
        self.bound = None;
    }

    // === [global] section ===

    /// True if the three PS2-required global settings are all in place
    pub async fn check_global_conf(&self) -> Ps2NetResult<bool> {
        let conf = self.store.read().await?;
        global_conf::validate(&conf)
    }

    /// Back up the configuration (once) and rewrite [global] for the PS2
    pub async fn fix_global_conf(&mut self) -> Ps2NetResult<()> {
        self.store.backup_once().await?;

        let conf = self.store.read().await?;
        let repaired = global_conf::repair(&conf)?;
        self.store.write(&repaired).await?;

        self.netbios_name = Some(section::read_setting("global", "netbios name", &repaired)?);
        info!("Global Samba settings rewritten for PS2 compatibility");
        Ok(())
    }

    /// The NetBIOS name the server advertises, read once and cached
    pub async fn netbios_name(&mut self) -> Ps2NetResult<String> {
        if let Some(name) = &self.netbios_name {
            return Ok(name.clone());
        }

        let conf = self.store.read().await?;
        let name = section::read_setting("global", "netbios name", &conf)?;
        self.netbios_name = Some(name.clone());
        Ok(name)
    }

    /// Persist a new NetBIOS name and restart a running server to pick it up
    pub async fn set_netbios_name(&mut self, name: &str) -> Ps2NetResult<()> {
        validation::validate_netbios_name(name)?;

        if let Ok(current) = self.netbios_name().await {
            if current == name {
                return Err(Ps2NetError::InvalidParameter(
                    format!("NetBIOS name is already '{}'", name)
                ));
            }
        }

        let conf = self.store.read().await?;
        let updated = section::upsert_setting("global", "netbios name", name, &conf)?;
        self.store.write(&updated).await?;
        self.netbios_name = Some(name.to_string());
        info!("NetBIOS name set to '{}'", name);

        self.restart_if_active().await
    }

    // === Share section ===

    /// Check the PS2 share section against the canonical block
    pub async fn check_share_conf(&self, user: &ShareUser) -> Ps2NetResult<()> {
        let conf = self.store.read().await?;
        share_conf::validate(&conf, &user.name)
    }

    /// Create the PS2 share section, or reset an existing one to the defaults
    pub async fn create_default_share_conf(&mut self, user: &ShareUser) -> Ps2NetResult<()> {
        let conf = self.store.read().await?;
        let updated = share_conf::create_or_replace(&conf, &user.name)?;
        self.store.write(&updated).await?;

        self.share_path = Some(share_conf::default_share_path(&user.name));
        info!("PS2 share section [{}] written with default settings", SHARE_NAME);

        self.restart_if_active().await
    }

    /// The folder the share exports, read once and cached
    pub async fn share_folder_path(&mut self) -> Ps2NetResult<PathBuf> {
        if let Some(path) = &self.share_path {
            return Ok(path.clone());
        }

        let conf = self.store.read().await?;
        if !section::section_exists(SHARE_NAME, &conf) {
            return Err(Ps2NetError::TagNotFound(SHARE_NAME.to_string()));
        }
        let path = PathBuf::from(section::read_setting(SHARE_NAME, "path", &conf)?);
        self.share_path = Some(path.clone());
        Ok(path)
    }

    /// Point the share at a different folder
    ///
    /// The folder must already exist; pick or create it first. A running
    /// server is restarted to pick the change up.
    pub async fn set_share_folder_path(&mut self, path: &Path) -> Ps2NetResult<()> {
        if path.as_os_str().is_empty() {
            return Err(Ps2NetError::InvalidParameter(
                "Shared folder path cannot be empty".to_string()
            ));
        }
        validation::validate_setting_value(&path.display().to_string())?;
        if !share_folder::folder_exists(path) {
            return Err(Ps2NetError::ShareFolderNotFound(path.to_path_buf()));
        }

        let conf = self.store.read().await?;
        let updated = section::upsert_setting(
            SHARE_NAME,
            "path",
            &path.display().to_string(),
            &conf,
        )?;
        self.store.write(&updated).await?;
        self.share_path = Some(path.to_path_buf());
        info!("Shared folder path set to {}", path.display());

        self.restart_if_active().await
    }

    // === Shared folder on disk ===

    /// True if the shared folder exists and is readable and writable
    pub async fn share_folder_ok(&mut self) -> Ps2NetResult<bool> {
        let path = self.share_folder_path().await?;
        Ok(share_folder::folder_exists(&path) && share_folder::permissions_ok(&path))
    }

    /// Create the shared folder and hand it to the share user
    pub async fn create_share_folder(&mut self, user: &ShareUser) -> Ps2NetResult<()> {
        let path = self.share_folder_path().await?;
        share_folder::create_folder(&path, user).await
    }

    /// Re-apply ownership and mode on the shared folder
    pub async fn fix_share_folder_permissions(&mut self, user: &ShareUser) -> Ps2NetResult<()> {
        let path = self.share_folder_path().await?;
        share_folder::fix_permissions(&path, user).await
    }

    // === Interface binding ===

    pub async fn list_interfaces(&self) -> Ps2NetResult<Vec<String>> {
        self.netif.list().await
    }

    pub async fn ipv4_addresses(&self, interface: &str) -> Ps2NetResult<Vec<Ipv4Info>> {
        self.netif.ipv4_addresses(interface).await
    }

    /// Classify the configured binding against live OS state
    pub async fn binding_state(&mut self) -> Ps2NetResult<BindingState> {
        let conf = self.store.read().await?;
        let tokens = binding::read_binding_tokens(&conf);
        let interfaces = self.netif.list().await?;

        let addresses: Vec<Ipv4Addr> = match tokens.first() {
            Some(name) if interfaces.iter().any(|i| i == name) => self
                .netif
                .ipv4_addresses(name)
                .await?
                .into_iter()
                .map(|info| info.address)
                .collect(),
            _ => Vec::new(),
        };

        let state = binding::classify(&tokens, &interfaces, &addresses);
        self.bound = match &state {
            BindingState::Bound { interface, ip } => Some((interface.clone(), *ip)),
            _ => None,
        };
        Ok(state)
    }

    /// Pin the daemons to an interface and an address assigned on it
    pub async fn set_binding(&mut self, interface: &str, ip: Ipv4Addr) -> Ps2NetResult<()> {
        validation::validate_interface_name(interface)?;

        if !self.netif.exists(interface) {
            return Err(Ps2NetError::InterfaceNotFound(interface.to_string()));
        }
        if !self.netif.is_ipv4_bound(ip, interface).await? {
            return Err(Ps2NetError::InvalidState(format!(
                "Address {} is not assigned on interface {}; assign it first",
                ip, interface
            )));
        }

        let conf = self.store.read().await?;
        let updated = binding::persist(Some(interface), Some(ip), &conf)?;
        self.store.write(&updated).await?;
        self.bound = Some((interface.to_string(), ip));
        info!("Bound SMB daemons to {} on {}", ip, interface);

        self.restart_if_active().await
    }

    /// Remove the binding pair from [global]
    pub async fn erase_binding(&mut self) -> Ps2NetResult<()> {
        let conf = self.store.read().await?;
        let updated = binding::persist(None, None, &conf)?;
        self.store.write(&updated).await?;
        self.bound = None;
        info!("Interface binding erased");

        self.restart_if_active().await
    }

    /// Assign a brand-new IPv4 address on an interface (the auto-bind offer
    /// for a Candidate binding)
    pub async fn assign_address(
        &mut self,
        interface: &str,
        ip: Ipv4Addr,
        prefix_len: u8,
    ) -> Ps2NetResult<()> {
        self.netif.add_ipv4(interface, ip, prefix_len).await?;
        info!("Assigned {}/{} on {}", ip, prefix_len, interface);
        Ok(())
    }

    // === Service control ===

    /// Start smbd and nmbd; refuses to start an unbound server
    pub async fn start_server(&mut self) -> Ps2NetResult<()> {
        self.require_bound().await?;
        self.service.start().await
    }

    pub async fn stop_server(&mut self) -> Ps2NetResult<()> {
        self.service.stop().await
    }

    /// Restart smbd and nmbd; refuses to restart an unbound server
    pub async fn restart_server(&mut self) -> Ps2NetResult<()> {
        self.require_bound().await?;
        self.service.restart().await
    }

    pub fn server_state(&self) -> ServerState {
        self.service.state()
    }

    async fn require_bound(&mut self) -> Ps2NetResult<()> {
        if self.bound.is_some() {
            return Ok(());
        }
        if self.binding_state().await?.is_bound() {
            return Ok(());
        }
        Err(Ps2NetError::InvalidState(
            "No interface and IP binding established; refusing to run the server unbound"
                .to_string(),
        ))
    }

    /// Restart a running server so it picks up a persisted change; an
    /// inactive server gets the new settings on its next start
    async fn restart_if_active(&mut self) -> Ps2NetResult<()> {
        if self.service.state() == ServerState::Active {
            self.service.restart().await?;
        }
        Ok(())
    }
}
