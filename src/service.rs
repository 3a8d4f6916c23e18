//! smbd/nmbd supervision through systemctl
//!
//! Both daemons are driven with a single systemctl invocation per operation.
//! The recorded run state tracks command outcomes only; it is not read back
//! from the service manager, so external changes to the daemons are invisible
//! until the next command here.

use crate::error::{Ps2NetError, Ps2NetResult};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::info;

/// The SMB and NetBIOS daemon units, always handled together
const SAMBA_UNITS: [&str; 2] = ["smbd", "nmbd"];

/// Last known run state of the daemons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    Active,
    #[default]
    Inactive,
    /// A service command failed; the true daemon state is unverified
    Unknown,
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// systemctl wrapper for the Samba daemon pair
#[derive(Debug)]
pub struct ServiceController {
    state: ServerState,
}

impl ServiceController {
    pub fn new() -> Self {
        Self { state: ServerState::Inactive }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub async fn start(&mut self) -> Ps2NetResult<()> {
        self.systemctl("start").await?;
        self.state = ServerState::Active;
        info!("SMB and NetBIOS daemons started");
        Ok(())
    }

    pub async fn stop(&mut self) -> Ps2NetResult<()> {
        self.systemctl("stop").await?;
        self.state = ServerState::Inactive;
        info!("SMB and NetBIOS daemons stopped");
        Ok(())
    }

    pub async fn restart(&mut self) -> Ps2NetResult<()> {
        self.systemctl("restart").await?;
        self.state = ServerState::Active;
        info!("SMB and NetBIOS daemons restarted");
        Ok(())
    }

    /// Run one systemctl verb over both units
    ///
    /// Any failure degrades the recorded state to Unknown: after a failed
    /// command the daemons may be in either state.
    async fn systemctl(&mut self, verb: &str) -> Ps2NetResult<()> {
        let cmd_str = format!("systemctl {} {}", verb, SAMBA_UNITS.join(" "));
        let output = Command::new("systemctl")
            .arg(verb)
            .args(SAMBA_UNITS)
            .output()
            .await
            .map_err(|e| {
                self.state = ServerState::Unknown;
                Ps2NetError::CommandFailed {
                    cmd: cmd_str.clone(),
                    code: None,
                    stderr: e.to_string(),
                }
            })?;

        if !output.status.success() {
            self.state = ServerState::Unknown;
            return Err(Ps2NetError::ServiceFailure {
                code: output.status.code().unwrap_or(-1),
            });
        }

        Ok(())
    }
}

impl Default for ServiceController {
    fn default() -> Self {
        Self::new()
    }
}
