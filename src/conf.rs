//! Samba configuration file store
//!
//! Owns the smb.conf path, its one-time backup, and the read/write cycle
//! every query and mutation goes through

use crate::error::{Ps2NetError, Ps2NetResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default location of the Samba configuration file
pub const SAMBA_CONF_PATH: &str = "/etc/samba/smb.conf";

/// Configuration file store
///
/// Reads strip comment and blank lines, so a document handed to the section
/// codec only ever contains section headers and setting lines. Writes replace
/// the file in full.
#[derive(Debug)]
pub struct ConfStore {
    conf_path: PathBuf,
    backup_path: PathBuf,
}

impl ConfStore {
    /// Open a store for the given configuration file
    ///
    /// Fails with `ConfNotFound` if the file does not exist. The check runs
    /// here once, not on every read.
    pub fn new(conf_path: impl Into<PathBuf>) -> Ps2NetResult<Self> {
        let conf_path = conf_path.into();

        if !conf_path.exists() {
            return Err(Ps2NetError::ConfNotFound(conf_path));
        }

        let mut backup_name = conf_path.as_os_str().to_os_string();
        backup_name.push(".bak");

        Ok(Self {
            backup_path: PathBuf::from(backup_name),
            conf_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.conf_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Read the configuration file, dropping comment and blank lines
    ///
    /// Rejects documents that declare the same section tag twice: substring
    /// matching in the section codec would silently operate on the first
    /// occurrence.
    pub async fn read(&self) -> Ps2NetResult<String> {
        let raw = fs::read_to_string(&self.conf_path).await?;

        let mut conf_data = String::with_capacity(raw.len());
        for line in raw.lines() {
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            conf_data.push_str(line);
            conf_data.push('\n');
        }

        Self::check_duplicate_sections(&conf_data)?;

        debug!("Read {} bytes of settings from {}", conf_data.len(), self.conf_path.display());
        Ok(conf_data)
    }

    /// Overwrite the configuration file with the given document
    pub async fn write(&self, conf_data: &str) -> Ps2NetResult<()> {
        fs::write(&self.conf_path, conf_data).await?;
        debug!("Wrote {} bytes to {}", conf_data.len(), self.conf_path.display());
        Ok(())
    }

    /// Copy the configuration file to its `.bak` sibling, once
    ///
    /// The backup preserves the pristine pre-tool state and is never
    /// overwritten. Returns true if the copy was made on this call.
    pub async fn backup_once(&self) -> Ps2NetResult<bool> {
        if fs::metadata(&self.backup_path).await.is_ok() {
            debug!("Backup {} already exists, keeping it", self.backup_path.display());
            return Ok(false);
        }

        fs::copy(&self.conf_path, &self.backup_path).await?;
        info!("Backed up {} to {}", self.conf_path.display(), self.backup_path.display());
        Ok(true)
    }

    fn check_duplicate_sections(conf_data: &str) -> Ps2NetResult<()> {
        let mut seen = HashSet::new();

        for line in conf_data.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let tag = trimmed[1..trimmed.len() - 1].to_string();
                if !seen.insert(tag.clone()) {
                    return Err(Ps2NetError::DuplicateSection(tag));
                }
            }
        }

        Ok(())
    }
}
