//! Error types for ps2net

use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Ps2NetError {
    /// IO error
    Io(io::Error),
    /// Samba configuration file does not exist
    ConfNotFound(PathBuf),
    /// [global] section missing from the configuration file
    GlobalSectionNotFound,
    /// A section tag is missing from the configuration file
    TagNotFound(String),
    /// A setting key is missing inside a section
    SettingNotFound(String),
    /// The same section tag appears more than once
    DuplicateSection(String),
    /// Shared folder does not exist on disk
    ShareFolderNotFound(PathBuf),
    /// Interface not found
    InterfaceNotFound(String),
    /// Invalid parameter
    InvalidParameter(String),
    /// Invalid state
    InvalidState(String),
    /// Command execution failed
    CommandFailed { cmd: String, code: Option<i32>, stderr: String },
    /// smbd/nmbd service command returned a non-zero exit code
    ServiceFailure { code: i32 },
    /// Permission denied
    PermissionDenied(String),
    /// Parse error
    ParseError(String),
}

impl fmt::Display for Ps2NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ps2NetError::Io(e) => write!(f, "IO error: {}", e),
            Ps2NetError::ConfNotFound(path) => {
                write!(f, "Samba configuration file not found: {}", path.display())
            }
            Ps2NetError::GlobalSectionNotFound => {
                write!(f, "[global] section not found in the Samba configuration file")
            }
            Ps2NetError::TagNotFound(tag) => {
                write!(f, "Section [{}] not found in the Samba configuration file", tag)
            }
            Ps2NetError::SettingNotFound(setting) => {
                write!(f, "Setting '{}' not found in the Samba configuration file", setting)
            }
            Ps2NetError::DuplicateSection(tag) => {
                write!(f, "Section [{}] appears more than once in the Samba configuration file", tag)
            }
            Ps2NetError::ShareFolderNotFound(path) => {
                write!(f, "Shared folder not found: {}", path.display())
            }
            Ps2NetError::InterfaceNotFound(name) => write!(f, "Interface not found: {}", name),
            Ps2NetError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Ps2NetError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Ps2NetError::CommandFailed { cmd, code, stderr } => {
                if let Some(code) = code {
                    write!(f, "Command '{}' failed with code {}: {}", cmd, code, stderr)
                } else {
                    write!(f, "Command '{}' failed: {}", cmd, stderr)
                }
            }
            Ps2NetError::ServiceFailure { code } => {
                write!(f, "smbd/nmbd service command failed with exit code {}", code)
            }
            Ps2NetError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            Ps2NetError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for Ps2NetError {}

impl From<io::Error> for Ps2NetError {
    fn from(error: io::Error) -> Self {
        Ps2NetError::Io(error)
    }
}

impl From<serde_json::Error> for Ps2NetError {
    fn from(error: serde_json::Error) -> Self {
        Ps2NetError::ParseError(error.to_string())
    }
}

pub type Ps2NetResult<T> = Result<T, Ps2NetError>;
