//! Shared folder reconciliation
//!
//! The folder backing the PS2 share must exist, belong to the share user and
//! stay world-writable: the PS2 authenticates as a fixed forced user, so Unix
//! permissions are not the access-control layer here.

use crate::error::{Ps2NetError, Ps2NetResult};
use nix::unistd::{self, AccessFlags, Gid, Uid};
use serde::{Deserialize, Serialize};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Mode applied to the shared folder
const SHARE_FOLDER_MODE: u32 = 0o777;

/// The OS user the share runs as
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareUser {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
}

/// True if the folder exists on disk
pub fn folder_exists(path: &Path) -> bool {
    path.is_dir()
}

/// True if the process can both read and write the folder
pub fn permissions_ok(path: &Path) -> bool {
    unistd::access(path, AccessFlags::R_OK | AccessFlags::W_OK).is_ok()
}

/// Create the shared folder tree and hand it to the share user
///
/// Creating an already-existing tree is not an error; any other filesystem
/// failure propagates.
pub async fn create_folder(path: &Path, user: &ShareUser) -> Ps2NetResult<()> {
    fs::create_dir_all(path).await?;
    apply_ownership_and_mode(path, user).await?;
    info!("Created shared folder {} for user {}", path.display(), user.name);
    Ok(())
}

/// Re-apply ownership and the permissive mode unconditionally
pub async fn fix_permissions(path: &Path, user: &ShareUser) -> Ps2NetResult<()> {
    if !folder_exists(path) {
        return Err(Ps2NetError::ShareFolderNotFound(path.to_path_buf()));
    }
    apply_ownership_and_mode(path, user).await?;
    info!("Fixed permissions on shared folder {}", path.display());
    Ok(())
}

async fn apply_ownership_and_mode(path: &Path, user: &ShareUser) -> Ps2NetResult<()> {
    unistd::chown(path, Some(Uid::from_raw(user.uid)), Some(Gid::from_raw(user.gid)))
        .map_err(|e| Ps2NetError::Io(e.into()))?;
    fs::set_permissions(path, std::fs::Permissions::from_mode(SHARE_FOLDER_MODE)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn current_user() -> ShareUser {
        ShareUser {
            name: "test".to_string(),
            uid: unistd::getuid().as_raw(),
            gid: unistd::getgid().as_raw(),
        }
    }

    #[tokio::test]
    async fn test_create_folder_sets_mode() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("ps2").join("share");

        assert!(!folder_exists(&target));
        create_folder(&target, &current_user()).await.unwrap();
        assert!(folder_exists(&target));
        assert!(permissions_ok(&target));

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o777);
    }

    #[tokio::test]
    async fn test_create_folder_tolerates_existing_tree() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("share");

        create_folder(&target, &current_user()).await.unwrap();
        create_folder(&target, &current_user()).await.unwrap();
        assert!(folder_exists(&target));
    }

    #[tokio::test]
    async fn test_fix_permissions_requires_existing_folder() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");

        let err = fix_permissions(&missing, &current_user()).await.unwrap_err();
        assert!(matches!(err, Ps2NetError::ShareFolderNotFound(_)));
    }

    #[tokio::test]
    async fn test_fix_permissions_reapplies_mode() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("share");
        create_folder(&target, &current_user()).await.unwrap();

        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o700)).unwrap();
        fix_permissions(&target, &current_user()).await.unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o777);
    }
}
