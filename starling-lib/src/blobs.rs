//! Local byte storage for cached artefacts. Object-storage backends are
//! external; this is the disk driver the core uses for its own cache,
//! keyed by the storage paths recorded on emoji and attachments.

use crate::error::Error;
use crate::globals::GLOBALS;
use std::path::PathBuf;

fn disk_path(storage_path: &str) -> PathBuf {
    let base = GLOBALS.settings.read().media_base_dir.clone();
    let mut path = base;
    // Storage paths are generated internally, but never trust them blindly.
    for part in storage_path.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            continue;
        }
        path.push(part);
    }
    path
}

pub async fn put(storage_path: &str, bytes: &[u8]) -> Result<(), Error> {
    let path = disk_path(storage_path);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}

pub async fn get(storage_path: &str) -> Result<Vec<u8>, Error> {
    Ok(tokio::fs::read(disk_path(storage_path)).await?)
}

pub async fn exists(storage_path: &str) -> bool {
    matches!(
        tokio::fs::try_exists(disk_path(storage_path)).await,
        Ok(true)
    )
}

/// Best-effort; missing files are not an error.
pub async fn delete(storage_path: &str) {
    let _ = tokio::fs::remove_file(disk_path(storage_path)).await;
}
