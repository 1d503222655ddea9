//! Crash-safe file replacement
//!
//! Writes go to a uniquely named temp file in the destination directory and
//! are renamed over the target, so readers see either the old or the new
//! content, never a partial write.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::types::{ArtistError, Result};

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ArtistError::Config(format!("Invalid output path: {}", path.display())))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple())))
}

/// Atomically replace `path` with `bytes`, creating parent directories.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path)?;
    replace_via(&tmp, path, bytes).await
}

/// Write `tmp` and rename it onto `path`; `tmp` is removed if either step fails
async fn replace_via(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let result = match fs::write(tmp, bytes).await {
        Ok(()) => fs::rename(tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        let _ = fs::remove_file(tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_and_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/file.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_failed_write_removes_temp_file() {
        let dev_full = Path::new("/dev/full");
        if !dev_full.exists() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("architecture.json");
        // Writes through this link fail with ENOSPC after the temp entry exists
        let tmp = temp_dir.path().join(".architecture.json.x.tmp");
        std::os::unix::fs::symlink(dev_full, &tmp).unwrap();

        assert!(replace_via(&tmp, &target, b"payload").await.is_err());
        assert!(std::fs::symlink_metadata(&tmp).is_err());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("missing-dir/architecture.json");
        let tmp = temp_dir.path().join(".architecture.json.y.tmp");

        assert!(replace_via(&tmp, &target, b"payload").await.is_err());
        assert!(!tmp.exists());
    }

    #[test]
    fn test_temp_names_are_unique_siblings() {
        let a = temp_path(Path::new("/repo/assets/architecture.json")).unwrap();
        let b = temp_path(Path::new("/repo/assets/architecture.json")).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/repo/assets")));
    }
}
