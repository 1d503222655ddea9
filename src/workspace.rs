//! Isolated temporary workspaces
//!
//! Each preview run clones into its own uuid-named directory so concurrent
//! runs never share files. The directory is removed when the [`Workspace`]
//! is dropped.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{ArtistError, Result};

/// Branches tried, in order, when the caller names none
const DEFAULT_BRANCHES: &[&str] = &["main", "master"];

#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// New empty workspace under the system temp directory
    pub fn create() -> Result<Self> {
        Self::create_in(&std::env::temp_dir())
    }

    pub fn create_in(base: &Path) -> Result<Self> {
        let path = base.join(format!("repo-artist-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path).map_err(|e| {
            ArtistError::Workspace(format!("cannot create {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Workspace created");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shallow-clone `url` into `<workspace>/repo` and return that path.
    ///
    /// Without an explicit branch, `main` then `master` are tried, then the
    /// remote's default branch.
    pub async fn clone_repo(&self, url: &str, branch: Option<&str>) -> Result<PathBuf> {
        validate_clone_url(url)?;
        let dest = self.path.join("repo");

        let attempts: Vec<Option<&str>> = match branch {
            Some(b) => vec![Some(b)],
            None => DEFAULT_BRANCHES
                .iter()
                .map(|b| Some(*b))
                .chain(std::iter::once(None))
                .collect(),
        };

        let mut last_error = String::new();
        for candidate in attempts {
            match git_clone(url, candidate, &dest).await {
                Ok(()) => {
                    info!(url, branch = candidate.unwrap_or("default"), "Repository cloned");
                    return Ok(dest);
                }
                Err(message) => {
                    debug!(branch = candidate.unwrap_or("default"), %message, "Clone attempt failed");
                    last_error = message;
                    if dest.exists() {
                        let _ = tokio::fs::remove_dir_all(&dest).await;
                    }
                }
            }
        }

        Err(ArtistError::Workspace(format!(
            "failed to clone {}: {}",
            url,
            last_error.trim()
        )))
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), "Failed to remove workspace: {}", e);
        }
    }
}

async fn git_clone(url: &str, branch: Option<&str>, dest: &Path) -> std::result::Result<(), String> {
    let mut cmd = Command::new("git");
    cmd.args(["clone", "--depth", "1", "--quiet"]);
    if let Some(branch) = branch {
        cmd.args(["--branch", branch]);
    }
    cmd.arg("--")
        .arg(url)
        .arg(dest)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("cannot run git: {}", e))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).into_owned())
    }
}

/// Accept http(s), ssh, git and file URLs plus scp-style `user@host:path`.
/// Anything that could be read as a git option is refused.
pub fn validate_clone_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() || url.starts_with('-') || url.chars().any(char::is_whitespace) {
        return Err(ArtistError::Workspace(format!("invalid repository URL: {:?}", url)));
    }

    if let Ok(parsed) = url::Url::parse(url) {
        return match parsed.scheme() {
            "https" | "http" | "ssh" | "git" | "file" => Ok(()),
            other => Err(ArtistError::Workspace(format!(
                "unsupported URL scheme '{}' in {}",
                other, url
            ))),
        };
    }

    // scp-like syntax: git@github.com:owner/repo.git
    match url.split_once(':') {
        Some((host, path)) if host.contains('@') && !host.contains('/') && !path.is_empty() => Ok(()),
        _ => Err(ArtistError::Workspace(format!("invalid repository URL: {}", url))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_workspace_removed_on_drop() {
        let base = TempDir::new().unwrap();
        let path = {
            let ws = Workspace::create_in(base.path()).unwrap();
            std::fs::write(ws.path().join("file.txt"), "x").unwrap();
            assert!(ws.path().exists());
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_workspaces_are_isolated() {
        let base = TempDir::new().unwrap();
        let a = Workspace::create_in(base.path()).unwrap();
        let b = Workspace::create_in(base.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_validate_clone_url() {
        assert!(validate_clone_url("https://github.com/owner/repo").is_ok());
        assert!(validate_clone_url("git@github.com:owner/repo.git").is_ok());
        assert!(validate_clone_url("file:///tmp/repo").is_ok());

        assert!(validate_clone_url("--upload-pack=touch /tmp/x").is_err());
        assert!(validate_clone_url("ftp://example.com/repo").is_err());
        assert!(validate_clone_url("").is_err());
        assert!(validate_clone_url("not a url").is_err());
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn git(dir: &Path, args: &[&str]) -> bool {
        std::process::Command::new("git")
            .args(["-c", "user.name=test", "-c", "user.email=test@example.com", "-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[tokio::test]
    async fn test_clone_falls_back_to_master() {
        if !git_available() {
            return;
        }
        let origin = TempDir::new().unwrap();
        std::fs::write(origin.path().join("README.md"), "# Origin\n").unwrap();
        assert!(git(origin.path(), &["init", "--quiet"]));
        assert!(git(origin.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]));
        assert!(git(origin.path(), &["add", "."]));
        assert!(git(origin.path(), &["commit", "--quiet", "-m", "init"]));

        let base = TempDir::new().unwrap();
        let ws = Workspace::create_in(base.path()).unwrap();
        let url = format!("file://{}", origin.path().display());
        let repo = ws.clone_repo(&url, None).await.unwrap();

        assert!(repo.join("README.md").exists());
    }

    #[tokio::test]
    async fn test_clone_missing_branch_fails() {
        if !git_available() {
            return;
        }
        let base = TempDir::new().unwrap();
        let ws = Workspace::create_in(base.path()).unwrap();
        let missing = format!("file://{}", base.path().join("nowhere").display());
        let err = ws.clone_repo(&missing, Some("main")).await.unwrap_err();
        assert!(matches!(err, ArtistError::Workspace(_)));
    }
}
