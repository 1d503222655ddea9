//! Significant-change heuristic
//!
//! Compares HEAD against a base revision with `git diff --shortstat` and
//! decides whether the change is large enough to suggest regenerating the
//! hero image. Thresholds come from [`ChangesConfig`].

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::config::ChangesConfig;
use crate::types::{ArtistError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub files: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffStat {
    /// Parse `git diff --shortstat` output, e.g.
    /// ` 3 files changed, 10 insertions(+), 2 deletions(-)`.
    /// Empty output means no changes.
    pub fn parse(shortstat: &str) -> Self {
        let mut stat = Self::default();
        for part in shortstat.split(',') {
            let mut words = part.split_whitespace();
            let Some(count) = words.next().and_then(|n| n.parse::<usize>().ok()) else {
                continue;
            };
            match words.next() {
                Some(w) if w.starts_with("file") => stat.files = count,
                Some(w) if w.starts_with("insertion") => stat.insertions = count,
                Some(w) if w.starts_with("deletion") => stat.deletions = count,
                _ => {}
            }
        }
        stat
    }

    pub fn lines(&self) -> usize {
        self.insertions + self.deletions
    }

    /// More files or more lines changed than the configured thresholds
    pub fn is_significant(&self, config: &ChangesConfig) -> bool {
        self.files > config.min_files || self.lines() > config.min_lines
    }
}

impl std::fmt::Display for DiffStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} files changed, {} lines changed", self.files, self.lines())
    }
}

/// Diff HEAD against `base` in the repository at `root`.
///
/// `Ok(None)` when `base` does not resolve (typically a branch without an
/// upstream), so a first push is never reported as significant.
pub async fn diff_stat(root: &Path, base: &str) -> Result<Option<DiffStat>> {
    let resolved = git(root, &["rev-parse", "--verify", "--quiet", base]).await?;
    if resolved.is_none() {
        debug!(base, "Base revision not found");
        return Ok(None);
    }

    let output = git(root, &["diff", "--shortstat", base, "HEAD"])
        .await?
        .ok_or_else(|| ArtistError::Workspace(format!("git diff against {} failed", base)))?;
    let stat = DiffStat::parse(&output);
    debug!(base, files = stat.files, lines = stat.lines(), "Diff stat");
    Ok(Some(stat))
}

/// stdout of a git command, `None` when it exited unsuccessfully
async fn git(root: &Path, args: &[&str]) -> Result<Option<String>> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ArtistError::Workspace(format!("cannot run git: {}", e)))?;
    Ok(output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned()))
}
