//! Architecture Cache
//!
//! One JSON file holding the last analyzed graph and the repository
//! fingerprint it was derived from. A missing or unreadable file is a cache
//! miss, never an error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use super::atomic::write_atomic;
use crate::config::Config;
use crate::types::{ArchitectureGraph, ArtistError, Fingerprint, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedArchitecture {
    pub fingerprint: Fingerprint,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    pub architecture: ArchitectureGraph,
}

#[derive(Debug, Clone)]
pub struct ArchitectureCache {
    path: PathBuf,
}

impl ArchitectureCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<root>/<output.dir>/<cache.architecture_file>`
    pub fn for_repo(root: &Path, config: &Config) -> Self {
        Self::new(
            root.join(&config.output.dir)
                .join(&config.cache.architecture_file),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached graph if it was derived from `fingerprint`
    pub async fn load(&self, fingerprint: &Fingerprint) -> Option<ArchitectureGraph> {
        let entry = self.load_latest().await?;
        if &entry.fingerprint == fingerprint {
            debug!(fingerprint = fingerprint.short(), "Architecture cache hit");
            Some(entry.architecture)
        } else {
            debug!(
                cached = entry.fingerprint.short(),
                current = fingerprint.short(),
                "Architecture cache stale"
            );
            None
        }
    }

    /// Whatever is cached, regardless of fingerprint
    pub async fn load_latest(&self) -> Option<CachedArchitecture> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("{}", ArtistError::cache_corruption(&self.path, e));
                return None;
            }
        };

        let entry: CachedArchitecture = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("{}", ArtistError::cache_corruption(&self.path, e));
                return None;
            }
        };

        match entry.architecture.normalize() {
            Ok(architecture) => Some(CachedArchitecture {
                architecture,
                ..entry
            }),
            Err(e) => {
                warn!("{}", ArtistError::cache_corruption(&self.path, e));
                None
            }
        }
    }

    pub async fn save(
        &self,
        fingerprint: &Fingerprint,
        model: &str,
        architecture: &ArchitectureGraph,
    ) -> Result<()> {
        let entry = CachedArchitecture {
            fingerprint: fingerprint.clone(),
            model: model.to_string(),
            generated_at: Utc::now(),
            architecture: architecture.clone(),
        };
        let json = serde_json::to_string_pretty(&entry)?;
        write_atomic(&self.path, json.as_bytes()).await?;
        info!(path = %self.path.display(), "Architecture cached");
        Ok(())
    }

    /// Remove the cache file; `Ok(false)` when there was nothing to remove
    pub async fn invalidate(&self) -> Result<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
