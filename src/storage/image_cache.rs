//! Generated image cache
//!
//! Images are keyed by repository fingerprint and prompt digest, so a rerun
//! on an unchanged repository with an unchanged prompt skips generation.
//! Each image has a JSON sidecar recording its provenance.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use super::atomic::write_atomic;
use crate::config::Config;
use crate::types::{ArtistError, Fingerprint, GeneratedImage, ImageFormat, Result, Tier};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ImageMeta {
    format: ImageFormat,
    tier: Tier,
    provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_repo(root: &Path, config: &Config) -> Self {
        Self::new(root.join(&config.cache.image_dir))
    }

    fn key(fingerprint: &Fingerprint, prompt_digest: &str) -> String {
        let digest: String = prompt_digest.chars().take(16).collect();
        format!("{}_{}", fingerprint.short(), digest)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub async fn load(&self, fingerprint: &Fingerprint, prompt_digest: &str) -> Option<GeneratedImage> {
        let key = Self::key(fingerprint, prompt_digest);
        let meta_path = self.meta_path(&key);

        let meta: ImageMeta = match fs::read_to_string(&meta_path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("{}", ArtistError::cache_corruption(&meta_path, e));
                    return None;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("{}", ArtistError::cache_corruption(&meta_path, e));
                return None;
            }
        };

        let image_path = self.dir.join(format!("{}.{}", key, meta.format.extension()));
        let bytes = match fs::read(&image_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{}", ArtistError::cache_corruption(&image_path, e));
                return None;
            }
        };
        if ImageFormat::sniff(&bytes) != Some(meta.format) {
            warn!(
                "{}",
                ArtistError::cache_corruption(&image_path, "content does not match recorded format")
            );
            return None;
        }

        debug!(key = %key, tier = %meta.tier, "Image cache hit");
        let image = GeneratedImage::new(bytes, meta.format, meta.tier, &meta.provider);
        Some(match meta.url {
            Some(url) => image.with_url(url),
            None => image,
        })
    }

    /// Store the image first, then its sidecar, so a sidecar always points
    /// at a complete file.
    pub async fn save(
        &self,
        fingerprint: &Fingerprint,
        prompt_digest: &str,
        image: &GeneratedImage,
    ) -> Result<()> {
        let key = Self::key(fingerprint, prompt_digest);
        let image_path = self.dir.join(format!("{}.{}", key, image.format.extension()));
        write_atomic(&image_path, &image.bytes).await?;

        let meta = ImageMeta {
            format: image.format,
            tier: image.tier,
            provider: image.provider.clone(),
            url: image.url.clone(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&meta)?;
        write_atomic(&self.meta_path(&key), json.as_bytes()).await
    }
}
