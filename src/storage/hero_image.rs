//! Hero image output file

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::atomic::write_atomic;
use crate::types::{GeneratedImage, ImageFormat, Result};

/// Extensions a previous run may have left behind
const KNOWN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg", "gif"];

/// Write `<dir>/<stem>.<ext>` and remove siblings with other image
/// extensions, so exactly one hero image exists afterwards.
pub async fn write_hero_image(dir: &Path, stem: &str, image: &GeneratedImage) -> Result<PathBuf> {
    let extension = image.format.extension();
    let path = dir.join(format!("{}.{}", stem, extension));
    write_atomic(&path, &image.bytes).await?;

    for stale in KNOWN_EXTENSIONS.iter().filter(|ext| **ext != extension) {
        let sibling = dir.join(format!("{}.{}", stem, stale));
        match fs::remove_file(&sibling).await {
            Ok(()) => debug!(path = %sibling.display(), "Removed stale hero image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    info!(path = %path.display(), bytes = image.bytes.len(), "Hero image written");
    Ok(path)
}

/// Reference path used inside the README: relative and `/`-separated
pub fn image_reference(output_dir: &Path, stem: &str, format: ImageFormat) -> String {
    let dir = output_dir
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    if dir.is_empty() {
        format!("{}.{}", stem, format.extension())
    } else {
        format!("{}/{}.{}", dir, stem, format.extension())
    }
}
