use std::path::Path;

use tracing::{debug, warn};

use crate::constants::harvest::IGNORE_FILE;

/// Directory names listed in the repository's `.artistignore`.
///
/// One name per line; blank lines and `#` comments are skipped, and a trailing
/// `/` is tolerated. A missing file yields an empty list.
pub fn load_artistignore<P: AsRef<Path>>(root: P) -> Vec<String> {
    let path = root.as_ref().join(IGNORE_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let names: Vec<String> = parse_artistignore(&content);
    debug!("Loaded {} entries from {}", names.len(), IGNORE_FILE);
    names
}

pub fn parse_artistignore(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_end_matches('/').to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
