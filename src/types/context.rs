//! Harvested code context.

use sha2::{Digest, Sha256};

use super::Fingerprint;

/// One harvested file, content already truncated to the per-file cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    /// `/`-separated path relative to the repository root
    pub path: String,
    pub content: String,
    pub truncated: bool,
}

/// Ordered, size-bounded summary of a repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeContext {
    pub files: Vec<ContextFile>,
    /// Eligible files left out because the total cap was reached
    pub omitted: usize,
}

impl CodeContext {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.content.len()).sum()
    }

    /// Text embedded in the analysis prompt
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.total_bytes() + self.files.len() * 32);
        out.push_str("Repository files:\n");
        for file in &self.files {
            out.push_str("- ");
            out.push_str(&file.path);
            out.push('\n');
        }
        for file in &self.files {
            out.push_str("\n=== ");
            out.push_str(&file.path);
            out.push_str(" ===\n");
            out.push_str(&file.content);
            if file.truncated {
                out.push_str("\n[... truncated]");
            }
            out.push('\n');
        }
        if self.omitted > 0 {
            out.push_str(&format!(
                "\n[{} more files omitted to stay within the context limit]\n",
                self.omitted
            ));
        }
        out
    }

    /// SHA-256 of the rendered context; the cache key for architecture and images
    pub fn fingerprint(&self) -> Fingerprint {
        let digest = Sha256::digest(self.render().as_bytes());
        Fingerprint::new(format!("{:x}", digest))
    }

    /// Fingerprint with `path` left out. The pipeline rewrites the README, so
    /// hashing it would invalidate the cache on every run.
    pub fn fingerprint_without(&self, path: &str) -> Fingerprint {
        let kept = CodeContext {
            files: self.files.iter().filter(|f| f.path != path).cloned().collect(),
            omitted: self.omitted,
        };
        kept.fingerprint()
    }
}
