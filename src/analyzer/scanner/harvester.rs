use ignore::WalkBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::artistignore::load_artistignore;
use crate::config::HarvestConfig;
use crate::constants::harvest;
use crate::types::{CodeContext, ContextFile, Result};

/// Walks a repository and produces a bounded [`CodeContext`].
pub struct Harvester {
    root: PathBuf,
    ignore_dirs: Arc<HashSet<String>>,
    extensions: HashSet<String>,
    important_files: HashSet<String>,
    exclude: Vec<glob::Pattern>,
    max_depth: usize,
    max_file_bytes: usize,
    max_total_bytes: usize,
    respect_gitignore: bool,
}

impl Harvester {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ignore_dirs: Arc::new(to_set(harvest::DEFAULT_IGNORE_DIRS.iter().copied())),
            extensions: to_set(harvest::DEFAULT_EXTENSIONS.iter().copied()),
            important_files: to_set(harvest::IMPORTANT_FILES.iter().copied()),
            exclude: Vec::new(),
            max_depth: harvest::MAX_DEPTH,
            max_file_bytes: harvest::MAX_FILE_BYTES,
            max_total_bytes: harvest::MAX_TOTAL_BYTES,
            respect_gitignore: true,
        }
    }

    /// Harvester for `root` with configured limits plus the repository's `.artistignore`
    pub fn from_config<P: AsRef<Path>>(root: P, config: &HarvestConfig) -> Self {
        let mut ignore_dirs = config.ignore_dirs.clone();
        ignore_dirs.extend(load_artistignore(root.as_ref()));

        Self::new(root)
            .with_ignore_dirs(ignore_dirs)
            .with_extensions(config.extensions.clone())
            .with_important_files(config.important_files.clone())
            .with_exclude(config.exclude.clone())
            .with_max_depth(config.max_depth)
            .with_byte_caps(config.max_file_bytes, config.max_total_bytes)
            .with_gitignore(config.respect_gitignore)
    }

    pub fn with_ignore_dirs(mut self, dirs: Vec<String>) -> Self {
        self.ignore_dirs = Arc::new(dirs.into_iter().collect());
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_important_files(mut self, names: Vec<String>) -> Self {
        self.important_files = names.into_iter().collect();
        self
    }

    /// Glob patterns matched against `/`-separated relative paths
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Ignoring invalid exclude pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_byte_caps(mut self, per_file: usize, total: usize) -> Self {
        self.max_file_bytes = per_file;
        self.max_total_bytes = total;
        self
    }

    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Walk the tree and read eligible files.
    ///
    /// Only a missing or unreadable root is an error; unreadable files are
    /// skipped with a warning.
    pub fn harvest(&self) -> Result<CodeContext> {
        let metadata = std::fs::metadata(&self.root)?;
        if !metadata.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("{} is not a directory", self.root.display()),
            )
            .into());
        }
        std::fs::read_dir(&self.root)?;

        let candidates = self.candidates();
        debug!(
            root = %self.root.display(),
            candidates = candidates.len(),
            "Harvesting repository"
        );

        let mut context = CodeContext::default();
        let mut total = 0usize;

        for (relative, path) in candidates {
            let (content, truncated) = match read_prefix(&path, self.max_file_bytes) {
                Ok(Some(read)) => read,
                Ok(None) => {
                    debug!(path = %relative, "Skipping binary file");
                    continue;
                }
                Err(e) => {
                    warn!(path = %relative, error = %e, "Skipping unreadable file");
                    continue;
                }
            };

            if total + content.len() > self.max_total_bytes {
                context.omitted += 1;
                continue;
            }
            total += content.len();
            context.files.push(ContextFile {
                path: relative,
                content,
                truncated,
            });
        }

        if context.omitted > 0 {
            debug!(
                omitted = context.omitted,
                "Context cap reached, some files left out"
            );
        }
        Ok(context)
    }

    /// Eligible files as (relative path, absolute path), sorted by relative path
    fn candidates(&self) -> Vec<(String, PathBuf)> {
        let ignore_dirs = Arc::clone(&self.ignore_dirs);
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .git_global(false)
            .require_git(false)
            .follow_links(false)
            .max_depth(Some(self.max_depth + 1))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                entry.depth() == 0
                    || !is_dir
                    || !ignore_dirs.contains(entry.file_name().to_string_lossy().as_ref())
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(relative) = relative_path(&self.root, path) else {
                continue;
            };
            if !self.is_eligible(path) || self.is_excluded(&relative) {
                continue;
            }
            files.push((relative, path.to_path_buf()));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    fn is_eligible(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if self.important_files.contains(name.as_ref()) {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(relative))
    }
}

fn to_set<'a>(items: impl Iterator<Item = &'a str>) -> HashSet<String> {
    items.map(String::from).collect()
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Read at most `cap` bytes as UTF-8 text, cutting at a character boundary.
///
/// Returns `None` for files that look binary (contain NUL bytes).
fn read_prefix(path: &Path, cap: usize) -> std::io::Result<Option<(String, bool)>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(cap.min(64 * 1024) + 1);
    file.take(cap as u64 + 1).read_to_end(&mut buf)?;

    let truncated = buf.len() > cap;
    buf.truncate(cap);

    if buf.contains(&0) {
        return Ok(None);
    }

    let text = match String::from_utf8(buf) {
        Ok(text) => text,
        Err(e) => {
            let utf8 = e.utf8_error();
            let mut bytes = e.into_bytes();
            if utf8.error_len().is_none() {
                // Only the cut split a multi-byte character
                bytes.truncate(utf8.valid_up_to());
                String::from_utf8_lossy(&bytes).into_owned()
            } else {
                String::from_utf8_lossy(&bytes).into_owned()
            }
        }
    };

    Ok(Some((text, truncated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn paths(ctx: &CodeContext) -> Vec<&str> {
        ctx.files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_skips_ignored_dirs_at_any_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "app.py", "print('hi')");
        write(root, "node_modules/lib/index.js", "x");
        write(root, "src/node_modules/inner.js", "x");
        write(root, "src/server.js", "listen()");

        let ctx = Harvester::new(root).harvest().unwrap();
        assert_eq!(paths(&ctx), vec!["app.py", "src/server.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "src/main.rs", "fn main() {}");
        write(root, "src/secret.rs", "const KEY: &str = \"x\";");
        write(root, "Cargo.toml", "[package]");
        let locked = root.join("src/secret.rs");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = Harvester::new(root).harvest();
        // Root ignores permission bits, so only check the skip when the lock holds
        let still_readable = File::open(&locked).is_ok();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        let ctx = result.unwrap();
        if still_readable {
            assert_eq!(paths(&ctx), vec!["Cargo.toml", "src/main.rs", "src/secret.rs"]);
        } else {
            assert_eq!(paths(&ctx), vec!["Cargo.toml", "src/main.rs"]);
        }
    }

    #[test]
    fn test_ignore_match_is_exact_and_case_sensitive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "Build/main.go", "package main");
        write(root, "builder/main.go", "package main");
        write(root, "build/main.go", "package main");

        let ctx = Harvester::new(root).harvest().unwrap();
        assert_eq!(paths(&ctx), vec!["Build/main.go", "builder/main.go"]);
    }

    #[test]
    fn test_depth_limit() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "a/b/c/keep.rs", "fn keep() {}");
        write(root, "a/b/c/d/drop.rs", "fn drop() {}");

        let ctx = Harvester::new(root).with_max_depth(3).harvest().unwrap();
        assert_eq!(paths(&ctx), vec!["a/b/c/keep.rs"]);

        let ctx = Harvester::new(root).with_max_depth(0).harvest().unwrap();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_extension_filter_and_important_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "Dockerfile", "FROM rust");
        write(root, "Makefile", "all:");
        write(root, "logo.png", "not really a png");
        write(root, "NOTES.MD", "# notes");
        write(root, "main.c", "int main() {}");

        let ctx = Harvester::new(root).harvest().unwrap();
        assert_eq!(paths(&ctx), vec!["Dockerfile", "Makefile", "NOTES.MD"]);
    }

    #[test]
    fn test_truncates_at_char_boundary() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        // 3 bytes per char, cap of 7 splits the third char
        write(root, "hangul.md", "한글한글");

        let ctx = Harvester::new(root).with_byte_caps(7, 1024).harvest().unwrap();
        let file = &ctx.files[0];
        assert_eq!(file.content, "한글");
        assert!(file.truncated);
    }

    #[test]
    fn test_total_cap_counts_omissions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "a.py", &"a".repeat(40));
        write(root, "b.py", &"b".repeat(40));
        write(root, "c.py", &"c".repeat(40));

        let ctx = Harvester::new(root).with_byte_caps(100, 90).harvest().unwrap();
        assert_eq!(paths(&ctx), vec!["a.py", "b.py"]);
        assert_eq!(ctx.omitted, 1);
        assert!(ctx.total_bytes() <= 90);
    }

    #[test]
    fn test_exclude_globs_and_artistignore() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, ".artistignore", "# local\nfixtures\n");
        write(root, "fixtures/data.json", "{}");
        write(root, "docs/guide.md", "guide");
        write(root, "src/lib.rs", "pub fn f() {}");

        let config = HarvestConfig {
            exclude: vec!["docs/**".to_string()],
            ..Default::default()
        };
        let ctx = Harvester::from_config(root, &config).harvest().unwrap();
        assert_eq!(paths(&ctx), vec!["src/lib.rs"]);
    }

    #[test]
    fn test_binary_files_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("blob.json"), b"{\0\0}").unwrap();
        write(root, "ok.json", "{}");

        let ctx = Harvester::new(root).harvest().unwrap();
        assert_eq!(paths(&ctx), vec!["ok.json"]);
    }

    #[test]
    fn test_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["z.ts", "m/a.ts", "a.ts", "m/z.ts", "B.ts"] {
            write(root, name, name);
        }

        let first = Harvester::new(root).harvest().unwrap();
        let second = Harvester::new(root).harvest().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.render(), second.render());
        assert_eq!(paths(&first), vec!["B.ts", "a.ts", "m/a.ts", "m/z.ts", "z.ts"]);
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let result = Harvester::new(&missing).harvest();
        assert!(matches!(result, Err(crate::types::ArtistError::Io(_))));

        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(Harvester::new(&file).harvest().is_err());
    }
}
