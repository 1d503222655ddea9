//! Global Constants
//!
//! Built-in defaults. Everything a user may reasonably want to change is
//! also exposed through [`crate::config::Config`].

/// Repository harvesting
pub mod harvest {
    /// Directories skipped at any depth (exact path-segment match)
    pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
        ".git",
        "node_modules",
        "venv",
        ".venv",
        "__pycache__",
        "assets",
        ".github",
        ".idea",
        "tests",
        "dist",
        "build",
        "coverage",
        ".pytest_cache",
        ".mypy_cache",
        ".tox",
        "eggs",
        "target",
        ".repo-artist",
    ];

    /// Extensions (without dot) whose files are harvested
    pub const DEFAULT_EXTENSIONS: &[&str] = &[
        "py", "js", "ts", "jsx", "tsx", "go", "rs", "java", "rb", "json", "md", "yml", "yaml",
        "toml", "sql", "sh", "dockerfile",
    ];

    /// Well-known build and deployment files harvested regardless of extension
    pub const IMPORTANT_FILES: &[&str] = &[
        "Dockerfile",
        "docker-compose.yml",
        "docker-compose.yaml",
        "Makefile",
        "requirements.txt",
        "package.json",
        "Cargo.toml",
        "go.mod",
        "pom.xml",
        "build.gradle",
    ];

    /// Per-repository ignore list, one directory name per line
    pub const IGNORE_FILE: &str = ".artistignore";

    pub const MAX_DEPTH: usize = 3;

    pub const MAX_FILE_BYTES: usize = 4 * 1024;

    pub const MAX_TOTAL_BYTES: usize = 96 * 1024;
}

/// Architecture analysis
pub mod analysis {
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    /// Attempts before giving up on malformed model output
    pub const MAX_ATTEMPTS: u32 = 3;

    pub const REQUEST_TIMEOUT_SECS: u64 = 120;
}

/// Hero prompt construction
pub mod prompt {
    pub const MAX_COMPONENTS: usize = 7;

    pub const MAX_CONNECTIONS: usize = 7;

    pub const MAX_CHARS: usize = 3_000;

    /// Per-component description budget inside the hero prompt
    pub const MAX_DESCRIPTION_CHARS: usize = 140;

    pub const MAX_SUMMARY_CHARS: usize = 240;
}

/// Image generation chain
pub mod chain {
    pub const PREMIUM_MAX_ATTEMPTS: u8 = 1;

    pub const FREE_MAX_ATTEMPTS: u8 = 2;

    pub const STRUCTURAL_MAX_ATTEMPTS: u8 = 1;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 750;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 8;

    pub const BACKOFF_FACTOR: f32 = 2.0;

    pub const REQUEST_TIMEOUT_SECS: u64 = 120;
}

/// Remote endpoints
pub mod endpoints {
    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

    pub const OLLAMA_API_BASE: &str = "http://localhost:11434";

    pub const POLLINATIONS_URL: &str = "https://image.pollinations.ai/prompt";

    pub const MERMAID_INK_URL: &str = "https://mermaid.ink/img";

    pub const IMAGEN_MODEL: &str = "imagen-3.0-generate-001";

    pub const IMAGEN_LOCATION: &str = "us-central1";
}

/// On-disk layout
pub mod paths {
    pub const OUTPUT_DIR: &str = "assets";

    /// Hero image file stem; the extension follows the produced format
    pub const IMAGE_STEM: &str = "architecture_diagram";

    pub const ARCHITECTURE_FILE: &str = "architecture.json";

    pub const README_FILE: &str = "README.md";

    pub const PROJECT_DIR: &str = ".repo-artist";

    pub const IMAGE_CACHE_DIR: &str = ".repo-artist/cache/images";
}

/// README splicing
pub mod readme {
    /// Only this many leading lines are searched for an existing hero reference
    pub const MARKER_SEARCH_LINES: usize = 40;

    pub const ALT_TEXT: &str = "Architecture";
}

/// Significant-change heuristic
pub mod changes {
    pub const MIN_FILES: usize = 3;

    pub const MIN_LINES: usize = 50;
}
