//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (platform config dir) and project (`.repo-artist/`) level
//! configuration; every section is `#[serde(default)]` so partial files work.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{analysis, chain, changes, endpoints, harvest, paths, prompt};
use crate::types::{ArtistError, Result, Tier};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Architecture analysis model
    pub llm: LlmConfig,

    /// Repository walking limits
    pub harvest: HarvestConfig,

    /// Hero prompt construction
    pub prompt: PromptConfig,

    /// Image tiers and their credentials
    pub generation: GenerationConfig,

    /// Where artifacts land
    pub output: OutputConfig,

    pub cache: CacheConfig,

    /// Significant-change heuristic used by `check`
    pub changes: ChangesConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ArtistError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ArtistError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            return Err(ArtistError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_attempts == 0 {
            return Err(ArtistError::Config(
                "llm.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.harvest.max_file_bytes == 0 || self.harvest.max_total_bytes == 0 {
            return Err(ArtistError::Config(
                "harvest byte caps must be greater than 0".to_string(),
            ));
        }

        if self.prompt.max_components == 0
            || self.prompt.max_connections == 0
            || self.prompt.max_chars == 0
        {
            return Err(ArtistError::Config(
                "prompt caps must be greater than 0".to_string(),
            ));
        }

        if self.generation.tiers.is_empty() {
            return Err(ArtistError::Config(
                "generation.tiers must list at least one tier".to_string(),
            ));
        }

        if let Some(pin) = self.generation.pin
            && !self.generation.tiers.contains(&pin)
        {
            return Err(ArtistError::Config(format!(
                "generation.pin = \"{}\" is not in generation.tiers",
                pin
            )));
        }

        let attempts = &self.generation.max_attempts;
        if attempts.premium == 0 || attempts.free == 0 || attempts.structural == 0 {
            return Err(ArtistError::Config(
                "generation.max_attempts values must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Tiers the chain should run, honoring `generation.pin`
    pub fn active_tiers(&self) -> Vec<Tier> {
        match self.generation.pin {
            Some(pin) => vec![pin],
            None => self.generation.tiers.clone(),
        }
    }
}

// =============================================================================
// Hero Style
// =============================================================================

/// Visual template selector for the hero prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeroStyle {
    /// Use the model's style hint, else the default isometric template
    #[default]
    Auto,
    Minimalist,
    Cyberpunk,
    Corporate,
    Sketch,
    Glassmorphism,
}

impl HeroStyle {
    pub const ALL: [HeroStyle; 6] = [
        HeroStyle::Auto,
        HeroStyle::Minimalist,
        HeroStyle::Cyberpunk,
        HeroStyle::Corporate,
        HeroStyle::Sketch,
        HeroStyle::Glassmorphism,
    ];
}

impl std::fmt::Display for HeroStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeroStyle::Auto => write!(f, "auto"),
            HeroStyle::Minimalist => write!(f, "minimalist"),
            HeroStyle::Cyberpunk => write!(f, "cyberpunk"),
            HeroStyle::Corporate => write!(f, "corporate"),
            HeroStyle::Sketch => write!(f, "sketch"),
            HeroStyle::Glassmorphism => write!(f, "glassmorphism"),
        }
    }
}

impl std::str::FromStr for HeroStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(HeroStyle::Auto),
            "minimalist" | "minimal" => Ok(HeroStyle::Minimalist),
            "cyberpunk" => Ok(HeroStyle::Cyberpunk),
            "corporate" => Ok(HeroStyle::Corporate),
            "sketch" => Ok(HeroStyle::Sketch),
            "glassmorphism" | "glass" => Ok(HeroStyle::Glassmorphism),
            _ => Err(format!(
                "Unknown hero style: {}. Valid values: auto, minimalist, cyberpunk, corporate, sketch, glassmorphism",
                s
            )),
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: gemini, openai, ollama
    pub provider: String,

    pub model: String,

    /// Never serialized; filled from config files or provider env vars
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Custom endpoint base URL
    pub api_base: Option<String>,

    pub timeout_secs: u64,

    pub temperature: f32,

    /// Attempts before malformed output is given up on
    pub max_attempts: u32,

    /// Extra guidance appended to every analysis prompt
    pub instructions: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_attempts", &self.max_attempts)
            .field("instructions", &self.instructions)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: analysis::DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base: None,
            timeout_secs: analysis::REQUEST_TIMEOUT_SECS,
            temperature: 0.2,
            max_attempts: analysis::MAX_ATTEMPTS,
            instructions: None,
        }
    }
}

// =============================================================================
// Harvest Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Deepest directory level descended into (root = 0)
    pub max_depth: usize,

    pub max_file_bytes: usize,

    pub max_total_bytes: usize,

    /// Directory names skipped at any depth
    pub ignore_dirs: Vec<String>,

    /// Allow-listed extensions, without the dot
    pub extensions: Vec<String>,

    /// File names harvested regardless of extension
    pub important_files: Vec<String>,

    /// Glob patterns over relative paths
    pub exclude: Vec<String>,

    pub respect_gitignore: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_depth: harvest::MAX_DEPTH,
            max_file_bytes: harvest::MAX_FILE_BYTES,
            max_total_bytes: harvest::MAX_TOTAL_BYTES,
            ignore_dirs: to_strings(harvest::DEFAULT_IGNORE_DIRS),
            extensions: to_strings(harvest::DEFAULT_EXTENSIONS),
            important_files: to_strings(harvest::IMPORTANT_FILES),
            exclude: Vec::new(),
            respect_gitignore: true,
        }
    }
}

// =============================================================================
// Prompt Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub style: HeroStyle,

    pub max_components: usize,

    pub max_connections: usize,

    pub max_chars: usize,

    /// Free-form style variation appended to the template
    pub extra: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            style: HeroStyle::Auto,
            max_components: prompt::MAX_COMPONENTS,
            max_connections: prompt::MAX_CONNECTIONS,
            max_chars: prompt::MAX_CHARS,
            extra: None,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Fallback order
    pub tiers: Vec<Tier>,

    /// Run exactly one tier, no fallback
    pub pin: Option<Tier>,

    /// Per-attempt timeout
    pub timeout_secs: u64,

    pub base_delay_ms: u64,

    pub max_attempts: TierAttempts,

    pub imagen: ImagenConfig,

    pub pollinations: PollinationsConfig,

    pub mermaid: MermaidConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            tiers: Tier::ALL.to_vec(),
            pin: None,
            timeout_secs: chain::REQUEST_TIMEOUT_SECS,
            base_delay_ms: chain::BASE_DELAY_MS,
            max_attempts: TierAttempts::default(),
            imagen: ImagenConfig::default(),
            pollinations: PollinationsConfig::default(),
            mermaid: MermaidConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierAttempts {
    pub premium: u8,
    pub free: u8,
    pub structural: u8,
}

impl TierAttempts {
    pub fn for_tier(&self, tier: Tier) -> u8 {
        match tier {
            Tier::Premium => self.premium,
            Tier::Free => self.free,
            Tier::Structural => self.structural,
        }
    }
}

impl Default for TierAttempts {
    fn default() -> Self {
        Self {
            premium: chain::PREMIUM_MAX_ATTEMPTS,
            free: chain::FREE_MAX_ATTEMPTS,
            structural: chain::STRUCTURAL_MAX_ATTEMPTS,
        }
    }
}

/// Vertex AI Imagen (premium tier)
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagenConfig {
    pub project_id: Option<String>,

    pub location: String,

    pub model: String,

    /// OAuth bearer token; never serialized
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    pub aspect_ratio: String,
}

impl std::fmt::Debug for ImagenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagenConfig")
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("model", &self.model)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("aspect_ratio", &self.aspect_ratio)
            .finish()
    }
}

impl Default for ImagenConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: endpoints::IMAGEN_LOCATION.to_string(),
            model: endpoints::IMAGEN_MODEL.to_string(),
            access_token: None,
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// Pollinations (free tier)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollinationsConfig {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub model: String,
}

impl Default for PollinationsConfig {
    fn default() -> Self {
        Self {
            url: endpoints::POLLINATIONS_URL.to_string(),
            width: 1280,
            height: 720,
            model: "flux".to_string(),
        }
    }
}

/// Structural tier rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MermaidConfig {
    /// Try the remote mermaid.ink renderer before the local SVG layout
    pub use_remote: bool,
    pub url: String,
}

impl Default for MermaidConfig {
    fn default() -> Self {
        Self {
            use_remote: true,
            url: endpoints::MERMAID_INK_URL.to_string(),
        }
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory (relative to the repository) for image and architecture file
    pub dir: PathBuf,

    /// Image file stem; the extension follows the produced format
    pub image_stem: String,

    /// README path relative to the repository
    pub readme: PathBuf,

    pub skip_readme: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(paths::OUTPUT_DIR),
            image_stem: paths::IMAGE_STEM.to_string(),
            readme: PathBuf::from(paths::README_FILE),
            skip_readme: false,
        }
    }
}

// =============================================================================
// Cache Configuration
// =============================================================================

/// When a cached architecture counts as fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Reuse only when the repository fingerprint matches
    #[default]
    Fingerprint,
    /// Reuse whatever is cached until an explicit refresh
    Sticky,
}

impl std::fmt::Display for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheMode::Fingerprint => write!(f, "fingerprint"),
            CacheMode::Sticky => write!(f, "sticky"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub mode: CacheMode,

    /// Architecture file name inside `output.dir`
    pub architecture_file: String,

    /// Reuse generated images whose fingerprint and prompt match
    pub images: bool,

    /// Image cache directory relative to the repository
    pub image_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Fingerprint,
            architecture_file: paths::ARCHITECTURE_FILE.to_string(),
            images: true,
            image_dir: PathBuf::from(paths::IMAGE_CACHE_DIR),
        }
    }
}

// =============================================================================
// Change Heuristic Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangesConfig {
    /// Regeneration is suggested when more files than this changed
    pub min_files: usize,

    /// ...or more lines (insertions + deletions) than this
    pub min_lines: usize,

    /// Revision compared against HEAD
    pub base: String,
}

impl Default for ChangesConfig {
    fn default() -> Self {
        Self {
            min_files: changes::MIN_FILES,
            min_lines: changes::MIN_LINES,
            base: "@{upstream}".to_string(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Tests
// =============================================================================
