//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (platform config dir, `config.toml`)
//! 3. Project config (`<repo>/.repo-artist/config.toml`)
//! 4. Environment variables (`REPO_ARTIST_*`, nested with `__`)
//! 5. Legacy variable names (`ARCH_MODEL_NAME`, `IMAGEN_*`, `REPO_ARTIST_MAX_DEPTH`, ...)
//!
//! Provider API keys (`GEMINI_API_KEY`, `OPENAI_API_KEY`) are resolved last,
//! once the provider is known. CLI flags are applied by the caller on top.

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants::paths;
use crate::types::{ArtistError, Result};

/// Legacy environment names and the config keys they set
const ENV_ALIASES: &[(&str, &str)] = &[
    ("ARCH_MODEL_NAME", "llm.model"),
    ("IMAGEN_PROJECT_ID", "generation.imagen.project_id"),
    ("IMAGEN_LOCATION", "generation.imagen.location"),
    ("IMAGEN_ACCESS_TOKEN", "generation.imagen.access_token"),
    ("REPO_ARTIST_MAX_DEPTH", "harvest.max_depth"),
    ("REPO_ARTIST_MAX_COMPONENTS", "prompt.max_components"),
    ("REPO_ARTIST_MAX_CONNECTIONS", "prompt.max_connections"),
    ("REPO_ARTIST_OUTPUT_DIR", "output.dir"),
];

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    Toml,
    Json,
    Yaml,
}

impl std::str::FromStr for ShowFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "toml" | "text" => Ok(ShowFormat::Toml),
            "json" => Ok(ShowFormat::Json),
            "yaml" | "yml" => Ok(ShowFormat::Yaml),
            _ => Err(format!(
                "Unknown format: {}. Valid values: toml, json, yaml",
                s
            )),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the repository at `root` with the full
    /// resolution chain: defaults → global → project → env vars
    pub fn load(root: &Path) -> Result<Config> {
        Self::load_layers(Self::file_figment(Self::global_config_path().as_deref(), Some(root)))
    }

    /// Same chain without the project file. Used for repositories that are
    /// not trusted, such as a freshly cloned preview target.
    pub fn load_global() -> Result<Config> {
        Self::load_layers(Self::file_figment(Self::global_config_path().as_deref(), None))
    }

    fn load_layers(files: Figment) -> Result<Config> {
        let figment = files
            .merge(Env::prefixed("REPO_ARTIST_").split("__"))
            .merge(
                Env::raw()
                    .only(&ENV_ALIASES.iter().map(|(k, _)| *k).collect::<Vec<_>>())
                    .map(|key| {
                        let upper = key.as_str().to_ascii_uppercase();
                        ENV_ALIASES
                            .iter()
                            .find(|(name, _)| *name == upper)
                            .map(|(_, target)| (*target).into())
                            .unwrap_or_else(|| key.as_str().into())
                    }),
            );

        let mut config: Config = figment
            .extract()
            .map_err(|e| ArtistError::Config(format!("Configuration error: {}", e)))?;

        Self::fill_provider_key(&mut config, |name| std::env::var(name).ok());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from files only (no environment)
    pub fn load_files(global: Option<&Path>, root: &Path) -> Result<Config> {
        let config: Config = Self::file_figment(global, Some(root))
            .extract()
            .map_err(|e| ArtistError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn file_figment(global: Option<&Path>, root: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(root) = root {
            let project_path = Self::project_config_path(root);
            if project_path.exists() {
                debug!("Loading project config from: {}", project_path.display());
                figment = figment.merge(Toml::file(&project_path));
            }
        }

        figment
    }

    /// Fill `llm.api_key` from the provider's conventional variable
    pub fn fill_provider_key<F>(config: &mut Config, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if config.llm.api_key.is_some() {
            return;
        }
        let var = match config.llm.provider.as_str() {
            "gemini" => "GEMINI_API_KEY",
            "openai" => "OPENAI_API_KEY",
            _ => return,
        };
        if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
            debug!(var, "Using API key from environment");
            config.llm.api_key = Some(key);
        }
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "repo-artist")
    }

    /// Global config directory (platform specific)
    pub fn global_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir(root: &Path) -> PathBuf {
        root.join(paths::PROJECT_DIR)
    }

    pub fn project_config_path(root: &Path) -> PathBuf {
        Self::project_dir(root).join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Render the effective configuration
    pub fn render(config: &Config, format: ShowFormat) -> Result<String> {
        match format {
            ShowFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| ArtistError::Config(e.to_string()))
            }
            ShowFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            ShowFormat::Yaml => Ok(serde_yaml::to_string(config)?),
        }
    }

    /// Configuration paths and whether each exists
    pub fn describe_paths(root: &Path) -> Vec<(&'static str, Option<PathBuf>)> {
        vec![
            ("Global", Self::global_config_path()),
            ("Project", Some(Self::project_config_path(root))),
            ("Image cache", Some(root.join(paths::IMAGE_CACHE_DIR))),
        ]
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    pub fn init_global(force: bool) -> Result<PathBuf> {
        let config_path = Self::global_config_path().ok_or_else(|| {
            ArtistError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_starter(&config_path, force)?;
        Ok(config_path)
    }

    pub fn init_project(root: &Path, force: bool) -> Result<PathBuf> {
        let config_path = Self::project_config_path(root);
        Self::write_starter(&config_path, force)?;
        Ok(config_path)
    }

    fn write_starter(path: &Path, force: bool) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(());
        }
        fs::write(path, Self::starter_config())?;
        info!("Created config: {}", path.display());
        Ok(())
    }

    /// Starter config content (TOML)
    fn starter_config() -> &'static str {
        r#"# repo-artist configuration
# Environment variables (REPO_ARTIST_SECTION__KEY) override this file.

[llm]
provider = "gemini"          # gemini | openai | ollama
model = "gemini-2.5-flash"
# api_key is read from GEMINI_API_KEY / OPENAI_API_KEY when not set here
# instructions = "Treat the plugins/ directory as one component"

[harvest]
max_depth = 3
exclude = []                 # glob patterns, e.g. ["docs/**"]

[prompt]
style = "auto"               # auto | minimalist | cyberpunk | corporate | sketch | glassmorphism
max_components = 7
max_connections = 7

[generation]
tiers = ["premium", "free", "structural"]
# pin = "structural"

[generation.imagen]
# project_id = "my-gcp-project"
location = "us-central1"

[generation.mermaid]
use_remote = true

[output]
dir = "assets"
readme = "README.md"

[cache]
mode = "fingerprint"         # fingerprint | sticky

[changes]
min_files = 3
min_lines = 50
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeroStyle;
    use crate::types::Tier;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_files(None, temp_dir.path()).unwrap();
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.harvest.max_depth, 3);
    }

    #[test]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(
            &global,
            "[prompt]\nstyle = \"sketch\"\nmax_components = 5\n",
        )
        .unwrap();

        let repo = temp_dir.path().join("repo");
        let project = ConfigLoader::project_config_path(&repo);
        fs::create_dir_all(project.parent().unwrap()).unwrap();
        fs::write(&project, "[prompt]\nmax_components = 4\n[generation]\npin = \"free\"\n")
            .unwrap();

        let config = ConfigLoader::load_files(Some(&global), &repo).unwrap();
        assert_eq!(config.prompt.style, HeroStyle::Sketch);
        assert_eq!(config.prompt.max_components, 4);
        assert_eq!(config.generation.pin, Some(Tier::Free));
        assert_eq!(config.prompt.max_connections, 7);
    }

    #[test]
    fn test_invalid_project_config_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let project = ConfigLoader::project_config_path(temp_dir.path());
        fs::create_dir_all(project.parent().unwrap()).unwrap();
        fs::write(&project, "[generation]\ntiers = []\n").unwrap();

        let result = ConfigLoader::load_files(None, temp_dir.path());
        assert!(matches!(result, Err(ArtistError::Config(_))));
    }

    #[test]
    fn test_starter_config_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::init_project(temp_dir.path(), false).unwrap();
        assert!(path.exists());

        let config = ConfigLoader::load_files(None, temp_dir.path()).unwrap();
        assert_eq!(config.generation.tiers.len(), 3);
    }

    #[test]
    fn test_init_project_keeps_existing_unless_forced() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::project_config_path(temp_dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "# mine\n").unwrap();

        ConfigLoader::init_project(temp_dir.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

        ConfigLoader::init_project(temp_dir.path(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[llm]"));
    }

    #[test]
    fn test_fill_provider_key() {
        let mut config = Config::default();
        ConfigLoader::fill_provider_key(&mut config, |name| {
            (name == "GEMINI_API_KEY").then(|| "g-key".to_string())
        });
        assert_eq!(config.llm.api_key.as_deref(), Some("g-key"));

        let mut config = Config::default();
        config.llm.provider = "ollama".to_string();
        ConfigLoader::fill_provider_key(&mut config, |_| Some("unused".to_string()));
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let toml = ConfigLoader::render(&config, ShowFormat::Toml).unwrap();
        assert!(toml.contains("[llm]"));
        let json = ConfigLoader::render(&config, ShowFormat::Json).unwrap();
        assert!(json.contains("\"provider\": \"gemini\""));
        let yaml = ConfigLoader::render(&config, ShowFormat::Yaml).unwrap();
        assert!(yaml.contains("provider: gemini"));
    }

    #[test]
    fn test_env_aliases() {
        // SAFETY: these variable names are only touched by this test
        unsafe {
            std::env::set_var("ARCH_MODEL_NAME", "gemini-test-model");
            std::env::set_var("IMAGEN_PROJECT_ID", "demo-project");
        }
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load(temp_dir.path()).unwrap();
        assert_eq!(config.llm.model, "gemini-test-model");
        assert_eq!(
            config.generation.imagen.project_id.as_deref(),
            Some("demo-project")
        );
        unsafe {
            std::env::remove_var("ARCH_MODEL_NAME");
            std::env::remove_var("IMAGEN_PROJECT_ID");
        }
    }
}
