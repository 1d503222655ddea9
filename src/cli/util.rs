//! CLI Common Utilities
//!
//! Shared configuration resolution for command handlers: load the layered
//! [`Config`], then apply command-line overrides on top.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader, HeroStyle};
use crate::types::{ArtistError, Result, Tier};

/// Flags that override configuration for one run
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub style: Option<HeroStyle>,
    pub pin: Option<Tier>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl ConfigOverrides {
    /// Apply on top of `config` and re-validate
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(style) = self.style {
            config.prompt.style = style;
        }
        if let Some(pin) = self.pin {
            if !config.generation.tiers.contains(&pin) {
                config.generation.tiers.push(pin);
            }
            config.generation.pin = Some(pin);
        }
        if let Some(provider) = &self.provider
            && *provider != config.llm.provider
        {
            config.llm.provider = provider.clone();
            // The key resolved so far belongs to the previous provider
            config.llm.api_key = None;
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(key) = &self.api_key {
            config.llm.api_key = Some(key.clone());
        }
        ConfigLoader::fill_provider_key(config, |name| std::env::var(name).ok());
        config.validate()
    }
}

/// Resolved repository root and configuration for a command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub root: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// Full resolution chain for the repository at `path` (default: cwd)
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let root = resolve_root(path)?;
        let mut config = ConfigLoader::load(&root)?;
        overrides.apply(&mut config)?;
        Ok(Self { root, config })
    }
}

/// Canonical repository root; it must be an existing directory
pub fn resolve_root(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let root = path
        .canonicalize()
        .map_err(|e| ArtistError::Config(format!("Cannot open {}: {}", path.display(), e)))?;
    if !root.is_dir() {
        return Err(ArtistError::Config(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_apply() {
        let mut config = Config::default();
        let overrides = ConfigOverrides {
            style: Some(HeroStyle::Sketch),
            model: Some("gemini-2.0-pro".to_string()),
            api_key: Some("cli-key".to_string()),
            ..Default::default()
        };
        overrides.apply(&mut config).unwrap();

        assert_eq!(config.prompt.style, HeroStyle::Sketch);
        assert_eq!(config.llm.model, "gemini-2.0-pro");
        assert_eq!(config.llm.api_key.as_deref(), Some("cli-key"));
    }

    #[test]
    fn test_pin_outside_configured_tiers_is_added() {
        let mut config = Config::default();
        config.generation.tiers = vec![Tier::Structural];
        let overrides = ConfigOverrides {
            pin: Some(Tier::Free),
            ..Default::default()
        };
        overrides.apply(&mut config).unwrap();
        assert_eq!(config.active_tiers(), vec![Tier::Free]);
    }

    #[test]
    fn test_provider_switch_drops_previous_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("gemini-key".to_string());
        let overrides = ConfigOverrides {
            provider: Some("ollama".to_string()),
            ..Default::default()
        };
        overrides.apply(&mut config).unwrap();
        assert_eq!(config.llm.provider, "ollama");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_resolve_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(resolve_root(Some(temp_dir.path())).is_ok());
        assert!(resolve_root(Some(&temp_dir.path().join("missing"))).is_err());

        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(resolve_root(Some(&file)).is_err());
    }
}
