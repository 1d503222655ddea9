//! Config Command
//!
//! Manage repo-artist configuration.
//!
//! Usage:
//!   repo-artist config show [-f toml|json|yaml]
//!   repo-artist config path
//!   repo-artist config init [-g] [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::resolve_root;
use crate::config::{ConfigLoader, ShowFormat};
use crate::types::Result;

/// Print the effective configuration (secrets are never serialized)
pub fn show(path: Option<&Path>, format: ShowFormat) -> Result<()> {
    let root = resolve_root(path)?;
    let config = ConfigLoader::load(&root)?;
    println!("{}", ConfigLoader::render(&config, format)?);
    Ok(())
}

pub fn path(path: Option<&Path>) -> Result<()> {
    let output = Output::new();
    let root = resolve_root(path)?;
    output.header("Configuration paths");
    for (label, location) in ConfigLoader::describe_paths(&root) {
        match location {
            Some(p) if p.exists() => output.path(label, &p),
            Some(p) => output.field(label, format!("{} (not found)", p.display())),
            None => output.field(label, "unavailable on this platform"),
        }
    }
    Ok(())
}

pub fn init(path: Option<&Path>, global: bool, force: bool) -> Result<()> {
    let output = Output::new();
    let config_path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(&resolve_root(path)?, force)?
    };
    output.success(&format!("Configuration at {}", config_path.display()));
    Ok(())
}
