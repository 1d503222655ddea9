//! Configuration Management
//!
//! Hierarchical resolution, later sources win:
//! 1. Built-in defaults
//! 2. Global config (platform config dir)
//! 3. Project config (`.repo-artist/config.toml`)
//! 4. Environment variables (`REPO_ARTIST_*` plus legacy names)
//! 5. CLI arguments
//!
//! The resolved [`Config`] is immutable for the rest of a run; no stage reads
//! the environment on its own.

mod loader;
mod types;

pub use loader::{ConfigLoader, ShowFormat};
pub use types::*;
