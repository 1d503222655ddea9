//! repo-artist - Architecture Hero Images for READMEs
//!
//! Harvests a bounded view of a repository, asks an LLM for its
//! architecture, and renders that architecture as a hero image spliced into
//! the README. Image generation falls through a tier chain so a run always
//! ends with a picture.
//!
//! ## Pipeline
//!
//! ```text
//! Harvester → Analyzer (cache-checked) → Prompt Builder → Generation Chain → README Updater
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use repo_artist::{ConfigLoader, Pipeline, PipelineOptions};
//!
//! let config = ConfigLoader::load(&root)?;
//! let pipeline = Pipeline::from_config(config, &root)?;
//! let outcome = pipeline.run(&PipelineOptions::default()).await?;
//! println!("{} tier: {}", outcome.tier, outcome.image_path.display());
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: context harvesting and LLM architecture inference
//! - [`hero`]: deterministic image prompt construction
//! - [`imagegen`]: tiered image providers (premium, free, structural)
//! - [`storage`]: architecture and image caches, atomic writes
//! - [`readme`]: idempotent README splicing
//! - [`pipeline`]: the stage orchestrator

pub mod ai;
pub mod analyzer;
pub mod changes;
pub mod cli;
pub mod config;
pub mod constants;
pub mod hero;
pub mod imagegen;
pub mod pipeline;
pub mod readme;
pub mod storage;
pub mod types;
pub mod workspace;

#[cfg(test)]
mod testing;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader, HeroStyle};

pub use types::{
    AnalysisError, ArchitectureGraph, ArtistError, CodeContext, ErrorCategory, Fingerprint,
    GeneratedImage, GenerationError, ImageFormat, PipelineError, PipelineStage, Result, Tier,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{ArchitectureSource, Pipeline, PipelineOptions, PipelineOutcome};

pub use ai::{LlmProvider, LlmResponse, SharedProvider, create_provider};
pub use analyzer::{ArchitectureAnalyzer, Harvester};
pub use hero::{ImagePrompt, build_prompt};
pub use imagegen::{GenerationChain, GenerationChainBuilder, ImageProvider};
pub use readme::{ReadmeOutcome, ReadmeUpdate};
pub use workspace::Workspace;
