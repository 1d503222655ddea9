//! Hero image prompts
//!
//! Converts an [`crate::types::ArchitectureGraph`] into the bounded text
//! prompt sent to the image tiers.

mod prompt;
mod style;

pub use prompt::{ImagePrompt, build_prompt};
pub use style::{StyleTemplate, kind_visual};
