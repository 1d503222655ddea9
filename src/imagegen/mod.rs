//! Image Generation
//!
//! Each tier implements [`ImageProvider`]; [`GenerationChain`] walks the
//! configured tiers in order and returns the first image produced.
//!
//! | Tier | Provider | Typical failure |
//! |------|----------|-----------------|
//! | premium | Imagen on Vertex AI | missing project or token |
//! | free | Pollinations | busy gateway, rate limit |
//! | structural | mermaid.ink, then local SVG | none for a valid graph |

mod chain;
mod imagen;
mod pollinations;
mod structural;

pub use chain::{ChainAttempt, ChainStats, GenerationChain, GenerationChainBuilder};
pub use imagen::ImagenProvider;
pub use pollinations::PollinationsProvider;
pub use structural::{StructuralProvider, render_svg, to_mermaid};

use async_trait::async_trait;
use std::sync::Arc;

use crate::hero::ImagePrompt;
use crate::types::{ArchitectureGraph, GeneratedImage, GenerationError, Tier};

/// Everything a tier may draw from
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a ImagePrompt,
    pub graph: &'a ArchitectureGraph,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(prompt: &'a ImagePrompt, graph: &'a ArchitectureGraph) -> Self {
        Self { prompt, graph }
    }
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<GeneratedImage, GenerationError>;

    fn tier(&self) -> Tier;

    /// Provider name for logging and provenance
    fn name(&self) -> &str;
}

pub type SharedImageProvider = Arc<dyn ImageProvider>;
