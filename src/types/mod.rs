pub mod context;
pub mod error;
pub mod graph;
pub mod image;

pub use context::{CodeContext, ContextFile};
pub use error::{
    AnalysisError, ArtistError, ErrorCategory, ErrorClassifier, GenerationError,
    GenerationErrorKind, LlmError, PipelineError, PipelineStage, Result,
};
pub use graph::{ArchitectureGraph, Component, ComponentKind, Connection, GraphDefect};
pub use image::{GeneratedImage, ImageFormat, Tier};

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content digest of a harvested repository
///
/// Keys both the architecture cache and the image cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, enough to tell runs apart in logs
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
