//! Visual vocabulary for hero prompts

use serde::{Deserialize, Serialize};

use crate::config::HeroStyle;
use crate::types::{ArchitectureGraph, ComponentKind};

/// Concrete template a [`HeroStyle`] resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleTemplate {
    Isometric,
    Minimalist,
    Cyberpunk,
    Corporate,
    Sketch,
    Glassmorphism,
}

impl StyleTemplate {
    /// `auto` follows the graph's style hint when it names a concrete style.
    pub fn resolve(style: HeroStyle, graph: &ArchitectureGraph) -> Self {
        let style = match style {
            HeroStyle::Auto => graph
                .style_hint
                .as_deref()
                .and_then(|hint| hint.parse::<HeroStyle>().ok())
                .unwrap_or(HeroStyle::Auto),
            concrete => concrete,
        };
        match style {
            HeroStyle::Auto => Self::Isometric,
            HeroStyle::Minimalist => Self::Minimalist,
            HeroStyle::Cyberpunk => Self::Cyberpunk,
            HeroStyle::Corporate => Self::Corporate,
            HeroStyle::Sketch => Self::Sketch,
            HeroStyle::Glassmorphism => Self::Glassmorphism,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Isometric => "isometric",
            Self::Minimalist => "minimalist",
            Self::Cyberpunk => "cyberpunk",
            Self::Corporate => "corporate",
            Self::Sketch => "sketch",
            Self::Glassmorphism => "glassmorphism",
        }
    }

    /// Opening scene description, followed by the system summary
    pub fn scene(&self) -> &'static str {
        match self {
            Self::Isometric => "A high-end sci-fi isometric flow diagram",
            Self::Minimalist => "A clean minimalist flat flow diagram",
            Self::Cyberpunk => "A neon cyberpunk flow diagram set in a rain-soaked digital city",
            Self::Corporate => "A polished corporate architecture diagram",
            Self::Sketch => "A hand-drawn whiteboard sketch of a flow diagram",
            Self::Glassmorphism => "A glassmorphism flow diagram with frosted translucent panels",
        }
    }

    /// What each component is drawn as
    pub fn node_noun(&self) -> &'static str {
        match self {
            Self::Isometric => "glowing 3D platforms",
            Self::Minimalist => "simple rounded cards",
            Self::Cyberpunk => "holographic neon towers",
            Self::Corporate => "tidy labeled blocks",
            Self::Sketch => "marker-drawn boxes",
            Self::Glassmorphism => "frosted glass panels",
        }
    }

    pub fn style_paragraph(&self) -> &'static str {
        match self {
            Self::Isometric => {
                "professional futuristic dark UI, isometric 3D glass platforms, neon blue and magenta edges"
            }
            Self::Minimalist => {
                "flat design, white background, two accent colors, generous whitespace, thin lines"
            }
            Self::Cyberpunk => {
                "dark background, saturated neon pink and cyan, glowing circuitry, light bloom"
            }
            Self::Corporate => {
                "light neutral palette, navy and teal accents, soft shadows, presentation-slide polish"
            }
            Self::Sketch => {
                "off-white paper texture, black marker strokes, a few highlighter accents, casual hand lettering"
            }
            Self::Glassmorphism => {
                "blurred gradient backdrop, translucent frosted panels, subtle borders, soft pastel glow"
            }
        }
    }
}

impl std::fmt::Display for StyleTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual descriptor for a component type
pub fn kind_visual(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Frontend => "a floating interface screen with UI elements",
        ComponentKind::Backend | ComponentKind::Api => "a server rack module with data streams",
        ComponentKind::Database => "a cylindrical data storage unit with holographic rings",
        ComponentKind::Queue => "a floating data buffer conduit",
        ComponentKind::Cache => "a glowing crystal memory bank",
        ComponentKind::Worker => "a processing core sending signals outward",
        ComponentKind::Cli => "a terminal window and code icons",
        ComponentKind::AiModel => "a glowing neural network brain visualization",
        ComponentKind::ExternalService => "an external service tile or cloud endpoint icon",
        ComponentKind::Storage => "a heavy metallic data vault",
        ComponentKind::Other => "a modular tech block",
    }
}
