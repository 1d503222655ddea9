//! Structural tier: the graph drawn as labeled boxes and arrows
//!
//! Prefers the mermaid.ink renderer when enabled and falls back to a local
//! SVG layout on any failure, so this tier never fails for a valid graph.

mod mermaid;
mod svg;

pub use mermaid::to_mermaid;
pub use svg::render_svg;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use std::time::Duration;
use tracing::{debug, warn};

use super::{GenerationRequest, ImageProvider};
use crate::config::MermaidConfig;
use crate::types::{
    ArchitectureGraph, ArtistError, GeneratedImage, GenerationError, ImageFormat, Result, Tier,
};

const PROVIDER: &str = "structural";

#[derive(Debug)]
pub struct StructuralProvider {
    /// mermaid.ink base URL; `None` renders locally only
    remote: Option<String>,
    client: Option<reqwest::Client>,
}

impl StructuralProvider {
    pub fn new(config: &MermaidConfig, timeout_secs: u64) -> Result<Self> {
        if !config.use_remote {
            return Ok(Self::local_only());
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ArtistError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            remote: Some(config.url.trim_end_matches('/').to_string()),
            client: Some(client),
        })
    }

    /// Render with the local SVG layout only
    pub fn local_only() -> Self {
        Self {
            remote: None,
            client: None,
        }
    }

    fn ink_url(base: &str, source: &str) -> String {
        format!("{}/{}", base, URL_SAFE.encode(source.as_bytes()))
    }

    async fn fetch_remote(
        &self,
        graph: &ArchitectureGraph,
    ) -> std::result::Result<Option<GeneratedImage>, String> {
        let (Some(base), Some(client)) = (&self.remote, &self.client) else {
            return Ok(None);
        };
        let url = Self::ink_url(base, &to_mermaid(graph));
        debug!(url_len = url.len(), "Requesting mermaid.ink render");

        let response = client.get(&url).send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("mermaid.ink returned HTTP {}", response.status()));
        }
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        let format = ImageFormat::sniff(&bytes)
            .ok_or_else(|| "mermaid.ink response is not an image".to_string())?;

        Ok(Some(
            GeneratedImage::new(bytes.to_vec(), format, Tier::Structural, "mermaid.ink").with_url(url),
        ))
    }
}

#[async_trait]
impl ImageProvider for StructuralProvider {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> std::result::Result<GeneratedImage, GenerationError> {
        match self.fetch_remote(request.graph).await {
            Ok(Some(image)) => return Ok(image),
            Ok(None) => {}
            Err(reason) => warn!("mermaid.ink unavailable, rendering locally: {}", reason),
        }

        let svg = render_svg(request.graph);
        Ok(GeneratedImage::new(
            svg.into_bytes(),
            ImageFormat::Svg,
            Tier::Structural,
            "local-svg",
        ))
    }

    fn tier(&self) -> Tier {
        Tier::Structural
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeroStyle, PromptConfig};
    use crate::hero::build_prompt;
    use crate::testing::sample_graph;

    #[tokio::test]
    async fn test_local_render() {
        let provider = StructuralProvider::local_only();
        let graph = sample_graph();
        let prompt = build_prompt(&graph, HeroStyle::Auto, &PromptConfig::default());

        let image = provider
            .generate(&GenerationRequest::new(&prompt, &graph))
            .await
            .unwrap();
        assert_eq!(image.format, ImageFormat::Svg);
        assert_eq!(image.tier, Tier::Structural);
        assert_eq!(image.provider, "local-svg");
    }

    #[tokio::test]
    async fn test_unreachable_remote_falls_back() {
        let config = MermaidConfig {
            use_remote: true,
            url: "http://127.0.0.1:9/img".to_string(),
        };
        let provider = StructuralProvider::new(&config, 2).unwrap();
        let graph = sample_graph();
        let prompt = build_prompt(&graph, HeroStyle::Auto, &PromptConfig::default());

        let image = provider
            .generate(&GenerationRequest::new(&prompt, &graph))
            .await
            .unwrap();
        assert_eq!(image.format, ImageFormat::Svg);
    }

    #[test]
    fn test_ink_url_is_path_safe() {
        let url = StructuralProvider::ink_url("https://mermaid.ink/img", "graph LR\n a??>>b");
        let encoded = url.trim_start_matches("https://mermaid.ink/img/");
        assert!(!encoded.contains('/') && !encoded.contains('+'));
        assert_eq!(URL_SAFE.decode(encoded).unwrap(), b"graph LR\n a??>>b");
    }
}
