//! Free tier: Pollinations
//!
//! A keyless GET with the prompt percent-encoded into the path. The gateway
//! is frequently busy, so 5xx responses and network errors are transient.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{GenerationRequest, ImageProvider};
use crate::ai::provider::http_failure;
use crate::config::PollinationsConfig;
use crate::types::{
    ArtistError, ErrorClassifier, GeneratedImage, GenerationError, GenerationErrorKind,
    ImageFormat, Result, Tier,
};

const PROVIDER: &str = "pollinations";

#[derive(Debug)]
pub struct PollinationsProvider {
    base: Url,
    width: u32,
    height: u32,
    model: String,
    client: reqwest::Client,
}

impl PollinationsProvider {
    pub fn new(config: &PollinationsConfig, timeout_secs: u64) -> Result<Self> {
        let base = Url::parse(&config.url).map_err(|e| {
            ArtistError::Config(format!("Invalid Pollinations URL '{}': {}", config.url, e))
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ArtistError::Config(format!(
                "Pollinations URL must be an http(s) base URL, got: {}",
                config.url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ArtistError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base,
            width: config.width,
            height: config.height,
            model: config.model.clone(),
            client,
        })
    }

    /// `{base}/{encoded prompt}?width=..&height=..&model=..`
    pub fn request_url(&self, prompt: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(prompt);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("width", &self.width.to_string())
            .append_pair("height", &self.height.to_string())
            .append_pair("model", &self.model);
        url
    }
}

#[async_trait]
impl ImageProvider for PollinationsProvider {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> std::result::Result<GeneratedImage, GenerationError> {
        let url = self.request_url(&request.prompt.text);
        debug!(url_len = url.as_str().len(), "Requesting Pollinations image");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            GenerationError::from_llm(Tier::Free, ErrorClassifier::classify_reqwest(&e, PROVIDER))
        })?;

        if !response.status().is_success() {
            let err = http_failure(response, PROVIDER).await;
            return Err(GenerationError::from_llm(Tier::Free, err));
        }

        let bytes = response.bytes().await.map_err(|e| {
            GenerationError::from_llm(Tier::Free, ErrorClassifier::classify_reqwest(&e, PROVIDER))
        })?;

        let format = ImageFormat::sniff(&bytes).ok_or_else(|| {
            GenerationError::new(
                Tier::Free,
                PROVIDER,
                GenerationErrorKind::ProviderRejected,
                format!("response is not an image ({} bytes)", bytes.len()),
            )
        })?;

        Ok(GeneratedImage::new(bytes.to_vec(), format, Tier::Free, PROVIDER).with_url(url.as_str()))
    }

    fn tier(&self) -> Tier {
        Tier::Free
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_encodes_prompt() {
        let provider = PollinationsProvider::new(&PollinationsConfig::default(), 5).unwrap();
        let url = provider.request_url("A diagram / with \"quotes\" & more?");
        let text = url.as_str();

        assert!(text.starts_with("https://image.pollinations.ai/prompt/A%20diagram%20%2F%20with"));
        assert!(text.ends_with("?width=1280&height=720&model=flux"));
        assert_eq!(url.path_segments().map(|s| s.count()), Some(2));
    }

    #[test]
    fn test_trailing_slash_base() {
        let config = PollinationsConfig {
            url: "https://example.test/prompt/".to_string(),
            ..Default::default()
        };
        let provider = PollinationsProvider::new(&config, 5).unwrap();
        assert!(
            provider
                .request_url("x")
                .as_str()
                .starts_with("https://example.test/prompt/x?")
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = PollinationsConfig {
            url: "ftp://example.test".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            PollinationsProvider::new(&config, 5),
            Err(ArtistError::Config(_))
        ));
    }
}
