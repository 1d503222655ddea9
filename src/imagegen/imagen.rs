//! Premium tier: Imagen on Vertex AI
//!
//! Calls the `predict` endpoint with an OAuth bearer token. Without a project
//! id and a token the tier reports `AuthMissing` and the chain moves on.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{GenerationRequest, ImageProvider};
use crate::ai::provider::http_failure;
use crate::config::ImagenConfig;
use crate::types::{
    ArtistError, ErrorClassifier, GeneratedImage, GenerationError, GenerationErrorKind,
    ImageFormat, Result, Tier,
};

const PROVIDER: &str = "imagen";

pub struct ImagenProvider {
    project_id: Option<String>,
    access_token: Option<SecretString>,
    location: String,
    model: String,
    aspect_ratio: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for ImagenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagenProvider")
            .field("project_id", &self.project_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("location", &self.location)
            .field("model", &self.model)
            .finish()
    }
}

impl ImagenProvider {
    pub fn new(config: &ImagenConfig, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ArtistError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            project_id: config
                .project_id
                .clone()
                .filter(|p| !p.trim().is_empty()),
            access_token: config
                .access_token
                .clone()
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
            location: config.location.clone(),
            model: config.model.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
            client,
        })
    }

    fn endpoint(&self, project_id: &str) -> String {
        format!(
            "https://{loc}-aiplatform.googleapis.com/v1/projects/{project}/locations/{loc}/publishers/google/models/{model}:predict",
            loc = self.location,
            project = project_id,
            model = self.model
        )
    }

    fn failure(&self, kind: GenerationErrorKind, message: impl Into<String>) -> GenerationError {
        GenerationError::new(Tier::Premium, PROVIDER, kind, message)
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> std::result::Result<GeneratedImage, GenerationError> {
        let project_id = self.project_id.as_deref().ok_or_else(|| {
            self.failure(
                GenerationErrorKind::AuthMissing,
                "IMAGEN_PROJECT_ID (generation.imagen.project_id) is not set",
            )
        })?;
        let token = self.access_token.as_ref().ok_or_else(|| {
            self.failure(
                GenerationErrorKind::AuthMissing,
                "IMAGEN_ACCESS_TOKEN (generation.imagen.access_token) is not set",
            )
        })?;

        let body = PredictRequest {
            instances: vec![Instance {
                prompt: request.prompt.text.clone(),
            }],
            parameters: Parameters {
                sample_count: 1,
                aspect_ratio: self.aspect_ratio.clone(),
            },
        };

        debug!(model = %self.model, location = %self.location, "Calling Imagen");
        let response = self
            .client
            .post(self.endpoint(project_id))
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                GenerationError::from_llm(Tier::Premium, ErrorClassifier::classify_reqwest(&e, PROVIDER))
            })?;

        if !response.status().is_success() {
            let err = http_failure(response, PROVIDER).await;
            return Err(GenerationError::from_llm(Tier::Premium, err));
        }

        let predictions: PredictResponse = response.json().await.map_err(|e| {
            self.failure(
                GenerationErrorKind::ProviderRejected,
                format!("unreadable Imagen response: {}", e),
            )
        })?;

        decode_prediction(predictions).map_err(|msg| self.failure(GenerationErrorKind::ProviderRejected, msg))
    }

    fn tier(&self) -> Tier {
        Tier::Premium
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

fn decode_prediction(response: PredictResponse) -> std::result::Result<GeneratedImage, String> {
    let prediction = response
        .predictions
        .into_iter()
        .next()
        .ok_or("Imagen returned no predictions (prompt may have been filtered)")?;
    let bytes = STANDARD
        .decode(prediction.bytes_base64_encoded.trim())
        .map_err(|e| format!("invalid base64 image payload: {}", e))?;
    let format = ImageFormat::sniff(&bytes).ok_or("Imagen payload is not a recognized image")?;
    Ok(GeneratedImage::new(bytes, format, Tier::Premium, PROVIDER))
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeroStyle, PromptConfig};
    use crate::hero::build_prompt;
    use crate::testing::sample_graph;

    #[tokio::test]
    async fn test_missing_project_is_auth_missing() {
        let provider = ImagenProvider::new(&ImagenConfig::default(), 5).unwrap();
        let graph = sample_graph();
        let prompt = build_prompt(&graph, HeroStyle::Auto, &PromptConfig::default());

        let err = provider
            .generate(&GenerationRequest::new(&prompt, &graph))
            .await
            .unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::AuthMissing);
        assert_eq!(err.tier, Tier::Premium);
    }

    #[test]
    fn test_endpoint_shape() {
        let config = ImagenConfig {
            project_id: Some("demo".to_string()),
            access_token: Some("ya29.secret".to_string()),
            ..Default::default()
        };
        let provider = ImagenProvider::new(&config, 5).unwrap();
        assert_eq!(
            provider.endpoint("demo"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/demo/locations/us-central1/publishers/google/models/imagen-3.0-generate-001:predict"
        );
        assert!(!format!("{:?}", provider).contains("ya29"));
    }

    #[test]
    fn test_decode_prediction() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let response = PredictResponse {
            predictions: vec![Prediction {
                bytes_base64_encoded: STANDARD.encode(png),
            }],
        };
        let image = decode_prediction(response).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.provider, "imagen");

        assert!(decode_prediction(PredictResponse { predictions: vec![] }).is_err());
    }
}
