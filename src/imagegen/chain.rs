//! Tiered Image Generation Chain
//!
//! Walks tiers in configured order until one produces an image.
//!
//! ## Strategy
//!
//! 1. Call the tier with a per-attempt timeout (elapsed = transport failure)
//! 2. On a transport failure with attempts left, back off with jitter and retry
//! 3. Any other failure, or no attempts left: log and advance to the next tier
//! 4. Every tier failed: [`ArtistError::GenerationExhausted`] with each failure

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::{
    GenerationRequest, ImageProvider, ImagenProvider, PollinationsProvider, SharedImageProvider,
    StructuralProvider,
};
use crate::ai::with_timeout_or;
use crate::config::Config;
use crate::constants::chain as chain_constants;
use crate::types::{
    ArtistError, GeneratedImage, GenerationError, GenerationErrorKind, Result, Tier,
};

/// Tier with its retry budget
#[derive(Clone)]
struct TierEntry {
    provider: SharedImageProvider,
    max_attempts: u8,
}

#[derive(Debug, Clone)]
pub struct ChainAttempt {
    pub tier: Tier,
    pub provider: String,
    pub attempt: u8,
    pub error: Option<GenerationError>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ChainStats {
    pub total_attempts: usize,
    pub succeeded_tier: Option<Tier>,
    pub attempts: Vec<ChainAttempt>,
    pub total_duration_ms: u64,
}

impl ChainStats {
    pub fn failures(&self) -> Vec<GenerationError> {
        self.attempts.iter().filter_map(|a| a.error.clone()).collect()
    }
}

pub struct GenerationChain {
    entries: Vec<TierEntry>,
    timeout: Duration,
    base_delay: Duration,
    max_delay: Duration,
    backoff_factor: f32,
}

impl GenerationChain {
    /// Build the tiers named by `config` (honoring a pin) in order.
    pub fn from_config(config: &Config) -> Result<Self> {
        let generation = &config.generation;
        let mut builder = GenerationChainBuilder::new()
            .with_timeout(Duration::from_secs(generation.timeout_secs))
            .with_base_delay(Duration::from_millis(generation.base_delay_ms));

        for tier in config.active_tiers() {
            let provider: SharedImageProvider = match tier {
                Tier::Premium => Arc::new(ImagenProvider::new(
                    &generation.imagen,
                    generation.timeout_secs,
                )?),
                Tier::Free => Arc::new(PollinationsProvider::new(
                    &generation.pollinations,
                    generation.timeout_secs,
                )?),
                Tier::Structural => Arc::new(StructuralProvider::new(
                    &generation.mermaid,
                    generation.timeout_secs,
                )?),
            };
            builder = builder.add_tier(provider, generation.max_attempts.for_tier(tier));
        }

        Ok(builder.build())
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.entries.iter().map(|e| e.provider.tier()).collect()
    }

    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedImage> {
        self.execute(request).await.map(|(image, _)| image)
    }

    #[instrument(skip_all, fields(tiers = self.entries.len(), prompt_chars = request.prompt.text.len()))]
    pub async fn execute(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<(GeneratedImage, ChainStats)> {
        let mut stats = ChainStats::default();
        let start_time = Instant::now();

        if self.entries.is_empty() {
            return Err(ArtistError::Config(
                "No image generation tiers configured".to_string(),
            ));
        }

        for entry in &self.entries {
            let tier = entry.provider.tier();
            let name = entry.provider.name().to_string();
            let mut current_delay = self.base_delay;

            for attempt in 1..=entry.max_attempts {
                debug!(%tier, provider = %name, attempt, "Requesting image");
                let attempt_start = Instant::now();

                let result = with_timeout_or(
                    self.timeout,
                    entry.provider.generate(request),
                    |elapsed| {
                        GenerationError::new(
                            tier,
                            name.clone(),
                            GenerationErrorKind::TransportFailure,
                            format!("timed out after {}s", elapsed.as_secs()),
                        )
                    },
                )
                .await;

                stats.total_attempts += 1;
                let duration_ms = attempt_start.elapsed().as_millis() as u64;

                match result {
                    Ok(image) => {
                        stats.attempts.push(ChainAttempt {
                            tier,
                            provider: name.clone(),
                            attempt,
                            error: None,
                            duration_ms,
                        });
                        stats.succeeded_tier = Some(tier);
                        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;
                        info!(
                            %tier,
                            provider = %name,
                            format = image.format.extension(),
                            bytes = image.bytes.len(),
                            "Image generated"
                        );
                        return Ok((image, stats));
                    }
                    Err(err) => {
                        let retry = err.is_transient() && attempt < entry.max_attempts;
                        warn!(
                            %tier,
                            provider = %name,
                            attempt,
                            kind = %err.kind,
                            will_retry = retry,
                            "Tier failed: {}",
                            err.message
                        );
                        stats.attempts.push(ChainAttempt {
                            tier,
                            provider: name.clone(),
                            attempt,
                            error: Some(err),
                            duration_ms,
                        });

                        if !retry {
                            break;
                        }
                        let delay = current_delay + random_jitter(current_delay);
                        debug!(delay_ms = delay.as_millis() as u64, "Retrying after backoff");
                        sleep(delay).await;
                        current_delay =
                            calculate_backoff(current_delay, self.backoff_factor, self.max_delay);
                    }
                }
            }
        }

        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;
        warn!(
            attempts = stats.total_attempts,
            "All image generation tiers failed"
        );
        Err(ArtistError::GenerationExhausted {
            failures: stats.failures(),
        })
    }
}

/// Up to a quarter of the base delay
fn random_jitter(base_delay: Duration) -> Duration {
    let max_jitter_ms = (base_delay.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_jitter_ms))
}

fn calculate_backoff(current: Duration, factor: f32, max: Duration) -> Duration {
    let next = Duration::from_secs_f32(current.as_secs_f32() * factor);
    std::cmp::min(next, max)
}

pub struct GenerationChainBuilder {
    entries: Vec<TierEntry>,
    timeout: Duration,
    base_delay: Duration,
    max_delay: Duration,
    backoff_factor: f32,
}

impl GenerationChainBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            timeout: Duration::from_secs(chain_constants::REQUEST_TIMEOUT_SECS),
            base_delay: Duration::from_millis(chain_constants::BASE_DELAY_MS),
            max_delay: Duration::from_secs(chain_constants::MAX_DELAY_SECS),
            backoff_factor: chain_constants::BACKOFF_FACTOR,
        }
    }

    pub fn add_tier(mut self, provider: SharedImageProvider, max_attempts: u8) -> Self {
        self.entries.push(TierEntry {
            provider,
            max_attempts: max_attempts.max(1),
        });
        self
    }

    pub fn add_provider<P: ImageProvider + 'static>(self, provider: P, max_attempts: u8) -> Self {
        self.add_tier(Arc::new(provider), max_attempts)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn build(self) -> GenerationChain {
        GenerationChain {
            entries: self.entries,
            timeout: self.timeout,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            backoff_factor: self.backoff_factor,
        }
    }
}

impl Default for GenerationChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeroStyle, PromptConfig};
    use crate::hero::build_prompt;
    use crate::imagegen::to_mermaid;
    use crate::testing::{FakeImageProvider, sample_graph};

    fn fast(builder: GenerationChainBuilder) -> GenerationChain {
        builder
            .with_base_delay(Duration::from_millis(1))
            .with_timeout(Duration::from_secs(5))
            .build()
    }

    #[tokio::test]
    async fn test_first_tier_wins() {
        let premium = FakeImageProvider::succeeding(Tier::Premium);
        let free = FakeImageProvider::succeeding(Tier::Free);
        let free_calls = free.counter();
        let chain = fast(
            GenerationChainBuilder::new()
                .add_provider(premium, 1)
                .add_provider(free, 2),
        );

        let graph = sample_graph();
        let prompt = build_prompt(&graph, HeroStyle::Auto, &PromptConfig::default());
        let (image, stats) = chain
            .execute(&GenerationRequest::new(&prompt, &graph))
            .await
            .unwrap();
        assert_eq!(image.tier, Tier::Premium);
        assert_eq!(stats.total_attempts, 1);
        assert_eq!(free_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_through_to_structural() {
        let chain = fast(
            GenerationChainBuilder::new()
                .add_provider(
                    FakeImageProvider::failing(Tier::Premium, GenerationErrorKind::AuthMissing),
                    1,
                )
                .add_provider(
                    FakeImageProvider::failing(Tier::Free, GenerationErrorKind::QuotaExceeded),
                    2,
                )
                .add_provider(StructuralProvider::local_only(), 1),
        );

        let graph = sample_graph();
        let prompt = build_prompt(&graph, HeroStyle::Auto, &PromptConfig::default());
        let (image, stats) = chain
            .execute(&GenerationRequest::new(&prompt, &graph))
            .await
            .unwrap();
        assert_eq!(image.tier, Tier::Structural);
        assert_eq!(stats.succeeded_tier, Some(Tier::Structural));
        // Quota is not transient, so the free tier is tried once
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.failures().len(), 2);
        assert!(!to_mermaid(&graph).is_empty());
    }

    #[tokio::test]
    async fn test_transient_failure_retried_within_budget() {
        let flaky = FakeImageProvider::failing_then_success(Tier::Free, 1);
        let calls = flaky.counter();
        let chain = fast(GenerationChainBuilder::new().add_provider(flaky, 2));

        let graph = sample_graph();
        let prompt = build_prompt(&graph, HeroStyle::Auto, &PromptConfig::default());
        let (image, stats) = chain
            .execute(&GenerationRequest::new(&prompt, &graph))
            .await
            .unwrap();
        assert_eq!(image.tier, Tier::Free);
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_tier_not_retried() {
        let flaky = FakeImageProvider::failing_then_success(Tier::Premium, 1);
        let calls = flaky.counter();
        let chain = fast(GenerationChainBuilder::new().add_provider(flaky, 1));

        let graph = sample_graph();
        let prompt = build_prompt(&graph, HeroStyle::Auto, &PromptConfig::default());
        let err = chain
            .execute(&GenerationRequest::new(&prompt, &graph))
            .await
            .unwrap_err();
        match err {
            ArtistError::GenerationExhausted { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].kind, GenerationErrorKind::TransportFailure);
            }
            other => panic!("expected exhaustion, got {}", other),
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_transport_failure() {
        let chain = GenerationChainBuilder::new()
            .add_provider(FakeImageProvider::hanging(Tier::Free), 1)
            .with_timeout(Duration::from_millis(20))
            .build();

        let graph = sample_graph();
        let prompt = build_prompt(&graph, HeroStyle::Auto, &PromptConfig::default());
        match chain.execute(&GenerationRequest::new(&prompt, &graph)).await {
            Err(ArtistError::GenerationExhausted { failures }) => {
                assert_eq!(failures[0].kind, GenerationErrorKind::TransportFailure);
                assert!(failures[0].message.contains("timed out"));
            }
            other => panic!("expected timeout exhaustion, got {:?}", other.map(|(i, _)| i.tier)),
        }
    }

    #[test]
    fn test_pin_builds_single_tier() {
        let mut config = Config::default();
        config.generation.pin = Some(Tier::Structural);
        let chain = GenerationChain::from_config(&config).unwrap();
        assert_eq!(chain.tiers(), vec![Tier::Structural]);

        let chain = GenerationChain::from_config(&Config::default()).unwrap();
        assert_eq!(chain.tiers(), Tier::ALL.to_vec());
    }

    #[test]
    fn test_random_jitter() {
        let base = Duration::from_millis(1000);
        assert!(random_jitter(base) <= Duration::from_millis(250));
        assert_eq!(random_jitter(Duration::from_millis(3)), Duration::ZERO);
    }

    #[test]
    fn test_calculate_backoff() {
        let next = calculate_backoff(Duration::from_millis(500), 2.0, Duration::from_secs(8));
        assert_eq!(next, Duration::from_millis(1000));
        let capped = calculate_backoff(Duration::from_secs(6), 2.0, Duration::from_secs(8));
        assert_eq!(capped, Duration::from_secs(8));
    }
}
