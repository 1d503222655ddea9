//! In-crate fakes for the LLM and image provider seams

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::{LlmProvider, LlmResponse};
use crate::imagegen::{GenerationRequest, ImageProvider};
use crate::types::{
    ArchitectureGraph, Component, ComponentKind, Connection, ErrorCategory, GeneratedImage,
    GenerationError, GenerationErrorKind, ImageFormat, LlmError, Result, Tier,
};

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

pub fn sample_graph() -> ArchitectureGraph {
    ArchitectureGraph {
        system_summary: Some("A task tracker with a web UI and a REST API".to_string()),
        style_hint: None,
        components: vec![
            Component::new("web", "Web UI", ComponentKind::Frontend, "Renders the board"),
            Component::new("api", "REST API", ComponentKind::Api, "Serves tasks"),
            Component::new("db", "Postgres", ComponentKind::Database, "Stores tasks"),
        ],
        connections: vec![
            Connection::new("web", "api", "HTTPS"),
            Connection::new("api", "db", "SQL"),
        ],
    }
}

/// LLM fake replaying scripted responses; the last one repeats
pub struct ScriptedLlm {
    script: Vec<std::result::Result<String, ErrorCategory>>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn failing(category: ErrorCategory) -> Self {
        Self::new(vec![Err(category)])
    }

    fn new(script: Vec<std::result::Result<String, ErrorCategory>>) -> Self {
        Self {
            script,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let step = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| Err(ErrorCategory::Unknown));
        match step {
            Ok(text) => Ok(LlmResponse::text_only(text)),
            Err(category) => Err(LlmError::with_provider(category, "scripted failure", "scripted").into()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

enum Behavior {
    Succeed,
    Fail(GenerationErrorKind),
    /// Transport failures for the first n calls, then success
    FlakyFor(u32),
    Hang,
}

pub struct FakeImageProvider {
    tier: Tier,
    behavior: Behavior,
    calls: Arc<AtomicU32>,
}

impl FakeImageProvider {
    fn new(tier: Tier, behavior: Behavior) -> Self {
        Self {
            tier,
            behavior,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn succeeding(tier: Tier) -> Self {
        Self::new(tier, Behavior::Succeed)
    }

    pub fn failing(tier: Tier, kind: GenerationErrorKind) -> Self {
        Self::new(tier, Behavior::Fail(kind))
    }

    pub fn failing_then_success(tier: Tier, failures: u32) -> Self {
        Self::new(tier, Behavior::FlakyFor(failures))
    }

    pub fn hanging(tier: Tier) -> Self {
        Self::new(tier, Behavior::Hang)
    }

    pub fn counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ImageProvider for FakeImageProvider {
    async fn generate(
        &self,
        _request: &GenerationRequest<'_>,
    ) -> std::result::Result<GeneratedImage, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = |kind| Err(GenerationError::new(self.tier, "fake", kind, "scripted failure"));
        match self.behavior {
            Behavior::Succeed => {}
            Behavior::Fail(kind) => return fail(kind),
            Behavior::FlakyFor(n) if call < n => {
                return fail(GenerationErrorKind::TransportFailure);
            }
            Behavior::FlakyFor(_) => {}
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
        Ok(GeneratedImage::new(
            PNG_BYTES.to_vec(),
            ImageFormat::Png,
            self.tier,
            "fake",
        ))
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn name(&self) -> &str {
        "fake"
    }
}
