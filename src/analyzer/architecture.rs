//! Architecture Analyzer
//!
//! Turns a harvested [`CodeContext`] into an [`ArchitectureGraph`] by asking
//! an LLM. Model output is untrusted: each response is repaired, deserialized
//! and normalized, and a malformed one triggers another attempt with a
//! correction instruction. Transport and credential failures are never
//! retried here.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::prompts;
use crate::ai::{SharedProvider, extract_json_from_response, with_timeout};
use crate::config::LlmConfig;
use crate::constants::analysis;
use crate::types::{
    AnalysisError, ArchitectureGraph, ArtistError, CodeContext, ErrorCategory, LlmError,
};

/// Typed exit of the bounded retry loop
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Parsed(ArchitectureGraph),
    Exhausted { attempts: u32, last_error: String },
}

pub struct ArchitectureAnalyzer {
    provider: SharedProvider,
    max_attempts: u32,
    timeout: Duration,
    extra_instructions: Option<String>,
}

impl ArchitectureAnalyzer {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            max_attempts: analysis::MAX_ATTEMPTS,
            timeout: Duration::from_secs(analysis::REQUEST_TIMEOUT_SECS),
            extra_instructions: None,
        }
    }

    pub fn from_config(provider: SharedProvider, config: &LlmConfig) -> Self {
        Self::new(provider)
            .with_max_attempts(config.max_attempts)
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_instructions(config.instructions.clone())
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Free-form guidance appended to every analysis prompt
    pub fn with_instructions(mut self, extra: Option<String>) -> Self {
        self.extra_instructions = extra;
        self
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Analyze and fold exhaustion into [`AnalysisError::MalformedResponse`].
    pub async fn analyze(&self, context: &CodeContext) -> Result<ArchitectureGraph, AnalysisError> {
        match self.run(context).await? {
            AnalysisOutcome::Parsed(graph) => Ok(graph),
            AnalysisOutcome::Exhausted {
                attempts,
                last_error,
            } => Err(AnalysisError::MalformedResponse {
                attempts,
                last_error,
            }),
        }
    }

    /// Run the retry loop.
    ///
    /// `Err` is reserved for failures no retry can fix; running out of
    /// attempts on malformed output is reported as
    /// [`AnalysisOutcome::Exhausted`].
    #[instrument(
        skip_all,
        fields(provider = self.provider.name(), model = self.provider.model(), files = context.files.len())
    )]
    pub async fn run(&self, context: &CodeContext) -> Result<AnalysisOutcome, AnalysisError> {
        let extra = self.extra_instructions.as_deref();
        let mut last_error: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            let prompt = match &last_error {
                None => prompts::analysis_prompt(context, extra),
                Some(err) => prompts::correction_prompt(context, extra, err),
            };
            debug!(attempt, prompt_chars = prompt.len(), "Requesting architecture");

            let response = with_timeout(
                self.timeout,
                self.provider.complete(&prompt),
                "architecture analysis",
            )
            .await
            .map_err(transport_error)?;

            match parse_graph(&response.text) {
                Ok(graph) => {
                    info!(
                        attempt,
                        components = graph.components.len(),
                        connections = graph.connections.len(),
                        "Architecture parsed"
                    );
                    return Ok(AnalysisOutcome::Parsed(graph));
                }
                Err(reason) => {
                    warn!(attempt, max = self.max_attempts, %reason, "Malformed architecture response");
                    last_error = Some(reason);
                }
            }
        }

        Ok(AnalysisOutcome::Exhausted {
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or_default(),
        })
    }
}

/// Repair, deserialize and normalize one model response.
pub fn parse_graph(text: &str) -> Result<ArchitectureGraph, String> {
    let value = extract_json_from_response(text).map_err(|e| e.to_string())?;
    let graph: ArchitectureGraph =
        serde_json::from_value(value).map_err(|e| format!("schema mismatch: {}", e))?;
    graph.normalize().map_err(|e| e.to_string())
}

fn transport_error(err: ArtistError) -> AnalysisError {
    match err {
        ArtistError::Llm(llm) => AnalysisError::from_llm(llm),
        ArtistError::Timeout { .. } => AnalysisError::TransportFailure(LlmError::new(
            ErrorCategory::Network,
            err.to_string(),
        )),
        other => {
            AnalysisError::TransportFailure(LlmError::new(ErrorCategory::Unknown, other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use crate::types::ContextFile;
    use std::sync::Arc;

    const VALID: &str = r#"{
        "system_summary": "A web app",
        "components": [
            {"id": "web", "label": "Web UI", "type": "frontend", "role": "Renders pages"},
            {"id": "api", "name": "API", "type": "api", "description": "Serves JSON"}
        ],
        "connections": [{"from": "web", "to": "api", "label": "HTTPS"}]
    }"#;

    fn context() -> CodeContext {
        CodeContext {
            files: vec![ContextFile {
                path: "app.py".to_string(),
                content: "print('hi')".to_string(),
                truncated: false,
            }],
            omitted: 0,
        }
    }

    #[tokio::test]
    async fn test_fenced_json_parses() {
        let llm = Arc::new(ScriptedLlm::texts(&[&format!("```json\n{}\n```", VALID)]));
        let analyzer = ArchitectureAnalyzer::new(llm.clone());

        let graph = analyzer.analyze(&context()).await.unwrap();
        assert_eq!(graph.components.len(), 2);
        assert_eq!(graph.components[0].name, "Web UI");
        assert_eq!(graph.connections[0].source, "web");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_three_malformed_responses_exhaust() {
        let llm = Arc::new(ScriptedLlm::texts(&["nope", "{\"components\": \"x\"}", "still no"]));
        let analyzer = ArchitectureAnalyzer::new(llm.clone()).with_max_attempts(3);

        match analyzer.analyze(&context()).await {
            Err(AnalysisError::MalformedResponse { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_sends_correction() {
        let llm = Arc::new(ScriptedLlm::texts(&["not json", VALID]));
        let analyzer = ArchitectureAnalyzer::new(llm.clone());

        let outcome = analyzer.run(&context()).await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Parsed(_)));

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("# Correction"));
        assert!(prompts[1].contains("# Correction"));
        assert!(prompts[1].contains("app.py"));
    }

    #[tokio::test]
    async fn test_configured_instructions_reach_every_prompt() {
        let llm = Arc::new(ScriptedLlm::texts(&["not json", VALID]));
        let config = LlmConfig {
            instructions: Some("Treat plugins/ as one component".to_string()),
            ..Default::default()
        };
        let analyzer = ArchitectureAnalyzer::from_config(llm.clone(), &config);

        analyzer.analyze(&context()).await.unwrap();

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|p| p.contains("# Additional Guidance")));
        assert!(prompts.iter().all(|p| p.contains("Treat plugins/ as one component")));
    }

    #[tokio::test]
    async fn test_empty_component_list_is_malformed() {
        let llm = Arc::new(ScriptedLlm::texts(&[r#"{"components": []}"#]));
        let analyzer = ArchitectureAnalyzer::new(llm).with_max_attempts(1);
        let outcome = analyzer.run(&context()).await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Exhausted { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_not_retried() {
        let llm = Arc::new(ScriptedLlm::failing(ErrorCategory::RateLimit));
        let analyzer = ArchitectureAnalyzer::new(llm.clone());

        let err = analyzer.analyze(&context()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::TransportFailure(_)));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_auth_missing() {
        let llm = Arc::new(ScriptedLlm::failing(ErrorCategory::Auth));
        let err = ArchitectureAnalyzer::new(llm)
            .analyze(&context())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::AuthMissing(_)));
    }

    #[test]
    fn test_parse_graph_drops_dangling_connection() {
        let graph = parse_graph(
            r#"{"components": [{"name": "Api"}], "connections": [{"source": "Api", "target": "Ghost"}]}"#,
        )
        .unwrap();
        assert_eq!(graph.components[0].id, "api");
        assert!(graph.connections.is_empty());
    }
}
