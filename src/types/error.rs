//! Unified Error Type System
//!
//! Centralized error types for the whole pipeline.
//!
//! ## Layers
//!
//! - [`ErrorCategory`] / [`LlmError`]: transport-level classification used by
//!   every HTTP-backed provider to decide between retry and fallback
//! - [`AnalysisError`]: typed exits of the architecture analysis stage
//! - [`GenerationError`]: per-tier failures of the image generation chain
//! - [`PipelineError`]: a stage-fatal failure tagged with the stage it came from
//! - [`ArtistError`]: the crate-wide error enum

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::types::image::Tier;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for retry and fallback decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited or quota exhausted
    RateLimit,
    /// Prompt too large for the model
    TokenLimit,
    /// Missing or rejected credentials
    Auth,
    /// Connectivity issues and timeouts
    Network,
    /// Endpoint or model not found
    Unavailable,
    /// Invalid request, retrying will not help
    BadRequest,
    /// Response body could not be decoded
    ParseError,
    /// Temporary server-side failure
    Transient,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether the same request may succeed if simply sent again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network | Self::Transient)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Provider error with category, context, and retry hint
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
    /// Suggested wait time before retry (from `Retry-After` or the category)
    pub retry_after: Option<Duration>,
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw transport failures onto [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status code
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            413 => LlmError::with_provider(ErrorCategory::TokenLimit, message, provider),
            408 | 500 | 502 | 503 | 504 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
                    .retry_after(Duration::from_secs(2))
            }
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a reqwest send/receive failure
    pub fn classify_reqwest(err: &reqwest::Error, provider: &str) -> LlmError {
        if let Some(status) = err.status() {
            return Self::classify_http_status(status.as_u16(), &err.to_string(), provider);
        }
        if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            return LlmError::with_provider(ErrorCategory::Network, err.to_string(), provider);
        }
        if err.is_decode() {
            return LlmError::with_provider(ErrorCategory::ParseError, err.to_string(), provider);
        }
        LlmError::with_provider(ErrorCategory::Unknown, err.to_string(), provider)
    }
}

// =============================================================================
// Analysis Error
// =============================================================================

/// Typed exits of the architecture analysis stage
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Every attempt produced text that did not parse into a usable graph.
    /// Callers may fall back to a cached architecture.
    #[error("model returned malformed architecture JSON after {attempts} attempts: {last_error}")]
    MalformedResponse { attempts: u32, last_error: String },

    /// Network, quota, or server failure. Never retried by the analyzer.
    #[error("analysis transport failure: {0}")]
    TransportFailure(LlmError),

    #[error("analysis credentials missing: {0}")]
    AuthMissing(String),
}

impl AnalysisError {
    /// Route a provider failure to the analysis exit it maps to
    pub fn from_llm(err: LlmError) -> Self {
        match err.category {
            ErrorCategory::Auth => Self::AuthMissing(err.to_string()),
            _ => Self::TransportFailure(err),
        }
    }
}

// =============================================================================
// Generation Error
// =============================================================================

/// Failure kinds an image tier can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    AuthMissing,
    QuotaExceeded,
    TransportFailure,
    ProviderRejected,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthMissing => write!(f, "auth missing"),
            Self::QuotaExceeded => write!(f, "quota exceeded"),
            Self::TransportFailure => write!(f, "transport failure"),
            Self::ProviderRejected => write!(f, "provider rejected"),
        }
    }
}

impl From<ErrorCategory> for GenerationErrorKind {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Auth => Self::AuthMissing,
            ErrorCategory::RateLimit => Self::QuotaExceeded,
            ErrorCategory::Network | ErrorCategory::Transient => Self::TransportFailure,
            _ => Self::ProviderRejected,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{tier} tier ({provider}) failed, {kind}: {message}")]
pub struct GenerationError {
    pub tier: Tier,
    pub provider: String,
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(
        tier: Tier,
        provider: impl Into<String>,
        kind: GenerationErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tier,
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_llm(tier: Tier, err: LlmError) -> Self {
        let provider = err.provider.clone().unwrap_or_else(|| tier.to_string());
        Self::new(tier, provider, err.category.into(), err.message)
    }

    /// Only transport failures are worth another attempt on the same tier
    pub fn is_transient(&self) -> bool {
        self.kind == GenerationErrorKind::TransportFailure
    }
}

// =============================================================================
// Pipeline Error
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Analyze,
    Generate,
    Update,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analyze => write!(f, "analyze"),
            Self::Generate => write!(f, "generate"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Stage-fatal pipeline failure
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: Box<ArtistError>,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: impl Into<ArtistError>) -> Self {
        Self {
            stage,
            source: Box::new(source.into()),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ArtistError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Stage Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("all image tiers failed: {}", summarize(.failures))]
    GenerationExhausted { failures: Vec<GenerationError> },

    #[error(transparent)]
    Pipeline(#[from] Box<PipelineError>),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Cache corrupted at {path}: {message}")]
    CacheCorruption { path: String, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Workspace error: {0}")]
    Workspace(String),
}

impl From<LlmError> for ArtistError {
    fn from(err: LlmError) -> Self {
        ArtistError::Llm(err)
    }
}

impl From<PipelineError> for ArtistError {
    fn from(err: PipelineError) -> Self {
        ArtistError::Pipeline(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ArtistError>;

impl ArtistError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn cache_corruption(path: &std::path::Path, message: impl fmt::Display) -> Self {
        Self::CacheCorruption {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}

fn summarize(failures: &[GenerationError]) -> String {
    if failures.is_empty() {
        return "no tiers attempted".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Tests
// =============================================================================
