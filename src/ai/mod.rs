//! AI Integration Layer
//!
//! LLM providers, prompt construction, response repair, and timeouts.

pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod validation;

pub use prompt::{PromptBuilder, PromptSection};
pub use provider::{
    GeminiProvider, LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider, ResponseMetadata,
    ResponseTiming, SharedProvider, TokenUsage, create_provider,
};
pub use timeout::{with_timeout, with_timeout_or};
pub use validation::{JsonRepairer, RepairError, extract_json_from_response};
