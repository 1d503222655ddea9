//! Repository Analysis
//!
//! - [`scanner`]: bounded, deterministic context harvesting
//! - [`architecture`]: LLM-backed architecture inference with a bounded retry loop

pub mod architecture;
mod prompts;
pub mod scanner;

pub use architecture::{AnalysisOutcome, ArchitectureAnalyzer, parse_graph};
pub use scanner::Harvester;
