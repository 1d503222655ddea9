//! Architecture analysis prompts

use crate::ai::PromptBuilder;
use crate::types::CodeContext;

const SCHEMA: &str = r#"{
  "system_summary": "1-2 sentence description of what this system does",
  "style_hint": "optional: minimalist | cyberpunk | corporate | sketch | glassmorphism",
  "components": [
    {
      "id": "short_alphanumeric_id",
      "name": "Human readable component name",
      "type": "frontend | backend | api | database | queue | cache | worker | cli | ai_model | external_service | storage | other",
      "description": "1 sentence describing what this component does"
    }
  ],
  "connections": [
    {
      "source": "component_id",
      "target": "component_id",
      "label": "short description of the data or control flow"
    }
  ]
}"#;

const RULES: &[&str] = &[
    "Use ONLY the keys shown in the schema",
    "Every connection source and target MUST be an id from \"components\"",
    "Prefer 3-7 components; merge minor pieces into larger logical units",
    "The response MUST be raw JSON: no markdown, no code fences, no comments, no extra text",
];

/// First-attempt prompt: role, schema, rules, then the harvested context.
pub fn analysis_prompt(context: &CodeContext, extra: Option<&str>) -> String {
    base(context, extra).build()
}

/// Retry prompt: identical context, plus a correction naming the last failure.
pub fn correction_prompt(context: &CodeContext, extra: Option<&str>, last_error: &str) -> String {
    base(context, extra)
        .section(
            "Correction",
            &format!(
                "Your last response was invalid JSON ({}). Return ONLY valid JSON matching the schema above.",
                last_error
            ),
        )
        .build()
}

fn base(context: &CodeContext, extra: Option<&str>) -> PromptBuilder {
    PromptBuilder::new()
        .role(
            "software architect",
            "infers the high-level architecture of a repository from its files",
        )
        .objectives(&[
            "Identify the major runtime components (frontend, backend/api, databases, workers, external APIs, AI models)",
            "Identify the data or control flow between them",
            "Summarize what the system does",
        ])
        .section("Output Schema", "Return a single JSON object with this structure:")
        .code("json", SCHEMA)
        .rules(RULES)
        .section_if("Additional Guidance", extra)
        .section("Repository", &context.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContextFile;

    fn context() -> CodeContext {
        CodeContext {
            files: vec![ContextFile {
                path: "src/main.rs".to_string(),
                content: "fn main() {}".to_string(),
                truncated: false,
            }],
            omitted: 0,
        }
    }

    #[test]
    fn test_prompt_embeds_context_and_schema() {
        let prompt = analysis_prompt(&context(), None);
        assert!(prompt.contains("src/main.rs"));
        assert!(prompt.contains("\"connections\""));
        assert!(!prompt.contains("Correction"));
    }

    #[test]
    fn test_correction_keeps_context() {
        let first = analysis_prompt(&context(), Some("focus on services"));
        let retry = correction_prompt(&context(), Some("focus on services"), "EOF while parsing");
        assert!(retry.starts_with(&first));
        assert!(retry.contains("EOF while parsing"));
    }
}
