//! Prompt Builder
//!
//! Structured construction of LLM prompts: a role, numbered objectives,
//! headed text sections, code blocks, and hard output rules. Sections render
//! in insertion order so the same inputs always produce the same prompt.

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    Role { expertise: String, task: String },
    Objectives(Vec<String>),
    Text {
        header: Option<String>,
        content: String,
    },
    Code { language: String, content: String },
    /// Non-negotiable output constraints
    Rules(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: &[&str]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.to_string()).collect(),
        ));
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Text section with a `#` header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn rules(mut self, rules: &[&str]) -> Self {
        self.sections
            .push(PromptSection::Rules(rules.iter().map(|r| r.to_string()).collect()));
        self
    }

    /// Append a section only when `content` is present
    pub fn section_if(self, header: &str, content: Option<&str>) -> Self {
        match content {
            Some(c) if !c.trim().is_empty() => self.section(header, c),
            _ => self,
        }
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!("You are an expert {} who {}.\n", expertise, task));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(content.trim_end());
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(content.trim_end());
                    prompt.push_str("\n```\n\n");
                }
                PromptSection::Rules(rules) => {
                    prompt.push_str("<RULES>\n");
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_render_in_order() {
        let prompt = PromptBuilder::new()
            .role("software architect", "reads repositories")
            .objectives(&["Find components", "Find connections"])
            .section("Files", "src/main.rs")
            .code("json", "{}")
            .rules(&["Return JSON only"])
            .build();

        let role = prompt.find("<ROLE>").unwrap();
        let objectives = prompt.find("1. Find components").unwrap();
        let files = prompt.find("# Files").unwrap();
        let code = prompt.find("```json").unwrap();
        let rules = prompt.find("- Return JSON only").unwrap();
        assert!(role < objectives && objectives < files && files < code && code < rules);
        assert!(!prompt.ends_with('\n'));
    }

    #[test]
    fn test_section_if_skips_empty() {
        let prompt = PromptBuilder::new()
            .text("base")
            .section_if("Extra", None)
            .section_if("Blank", Some("  "))
            .build();
        assert_eq!(prompt, "base");
    }
}
