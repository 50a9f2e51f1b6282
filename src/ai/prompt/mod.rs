//! Prompt Builder
//!
//! Section-based prompt construction for the direct review provider.
//! The system prompt pins the JSON shape the parser expects; the user
//! prompt carries the language and the fenced source.

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Raw text paragraph
    Text(String),
    /// Bulleted rules
    Rules(Vec<String>),
    /// Fenced code block
    Code(String),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Text(content.into()));
        self
    }

    pub fn rules(mut self, rules: &[&str]) -> Self {
        self.sections.push(PromptSection::Rules(
            rules.iter().map(|r| r.to_string()).collect(),
        ));
        self
    }

    pub fn code(mut self, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Code(content.into()));
        self
    }

    pub fn build(self) -> String {
        self.sections
            .into_iter()
            .map(|section| match section {
                PromptSection::Text(text) => text,
                PromptSection::Rules(rules) => {
                    let mut out = String::from("Rules:");
                    for rule in rules {
                        out.push_str("\n• ");
                        out.push_str(&rule);
                    }
                    out
                }
                PromptSection::Code(code) => format!("```\n{}\n```", code),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

const RESPONSE_SHAPE: &str = r#"{
"score": number from 0 to 10,
"summary": "short explanation of code quality",
"suggestions": [
{ "line": number, "suggestion": "clear improvement advice" }
]
}"#;

/// System prompt demanding the structured review shape
pub fn review_system_prompt() -> String {
    PromptBuilder::new()
        .text("You are a senior developer reviewing code.")
        .text(format!("Return ONLY JSON in this format:\n\n{}", RESPONSE_SHAPE))
        .rules(&[
            "Always give at least 2 suggestions",
            "Score must reflect real quality",
            "Focus on readability, structure, performance, best practices",
            "Return ONLY JSON",
        ])
        .build()
}

/// User prompt embedding the language (if known) and the fenced code
pub fn review_user_prompt(code: &str, language: Option<&str>) -> String {
    let mut builder = PromptBuilder::new().text("Analyze this code and return structured JSON:");
    if let Some(language) = language {
        builder = builder.text(format!("Language: {}", language));
    }
    builder
        .code(code)
        .text("Return ONLY valid JSON. No markdown, no explanations.")
        .build()
}
