//! Builds the analysis prompt sent for a transcript or document.

use crate::config::{AnalysisPrompts, Prompts};
use std::collections::HashMap;

/// Renders the analysis template around a piece of context text.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prompts: Prompts,
}

impl PromptBuilder {
    pub fn new(prompts: Prompts) -> Self {
        Self { prompts }
    }

    pub fn analysis(&self) -> &AnalysisPrompts {
        &self.prompts.analysis
    }

    /// Build the prompt for `context`.
    ///
    /// The context is inserted last so that any `{{...}}` sequences inside a
    /// transcript are left untouched.
    pub fn build(&self, context: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert(
            "questions".to_string(),
            self.prompts.analysis.render_checklist(),
        );

        let rendered = self
            .prompts
            .render_with_custom(&self.prompts.analysis.template, &vars);

        rendered.replace("{{context}}", context)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Prompts::default())
    }
}
