//! Prompt templates for Tubecoach.
//!
//! Prompts can be customized by placing an `analysis.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Placeholders filled by the analysis pipeline itself.
const RESERVED_VARIABLES: &[&str] = &["context", "questions"];

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub analysis: AnalysisPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// One entry of the analysis checklist.
///
/// The label is what the model is asked to echo in its reply, so it doubles
/// as the section marker the extractor looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub question: String,
}

impl ChecklistItem {
    fn new(label: &str, question: &str) -> Self {
        Self {
            label: label.to_string(),
            question: question.to_string(),
        }
    }

    /// The label as it appears in a reply, e.g. `Thumbnail Prompt:`.
    pub fn marker(&self) -> String {
        format!("{}:", self.label)
    }
}

/// Literal start and end markers delimiting one section of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLabels {
    pub start: String,
    pub end: String,
}

impl SectionLabels {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Prompts for transcript analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPrompts {
    /// Instruction template; `{{context}}` and `{{questions}}` are substituted.
    pub template: String,
    /// Ordered checklist of analysis questions.
    pub checklist: Vec<ChecklistItem>,
    /// Label of the checklist item whose answer describes the thumbnail.
    pub thumbnail_label: String,
}

impl Default for AnalysisPrompts {
    fn default() -> Self {
        Self {
            template: r#"You are an engaging, humorous expert content editor.
Your first task is to provide a concise 4-6 sentence summary of the given text as if you were preparing an introduction for a personal blog post. Begin your summary with a phrase such as 'In this post' or 'In this interview,' setting the stage for what the reader can expect.
Your second task is to provide your responses to the following inquiries in the form of bullet points. Start each answer with its label exactly as written, followed by a colon.

{{context}}

Provide Summary Here:

Answer Tasks Here:
{{questions}}"#
                .to_string(),

            checklist: vec![
                ChecklistItem::new(
                    "Engaging Title",
                    "Propose a list of catchy and appealing titles that encapsulate the essence of the content.",
                ),
                ChecklistItem::new(
                    "SEO Tags",
                    "Identify a list of SEO-friendly tags that are relevant to the content and could improve its searchability.",
                ),
                ChecklistItem::new(
                    "Thumbnail Prompt",
                    "Generate a prompt that describes the elements of an eye-catching thumbnail that would compel viewers to click.",
                ),
                ChecklistItem::new(
                    "Content Enhancement",
                    "Offer specific suggestions on how the content could be improved for viewer engagement and retention.",
                ),
                ChecklistItem::new(
                    "Viral Segment",
                    "Identify and provide the best section that might have the potential to be engaging or entertaining for a short-form viral video based on factors like humor, uniqueness, relatability, or other notable elements.",
                ),
                ChecklistItem::new(
                    "Viral Segment Explanation",
                    "After you provide the segment, explain why.",
                ),
            ],

            thumbnail_label: "Thumbnail Prompt".to_string(),
        }
    }
}

impl AnalysisPrompts {
    /// Render the checklist as a numbered list.
    pub fn render_checklist(&self) -> String {
        self.checklist
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}: {}", i + 1, item.label, item.question))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Markers bounding the answer to the checklist item named `label`.
    ///
    /// The end marker is the label of the item that follows it, so the last
    /// item has no extractable section.
    pub fn section_labels(&self, label: &str) -> Option<SectionLabels> {
        let idx = self.checklist.iter().position(|item| item.label == label)?;
        let next = self.checklist.get(idx + 1)?;
        Some(SectionLabels::new(self.checklist[idx].marker(), next.marker()))
    }

    /// Markers bounding the thumbnail description.
    pub fn thumbnail_labels(&self) -> Option<SectionLabels> {
        self.section_labels(&self.thumbnail_label)
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let analysis_path = custom_path.join("analysis.toml");
            if analysis_path.exists() {
                let content = std::fs::read_to_string(&analysis_path)?;
                prompts.analysis = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    ///
    /// Config variables named like a built-in placeholder are ignored, so a
    /// `context` entry can never replace the transcript.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged: HashMap<String, String> = self
            .variables
            .iter()
            .filter(|(key, _)| !RESERVED_VARIABLES.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_checklist() {
        let prompts = Prompts::default();
        assert_eq!(prompts.analysis.checklist.len(), 6);
        assert!(prompts.analysis.template.contains("{{context}}"));
        assert!(prompts.analysis.template.contains("{{questions}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_config_variables_cannot_shadow_placeholders() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("context".to_string(), "my channel context".to_string());
        prompts
            .variables
            .insert("channel".to_string(), "Cat Corner".to_string());

        let rendered = prompts.render_with_custom("{{channel}} {{context}}", &HashMap::new());
        assert_eq!(rendered, "Cat Corner {{context}}");
    }

    #[test]
    fn test_thumbnail_labels_follow_checklist() {
        let analysis = AnalysisPrompts::default();
        assert_eq!(
            analysis.thumbnail_labels(),
            Some(SectionLabels::new("Thumbnail Prompt:", "Content Enhancement:"))
        );
    }

    #[test]
    fn test_renamed_checklist_item_moves_labels() {
        let mut analysis = AnalysisPrompts::default();
        analysis.checklist[3].label = "Improvements".to_string();
        assert_eq!(
            analysis.thumbnail_labels().map(|l| l.end),
            Some("Improvements:".to_string())
        );
    }

    #[test]
    fn test_last_item_has_no_section() {
        let analysis = AnalysisPrompts::default();
        assert!(analysis.section_labels("Viral Segment Explanation").is_none());
        assert!(analysis.section_labels("Missing").is_none());
    }

    #[test]
    fn test_render_checklist_numbering() {
        let rendered = AnalysisPrompts::default().render_checklist();
        assert!(rendered.starts_with("1. Engaging Title: "));
        assert!(rendered.contains("\n3. Thumbnail Prompt: "));
        assert!(rendered.contains("\n6. Viral Segment Explanation: "));
    }
}
