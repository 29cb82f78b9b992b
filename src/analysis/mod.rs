//! Prompt construction and reply parsing for transcript analysis.

mod extract;
mod prompt;

pub use extract::{extract_section, SectionExtractor};
pub use prompt::PromptBuilder;
