//! Configuration module for Tubecoach.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnalysisPrompts, ChecklistItem, Prompts, SectionLabels};
pub use settings::{
    ChatProfile, ChatSettings, GeneralSettings, ImageProvider, ImageSettings, ModelParams,
    PromptSettings, Settings, YoutubeSettings,
};
