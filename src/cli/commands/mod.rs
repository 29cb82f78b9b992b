//! CLI command implementations.

mod analyze;
mod chat;
mod config;
mod doctor;
mod serve;
mod transcript;

pub use analyze::run_analyze;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;
pub use transcript::run_transcript;

use crate::cli::Output;
use crate::illustration::Illustration;
use crate::orchestrator::TurnOutcome;
use std::path::Path;

/// Print a turn's reply and save its illustration under `dir`.
pub(crate) fn print_outcome(outcome: &TurnOutcome, dir: &Path, stem: &str) {
    Output::turn("Tubecoach", &outcome.reply);

    if let Some(path) = &outcome.exported_transcript {
        Output::kv("Transcript", &path.display().to_string());
    }

    if let Some(illustration) = &outcome.illustration {
        save_illustration(illustration, dir, stem);
    }
}

fn save_illustration(illustration: &Illustration, dir: &Path, stem: &str) {
    match illustration.save(dir, stem) {
        Ok(path) => Output::success(&format!("Thumbnail saved to {}", path.display())),
        Err(e) => Output::warning(&format!("Could not save thumbnail: {}", e)),
    }
}
