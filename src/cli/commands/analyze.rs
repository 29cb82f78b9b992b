//! One-shot analysis of a video or document.

use super::print_outcome;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::source::is_document_input;
use anyhow::Result;
use std::path::PathBuf;

/// Run the analyze command.
pub async fn run_analyze(
    input: &str,
    profile: Option<&str>,
    image_out: Option<String>,
    settings: Settings,
) -> Result<()> {
    let is_document = is_document_input(input);
    let operation = if is_document {
        Operation::Chat
    } else {
        Operation::Video
    };

    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubecoach doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut orchestrator = Orchestrator::new(&settings, profile)?;

    let spinner = if is_document {
        Output::spinner(&format!("Reviewing {}...", input))
    } else {
        Output::spinner("Fetching transcript and reviewing video...")
    };
    let result = if is_document {
        orchestrator.submit_document(input).await
    } else {
        orchestrator.submit_video(input).await
    };
    spinner.finish_and_clear();

    let outcome = result?;

    if let Some(transcript) = &outcome.transcript {
        Output::header(transcript.title.as_deref().unwrap_or(&transcript.id));
    }

    let (dir, stem) = match image_out.as_deref().map(Settings::expand_path) {
        Some(path) => (
            path.parent().map(PathBuf::from).unwrap_or_default(),
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| orchestrator.session_id().to_string()),
        ),
        None => (
            settings.illustration_dir(),
            orchestrator.session_id().to_string(),
        ),
    };

    print_outcome(&outcome, &dir, &stem);

    if outcome.illustration.is_none() && settings.image.enabled {
        Output::info("No thumbnail was generated for this reply.");
    }

    Ok(())
}
