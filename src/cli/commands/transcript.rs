//! Transcript command: fetch and save a video's transcript.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::export::{export_transcript, export_transcript_to};
use crate::source::{TranscriptSource, YoutubeSource};
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(video: &str, output: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcript) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let source = YoutubeSource::with_settings(
        &settings.youtube,
        std::env::temp_dir().join("tubecoach"),
    );

    let spinner = Output::spinner("Fetching transcript...");
    let result = source.fetch(video).await;
    spinner.finish_and_clear();
    let transcript = result?;

    let path = match output.as_deref() {
        Some("-") => {
            println!("{}", transcript.text);
            return Ok(());
        }
        Some(path) => export_transcript_to(&transcript, &Settings::expand_path(path))?,
        None => export_transcript(&transcript, &settings.export_dir())?,
    };

    Output::success(&format!(
        "Saved transcript of {} to {}",
        transcript.title.as_deref().unwrap_or(&transcript.id),
        path.display()
    ));
    Output::kv("Characters", &transcript.text.chars().count().to_string());

    Ok(())
}

