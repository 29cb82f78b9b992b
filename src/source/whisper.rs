//! Whisper transcription for videos without captions.

use crate::audio::download_audio;
use crate::error::{Result, TubecoachError};
use crate::openai::create_client;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, instrument};

/// Download a video's audio and transcribe it to plain text.
///
/// Each call downloads into its own scratch directory under `temp_dir`,
/// removed when the call returns.
#[instrument(skip(temp_dir))]
pub async fn transcribe_video(
    url: &str,
    video_id: &str,
    model: &str,
    temp_dir: &Path,
) -> Result<String> {
    let work_dir = scratch_dir(temp_dir)?;
    let audio_path = download_audio(url, video_id, work_dir.path()).await?;
    let file_bytes = tokio::fs::read(&audio_path).await?;
    debug!("Transcribing {} bytes of audio", file_bytes.len());

    let file_name = audio_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.mp3")
        .to_string();

    let request = CreateTranscriptionRequestArgs::default()
        .file(AudioInput::from_vec_u8(file_name, file_bytes))
        .model(model)
        .build()
        .map_err(|e| TubecoachError::Acquisition(format!("Failed to build request: {}", e)))?;

    let response = create_client()?
        .audio()
        .transcribe(request)
        .await
        .map_err(|e| TubecoachError::Acquisition(format!("Whisper API error: {}", e)))?;

    Ok(response.text.trim().to_string())
}

fn scratch_dir(temp_dir: &Path) -> Result<TempDir> {
    std::fs::create_dir_all(temp_dir)?;
    Ok(tempfile::Builder::new()
        .prefix("whisper-")
        .tempdir_in(temp_dir)?)
}
