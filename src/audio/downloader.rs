//! Audio download for caption-less videos.
//!
//! Uses yt-dlp (with ffmpeg for the MP3 conversion) to pull the audio track.

use crate::error::{Result, TubecoachError};
use crate::source::run_ytdlp;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Downloads audio from a URL and saves it as MP3.
///
/// Always downloads; callers pass a directory they own.
#[instrument(skip(output_dir), fields(video_id = %video_id))]
pub async fn download_audio(url: &str, video_id: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    info!("Downloading audio from {}", url);

    let template = output_dir.join(format!("{}.%(ext)s", video_id));
    let template = template.to_string_lossy();

    let output = run_ytdlp(&[
        "--extract-audio",
        "--audio-format",
        "mp3",
        "--audio-quality",
        "5",
        "--output",
        &template,
        "--no-playlist",
        "--quiet",
        "--no-warnings",
        url,
    ])
    .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TubecoachError::Acquisition(format!(
            "yt-dlp audio download failed: {}",
            stderr.trim()
        )));
    }

    find_audio_file(output_dir, video_id)
}

/// Locates a downloaded audio file by video ID.
fn find_audio_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    for ext in &["mp3", "opus", "m4a", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(TubecoachError::Acquisition(
        "Audio file not found after download".into(),
    ))
}
