//! YouTube transcript source.
//!
//! Captions are pulled with yt-dlp. Manually authored tracks win over
//! auto-generated ones; when a video has neither, the audio can optionally
//! be transcribed with Whisper.

use super::{captions::vtt_to_text, whisper, SourceKind, Transcript, TranscriptSource};
use crate::config::YoutubeSettings;
use crate::error::{Result, TubecoachError};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// A caption track chosen from the video's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    /// Language key as yt-dlp reports it (e.g. `en`, `en-US`).
    pub language: String,
    /// Whether the track is auto-generated.
    pub automatic: bool,
}

/// YouTube transcript source.
pub struct YoutubeSource {
    video_id_regex: Regex,
    languages: Vec<String>,
    whisper_model: Option<String>,
    temp_dir: PathBuf,
}

impl YoutubeSource {
    pub fn new() -> Self {
        Self::with_settings(&YoutubeSettings::default(), std::env::temp_dir().join("tubecoach"))
    }

    pub fn with_settings(settings: &YoutubeSettings, temp_dir: PathBuf) -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            languages: settings.languages.clone(),
            whisper_model: settings
                .whisper_fallback
                .then(|| settings.whisper_model.clone()),
            temp_dir,
        }
    }

    /// Extract video ID from a YouTube URL or bare ID.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let input = input.trim();

        // Watch URLs may carry `v` anywhere in the query string
        if let Ok(parsed) = url::Url::parse(input) {
            let is_youtube = parsed
                .host_str()
                .is_some_and(|h| h == "youtube.com" || h.ends_with(".youtube.com"));
            if is_youtube && parsed.path() == "/watch" {
                if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
                    if self.video_id_regex.is_match(&v) {
                        return Some(v.into_owned());
                    }
                }
            }
        }

        let caps = self.video_id_regex.captures(input)?;

        // Try group 1 (URL format) then group 2 (bare ID)
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch video metadata (title, available caption tracks) using yt-dlp.
    async fn fetch_info(&self, url: &str) -> Result<Value> {
        let output = run_ytdlp(&["--dump-json", "--no-download", "--no-warnings", url]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TubecoachError::Acquisition(format!(
                "Video not found or unavailable: {}",
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            TubecoachError::Acquisition(format!("Failed to parse yt-dlp output: {}", e))
        })
    }

    /// Download one caption track and flatten it to text.
    #[instrument(skip(self, url))]
    async fn download_captions(
        &self,
        url: &str,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Result<String> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let work_dir = tempfile::tempdir_in(&self.temp_dir)?;
        let template = work_dir.path().join("%(id)s.%(ext)s");
        let template = template.to_string_lossy();

        let write_flag = if track.automatic {
            "--write-auto-subs"
        } else {
            "--write-subs"
        };

        let output = run_ytdlp(&[
            "--skip-download",
            write_flag,
            "--sub-langs",
            &track.language,
            "--sub-format",
            "vtt",
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
                "Caption download failed: {}",
                stderr.trim()
            )));
        }

        let vtt_path = find_caption_file(work_dir.path(), video_id)?;
        let vtt = std::fs::read_to_string(&vtt_path)?;
        debug!("Read {} bytes of captions from {:?}", vtt.len(), vtt_path);

        Ok(vtt_to_text(&vtt))
    }

    async fn fetch_transcript(&self, reference: &str) -> Result<Transcript> {
        let video_id = self.extract_video_id(reference).ok_or_else(|| {
            TubecoachError::Acquisition(format!("Invalid YouTube video ID or URL: {}", reference))
        })?;
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let info = self.fetch_info(&url).await?;
        let title = info["title"].as_str().map(|s| s.to_string());

        let text = match pick_caption_track(&info, &self.languages) {
            Some(track) => {
                info!(
                    "Using {} captions ({})",
                    if track.automatic { "auto-generated" } else { "manual" },
                    track.language
                );
                self.download_captions(&url, &video_id, &track).await?
            }
            None => match &self.whisper_model {
                Some(model) => {
                    warn!("No captions for {}, transcribing audio with {}", video_id, model);
                    whisper::transcribe_video(&url, &video_id, model, &self.temp_dir).await?
                }
                None => {
                    return Err(TubecoachError::Acquisition(format!(
                        "No captions available for {} in: {}",
                        video_id,
                        self.languages.join(", ")
                    )))
                }
            },
        };

        if text.trim().is_empty() {
            return Err(TubecoachError::Acquisition(format!(
                "Transcript for {} is empty",
                video_id
            )));
        }

        Ok(Transcript {
            id: video_id,
            title,
            kind: SourceKind::YouTube,
            text,
        })
    }
}

impl Default for YoutubeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for YoutubeSource {
    fn can_handle(&self, input: &str) -> bool {
        self.extract_video_id(input).is_some()
    }

    #[instrument(skip(self))]
    async fn fetch(&self, reference: &str) -> Result<Transcript> {
        self.fetch_transcript(reference).await.map_err(|e| match e {
            TubecoachError::Acquisition(_) => e,
            other => TubecoachError::Acquisition(other.to_string()),
        })
    }
}

/// Pick the best caption track for the preferred languages.
///
/// Manual tracks in any preferred language beat auto-generated ones. Within
/// a kind, an exact language key beats a regional variant (`en` over `en-GB`).
pub fn pick_caption_track(info: &Value, languages: &[String]) -> Option<CaptionTrack> {
    for (field, automatic) in [("subtitles", false), ("automatic_captions", true)] {
        let Some(tracks) = info[field].as_object() else {
            continue;
        };

        for lang in languages {
            if tracks.contains_key(lang.as_str()) {
                return Some(CaptionTrack {
                    language: lang.clone(),
                    automatic,
                });
            }

            let prefix = format!("{}-", lang);
            let mut variants: Vec<&String> =
                tracks.keys().filter(|k| k.starts_with(&prefix)).collect();
            variants.sort();
            if let Some(key) = variants.first() {
                return Some(CaptionTrack {
                    language: (*key).clone(),
                    automatic,
                });
            }
        }
    }

    None
}

/// Locate the caption file yt-dlp wrote for a video.
fn find_caption_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| TubecoachError::Acquisition(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(video_id) && name.ends_with(".vtt") {
            return Ok(entry.path());
        }
    }

    Err(TubecoachError::Acquisition(
        "Caption file not found after download".into(),
    ))
}

/// Run yt-dlp and capture its output.
pub(crate) async fn run_ytdlp(args: &[&str]) -> Result<std::process::Output> {
    Command::new("yt-dlp")
        .args(args)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TubecoachError::ToolNotFound("yt-dlp".to_string())
            } else {
                TubecoachError::Acquisition(format!("Failed to run yt-dlp: {}", e))
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_video_id() {
        let source = YoutubeSource::new();

        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("  dQw4w9WgXcQ  "),
            Some("dQw4w9WgXcQ".to_string())
        );

        assert_eq!(source.extract_video_id("not-a-video-id"), None);
        assert_eq!(source.extract_video_id(""), None);
        assert_eq!(source.extract_video_id("abc123"), None);
    }

    #[test]
    fn test_extract_video_id_from_query() {
        let source = YoutubeSource::new();
        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://m.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_can_handle() {
        let source = YoutubeSource::new();
        assert!(source.can_handle("dQw4w9WgXcQ"));
        assert!(source.can_handle("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!source.can_handle("/path/to/notes.txt"));
    }

    #[test]
    fn test_manual_captions_preferred() {
        let info = json!({
            "subtitles": {"en": [{}]},
            "automatic_captions": {"en": [{}]}
        });
        assert_eq!(
            pick_caption_track(&info, &langs(&["en"])),
            Some(CaptionTrack {
                language: "en".to_string(),
                automatic: false
            })
        );
    }

    #[test]
    fn test_auto_captions_fallback_and_variants() {
        let info = json!({
            "subtitles": {},
            "automatic_captions": {"en-orig": [{}], "de": [{}]}
        });
        assert_eq!(
            pick_caption_track(&info, &langs(&["fr", "en"])),
            Some(CaptionTrack {
                language: "en-orig".to_string(),
                automatic: true
            })
        );
    }

    #[test]
    fn test_language_order_respected() {
        let info = json!({"subtitles": {"en": [{}], "de": [{}]}});
        assert_eq!(
            pick_caption_track(&info, &langs(&["de", "en"])).map(|t| t.language),
            Some("de".to_string())
        );
    }

    #[test]
    fn test_no_captions() {
        let info = json!({"title": "Silent film"});
        assert_eq!(pick_caption_track(&info, &langs(&["en"])), None);
    }

    #[test]
    fn test_find_caption_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dQw4w9WgXcQ.en.vtt"), "WEBVTT\n").unwrap();
        let found = find_caption_file(dir.path(), "dQw4w9WgXcQ").unwrap();
        assert!(found.ends_with("dQw4w9WgXcQ.en.vtt"));

        assert!(find_caption_file(dir.path(), "other").is_err());
    }

    #[tokio::test]
    async fn test_invalid_reference_is_acquisition_error() {
        let err = YoutubeSource::new().fetch("abc123").await.unwrap_err();
        assert!(matches!(err, TubecoachError::Acquisition(_)));
    }
}
