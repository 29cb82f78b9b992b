//! Transcript acquisition.
//!
//! Provides a trait-based interface over the places a transcript can come
//! from: a YouTube video (captions, or Whisper as a fallback) or a document
//! the user supplies.

mod captions;
mod document;
mod whisper;
mod youtube;

pub use captions::vtt_to_text;
pub use document::{decode_document, DocumentSource};
pub use youtube::{pick_caption_track, CaptionTrack, YoutubeSource};
pub(crate) use youtube::run_ytdlp;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    YouTube,
    Document,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::YouTube => write!(f, "youtube"),
            SourceKind::Document => write!(f, "document"),
        }
    }
}

/// Plain-text transcript and what it was fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Video id or document name.
    pub id: String,
    /// Video title, when known.
    pub title: Option<String>,
    pub kind: SourceKind,
    pub text: String,
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Check if this source can handle the given input.
    fn can_handle(&self, input: &str) -> bool;

    /// Fetch the transcript for a reference (URL, id or path).
    async fn fetch(&self, reference: &str) -> Result<Transcript>;
}

/// Whether `input` looks like something the document source should read.
pub fn is_document_input(input: &str) -> bool {
    DocumentSource::new().can_handle(input)
}
