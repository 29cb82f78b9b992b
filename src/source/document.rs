//! User-supplied document source.

use super::{SourceKind, Transcript, TranscriptSource};
use crate::error::{Result, TubecoachError};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Extensions accepted as documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md", "text", "vtt", "srt", "csv", "json"];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Reads a text document from disk.
pub struct DocumentSource;

impl DocumentSource {
    pub fn new() -> Self {
        Self
    }

    fn is_document_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl Default for DocumentSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode uploaded bytes as UTF-8 text.
///
/// A leading byte-order mark is dropped. Content is otherwise passed through
/// unchanged, including empty documents.
pub fn decode_document(name: &str, bytes: &[u8]) -> Result<Transcript> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let text = std::str::from_utf8(bytes).map_err(|e| {
        TubecoachError::Decode(format!(
            "{}: invalid byte sequence at offset {}",
            name,
            e.valid_up_to()
        ))
    })?;

    Ok(Transcript {
        id: name.to_string(),
        title: None,
        kind: SourceKind::Document,
        text: text.to_string(),
    })
}

#[async_trait]
impl TranscriptSource for DocumentSource {
    fn can_handle(&self, input: &str) -> bool {
        let path = Path::new(input);
        path.is_file() || Self::is_document_file(path)
    }

    #[instrument(skip(self))]
    async fn fetch(&self, reference: &str) -> Result<Transcript> {
        let path = Path::new(reference);
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TubecoachError::InvalidInput(format!("File not found: {}", reference))
            } else {
                TubecoachError::Io(e)
            }
        })?;
        debug!("Read {} bytes", bytes.len());

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(reference);

        decode_document(name, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_plain_utf8() {
        let transcript = decode_document("notes.txt", "héllo wörld".as_bytes()).unwrap();
        assert_eq!(transcript.text, "héllo wörld");
        assert_eq!(transcript.kind, SourceKind::Document);
        assert_eq!(transcript.id, "notes.txt");
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"text");
        assert_eq!(decode_document("a.txt", &bytes).unwrap().text, "text");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let err = decode_document("a.txt", &[b'o', b'k', 0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, TubecoachError::Decode(ref m) if m.contains("offset 2")));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_document("empty.txt", b"").unwrap().text, "");
    }

    #[test]
    fn test_is_document_file() {
        assert!(DocumentSource::is_document_file(Path::new("notes.TXT")));
        assert!(DocumentSource::is_document_file(Path::new("/tmp/talk.md")));
        assert!(!DocumentSource::is_document_file(Path::new("dQw4w9WgXcQ")));
        assert!(!DocumentSource::is_document_file(Path::new("video.mp4")));
    }

    #[tokio::test]
    async fn test_fetch_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"from disk").unwrap();

        let source = DocumentSource::new();
        let path = file.path().to_str().unwrap();
        assert!(source.can_handle(path));

        let transcript = source.fetch(path).await.unwrap();
        assert_eq!(transcript.text, "from disk");
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let err = DocumentSource::new()
            .fetch("/definitely/not/here.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, TubecoachError::InvalidInput(_)));
    }
}
