//! Plain-text transcript export.

use crate::error::{Result, TubecoachError};
use crate::source::Transcript;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name used for an exported transcript.
pub fn export_file_name(transcript: &Transcript) -> String {
    let stem: String = transcript
        .id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "transcript".to_string() } else { stem };
    format!("{}.txt", stem)
}

/// Write the transcript text into `dir` and return the file path.
pub fn export_transcript(transcript: &Transcript, dir: &Path) -> Result<PathBuf> {
    export_transcript_to(transcript, &dir.join(export_file_name(transcript)))
}

/// Write the transcript text to an exact path.
pub fn export_transcript_to(transcript: &Transcript, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| TubecoachError::Export(format!("{}: {}", parent.display(), e)))?;
    }
    std::fs::write(path, &transcript.text)
        .map_err(|e| TubecoachError::Export(format!("{}: {}", path.display(), e)))?;

    info!("Exported transcript to {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;

    fn transcript(id: &str) -> Transcript {
        Transcript {
            id: id.to_string(),
            title: None,
            kind: SourceKind::YouTube,
            text: "Hello world, today we discuss cats.".to_string(),
        }
    }

    #[test]
    fn test_export_writes_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_transcript(&transcript("dQw4w9WgXcQ"), &dir.path().join("nested")).unwrap();
        assert!(path.ends_with("nested/dQw4w9WgXcQ.txt"));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "Hello world, today we discuss cats."
        );
    }

    #[test]
    fn test_file_name_is_sanitized() {
        assert_eq!(export_file_name(&transcript("../etc/passwd")), "___etc_passwd.txt");
        assert_eq!(export_file_name(&transcript("")), "transcript.txt");
    }

    #[test]
    fn test_export_failure_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let err = export_transcript(&transcript("abc"), &blocker.join("sub")).unwrap_err();
        assert!(matches!(err, TubecoachError::Export(_)));
    }
}
