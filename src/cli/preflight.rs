//! Pre-flight checks before remote work.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::error::{Result, TubecoachError};
use crate::openai::is_api_key_configured;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chatting requires the API key.
    Chat,
    /// Video analysis also requires yt-dlp.
    Video,
    /// Fetching a transcript only requires yt-dlp.
    Transcript,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Chat => {
            check_api_key()?;
        }
        Operation::Video => {
            check_api_key()?;
            check_tool("yt-dlp")?;
        }
        Operation::Transcript => {
            check_tool("yt-dlp")?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(TubecoachError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

/// Check if an external tool is available.
pub(crate) fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(TubecoachError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TubecoachError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(TubecoachError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let err = check_tool("tubecoach-no-such-tool").unwrap_err();
        assert!(matches!(err, TubecoachError::ToolNotFound(ref t) if t == "tubecoach-no-such-tool"));
    }
}
