//! Extraction of labelled sections from free-form model replies.
//!
//! A missing section is a normal outcome: the model may drop, reword or
//! reorder headers, so every lookup returns `Option`.

use crate::config::SectionLabels;
use crate::error::{Result, TubecoachError};
use regex::Regex;

/// Finds the text between a fixed pair of section markers.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    labels: SectionLabels,
    pattern: Regex,
}

impl SectionExtractor {
    pub fn new(labels: SectionLabels) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"(?s){}(.*?){}",
            regex::escape(&labels.start),
            regex::escape(&labels.end)
        ))
        .map_err(|e| TubecoachError::Config(format!("Invalid section labels: {}", e)))?;

        Ok(Self { labels, pattern })
    }

    pub fn labels(&self) -> &SectionLabels {
        &self.labels
    }

    /// Return the trimmed text between the first start marker and the next
    /// end marker after it.
    pub fn extract(&self, reply: &str) -> Option<String> {
        let caps = self.pattern.captures(reply)?;
        let inner = caps
            .get(1)?
            .as_str()
            .trim_matches(|c: char| c.is_whitespace() || c == '*');

        if inner.is_empty() {
            None
        } else {
            Some(inner.to_string())
        }
    }
}

/// One-off extraction without keeping a compiled extractor around.
pub fn extract_section(reply: &str, start_label: &str, end_label: &str) -> Option<String> {
    SectionExtractor::new(SectionLabels::new(start_label, end_label))
        .ok()?
        .extract(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "Thumbnail Prompt:";
    const END: &str = "Content Enhancement:";

    #[test]
    fn test_extract_inline() {
        let reply = "...Thumbnail Prompt: ABC Content Enhancement:...";
        assert_eq!(extract_section(reply, START, END), Some("ABC".to_string()));
    }

    #[test]
    fn test_extract_spans_lines() {
        let reply = "Summary here.\n\n- Thumbnail Prompt:\n  A cat wearing sunglasses,\n  neon background.\n- Content Enhancement: shorter intro";
        assert_eq!(
            extract_section(reply, START, END),
            Some("A cat wearing sunglasses,\n  neon background.\n-".to_string())
        );
    }

    #[test]
    fn test_extract_is_non_greedy() {
        let reply = "Thumbnail Prompt: first Content Enhancement: a\nThumbnail Prompt: second Content Enhancement: b";
        assert_eq!(extract_section(reply, START, END), Some("first".to_string()));
    }

    #[test]
    fn test_missing_labels() {
        assert_eq!(extract_section("Content Enhancement: only end", START, END), None);
        assert_eq!(extract_section("Thumbnail Prompt: only start", START, END), None);
        assert_eq!(extract_section("", START, END), None);
    }

    #[test]
    fn test_end_before_start() {
        let reply = "Content Enhancement: more jokes. Thumbnail Prompt: a dog";
        assert_eq!(extract_section(reply, START, END), None);
    }

    #[test]
    fn test_markdown_emphasis_is_trimmed() {
        let reply = "**Thumbnail Prompt:** a cute orange cat\n\n**Content Enhancement:** add captions";
        assert_eq!(
            extract_section(reply, START, END),
            Some("a cute orange cat".to_string())
        );
    }

    #[test]
    fn test_empty_section_is_a_miss() {
        assert_eq!(
            extract_section("Thumbnail Prompt:   Content Enhancement:", START, END),
            None
        );
    }

    #[test]
    fn test_labels_are_literal() {
        let extractor = SectionExtractor::new(SectionLabels::new("Q(1)?", "[end]")).unwrap();
        assert_eq!(extractor.extract("Q(1)? x [end]"), Some("x".to_string()));
        assert_eq!(extractor.extract("Q1 x [end]"), None);
    }
}
