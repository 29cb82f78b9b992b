//! WebVTT caption flattening.

use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// Flatten a WebVTT document into plain text.
///
/// Drops the header, cue identifiers and timings, NOTE/STYLE/REGION blocks
/// and inline tags. Auto-generated captions repeat each line in the next
/// cue while scrolling, so consecutive duplicates are collapsed.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = true;
    let mut skipping_block = false;

    for raw in vtt.lines() {
        let line = raw.trim();

        if in_header {
            if line.is_empty() {
                in_header = false;
            }
            continue;
        }

        if line.is_empty() {
            skipping_block = false;
            continue;
        }

        if skipping_block {
            continue;
        }

        if line.starts_with("NOTE") || line == "STYLE" || line == "REGION" {
            skipping_block = true;
            continue;
        }

        if line.contains("-->") || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let text = decode_entities(&tag_regex().replace_all(line, ""));
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        if lines.last().map(String::as_str) != Some(text) {
            lines.push(text.to_string());
        }
    }

    lines.join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
