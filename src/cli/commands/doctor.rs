//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{ImageProvider, Settings};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    /// Downgrade an error to a warning (for optional requirements).
    fn optional(mut self) -> Self {
        if self.status == CheckStatus::Error {
            self.status = CheckStatus::Warning;
        }
        self
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Print a group of checks under a heading and collect them.
fn section(title: &str, group: Vec<CheckResult>, all: &mut Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for check in &group {
        check.print();
    }
    println!();
    all.extend(group);
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Tubecoach Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let mut tools = vec![check_tool("yt-dlp", "yt-dlp --version", install_hint_ytdlp())];
    let ffmpeg = check_tool("ffmpeg", "ffmpeg -version", install_hint_ffmpeg());
    tools.push(if settings.youtube.whisper_fallback {
        ffmpeg
    } else {
        ffmpeg.optional()
    });
    section("External Tools", tools, &mut checks);

    section(
        "API Configuration",
        vec![check_openai_api_key(), check_image_backend(settings)],
        &mut checks,
    );

    section("Directories", check_directories(settings), &mut checks);

    section("Configuration", vec![check_config_file(settings)], &mut checks);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Tubecoach.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Tubecoach is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, version_cmd: &str, hint: &str) -> CheckResult {
    let mut parts = version_cmd.split_whitespace();
    let Some(cmd) = parts.next() else {
        return CheckResult::error(name, "no command given", hint);
    };

    match Command::new(cmd).args(parts).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    key_check("OPENAI_API_KEY", std::env::var("OPENAI_API_KEY").ok())
}

fn key_check(name: &str, value: Option<String>) -> CheckResult {
    let hint = format!("Set with: export {}='sk-...'", name);
    match value {
        Some(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok(name, &format!("configured ({})", mask_key(&key)))
        }
        Some(key) if key.is_empty() => CheckResult::error(name, "empty", &hint),
        Some(_) => CheckResult::warning(
            name,
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(name, "not set", &hint),
    }
}

/// Check the illustration backend configuration.
fn check_image_backend(settings: &Settings) -> CheckResult {
    let image = &settings.image;
    if !image.enabled {
        return CheckResult::ok("Illustrations", "disabled");
    }

    match image.provider {
        ImageProvider::OpenAI => {
            CheckResult::ok("Illustrations", &format!("openai ({})", image.model))
        }
        ImageProvider::Http => match image.endpoint.as_deref() {
            None | Some("") => CheckResult::error(
                "Illustrations",
                "http provider without an endpoint",
                "Set image.endpoint in the config, or image.provider = \"openai\"",
            ),
            Some(endpoint) => match std::env::var(&image.api_key_env) {
                Ok(key) if !key.is_empty() => {
                    CheckResult::ok("Illustrations", &format!("http ({})", endpoint))
                }
                _ => CheckResult::warning(
                    "Illustrations",
                    &format!("http ({}) without {}", endpoint, image.api_key_env),
                    "Requests are sent without an Authorization header",
                ),
            },
        },
    }
}

/// Check data directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    [
        ("Data directory", settings.data_dir()),
        ("Export directory", settings.export_dir()),
        ("Illustrations", settings.illustration_dir()),
    ]
    .into_iter()
    .map(|(name, dir)| {
        if dir.exists() {
            CheckResult::ok(name, &dir.display().to_string())
        } else {
            CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            )
        }
    })
    .collect()
}

/// Check if config file exists and parses.
fn check_config_file(settings: &Settings) -> CheckResult {
    let config_path = Settings::default_config_path();
    if !config_path.exists() {
        return CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: tubecoach config edit",
        );
    }

    match settings.chat.resolve(None) {
        Ok(params) => CheckResult::ok(
            "Config file",
            &format!("{} (model {})", config_path.display(), params.model),
        ),
        Err(e) => CheckResult::error("Config file", &e.to_string(), "Fix the [chat] section"),
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg (needed for the Whisper fallback)"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (needed for the Whisper fallback)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_downgrades_errors() {
        let result = CheckResult::error("ffmpeg", "not found", "install it").optional();
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(CheckResult::ok("x", "y").optional().status, CheckStatus::Ok);
    }

    #[test]
    fn test_key_check() {
        assert_eq!(key_check("K", None).status, CheckStatus::Error);
        assert_eq!(key_check("K", Some(String::new())).status, CheckStatus::Error);
        assert_eq!(key_check("K", Some("abc".into())).status, CheckStatus::Warning);

        let ok = key_check("K", Some("sk-abcdefghijklmnopqrstuvwxyz".into()));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert_eq!(ok.message, "configured (sk-abcd...wxyz)");
    }

    #[test]
    fn test_http_backend_needs_endpoint() {
        let mut settings = Settings::default();
        settings.image.enabled = true;
        settings.image.provider = ImageProvider::Http;
        settings.image.endpoint = None;
        assert_eq!(check_image_backend(&settings).status, CheckStatus::Error);

        settings.image.enabled = false;
        assert_eq!(check_image_backend(&settings).status, CheckStatus::Ok);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
