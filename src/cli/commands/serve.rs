//! HTTP API server command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::server;

/// Run the HTTP API server.
pub async fn run_serve(
    host: &str,
    port: u16,
    profile: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }
    if let Err(e) = preflight::check(Operation::Transcript) {
        Output::warning(&format!("{} (video endpoints will fail)", e));
    }

    Output::header("Tubecoach API Server");
    println!();
    Output::success(&format!("Listening on http://{}:{}", host, port));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Message", "POST   /sessions/:id/messages   {\"text\"}");
    Output::kv("Document", "POST   /sessions/:id/documents  {\"name\", \"content_base64\" | \"text\"}");
    Output::kv("Video", "POST   /sessions/:id/videos     {\"video\"}");
    Output::kv("Reset", "POST   /sessions/:id/reset");
    Output::kv("History", "GET    /sessions/:id/history");
    Output::kv("End session", "DELETE /sessions/:id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::run(host, port, settings, profile).await?;

    Ok(())
}
