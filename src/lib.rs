//! Tubecoach - YouTube Analysis Assistant
//!
//! A CLI assistant that helps creators improve their videos.
//!
//! # Overview
//!
//! Tubecoach allows you to:
//! - Fetch a YouTube video's transcript, or load a text document
//! - Have an LLM summarize it and answer a checklist of channel-growth questions
//!   (titles, tags, thumbnail, improvements, viral segment)
//! - Keep chatting about the result in a multi-turn conversation
//! - Get a thumbnail illustration drawn from the model's thumbnail suggestion
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `source` - Transcript acquisition (YouTube captions, documents)
//! - `audio` - Audio download for the Whisper fallback
//! - `analysis` - Prompt building and reply section extraction
//! - `conversation` - Chat model abstraction and session history
//! - `illustration` - Image generation backends
//! - `export` - Transcript export
//! - `orchestrator` - Per-session pipeline
//! - `server` - HTTP API with isolated sessions
//!
//! # Example
//!
//! ```rust,no_run
//! use tubecoach::config::Settings;
//! use tubecoach::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut orchestrator = Orchestrator::new(&settings, None)?;
//!
//!     let outcome = orchestrator.submit_video("dQw4w9WgXcQ").await?;
//!     println!("{}", outcome.reply);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod export;
pub mod illustration;
pub mod openai;
pub mod orchestrator;
pub mod server;
pub mod source;

pub use error::{Result, TubecoachError};
