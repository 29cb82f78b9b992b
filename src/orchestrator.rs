//! Session orchestrator for Tubecoach.
//!
//! Sequences transcript acquisition, prompt building, the chat exchange and
//! the optional thumbnail illustration for each user action.

use crate::analysis::{PromptBuilder, SectionExtractor};
use crate::config::{Prompts, Settings};
use crate::conversation::{ChatModel, ConversationSession, OpenAIChatModel};
use crate::error::{Result, TubecoachError};
use crate::export::export_transcript;
use crate::illustration::{create_generator, illustration_prompt, Illustration, ImageGenerator};
use crate::source::{decode_document, DocumentSource, Transcript, TranscriptSource, YoutubeSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Input label recorded for a submitted document.
pub const DOCUMENT_PLACEHOLDER: &str = "File received. Currently reviewing...";

/// Input label recorded for a submitted video.
pub const VIDEO_PLACEHOLDER: &str = "Video received. Currently reviewing...";

/// The main orchestrator for one user's session.
///
/// Every action takes `&mut self`, so a session only ever has one exchange
/// in flight.
pub struct Orchestrator {
    session: ConversationSession,
    prompt_builder: PromptBuilder,
    extractor: Option<SectionExtractor>,
    video_source: Arc<dyn TranscriptSource>,
    document_source: Arc<dyn TranscriptSource>,
    image_generator: Option<Arc<dyn ImageGenerator>>,
    illustration_template: String,
    export_dir: Option<PathBuf>,
}

/// What a completed action produced.
#[derive(Debug)]
pub struct TurnOutcome {
    pub reply: String,
    /// Thumbnail illustration, when the reply described one and generation succeeded.
    pub illustration: Option<Illustration>,
    /// Transcript the turn was built from (video and document actions).
    pub transcript: Option<Transcript>,
    /// Where the transcript was exported, for video actions.
    pub exported_transcript: Option<PathBuf>,
}

impl Orchestrator {
    /// Create an orchestrator wired to the configured remote services.
    pub fn new(settings: &Settings, profile: Option<&str>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let params = settings.chat.resolve(profile)?;
        info!("Using chat model {}", params.model);
        let chat: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::new(params)?);

        let video_source: Arc<dyn TranscriptSource> = Arc::new(YoutubeSource::with_settings(
            &settings.youtube,
            std::env::temp_dir().join("tubecoach"),
        ));
        let document_source: Arc<dyn TranscriptSource> = Arc::new(DocumentSource::new());

        let image_generator = if settings.image.enabled {
            info!("Illustrations via {} ({})", settings.image.provider, settings.image.model);
            Some(create_generator(&settings.image)?)
        } else {
            None
        };

        Ok(Self::with_components(
            prompts,
            chat,
            video_source,
            document_source,
            image_generator,
            settings.image.prompt_template.clone(),
        )?
        .with_system_prompt(settings.chat.system_prompt.clone())
        .with_export_dir(Some(settings.export_dir())))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        prompts: Prompts,
        chat: Arc<dyn ChatModel>,
        video_source: Arc<dyn TranscriptSource>,
        document_source: Arc<dyn TranscriptSource>,
        image_generator: Option<Arc<dyn ImageGenerator>>,
        illustration_template: String,
    ) -> Result<Self> {
        let extractor = match prompts.analysis.thumbnail_labels() {
            Some(labels) => Some(SectionExtractor::new(labels)?),
            None => {
                warn!(
                    "Checklist has no item after '{}', illustrations are disabled",
                    prompts.analysis.thumbnail_label
                );
                None
            }
        };

        Ok(Self {
            session: ConversationSession::new(chat),
            prompt_builder: PromptBuilder::new(prompts),
            extractor,
            video_source,
            document_source,
            image_generator,
            illustration_template,
            export_dir: None,
        })
    }

    /// Send a system message ahead of every request.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.session = self.session.with_system_prompt(prompt);
        self
    }

    /// Export fetched video transcripts into `dir`.
    pub fn with_export_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.export_dir = dir;
        self
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id()
    }

    /// Send the user's own text.
    #[instrument(skip(self, text), fields(session = %self.session.id()))]
    pub async fn send_message(&mut self, text: &str) -> Result<TurnOutcome> {
        if text.trim().is_empty() {
            return Err(TubecoachError::InvalidInput("Message is empty".to_string()));
        }

        let reply = self.session.send(text).await?;
        Ok(self.finish_turn(reply, None, None).await)
    }

    /// Read a document from disk and analyze it.
    #[instrument(skip(self), fields(session = %self.session.id()))]
    pub async fn submit_document(&mut self, path: &str) -> Result<TurnOutcome> {
        let transcript = self.document_source.fetch(path).await?;
        self.analyze(transcript, DOCUMENT_PLACEHOLDER, None).await
    }

    /// Analyze an uploaded document.
    #[instrument(skip(self, bytes), fields(session = %self.session.id(), size = bytes.len()))]
    pub async fn submit_document_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<TurnOutcome> {
        let transcript = decode_document(name, bytes)?;
        self.analyze(transcript, DOCUMENT_PLACEHOLDER, None).await
    }

    /// Fetch a video's transcript, export it, and analyze it.
    #[instrument(skip(self), fields(session = %self.session.id()))]
    pub async fn submit_video(&mut self, reference: &str) -> Result<TurnOutcome> {
        let transcript = self.video_source.fetch(reference).await?;
        info!(
            "Fetched transcript for {} ({} chars)",
            transcript.title.as_deref().unwrap_or(&transcript.id),
            transcript.text.len()
        );

        let exported = self.export_dir.as_ref().and_then(|dir| {
            export_transcript(&transcript, dir)
                .map_err(|e| warn!("Transcript export skipped: {}", e))
                .ok()
        });

        self.analyze(transcript, VIDEO_PLACEHOLDER, exported).await
    }

    /// Clear the conversation and take a new session identity.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    async fn analyze(
        &mut self,
        transcript: Transcript,
        label: &str,
        exported: Option<PathBuf>,
    ) -> Result<TurnOutcome> {
        let prompt = self.prompt_builder.build(&transcript.text);
        debug!("Built analysis prompt of {} chars", prompt.len());

        let reply = self.session.send_labeled(&prompt, label).await?;
        Ok(self.finish_turn(reply, Some(transcript), exported).await)
    }

    async fn finish_turn(
        &self,
        reply: String,
        transcript: Option<Transcript>,
        exported_transcript: Option<PathBuf>,
    ) -> TurnOutcome {
        let illustration = self.illustrate(&reply).await;
        TurnOutcome {
            reply,
            illustration,
            transcript,
            exported_transcript,
        }
    }

    /// Generate a thumbnail if the reply contains a thumbnail section.
    ///
    /// Never fails the turn: a missing section or a generator error both
    /// just mean no illustration.
    async fn illustrate(&self, reply: &str) -> Option<Illustration> {
        let extractor = self.extractor.as_ref()?;
        let generator = self.image_generator.as_ref()?;

        let Some(design) = extractor.extract(reply) else {
            debug!(
                "No '{}' section in reply, skipping illustration",
                extractor.labels().start
            );
            return None;
        };

        let prompt = illustration_prompt(&self.illustration_template, &design);
        match generator.generate(&prompt).await {
            Ok(bytes) => {
                info!("Generated illustration ({} bytes)", bytes.len());
                Some(Illustration { prompt, bytes })
            }
            Err(e) if e.is_fatal() => {
                error!("Illustration backend error: {}", e);
                None
            }
            Err(e) => {
                warn!("Illustration failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageSettings;
    use crate::conversation::ChatMessage;
    use crate::source::SourceKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed reply and records every request.
    struct ScriptedChat {
        reply: String,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            Ok(self.reply.clone())
        }
    }

    struct FakeVideo {
        text: Option<String>,
    }

    #[async_trait]
    impl TranscriptSource for FakeVideo {
        fn can_handle(&self, _input: &str) -> bool {
            true
        }

        async fn fetch(&self, reference: &str) -> Result<Transcript> {
            match &self.text {
                Some(text) => Ok(Transcript {
                    id: reference.to_string(),
                    title: Some("Cats".to_string()),
                    kind: SourceKind::YouTube,
                    text: text.clone(),
                }),
                None => Err(TubecoachError::Acquisition(format!(
                    "No captions available for {}",
                    reference
                ))),
            }
        }
    }

    /// Records prompts; fails with `failure` when set.
    struct RecordingImages {
        failure: Option<fn() -> TubecoachError>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingImages {
        fn new(fail: bool) -> Arc<Self> {
            if fail {
                Self::failing_with(|| TubecoachError::Generation("quota exceeded".to_string()))
            } else {
                Arc::new(Self {
                    failure: None,
                    prompts: Mutex::new(Vec::new()),
                })
            }
        }

        fn failing_with(failure: fn() -> TubecoachError) -> Arc<Self> {
            Arc::new(Self {
                failure: Some(failure),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ImageGenerator for RecordingImages {
        async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.failure {
                Some(failure) => Err(failure()),
                None => Ok(vec![0x89, b'P', b'N', b'G']),
            }
        }
    }

    const THUMBNAIL_REPLY: &str = "In this post we meet cats.\n\
        Engaging Title: Cats!\n\
        Thumbnail Prompt: a cute orange cat Content Enhancement: add captions\n\
        Viral Segment: the nap";

    fn orchestrator(
        chat: Arc<ScriptedChat>,
        video_text: Option<&str>,
        images: Arc<RecordingImages>,
    ) -> Orchestrator {
        Orchestrator::with_components(
            Prompts::default(),
            chat,
            Arc::new(FakeVideo {
                text: video_text.map(str::to_string),
            }),
            Arc::new(DocumentSource::new()),
            Some(images as Arc<dyn ImageGenerator>),
            ImageSettings::default().prompt_template,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_video_end_to_end() {
        let chat = ScriptedChat::new(THUMBNAIL_REPLY);
        let images = RecordingImages::new(false);
        let export = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(
            chat.clone(),
            Some("Hello world, today we discuss cats."),
            images.clone(),
        )
        .with_export_dir(Some(export.path().to_path_buf()));

        let outcome = orch.submit_video("abc123").await.unwrap();

        let requests = chat.requests.lock().unwrap();
        let sent = &requests[0].last().unwrap().content;
        assert!(sent.contains("Hello world, today we discuss cats."));
        assert!(sent.contains("Thumbnail Prompt"));
        assert!(sent.contains("Viral Segment Explanation"));

        let image_prompts = images.prompts.lock().unwrap();
        assert_eq!(image_prompts.len(), 1);
        assert!(image_prompts[0].contains("a cute orange cat"));

        let illustration = outcome.illustration.unwrap();
        assert!(illustration.prompt.contains("a cute orange cat"));

        assert_eq!(orch.session().previous(), vec![VIDEO_PLACEHOLDER]);
        assert_eq!(orch.session().generated(), vec![THUMBNAIL_REPLY]);

        let exported = outcome.exported_transcript.unwrap();
        assert_eq!(
            std::fs::read_to_string(exported).unwrap(),
            "Hello world, today we discuss cats."
        );
    }

    #[tokio::test]
    async fn test_direct_messages_keep_lists_aligned() {
        let chat = ScriptedChat::new("plain reply");
        let images = RecordingImages::new(false);
        let mut orch = orchestrator(chat, None, images.clone());

        for (i, text) in ["hi", "tell me more", "thanks"].iter().enumerate() {
            let outcome = orch.send_message(text).await.unwrap();
            assert!(outcome.illustration.is_none());
            assert_eq!(orch.session().previous().len(), i + 1);
            assert_eq!(orch.session().generated().len(), i + 1);
            assert_eq!(orch.session().previous()[i], *text);
        }
        assert!(images.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_does_not_fail_turn() {
        let chat = ScriptedChat::new(THUMBNAIL_REPLY);
        let images = RecordingImages::new(true);
        let mut orch = orchestrator(chat, None, images.clone());

        let outcome = orch.send_message("analyze please").await.unwrap();
        assert!(outcome.illustration.is_none());
        assert_eq!(outcome.reply, THUMBNAIL_REPLY);
        assert_eq!(orch.session().len(), 1);
        assert_eq!(images.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_during_illustration_does_not_fail_turn() {
        let chat = ScriptedChat::new(THUMBNAIL_REPLY);
        let images =
            RecordingImages::failing_with(|| TubecoachError::Config("bad endpoint".to_string()));
        let mut orch = orchestrator(chat, None, images.clone());

        let outcome = orch.send_message("analyze please").await.unwrap();
        assert!(outcome.illustration.is_none());
        assert_eq!(outcome.reply, THUMBNAIL_REPLY);
        assert_eq!(orch.session().len(), 1);
        assert_eq!(images.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_acquisition_failure_leaves_history() {
        let chat = ScriptedChat::new("reply");
        let mut orch = orchestrator(chat.clone(), None, RecordingImages::new(false));
        orch.send_message("hello").await.unwrap();

        let err = orch.submit_video("abc123").await.unwrap_err();
        assert!(matches!(err, TubecoachError::Acquisition(_)));
        assert!(err.is_fatal());
        assert_eq!(orch.session().len(), 1);
        assert_eq!(chat.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_leaves_history() {
        let chat = ScriptedChat::new("reply");
        let mut orch = orchestrator(chat.clone(), None, RecordingImages::new(false));

        let err = orch
            .submit_document_bytes("bad.txt", &[0xC3, 0x28])
            .await
            .unwrap_err();
        assert!(matches!(err, TubecoachError::Decode(_)));
        assert!(orch.session().is_empty());
        assert!(chat.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_uses_placeholder_label() {
        let chat = ScriptedChat::new("reply");
        let mut orch = orchestrator(chat.clone(), None, RecordingImages::new(false));

        let outcome = orch
            .submit_document_bytes("notes.txt", b"my podcast notes")
            .await
            .unwrap();
        assert_eq!(outcome.transcript.unwrap().text, "my podcast notes");
        assert!(outcome.exported_transcript.is_none());
        assert_eq!(orch.session().previous(), vec![DOCUMENT_PLACEHOLDER]);

        let requests = chat.requests.lock().unwrap();
        assert!(requests[0][0].content.contains("my podcast notes"));
    }

    #[tokio::test]
    async fn test_reset_starts_fresh_conversation() {
        let chat = ScriptedChat::new("reply");
        let mut orch = orchestrator(chat.clone(), None, RecordingImages::new(false));
        orch.send_message("one").await.unwrap();
        orch.send_message("two").await.unwrap();
        let old_id = orch.session_id();

        orch.reset();
        assert!(orch.session().is_empty());
        assert_ne!(orch.session_id(), old_id);

        orch.send_message("three").await.unwrap();
        let requests = chat.requests.lock().unwrap();
        assert_eq!(requests[1].len(), 3);
        assert_eq!(requests[2].len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let chat = ScriptedChat::new("reply");
        let mut orch = orchestrator(chat.clone(), None, RecordingImages::new(false));
        assert!(matches!(
            orch.send_message("   ").await,
            Err(TubecoachError::InvalidInput(_))
        ));
        assert!(chat.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_generator_means_no_illustration() {
        let chat = ScriptedChat::new(THUMBNAIL_REPLY);
        let mut orch = Orchestrator::with_components(
            Prompts::default(),
            chat,
            Arc::new(FakeVideo { text: None }),
            Arc::new(DocumentSource::new()),
            None,
            ImageSettings::default().prompt_template,
        )
        .unwrap();

        let outcome = orch.send_message("go").await.unwrap();
        assert!(outcome.illustration.is_none());
    }
}
