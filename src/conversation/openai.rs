//! OpenAI chat completion backend.

use super::{ChatMessage, ChatModel, Role};
use crate::config::ModelParams;
use crate::error::{Result, TubecoachError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model backed by the OpenAI chat completions API.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    params: ModelParams,
}

impl OpenAIChatModel {
    pub fn new(params: ModelParams) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            params,
        })
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| TubecoachError::Inference(e.to_string()))?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| TubecoachError::Inference(e.to_string()))?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| TubecoachError::Inference(e.to_string()))?
            .into(),
    };
    Ok(built)
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn model(&self) -> &str {
        &self.params.model
    }

    #[instrument(skip(self, messages), fields(model = %self.params.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.params.model)
            .messages(messages)
            .temperature(self.params.temperature);

        if let Some(max_tokens) = self.params.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if let Some(top_p) = self.params.top_p {
            builder.top_p(top_p);
        }

        let request = builder
            .build()
            .map_err(|e| TubecoachError::Inference(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TubecoachError::Inference(format!("Chat API error: {}", e)))?;

        let reply = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| TubecoachError::Inference("Empty response from model".to_string()))?;

        debug!("Received reply of {} chars", reply.len());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_conversion() {
        let msg = to_request_message(&ChatMessage::user("hi")).unwrap();
        assert!(matches!(msg, ChatCompletionRequestMessage::User(_)));

        let msg = to_request_message(&ChatMessage::assistant("hello")).unwrap();
        assert!(matches!(msg, ChatCompletionRequestMessage::Assistant(_)));

        let msg = to_request_message(&ChatMessage::system("be nice")).unwrap();
        assert!(matches!(msg, ChatCompletionRequestMessage::System(_)));
    }
}
