//! services/api/src/adapters/groq_llm.rs
//!
//! This module contains the adapter for the generation LLM. It implements the
//! `ChatCompletionService` port from the `core` crate against any
//! OpenAI-compatible endpoint (Groq by default).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use study_helper_core::ports::{ChatCompletionService, GenerationError, GenerationResult};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatCompletionService` using an OpenAI-compatible LLM.
///
/// Credentials belong to the caller, so a client is configured per call.
#[derive(Clone)]
pub struct GroqChatAdapter {
    api_base: String,
    model: String,
}

impl GroqChatAdapter {
    /// Creates a new `GroqChatAdapter`.
    pub fn new(api_base: String, model: String) -> Self {
        Self { api_base, model }
    }

    /// Builds a client for one call. Rate limits surface to the caller on the
    /// first response, so the client's own backoff is given no time budget.
    fn client(&self, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(&self.api_base)
            .with_api_key(api_key);
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        Client::with_config(config).with_backoff(no_retry)
    }
}

fn build_error(e: OpenAIError) -> GenerationError {
    GenerationError::Other(e.to_string())
}

//=========================================================================================
// `ChatCompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatCompletionService for GroqChatAdapter {
    async fn complete(
        &self,
        api_key: &str,
        system_instruction: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> GenerationResult<String> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_instruction)
                    .build()
                    .map_err(build_error)?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(build_error)?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(max_tokens)
            .temperature(temperature)
            .build()
            .map_err(build_error)?;

        let response = self
            .client(api_key)
            .chat()
            .create(request)
            .await
            .map_err(|e| {
                let err = GenerationError::classify(&e.to_string());
                warn!(code = err.code(), "chat completion request failed");
                err
            })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)
    }
}
