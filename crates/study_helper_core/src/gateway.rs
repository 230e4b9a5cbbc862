//! crates/study_helper_core/src/gateway.rs
//!
//! The single entry point for text generation. Cleans prompts, retries once
//! on encoding failures and reports classified errors.

use crate::domain::GenerationRequest;
use crate::ports::{ChatCompletionService, GenerationError, GenerationResult};
use crate::retry::{retry, RetryDecision, RetryPolicy};
use crate::sanitize::{clean_prompt, strict_ascii};
use std::sync::Arc;
use tracing::{error, warn};

const SYSTEM_INSTRUCTION: &str = "You are a knowledgeable and helpful AI study assistant. \
Provide clear, accurate, and well-structured educational content. \
Use plain text without emojis in your responses.";

const ASCII_SYSTEM_INSTRUCTION: &str = "You are a helpful AI study assistant. \
Provide clear educational content using only standard ASCII characters.";

#[derive(Clone)]
pub struct GenerationGateway {
    backend: Arc<dyn ChatCompletionService>,
}

impl GenerationGateway {
    pub fn new(backend: Arc<dyn ChatCompletionService>) -> Self {
        Self { backend }
    }

    /// Generates text for a prompt using the caller's credential.
    ///
    /// A missing or blank credential fails without contacting the backend.
    pub async fn generate(
        &self,
        credential: Option<&str>,
        request: &GenerationRequest,
    ) -> GenerationResult<String> {
        let api_key = credential
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(GenerationError::MissingCredential)?;

        // One extra attempt, reserved for encoding failures.
        let policy = RetryPolicy::immediate(2);
        let decide = |err: &GenerationError| match err {
            GenerationError::Encoding(_) => {
                warn!("encoding error from generation backend; retrying with ASCII-only prompt");
                RetryDecision::Retry(0)
            }
            _ => RetryDecision::Stop,
        };

        let result = retry(&policy, decide, |attempt| {
            let backend = self.backend.clone();
            let (system, prompt) = if attempt == 0 {
                (SYSTEM_INSTRUCTION, clean_prompt(&request.prompt))
            } else {
                (ASCII_SYSTEM_INSTRUCTION, strict_ascii(&request.prompt))
            };
            let max_tokens = request.max_output_tokens;
            let temperature = request.temperature;
            async move {
                backend
                    .complete(api_key, system, &prompt, max_tokens, temperature)
                    .await
            }
        })
        .await;

        match result {
            Ok(text) if text.trim().is_empty() => Err(GenerationError::EmptyResponse),
            Ok(text) => Ok(text),
            Err(err) => {
                error!(code = err.code(), "generation failed: {}", err);
                Err(err)
            }
        }
    }
}
