//! crates/study_helper_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete encyclopedia and generation backends.

use crate::domain::PageSummary;
use async_trait::async_trait;

//=========================================================================================
// Port Error Types
//=========================================================================================

/// A failure talking to the encyclopedia service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Not Found")]
    NotFound,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("Timeout")]
    Timeout,
    #[error("{0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// A classified failure from the text-generation service.
///
/// The `Display` text is the user-facing message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("An API key is required. Please provide your Groq API key.")]
    MissingCredential,
    #[error("Rate limit exceeded. Please wait a moment before trying again.")]
    RateLimited,
    #[error("Invalid API key. Please check your Groq API key.")]
    InvalidCredential,
    #[error("API quota exceeded. Please check your Groq account limits.")]
    QuotaExceeded,
    #[error("Text encoding error: {0}")]
    Encoding(String),
    #[error("The generation service returned no content.")]
    EmptyResponse,
    #[error("Error calling the generation service: {0}")]
    Other(String),
}

impl GenerationError {
    /// Classifies a raw provider error message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("rate limit") || lower.contains("rate_limit") || lower.contains("429") {
            GenerationError::RateLimited
        } else if lower.contains("api key")
            || lower.contains("api_key")
            || lower.contains("authentication")
            || lower.contains("unauthorized")
        {
            GenerationError::InvalidCredential
        } else if lower.contains("quota") {
            GenerationError::QuotaExceeded
        } else if lower.contains("encod") || lower.contains("unicode") || lower.contains("utf-8") {
            GenerationError::Encoding(message.to_string())
        } else {
            GenerationError::Other(message.to_string())
        }
    }

    /// A stable, machine-checkable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::MissingCredential => "missing_credential",
            GenerationError::RateLimited => "rate_limited",
            GenerationError::InvalidCredential => "invalid_credential",
            GenerationError::QuotaExceeded => "quota_exceeded",
            GenerationError::Encoding(_) => "encoding_error",
            GenerationError::EmptyResponse => "empty_response",
            GenerationError::Other(_) => "generation_error",
        }
    }

    /// An optional hint for what the user can do next.
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            GenerationError::MissingCredential => {
                Some("Enter an API key for this session to enable AI-enhanced content.")
            }
            GenerationError::RateLimited => Some(
                "Free tiers have rate limits. Wait a few moments, or upgrade for higher limits.",
            ),
            GenerationError::InvalidCredential => {
                Some("Double-check the API key for this session.")
            }
            _ => None,
        }
    }
}

/// A convenience type alias for generation results.
pub type GenerationResult<T> = Result<T, GenerationError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait EncyclopediaService: Send + Sync {
    /// Fetches the summary for an exact, already-normalized title.
    async fn page_summary(&self, title: &str) -> Result<PageSummary, FetchError>;

    /// Full-text search, returning result titles in rank order.
    async fn search_titles(&self, query: &str, limit: u32) -> Result<Vec<String>, FetchError>;

    /// Title suggestions for a partial or related query.
    async fn suggest_titles(&self, query: &str, limit: u32) -> Result<Vec<String>, FetchError>;
}

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    /// Runs a single chat completion. Implementations classify provider
    /// failures with [`GenerationError::classify`] and never retry.
    async fn complete(
        &self,
        api_key: &str,
        system_instruction: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> GenerationResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognizes_provider_messages() {
        assert_eq!(
            GenerationError::classify("Rate limit reached for model"),
            GenerationError::RateLimited
        );
        assert_eq!(
            GenerationError::classify("Invalid API Key"),
            GenerationError::InvalidCredential
        );
        assert_eq!(
            GenerationError::classify("You exceeded your current quota"),
            GenerationError::QuotaExceeded
        );
        assert!(matches!(
            GenerationError::classify("failed to encode request body"),
            GenerationError::Encoding(_)
        ));
        assert!(matches!(
            GenerationError::classify("connection reset"),
            GenerationError::Other(_)
        ));
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            GenerationError::MissingCredential,
            GenerationError::RateLimited,
            GenerationError::InvalidCredential,
            GenerationError::QuotaExceeded,
            GenerationError::Encoding(String::new()),
            GenerationError::EmptyResponse,
            GenerationError::Other(String::new()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
