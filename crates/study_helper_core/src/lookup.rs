//! crates/study_helper_core/src/lookup.rs
//!
//! Resolves a topic to an encyclopedia summary, following at most one
//! disambiguation redirect and retrying transient failures.

use crate::domain::{normalize_topic, LookupResult, PageSummary, NOT_FOUND_LABEL};
use crate::ports::{EncyclopediaService, FetchError};
use crate::retry::{retry, RetryDecision, RetryPolicy};
use std::sync::Arc;
use tracing::{info, warn};

/// Extracts containing this phrase are disambiguation pages.
const DISAMBIGUATION_MARKER: &str = "may refer to:";
/// Extracts shorter than this are not worth studying on their own.
const MIN_EXTRACT_CHARS: usize = 100;
/// How many results the disambiguation search asks for.
const SEARCH_LIMIT: u32 = 5;
const MISSING_EXTRACT: &str = "No summary available.";

pub struct LookupClient {
    encyclopedia: Arc<dyn EncyclopediaService>,
    policy: RetryPolicy,
    max_redirects: u32,
}

impl LookupClient {
    pub fn new(encyclopedia: Arc<dyn EncyclopediaService>) -> Self {
        Self {
            encyclopedia,
            policy: RetryPolicy::default(),
            max_redirects: 1,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Looks up a topic. Never fails: problems are reported in the result.
    pub async fn lookup(&self, topic: &str) -> LookupResult {
        let mut query = topic.trim().to_string();
        let mut redirects = 0;

        loop {
            let title = normalize_topic(&query);
            let summary = match self.fetch_summary(&title).await {
                Ok(summary) => summary,
                Err(err) => return failure(&query, err),
            };

            let extract = summary
                .extract
                .clone()
                .unwrap_or_else(|| MISSING_EXTRACT.to_string());

            if redirects < self.max_redirects && needs_redirect(&extract) {
                if let Some(target) = self.first_search_hit(&query).await {
                    info!(from = %query, to = %target, "following disambiguation redirect");
                    query = target;
                    redirects += 1;
                    continue;
                }
            }

            return found(&query, extract, summary);
        }
    }

    async fn fetch_summary(&self, title: &str) -> Result<PageSummary, FetchError> {
        retry(&self.policy, retry_decision, |attempt| {
            info!(title, attempt = attempt + 1, "fetching page summary");
            self.encyclopedia.page_summary(title)
        })
        .await
    }

    async fn first_search_hit(&self, query: &str) -> Option<String> {
        match self.encyclopedia.search_titles(query, SEARCH_LIMIT).await {
            Ok(titles) => titles.into_iter().find(|t| !t.trim().is_empty()),
            Err(err) => {
                warn!(query, error = %err, "disambiguation search failed");
                None
            }
        }
    }
}

fn needs_redirect(extract: &str) -> bool {
    extract.to_lowercase().contains(DISAMBIGUATION_MARKER)
        || extract.chars().count() < MIN_EXTRACT_CHARS
}

/// Timeouts wait twice as long as other transient failures before the next attempt.
fn retry_decision(err: &FetchError) -> RetryDecision {
    match err {
        FetchError::NotFound => RetryDecision::Stop,
        FetchError::Timeout => RetryDecision::Retry(2),
        FetchError::Status(_) | FetchError::Transport(_) | FetchError::Decode(_) => {
            RetryDecision::Retry(1)
        }
    }
}

fn found(query: &str, extract: String, summary: PageSummary) -> LookupResult {
    LookupResult::found(
        extract,
        summary.title.unwrap_or_else(|| query.to_string()),
        summary.page_url.unwrap_or_default(),
        summary.thumbnail.unwrap_or_default(),
    )
}

fn failure(query: &str, err: FetchError) -> LookupResult {
    warn!(query, error = %err, "lookup failed");
    match err {
        FetchError::NotFound => LookupResult::failed(
            query,
            format!(
                "No Wikipedia article found for '{}'. Try a different search term or check the spelling.",
                query
            ),
            NOT_FOUND_LABEL.to_string(),
        ),
        FetchError::Status(code) => LookupResult::failed(
            query,
            format!("Could not fetch information about '{}' (HTTP {})", query, code),
            format!("HTTP {}", code),
        ),
        FetchError::Timeout => LookupResult::failed(
            query,
            "Request timed out. Please check your internet connection and try again.".to_string(),
            "Timeout".to_string(),
        ),
        other => LookupResult::failed(
            query,
            format!("Error searching Wikipedia: {}", other),
            other.to_string(),
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A scripted encyclopedia that records every call it receives.
    #[derive(Default)]
    pub struct FakeEncyclopedia {
        pub summaries: Mutex<HashMap<String, Vec<Result<PageSummary, FetchError>>>>,
        pub search: Mutex<HashMap<String, Result<Vec<String>, FetchError>>>,
        pub suggestions: Mutex<Option<Result<Vec<String>, FetchError>>>,
        pub summary_calls: Mutex<Vec<String>>,
        pub search_calls: Mutex<Vec<String>>,
    }

    impl FakeEncyclopedia {
        /// Queues responses for a title; the last one repeats once the queue drains.
        pub fn with_summary(
            self,
            title: &str,
            responses: Vec<Result<PageSummary, FetchError>>,
        ) -> Self {
            self.summaries.lock().unwrap().insert(title.to_string(), responses);
            self
        }

        pub fn with_search(self, query: &str, response: Result<Vec<String>, FetchError>) -> Self {
            self.search.lock().unwrap().insert(query.to_string(), response);
            self
        }

        pub fn with_suggestions(self, response: Result<Vec<String>, FetchError>) -> Self {
            *self.suggestions.lock().unwrap() = Some(response);
            self
        }

        pub fn summary_call_count(&self) -> usize {
            self.summary_calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EncyclopediaService for FakeEncyclopedia {
        async fn page_summary(&self, title: &str) -> Result<PageSummary, FetchError> {
            self.summary_calls.lock().unwrap().push(title.to_string());
            let mut summaries = self.summaries.lock().unwrap();
            match summaries.get_mut(title) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) => queue.first().cloned().unwrap_or(Err(FetchError::NotFound)),
                None => Err(FetchError::NotFound),
            }
        }

        async fn search_titles(&self, query: &str, _limit: u32) -> Result<Vec<String>, FetchError> {
            self.search_calls.lock().unwrap().push(query.to_string());
            self.search
                .lock()
                .unwrap()
                .get(query)
                .cloned()
                .unwrap_or(Ok(Vec::new()))
        }

        async fn suggest_titles(
            &self,
            _query: &str,
            _limit: u32,
        ) -> Result<Vec<String>, FetchError> {
            self.suggestions
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(FetchError::Transport("offline".into())))
        }
    }

    pub fn article(title: &str, extract: &str) -> PageSummary {
        PageSummary {
            extract: Some(extract.to_string()),
            title: Some(title.to_string()),
            page_url: Some(format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))),
            thumbnail: None,
        }
    }

    pub fn long_extract(subject: &str) -> String {
        format!(
            "{} is a subject with a long and detailed history. It has been studied by many people \
             over several centuries and remains important today.",
            subject
        )
    }

    fn client(fake: Arc<FakeEncyclopedia>) -> LookupClient {
        LookupClient::new(fake).with_retry_policy(RetryPolicy::immediate(3))
    }

    #[tokio::test]
    async fn returns_article_for_exact_title() {
        let fake = Arc::new(FakeEncyclopedia::default().with_summary(
            "Ancient_Rome",
            vec![Ok(article("Ancient Rome", &long_extract("Ancient Rome")))],
        ));

        let result = client(fake.clone()).lookup("  Ancient Rome ").await;

        assert!(result.success);
        assert_eq!(result.title, "Ancient Rome");
        assert_eq!(result.url, "https://en.wikipedia.org/wiki/Ancient_Rome");
        assert_eq!(result.thumbnail, "");
        assert!(result.error.is_none());
        assert_eq!(fake.summary_call_count(), 1);
    }

    #[tokio::test]
    async fn not_found_is_terminal_after_one_attempt() {
        let fake = Arc::new(
            FakeEncyclopedia::default()
                .with_summary("Zzqxnotatopic123", vec![Err(FetchError::NotFound)]),
        );

        let result = client(fake.clone()).lookup("Zzqxnotatopic123").await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Not Found"));
        assert!(result.content.starts_with("No Wikipedia article found for"));
        assert_eq!(fake.summary_call_count(), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried_three_times() {
        let fake = Arc::new(
            FakeEncyclopedia::default().with_summary("Rust", vec![Err(FetchError::Status(500))]),
        );

        let result = client(fake.clone()).lookup("Rust").await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("HTTP 500"));
        assert_eq!(fake.summary_call_count(), 3);
    }

    #[tokio::test]
    async fn timeout_then_success_recovers() {
        let fake = Arc::new(FakeEncyclopedia::default().with_summary(
            "Rust",
            vec![Err(FetchError::Timeout), Ok(article("Rust", &long_extract("Rust")))],
        ));

        let result = client(fake.clone()).lookup("Rust").await;

        assert!(result.success);
        assert_eq!(fake.summary_call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_timeouts_report_timeout() {
        let fake = Arc::new(
            FakeEncyclopedia::default().with_summary("Rust", vec![Err(FetchError::Timeout)]),
        );

        let result = client(fake).lookup("Rust").await;

        assert_eq!(result.error.as_deref(), Some("Timeout"));
        assert!(result.content.starts_with("Request timed out"));
    }

    #[tokio::test]
    async fn disambiguation_follows_first_search_result() {
        let fake = Arc::new(
            FakeEncyclopedia::default()
                .with_summary("Mercury", vec![Ok(article("Mercury", "Mercury may refer to:"))])
                .with_search(
                    "Mercury",
                    Ok(vec!["Mercury (planet)".into(), "Mercury (element)".into()]),
                )
                .with_summary(
                    "Mercury_(planet)",
                    vec![Ok(article("Mercury (planet)", &long_extract("Mercury")))],
                ),
        );

        let result = client(fake.clone()).lookup("Mercury").await;

        assert!(result.success);
        assert_eq!(result.title, "Mercury (planet)");
        assert_eq!(
            *fake.summary_calls.lock().unwrap(),
            vec!["Mercury".to_string(), "Mercury_(planet)".to_string()]
        );
    }

    #[tokio::test]
    async fn redirects_are_bounded_to_one_hop() {
        let fake = Arc::new(
            FakeEncyclopedia::default()
                .with_summary("Loop", vec![Ok(article("Loop", "Loop may refer to:"))])
                .with_search("Loop", Ok(vec!["Loop two".into()]))
                .with_summary("Loop_two", vec![Ok(article("Loop two", "Loop two may refer to:"))])
                .with_search("Loop two", Ok(vec!["Loop".into()])),
        );

        let result = client(fake.clone()).lookup("Loop").await;

        assert!(result.success);
        assert_eq!(result.title, "Loop two");
        assert_eq!(fake.summary_call_count(), 2);
        assert_eq!(fake.search_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn short_extract_without_search_hits_is_returned_as_is() {
        let fake = Arc::new(
            FakeEncyclopedia::default()
                .with_summary("Tiny", vec![Ok(article("Tiny", "Tiny is short."))])
                .with_search("Tiny", Err(FetchError::Timeout)),
        );

        let result = client(fake).lookup("Tiny").await;

        assert!(result.success);
        assert_eq!(result.content, "Tiny is short.");
    }

    #[tokio::test]
    async fn missing_fields_fall_back_to_defaults() {
        let fake = Arc::new(
            FakeEncyclopedia::default().with_summary("Blank", vec![Ok(PageSummary::default())]),
        );

        let result = client(fake).lookup("Blank").await;

        assert!(result.success);
        assert_eq!(result.content, "No summary available.");
        assert_eq!(result.title, "Blank");
    }
}
