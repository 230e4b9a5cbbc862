//! crates/study_helper_core/src/related.rs
//!
//! Related-topic suggestions from the encyclopedia's open search, with a
//! templated fallback when the service cannot be reached.

use crate::ports::EncyclopediaService;
use std::sync::Arc;
use tracing::warn;

const SUGGESTION_QUERY_LIMIT: u32 = 8;
const MAX_SUGGESTIONS: usize = 6;

pub struct RelatedTopics {
    encyclopedia: Arc<dyn EncyclopediaService>,
}

impl RelatedTopics {
    pub fn new(encyclopedia: Arc<dyn EncyclopediaService>) -> Self {
        Self { encyclopedia }
    }

    /// Up to six titles related to `topic`, never including the topic itself.
    pub async fn suggest(&self, topic: &str) -> Vec<String> {
        let topic = topic.trim();
        match self.encyclopedia.suggest_titles(topic, SUGGESTION_QUERY_LIMIT).await {
            Ok(titles) => {
                let topic_lower = topic.to_lowercase();
                titles
                    .into_iter()
                    .filter(|title| title.to_lowercase() != topic_lower)
                    .take(MAX_SUGGESTIONS)
                    .collect()
            }
            Err(err) => {
                warn!(topic, error = %err, "could not fetch related topics; using fallback list");
                fallback_topics(topic)
            }
        }
    }
}

pub fn fallback_topics(topic: &str) -> Vec<String> {
    vec![
        format!("History of {}", topic),
        format!("Applications of {}", topic),
        format!("{} fundamentals", topic),
        format!("Advanced {}", topic),
        format!("{} in practice", topic),
    ]
}
