pub mod groq_llm;
pub mod wikipedia;

pub use groq_llm::GroqChatAdapter;
pub use wikipedia::{WikipediaAdapter, WikipediaSettings};
