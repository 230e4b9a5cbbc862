//! crates/study_helper_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// The error label a lookup carries when the encyclopedia has no such article.
pub const NOT_FOUND_LABEL: &str = "Not Found";

/// Advice shown alongside a "Not Found" lookup.
pub const NOT_FOUND_SUGGESTIONS: [&str; 3] = [
    "Check the spelling of your search term",
    "Try more general or specific terms",
    "Use alternative names or synonyms",
];

/// Maximum number of entries a study history keeps.
pub const HISTORY_CAPACITY: usize = 20;

/// Normalizes a free-text topic into an encyclopedia title key.
pub fn normalize_topic(topic: &str) -> String {
    topic.trim().replace(' ', "_")
}

//=========================================================================================
// Encyclopedia Lookups
//=========================================================================================

/// A raw page summary as returned by the encyclopedia, before it is judged usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSummary {
    pub extract: Option<String>,
    pub title: Option<String>,
    pub page_url: Option<String>,
    pub thumbnail: Option<String>,
}

/// The outcome of resolving a topic against the encyclopedia.
///
/// Failures are carried as data: `success` is false, `content` holds a
/// human-readable message and `error` the classification label.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub success: bool,
    pub content: String,
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub error: Option<String>,
}

impl LookupResult {
    pub fn found(content: String, title: String, url: String, thumbnail: String) -> Self {
        Self {
            success: true,
            content,
            title,
            url,
            thumbnail,
            error: None,
        }
    }

    pub fn failed(query: &str, content: String, error: String) -> Self {
        Self {
            success: false,
            content,
            title: query.to_string(),
            url: String::new(),
            thumbnail: String::new(),
            error: Some(error),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error.as_deref() == Some(NOT_FOUND_LABEL)
    }

    /// Actionable suggestions for the user, if this failure has any.
    pub fn suggestions(&self) -> Vec<String> {
        if self.is_not_found() {
            NOT_FOUND_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        }
    }
}

//=========================================================================================
// Generation
//=========================================================================================

/// A single request to the text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
    /// Clamped to `[0, 1]` on construction.
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, max_output_tokens: u32, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens,
            temperature: temperature.clamp(0.0, 1.0),
        }
    }
}

//=========================================================================================
// Quizzes and Notes
//=========================================================================================

/// A single quiz prompt. Order in a quiz is presentation order.
pub type QuizQuestion = String;

/// How demanding generated quiz questions should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("'{}' is not a difficulty (easy, medium, hard)", other)),
        }
    }
}

/// A derived quiz. `questions.len()` always equals the requested count.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
    /// True when at least one question came from the generation service.
    pub enhanced: bool,
    /// Why generation was skipped or degraded, if it was attempted and failed.
    pub notice: Option<String>,
}

/// Study notes for a topic. `content` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NotesDocument {
    pub enhanced: bool,
    pub content: String,
}

/// Which derivation the user asked for when requesting notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotesStyle {
    #[default]
    Enhanced,
    Basic,
}

//=========================================================================================
// Study Modes and History
//=========================================================================================

/// The study activity a topic was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudyMode {
    #[default]
    Research,
    Quiz,
    Notes,
    Related,
}

impl StudyMode {
    pub fn label(&self) -> &'static str {
        match self {
            StudyMode::Research => "Research & Learn",
            StudyMode::Quiz => "Quiz Mode",
            StudyMode::Notes => "Study Notes",
            StudyMode::Related => "Related Topics",
        }
    }
}

/// A topic the user studied, in the mode it was first studied in.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyHistoryEntry {
    pub topic: String,
    pub mode: StudyMode,
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of studied topics, deduplicated by topic and capped at
/// [`HISTORY_CAPACITY`] entries.
#[derive(Debug, Clone, Default)]
pub struct StudyHistory {
    entries: Vec<StudyHistoryEntry>,
}

impl StudyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a topic unless it is already present. Repeats do not update
    /// the existing entry.
    pub fn record(&mut self, topic: &str, mode: StudyMode, timestamp: DateTime<Utc>) {
        if !self.entries.iter().any(|e| e.topic == topic) {
            self.entries.push(StudyHistoryEntry {
                topic: topic.to_string(),
                mode,
                timestamp,
            });
        }
        if self.entries.len() > HISTORY_CAPACITY {
            let excess = self.entries.len() - HISTORY_CAPACITY;
            self.entries.drain(..excess);
        }
    }

    /// The last `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> &[StudyHistoryEntry] {
        let start = self.entries.len().saturating_sub(limit);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[StudyHistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&StudyHistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
