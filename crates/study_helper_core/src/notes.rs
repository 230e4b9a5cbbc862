//! crates/study_helper_core/src/notes.rs
//!
//! Study-notes derivation. Generated notes are returned verbatim; the basic
//! notes are assembled from sentence heuristics.

use crate::domain::{GenerationRequest, NotesDocument};
use crate::gateway::GenerationGateway;
use crate::ports::GenerationError;
use crate::quiz::MIN_GENERATION_CHARS;
use std::collections::BTreeSet;
use std::fmt::Write;
use tracing::{info, warn};

pub const NO_CONTENT: &str = "No content available for notes generation.";
const NO_OVERVIEW: &str = "No overview available.";
const MAX_KEY_POINTS: usize = 6;
const MAX_TERMS: usize = 8;
const KEY_POINT_MIN_WORDS: usize = 8;
const TERM_STOPLIST: [&str; 9] = [
    "The", "This", "That", "These", "Those", "When", "Where", "What", "How",
];
const STUDY_TIPS: [&str; 4] = [
    "Review the key points regularly",
    "Create connections between important terms",
    "Practice explaining the concept in your own words",
    "Look for real-world examples and applications",
];

pub fn build_notes_prompt(content: &str, topic: &str) -> String {
    format!(
        r#"Create comprehensive, well-structured study notes for the topic: "{topic}"

Source content:
{content}

Create detailed study notes with these sections:

Overview
A clear, concise summary (2-3 sentences) of the main concept

Key Points
5-8 detailed bullet points covering the most important aspects from the content

Important Terms and Concepts
5-7 key terms with clear definitions and explanations

Key Facts and Details
4-6 specific facts, data points, or important details worth remembering

Connections and Applications
How this topic relates to other subjects, real-world applications, or broader concepts

Study Tips
Specific suggestions for remembering this information (mnemonics, analogies, etc.)

Review Questions
3-4 self-assessment questions to test understanding

Make the notes comprehensive, student-friendly, and well-organized.
Focus specifically on the content provided, not generic information.
Use plain text formatting without emojis or special unicode characters."#
    )
}

/// Notes together with the reason generation was not used, if it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedNotes {
    pub notes: NotesDocument,
    pub failure: Option<GenerationError>,
}

/// Derives study notes, preferring the generation service.
pub async fn derive_notes(
    gateway: &GenerationGateway,
    credential: Option<&str>,
    content: &str,
    topic: &str,
) -> DerivedNotes {
    if content.trim().chars().count() < MIN_GENERATION_CHARS {
        info!(topic, "content too short for generation; using basic notes");
        return DerivedNotes {
            notes: basic_notes(content),
            failure: None,
        };
    }

    let request = GenerationRequest::new(build_notes_prompt(content, topic), 2000, 0.4);
    match gateway.generate(credential, &request).await {
        Ok(text) => DerivedNotes {
            notes: NotesDocument {
                enhanced: true,
                content: text,
            },
            failure: None,
        },
        Err(err) => {
            warn!(topic, code = err.code(), "notes generation unavailable; using basic notes");
            DerivedNotes {
                notes: basic_notes(content),
                failure: Some(err),
            }
        }
    }
}

/// Builds plain-text notes with Overview, Key Points, Important Terms,
/// Summary and Study Tips sections.
pub fn basic_notes(content: &str) -> NotesDocument {
    if content.trim().is_empty() {
        return NotesDocument {
            enhanced: false,
            content: NO_CONTENT.to_string(),
        };
    }

    let sentences: Vec<&str> = content
        .split(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let key_points = sentences
        .iter()
        .filter(|s| s.split_whitespace().count() > KEY_POINT_MIN_WORDS)
        .take(MAX_KEY_POINTS);

    let terms: BTreeSet<String> = sentences
        .iter()
        .flat_map(|s| s.split_whitespace())
        .map(|word| word.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect::<String>())
        .filter(|word| {
            is_title_case(word)
                && word.chars().count() > 3
                && !TERM_STOPLIST.contains(&word.as_str())
        })
        .collect();

    let overview = match sentences.len() {
        0 => NO_OVERVIEW.to_string(),
        1 => sentences[0].to_string(),
        _ => join_sentences(&sentences[..2]),
    };

    let summary = if sentences.len() >= 3 {
        join_sentences(&sentences[..3])
    } else {
        let head: String = content.chars().take(200).collect();
        format!("{}...", head)
    };

    let mut notes = String::new();
    let _ = writeln!(notes, "Overview\n{}\n", overview);
    notes.push_str("Key Points\n");
    for point in key_points {
        let _ = writeln!(notes, "- {}", point);
    }
    notes.push_str("\nImportant Terms\n");
    for term in terms.iter().take(MAX_TERMS) {
        let _ = writeln!(notes, "- {}", term);
    }
    let _ = writeln!(notes, "\nSummary\n{}\n", summary);
    notes.push_str("Study Tips\n");
    for tip in STUDY_TIPS {
        let _ = writeln!(notes, "- {}", tip);
    }

    NotesDocument {
        enhanced: false,
        content: notes,
    }
}

fn join_sentences(sentences: &[&str]) -> String {
    let joined = sentences
        .iter()
        .map(|s| s.trim_end_matches('.'))
        .collect::<Vec<_>>()
        .join(". ");
    format!("{}.", joined)
}

/// Title case: every cased run starts upper-case and continues lower-case,
/// with at least one cased character.
fn is_title_case(word: &str) -> bool {
    let mut previous_cased = false;
    let mut any_cased = false;
    for c in word.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else {
            previous_cased = false;
        }
    }
    any_cased
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::FakeChat;
    use std::sync::Arc;

    const ROME: &str = "Ancient Rome was a civilization that grew from a small town on the Tiber. \
The Roman Republic was governed by elected Senators and Consuls for centuries. \
Julius Caesar played a critical role in the events that led to the Empire. \
When the Empire fell, Europe changed.";

    #[test]
    fn empty_content_yields_placeholder() {
        let notes = basic_notes("");
        assert!(!notes.enhanced);
        assert_eq!(notes.content, NO_CONTENT);

        assert_eq!(basic_notes("   ").content, NO_CONTENT);
    }

    #[test]
    fn basic_notes_have_fixed_sections_in_order() {
        let notes = basic_notes(ROME).content;

        let sections = ["Overview", "Key Points", "Important Terms", "Summary", "Study Tips"];
        let positions: Vec<usize> = sections
            .iter()
            .map(|section| notes.find(section).expect("section present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(notes.matches("\n- Review the key points regularly").count(), 1);
    }

    #[test]
    fn overview_joins_first_two_sentences() {
        let notes = basic_notes(ROME).content;
        assert!(notes.starts_with(
            "Overview\nAncient Rome was a civilization that grew from a small town on the Tiber. \
The Roman Republic was governed by elected Senators and Consuls for centuries.\n"
        ));
    }

    #[test]
    fn key_points_require_more_than_eight_words() {
        let notes = basic_notes(ROME).content;
        assert!(notes.contains(
            "- Julius Caesar played a critical role in the events that led to the Empire\n"
        ));
        assert!(!notes.contains("- When the Empire fell"));
    }

    #[test]
    fn important_terms_are_sorted_deduplicated_and_filtered() {
        let notes = basic_notes(ROME).content;
        let start = notes.find("Important Terms\n").unwrap() + "Important Terms\n".len();
        let end = notes.find("\nSummary").unwrap();
        let terms: Vec<&str> = notes[start..end]
            .lines()
            .map(|l| l.trim_start_matches("- "))
            .collect();

        assert_eq!(
            terms,
            vec!["Ancient", "Caesar", "Consuls", "Empire", "Europe", "Julius", "Republic", "Roman"]
        );
    }

    #[test]
    fn single_sentence_uses_truncated_content_for_summary() {
        let notes = basic_notes("Rust is a systems programming language").content;
        assert!(notes.contains("Overview\nRust is a systems programming language\n"));
        assert!(notes.contains("Summary\nRust is a systems programming language...\n"));
    }

    #[test]
    fn title_case_matches_python_semantics() {
        assert!(is_title_case("Rome"));
        assert!(is_title_case("Covid19"));
        assert!(!is_title_case("NASA"));
        assert!(!is_title_case("rome"));
        assert!(!is_title_case("McDonald"));
        assert!(!is_title_case("1999"));
    }

    #[tokio::test]
    async fn generated_notes_are_returned_verbatim() {
        let chat = Arc::new(FakeChat::replying(vec![Ok("Overview\nGenerated notes".into())]));
        let gateway = GenerationGateway::new(chat);

        let derived = derive_notes(&gateway, Some("key"), ROME, "Ancient Rome").await;

        assert!(derived.notes.enhanced);
        assert_eq!(derived.notes.content, "Overview\nGenerated notes");
        assert!(derived.failure.is_none());
    }

    #[tokio::test]
    async fn missing_credential_falls_back_to_basic_notes() {
        let chat = Arc::new(FakeChat::default());
        let gateway = GenerationGateway::new(chat.clone());

        let derived = derive_notes(&gateway, None, ROME, "Ancient Rome").await;

        assert!(!derived.notes.enhanced);
        assert_eq!(derived.notes, basic_notes(ROME));
        assert_eq!(derived.failure, Some(GenerationError::MissingCredential));
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_content_never_calls_generation() {
        let chat = Arc::new(FakeChat::replying(vec![Ok("unused".into())]));
        let gateway = GenerationGateway::new(chat.clone());

        let derived = derive_notes(&gateway, Some("key"), "", "Nothing").await;

        assert!(!derived.notes.enhanced);
        assert!(!derived.notes.content.is_empty());
        assert_eq!(chat.call_count(), 0);
    }
}
