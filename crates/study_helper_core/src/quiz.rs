//! crates/study_helper_core/src/quiz.rs
//!
//! Quiz derivation: generation-backed questions with a deterministic
//! sentence-template fallback.

use crate::domain::{Difficulty, GenerationRequest, Quiz, QuizQuestion};
use crate::gateway::GenerationGateway;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Content shorter than this (in characters) skips generation.
pub const MIN_GENERATION_CHARS: usize = 50;
/// Content with fewer words than this cannot produce a quiz.
const MIN_QUIZ_WORDS: usize = 10;
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_KEY_SENTENCES: usize = 10;
/// Parsed questions must be longer than this after the marker is stripped.
const MIN_QUESTION_CHARS: usize = 10;

pub const NOT_ENOUGH_CONTENT: &str =
    "Not enough content to generate meaningful quiz questions. Please search for a topic first.";

const GENERIC_QUESTIONS: [&str; 5] = [
    "What is the main concept discussed in this topic?",
    "How does this topic relate to real-world applications?",
    "What are the most important points to remember?",
    "What questions does this information raise?",
    "How might this knowledge be useful in practice?",
];

fn question_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?i)^(?:q\s*\d+\s*[:.)]?|\d+\s*[.):]|question\b(?:\s*\d+)?\s*[:.)]?)\s*")
            .expect("question marker pattern is valid")
    })
}

fn difficulty_instructions(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "Create simple recall questions, fill-in-the-blanks, and basic true/false questions that test basic understanding."
        }
        Difficulty::Medium => {
            "Create questions that require understanding and explanation of concepts, asking 'how' and 'why' questions."
        }
        Difficulty::Hard => {
            "Create analytical questions that require critical thinking, comparison, synthesis, and application of knowledge."
        }
    }
}

pub fn build_quiz_prompt(
    content: &str,
    topic: &str,
    difficulty: Difficulty,
    count: usize,
) -> String {
    format!(
        r#"Create exactly {count} {difficulty} level educational quiz questions about: "{topic}"

Content to base questions on:
{content}

Requirements:
{instructions}

Format Requirements:
- Number each question clearly (Q1:, Q2:, etc.)
- Make questions varied (multiple choice, short answer, essay, true/false)
- Ensure questions test different aspects of the topic
- Focus on the most important concepts from the content
- Make questions specific to the content provided
- Avoid generic questions
- Use plain text without emojis or special characters

Example format:
Q1: [Specific question based on content]
Q2: [Different type of question]
Q3: [Another variation]

Create exactly {count} questions now:"#,
        instructions = difficulty_instructions(difficulty),
    )
}

/// Extracts numbered questions from a generated response.
pub fn parse_questions(response: &str) -> Vec<QuizQuestion> {
    let marker = question_marker();
    response
        .lines()
        .map(str::trim)
        .filter_map(|line| marker.find(line).map(|m| line[m.end()..].trim()))
        .filter(|question| question.chars().count() > MIN_QUESTION_CHARS)
        .map(str::to_string)
        .collect()
}

/// Derives exactly `count` questions from `content`, preferring the
/// generation service and falling back to [`basic_quiz`].
pub async fn derive_quiz(
    gateway: &GenerationGateway,
    credential: Option<&str>,
    content: &str,
    topic: &str,
    difficulty: Difficulty,
    count: usize,
) -> Quiz {
    if content.trim().chars().count() < MIN_GENERATION_CHARS {
        info!(topic, "content too short for generation; using basic quiz");
        return Quiz {
            questions: pad_to(basic_quiz(content, difficulty, count), count),
            enhanced: false,
            notice: None,
        };
    }

    let prompt = build_quiz_prompt(content, topic, difficulty, count);
    let request = GenerationRequest::new(prompt, 1200, 0.5);

    match gateway.generate(credential, &request).await {
        Ok(response) => {
            let mut questions = parse_questions(&response);
            let enhanced = !questions.is_empty();
            if questions.len() < count {
                let missing = count - questions.len();
                info!(
                    parsed = questions.len(),
                    missing,
                    "padding generated quiz with basic questions"
                );
                questions.extend(basic_quiz(content, difficulty, missing));
            }
            Quiz {
                questions: pad_to(questions, count),
                enhanced,
                notice: None,
            }
        }
        Err(err) => {
            warn!(topic, code = err.code(), "quiz generation unavailable; using basic quiz");
            Quiz {
                questions: pad_to(basic_quiz(content, difficulty, count), count),
                enhanced: false,
                notice: Some(err.to_string()),
            }
        }
    }
}

/// Pads with generic questions, or truncates, to exactly `count`.
fn pad_to(mut questions: Vec<QuizQuestion>, count: usize) -> Vec<QuizQuestion> {
    questions.truncate(count);
    while questions.len() < count {
        questions.push(GENERIC_QUESTIONS[questions.len() % GENERIC_QUESTIONS.len()].to_string());
    }
    questions
}

/// Template-based questions built from the leading sentences of `content`.
///
/// Content of fewer than ten words yields the single [`NOT_ENOUGH_CONTENT`]
/// question regardless of `count`.
pub fn basic_quiz(content: &str, difficulty: Difficulty, count: usize) -> Vec<QuizQuestion> {
    if content.split_whitespace().count() < MIN_QUIZ_WORDS {
        return vec![NOT_ENOUGH_CONTENT.to_string()];
    }

    let questions = content
        .split(". ")
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(MAX_KEY_SENTENCES.min(count))
        .enumerate()
        .map(|(i, sentence)| template_question(difficulty, i, sentence))
        .collect();

    pad_to(questions, count)
}

fn template_question(difficulty: Difficulty, index: usize, sentence: &str) -> QuizQuestion {
    match (difficulty, index % 3) {
        (Difficulty::Easy, 0) => format!("Fill in the blank: {}", blank_out(sentence)),
        (Difficulty::Easy, 1) => format!("True or False: {}", sentence),
        (Difficulty::Easy, _) => format!(
            "What is mentioned about {}?",
            sentence.split_whitespace().next().unwrap_or("the topic")
        ),
        (Difficulty::Medium, 0) => {
            format!("Explain the significance of: {}...", prefix(sentence, 60))
        }
        (Difficulty::Medium, 1) => {
            format!("How does this relate to the main topic: {}...?", prefix(sentence, 50))
        }
        (Difficulty::Medium, _) => {
            format!("What are the key characteristics mentioned in: {}...?", prefix(sentence, 70))
        }
        (Difficulty::Hard, 0) => format!("Analyze and evaluate: {}...", prefix(sentence, 60)),
        (Difficulty::Hard, 1) => {
            format!("What are the implications of: {}...?", prefix(sentence, 50))
        }
        (Difficulty::Hard, _) => {
            format!("How would you apply this knowledge: {}...?", prefix(sentence, 60))
        }
    }
}

/// Replaces the third-from-last word with a blank. Sentences of fewer than
/// three words are returned whole.
fn blank_out(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() < 3 {
        return sentence.to_string();
    }
    let target = words.len() - 3;
    words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == target { "______" } else { *w })
        .collect::<Vec<_>>()
        .join(" ")
}

fn prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::FakeChat;
    use crate::ports::GenerationError;
    use std::sync::Arc;

    const PHOTOSYNTHESIS: &str = "Photosynthesis converts light energy into chemical energy. \
Plants use chlorophyll to capture sunlight. This process occurs in chloroplasts.";

    fn gateway(chat: Arc<FakeChat>) -> GenerationGateway {
        GenerationGateway::new(chat)
    }

    #[test]
    fn easy_quiz_cycles_templates_over_sentences() {
        let questions = basic_quiz(PHOTOSYNTHESIS, Difficulty::Easy, 3);

        assert_eq!(
            questions,
            vec![
                "Fill in the blank: Photosynthesis converts light energy ______ chemical energy",
                "True or False: Plants use chlorophyll to capture sunlight",
                "What is mentioned about This?",
            ]
        );
    }

    #[test]
    fn medium_and_hard_templates_truncate_sentences() {
        let medium = basic_quiz(PHOTOSYNTHESIS, Difficulty::Medium, 3);
        assert!(medium[0].starts_with("Explain the significance of: Photosynthesis"));
        assert!(medium[1].starts_with("How does this relate to the main topic:"));
        assert!(medium[2].starts_with("What are the key characteristics mentioned in:"));

        let hard = basic_quiz(PHOTOSYNTHESIS, Difficulty::Hard, 3);
        assert_eq!(
            hard[0],
            "Analyze and evaluate: Photosynthesis converts light energy into chemical energy..."
        );
        assert!(hard[1].starts_with("What are the implications of:"));
        assert!(hard[2].starts_with("How would you apply this knowledge:"));
    }

    #[test]
    fn short_content_yields_single_sentinel() {
        assert_eq!(
            basic_quiz("Too short to quiz.", Difficulty::Hard, 7),
            vec![NOT_ENOUGH_CONTENT.to_string()]
        );
        assert_eq!(basic_quiz("", Difficulty::Easy, 3).len(), 1);
    }

    #[test]
    fn basic_quiz_pads_with_generic_questions() {
        let questions = basic_quiz(PHOTOSYNTHESIS, Difficulty::Easy, 6);

        assert_eq!(questions.len(), 6);
        assert_eq!(questions[3], GENERIC_QUESTIONS[3]);
        assert_eq!(questions[5], GENERIC_QUESTIONS[0]);
    }

    #[test]
    fn blank_out_keeps_short_sentences_whole() {
        assert_eq!(blank_out("Two words"), "Two words");
        assert_eq!(blank_out("one two three"), "______ two three");
    }

    #[test]
    fn prefix_respects_char_boundaries() {
        assert_eq!(prefix("caf\u{E9} au lait", 4), "caf\u{E9}");
        assert_eq!(prefix("abc", 10), "abc");
    }

    #[test]
    fn parse_questions_recognizes_markers() {
        let response = "Here are your questions:\n\
Q1: What does chlorophyll absorb?\n\
2) Why do plants need sunlight to grow?\n\
3. Short?\n\
Question 4: How are chloroplasts structured?\n\
q5. Compare light and dark reactions in detail.\n\
Quickly review the material.";

        assert_eq!(
            parse_questions(response),
            vec![
                "What does chlorophyll absorb?",
                "Why do plants need sunlight to grow?",
                "How are chloroplasts structured?",
                "Compare light and dark reactions in detail.",
            ]
        );
    }

    #[test]
    fn question_marker_needs_the_whole_word() {
        let response = "Questions to consider about plants:\n\
Questioning authority is key here\n\
Question: What gas do plants release?";

        assert_eq!(parse_questions(response), vec!["What gas do plants release?"]);
    }

    #[tokio::test]
    async fn derive_quiz_uses_generated_questions() {
        let chat = Arc::new(FakeChat::replying(vec![Ok(
            "Q1: What does chlorophyll absorb?\nQ2: Where does photosynthesis occur?".into(),
        )]));

        let quiz = derive_quiz(
            &gateway(chat.clone()),
            Some("key"),
            PHOTOSYNTHESIS,
            "Photosynthesis",
            Difficulty::Medium,
            2,
        )
        .await;

        assert!(quiz.enhanced);
        assert_eq!(
            quiz.questions,
            vec!["What does chlorophyll absorb?", "Where does photosynthesis occur?"]
        );
        assert!(chat.last_prompt().unwrap().contains("Create exactly 2 medium level"));
    }

    #[tokio::test]
    async fn derive_quiz_pads_partial_generation_with_basic_questions() {
        let chat = Arc::new(FakeChat::replying(vec![Ok(
            "Q1: What does chlorophyll absorb?".into(),
        )]));

        let quiz = derive_quiz(
            &gateway(chat),
            Some("key"),
            PHOTOSYNTHESIS,
            "Photosynthesis",
            Difficulty::Easy,
            3,
        )
        .await;

        assert_eq!(quiz.questions.len(), 3);
        assert_eq!(quiz.questions[0], "What does chlorophyll absorb?");
        assert!(quiz.questions[1].starts_with("Fill in the blank:"));
        assert!(quiz.questions[2].starts_with("True or False:"));
    }

    #[tokio::test]
    async fn derive_quiz_falls_back_when_generation_fails() {
        let chat = Arc::new(FakeChat::replying(vec![Err(GenerationError::RateLimited)]));

        let quiz = derive_quiz(
            &gateway(chat),
            Some("key"),
            PHOTOSYNTHESIS,
            "Photosynthesis",
            Difficulty::Easy,
            3,
        )
        .await;

        assert!(!quiz.enhanced);
        assert_eq!(quiz.questions, basic_quiz(PHOTOSYNTHESIS, Difficulty::Easy, 3));
        assert_eq!(quiz.notice, Some(GenerationError::RateLimited.to_string()));
    }

    #[tokio::test]
    async fn derive_quiz_always_returns_requested_count() {
        let chat = Arc::new(FakeChat::replying(vec![Ok((1..=20)
            .map(|i| format!("Q{}: Generated question number {}?", i, i))
            .collect::<Vec<_>>()
            .join("\n"))]));
        let gateway = gateway(chat.clone());

        for count in 1..=15 {
            for content in ["", "tiny", PHOTOSYNTHESIS] {
                let quiz =
                    derive_quiz(&gateway, Some("key"), content, "Topic", Difficulty::Hard, count)
                        .await;
                assert_eq!(
                    quiz.questions.len(),
                    count,
                    "content {:?}, count {}",
                    content,
                    count
                );
            }
        }
    }

    #[tokio::test]
    async fn short_content_skips_generation() {
        let chat = Arc::new(FakeChat::replying(vec![Ok("Q1: unused question text".into())]));

        let quiz = derive_quiz(
            &gateway(chat.clone()),
            Some("key"),
            "Rust is a language.",
            "Rust",
            Difficulty::Easy,
            3,
        )
        .await;

        assert_eq!(chat.call_count(), 0);
        assert_eq!(quiz.questions[0], NOT_ENOUGH_CONTENT);
        assert_eq!(quiz.questions.len(), 3);
    }
}
