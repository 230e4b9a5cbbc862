//! services/api/src/web/protocol.rs
//!
//! Defines the JSON protocol between clients and the API server: the commands a
//! client can send and the outcomes the server returns. The core crate has no
//! serialization, so every wire type here converts to or from a core type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_helper_core::domain::{
    Difficulty, LookupResult, NotesStyle, StudyHistoryEntry, StudyMode,
};
use study_helper_core::ports::GenerationError;
use study_helper_core::study::{
    Executed, StudyCommand, StudyOptions, StudyOutcome, DEFAULT_QUESTION_COUNT,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Entries returned by the history listing when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

//=========================================================================================
// Shared Enumerations
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyDto {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl From<DifficultyDto> for Difficulty {
    fn from(value: DifficultyDto) -> Self {
        match value {
            DifficultyDto::Easy => Difficulty::Easy,
            DifficultyDto::Medium => Difficulty::Medium,
            DifficultyDto::Hard => Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for DifficultyDto {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyDto::Easy,
            Difficulty::Medium => DifficultyDto::Medium,
            Difficulty::Hard => DifficultyDto::Hard,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StudyModeDto {
    #[default]
    Research,
    Quiz,
    Notes,
    Related,
}

impl From<StudyModeDto> for StudyMode {
    fn from(value: StudyModeDto) -> Self {
        match value {
            StudyModeDto::Research => StudyMode::Research,
            StudyModeDto::Quiz => StudyMode::Quiz,
            StudyModeDto::Notes => StudyMode::Notes,
            StudyModeDto::Related => StudyMode::Related,
        }
    }
}

impl From<StudyMode> for StudyModeDto {
    fn from(value: StudyMode) -> Self {
        match value {
            StudyMode::Research => StudyModeDto::Research,
            StudyMode::Quiz => StudyModeDto::Quiz,
            StudyMode::Notes => StudyModeDto::Notes,
            StudyMode::Related => StudyModeDto::Related,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotesStyleDto {
    #[default]
    Enhanced,
    Basic,
}

impl From<NotesStyleDto> for NotesStyle {
    fn from(value: NotesStyleDto) -> Self {
        match value {
            NotesStyleDto::Enhanced => NotesStyle::Enhanced,
            NotesStyleDto::Basic => NotesStyle::Basic,
        }
    }
}

//=========================================================================================
// Requests Sent FROM the Client TO the Server
//=========================================================================================

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct CreateSessionRequest {
    /// Generation credential for this session. Blank means none.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub has_api_key: bool,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SetApiKeyRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ApiKeyStatus {
    pub has_api_key: bool,
}

/// Follow-up settings shared by study and restudy requests.
#[derive(Deserialize, ToSchema, Debug, Default, Clone, Copy)]
pub struct StudySettings {
    #[serde(default)]
    pub mode: StudyModeDto,
    #[serde(default)]
    pub difficulty: Option<DifficultyDto>,
    #[serde(default)]
    pub question_count: Option<usize>,
    #[serde(default)]
    pub notes_style: Option<NotesStyleDto>,
}

impl StudySettings {
    fn options(&self) -> StudyOptions {
        StudyOptions {
            difficulty: self.difficulty.unwrap_or_default().into(),
            question_count: self.question_count.unwrap_or(DEFAULT_QUESTION_COUNT),
            notes_style: self.notes_style.unwrap_or_default().into(),
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct StudyRequest {
    pub topic: String,
    #[serde(flatten)]
    pub settings: StudySettings,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct QuizRequest {
    #[serde(default)]
    pub difficulty: Option<DifficultyDto>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SubmitQuizRequest {
    pub answers: Vec<String>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct NotesRequest {
    #[serde(default)]
    pub style: Option<NotesStyleDto>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// How many of the most recent entries to return. Defaults to 5.
    pub limit: Option<usize>,
}

/// Any study action, tagged by `type`.
#[derive(Deserialize, ToSchema, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Study {
        topic: String,
        #[serde(flatten)]
        settings: StudySettings,
    },
    Restudy {
        index: usize,
        #[serde(flatten)]
        settings: StudySettings,
    },
    Quiz {
        #[serde(default)]
        difficulty: Option<DifficultyDto>,
        #[serde(default)]
        count: Option<usize>,
    },
    SubmitQuiz {
        answers: Vec<String>,
    },
    Notes {
        #[serde(default)]
        style: Option<NotesStyleDto>,
    },
    Related,
    History {
        #[serde(default)]
        limit: Option<usize>,
    },
    ClearHistory,
}

impl From<ClientCommand> for StudyCommand {
    fn from(command: ClientCommand) -> Self {
        match command {
            ClientCommand::Study { topic, settings } => StudyCommand::Study {
                topic,
                mode: settings.mode.into(),
                options: settings.options(),
            },
            ClientCommand::Restudy { index, settings } => StudyCommand::Restudy {
                index,
                mode: settings.mode.into(),
                options: settings.options(),
            },
            ClientCommand::Quiz { difficulty, count } => StudyCommand::Quiz {
                difficulty: difficulty.unwrap_or_default().into(),
                count: count.unwrap_or(DEFAULT_QUESTION_COUNT),
            },
            ClientCommand::SubmitQuiz { answers } => StudyCommand::SubmitQuiz { answers },
            ClientCommand::Notes { style } => StudyCommand::Notes {
                style: style.unwrap_or_default().into(),
            },
            ClientCommand::Related => StudyCommand::Related,
            ClientCommand::History { limit } => StudyCommand::History {
                limit: Some(limit.unwrap_or(DEFAULT_HISTORY_LIMIT)),
            },
            ClientCommand::ClearHistory => StudyCommand::ClearHistory,
        }
    }
}

//=========================================================================================
// Responses Sent FROM the Server TO the Client
//=========================================================================================

/// Every outcome is tagged with the sequence number of the request that produced it.
#[derive(Serialize, ToSchema, Debug)]
pub struct CommandResponse {
    pub request_id: u64,
    pub outcome: Outcome,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct LookupBody {
    pub success: bool,
    pub content: String,
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub error: Option<String>,
    /// Search advice, present when the article was not found.
    pub suggestions: Vec<String>,
}

impl From<LookupResult> for LookupBody {
    fn from(result: LookupResult) -> Self {
        let suggestions = result.suggestions();
        Self {
            success: result.success,
            content: result.content,
            title: result.title,
            url: result.url,
            thumbnail: result.thumbnail,
            error: result.error,
            suggestions,
        }
    }
}

/// A generation failure the client can show, with a stable `code`.
#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct FailureBody {
    pub code: String,
    pub message: String,
    pub advice: Option<String>,
}

impl From<GenerationError> for FailureBody {
    fn from(err: GenerationError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            advice: err.advice().map(str::to_string),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct QuizBody {
    pub topic: String,
    pub difficulty: DifficultyDto,
    pub questions: Vec<String>,
    pub enhanced: bool,
    pub notice: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct NotesBody {
    pub topic: String,
    pub enhanced: bool,
    pub content: String,
    /// Suggested name when the notes are saved as a file.
    pub file_name: String,
    pub failure: Option<FailureBody>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct RelatedBody {
    pub topic: String,
    pub suggestions: Vec<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct HistoryEntryBody {
    /// Position to pass to the restudy route.
    pub index: usize,
    pub topic: String,
    pub mode: StudyModeDto,
    pub mode_label: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntryBody {
    fn new(index: usize, entry: StudyHistoryEntry) -> Self {
        Self {
            index,
            mode_label: entry.mode.label().to_string(),
            mode: entry.mode.into(),
            topic: entry.topic,
            timestamp: entry.timestamp,
        }
    }
}

/// The result of a study action run right after its research step.
#[derive(Serialize, ToSchema, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FollowUp {
    Quiz(QuizBody),
    Notes(NotesBody),
    Related(RelatedBody),
    Superseded,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Studied {
        lookup: LookupBody,
        follow_up: Option<FollowUp>,
    },
    Quiz(QuizBody),
    QuizGraded {
        answered: usize,
        total: usize,
        complete: bool,
    },
    Notes(NotesBody),
    Related(RelatedBody),
    History {
        entries: Vec<HistoryEntryBody>,
    },
    HistoryCleared,
    NeedsResearch {
        message: String,
    },
    Superseded,
    Rejected {
        message: String,
    },
}

pub fn notes_file_name(topic: &str) -> String {
    format!("{}_notes.md", topic)
}

impl From<Executed> for CommandResponse {
    fn from(executed: Executed) -> Self {
        Self {
            request_id: executed.request_id,
            outcome: executed.outcome.into(),
        }
    }
}

impl From<StudyOutcome> for Outcome {
    fn from(outcome: StudyOutcome) -> Self {
        match outcome {
            StudyOutcome::Studied { lookup, follow_up } => Outcome::Studied {
                lookup: lookup.into(),
                follow_up: follow_up.map(|f| FollowUp::from(*f)),
            },
            StudyOutcome::Quiz {
                topic,
                difficulty,
                quiz,
            } => Outcome::Quiz(QuizBody {
                topic,
                difficulty: difficulty.into(),
                questions: quiz.questions,
                enhanced: quiz.enhanced,
                notice: quiz.notice,
            }),
            StudyOutcome::QuizGraded { answered, total } => Outcome::QuizGraded {
                answered,
                total,
                complete: answered == total,
            },
            StudyOutcome::Notes {
                topic,
                notes,
                failure,
            } => Outcome::Notes(NotesBody {
                file_name: notes_file_name(&topic),
                topic,
                enhanced: notes.enhanced,
                content: notes.content,
                failure: failure.map(FailureBody::from),
            }),
            StudyOutcome::Related { topic, suggestions } => {
                Outcome::Related(RelatedBody { topic, suggestions })
            }
            StudyOutcome::History {
                first_index,
                entries,
            } => Outcome::History {
                entries: entries
                    .into_iter()
                    .enumerate()
                    .map(|(offset, entry)| HistoryEntryBody::new(first_index + offset, entry))
                    .collect(),
            },
            StudyOutcome::HistoryCleared => Outcome::HistoryCleared,
            StudyOutcome::NeedsResearch { message } => Outcome::NeedsResearch { message },
            StudyOutcome::Superseded => Outcome::Superseded,
            StudyOutcome::Rejected { message } => Outcome::Rejected { message },
        }
    }
}

impl From<StudyOutcome> for FollowUp {
    fn from(outcome: StudyOutcome) -> Self {
        match Outcome::from(outcome) {
            Outcome::Quiz(body) => FollowUp::Quiz(body),
            Outcome::Notes(body) => FollowUp::Notes(body),
            Outcome::Related(body) => FollowUp::Related(body),
            Outcome::Superseded => FollowUp::Superseded,
            // The executor only follows research with a quiz, notes or related step.
            other @ (Outcome::Studied { .. }
            | Outcome::QuizGraded { .. }
            | Outcome::History { .. }
            | Outcome::HistoryCleared
            | Outcome::NeedsResearch { .. }
            | Outcome::Rejected { .. }) => {
                unreachable!("{:?} is not a follow-up", other)
            }
        }
    }
}
