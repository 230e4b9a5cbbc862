pub mod domain;
pub mod gateway;
pub mod lookup;
pub mod notes;
pub mod ports;
pub mod quiz;
pub mod related;
pub mod retry;
pub mod sanitize;
pub mod session;
pub mod study;

pub use domain::{
    Difficulty, GenerationRequest, LookupResult, NotesDocument, NotesStyle, PageSummary, Quiz,
    QuizQuestion, StudyHistory, StudyHistoryEntry, StudyMode,
};
pub use gateway::GenerationGateway;
pub use lookup::LookupClient;
pub use ports::{
    ChatCompletionService, EncyclopediaService, FetchError, GenerationError, GenerationResult,
};
pub use related::RelatedTopics;
pub use retry::RetryPolicy;
pub use session::{CurrentStudy, StudySession};
pub use study::{Executed, StudyCommand, StudyOptions, StudyOutcome, StudyService};
