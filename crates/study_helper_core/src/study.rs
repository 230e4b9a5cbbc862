//! crates/study_helper_core/src/study.rs
//!
//! User actions as explicit commands, and the executor that runs them
//! against a session. Every command produces a [`StudyOutcome`]; lookup and
//! generation failures are outcomes, never errors.

use crate::domain::{
    Difficulty, LookupResult, NotesDocument, NotesStyle, Quiz, QuizQuestion, StudyHistoryEntry,
    StudyMode,
};
use crate::gateway::GenerationGateway;
use crate::lookup::LookupClient;
use crate::notes::{basic_notes, derive_notes};
use crate::ports::{ChatCompletionService, EncyclopediaService, GenerationError};
use crate::quiz::derive_quiz;
use crate::related::RelatedTopics;
use crate::retry::RetryPolicy;
use crate::session::{CurrentStudy, RequestTicket, StudySession};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_QUESTION_COUNT: usize = 5;
pub const MAX_QUESTION_COUNT: usize = 15;

//=========================================================================================
// Commands and Outcomes
//=========================================================================================

/// Settings for the follow-up step of a study action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudyOptions {
    pub difficulty: Difficulty,
    pub question_count: usize,
    pub notes_style: NotesStyle,
}

impl Default for StudyOptions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            question_count: DEFAULT_QUESTION_COUNT,
            notes_style: NotesStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudyCommand {
    /// Record the topic, research it, then run the mode's follow-up.
    Study {
        topic: String,
        mode: StudyMode,
        options: StudyOptions,
    },
    /// Study a topic from the history again.
    Restudy {
        index: usize,
        mode: StudyMode,
        options: StudyOptions,
    },
    Quiz {
        difficulty: Difficulty,
        count: usize,
    },
    SubmitQuiz {
        answers: Vec<String>,
    },
    Notes {
        style: NotesStyle,
    },
    Related,
    History {
        limit: Option<usize>,
    },
    ClearHistory,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudyOutcome {
    Studied {
        lookup: LookupResult,
        follow_up: Option<Box<StudyOutcome>>,
    },
    Quiz {
        topic: String,
        difficulty: Difficulty,
        quiz: Quiz,
    },
    QuizGraded {
        answered: usize,
        total: usize,
    },
    Notes {
        topic: String,
        notes: NotesDocument,
        failure: Option<GenerationError>,
    },
    Related {
        topic: String,
        suggestions: Vec<String>,
    },
    /// The most recent entries, oldest first. `first_index` is the history
    /// position of the first entry, for use with restudy.
    History {
        first_index: usize,
        entries: Vec<StudyHistoryEntry>,
    },
    HistoryCleared,
    /// The action needs researched content first.
    NeedsResearch {
        message: String,
    },
    /// A newer action started while this one was in flight; its result was dropped.
    Superseded,
    /// The command itself was invalid.
    Rejected {
        message: String,
    },
}

/// An outcome tagged with the id of the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub request_id: u64,
    pub outcome: StudyOutcome,
}

//=========================================================================================
// The Executor
//=========================================================================================

pub struct StudyService {
    lookup: LookupClient,
    gateway: GenerationGateway,
    related: RelatedTopics,
    default_api_key: Option<String>,
}

impl StudyService {
    pub fn new(
        encyclopedia: Arc<dyn EncyclopediaService>,
        chat: Arc<dyn ChatCompletionService>,
    ) -> Self {
        Self {
            lookup: LookupClient::new(encyclopedia.clone()),
            gateway: GenerationGateway::new(chat),
            related: RelatedTopics::new(encyclopedia),
            default_api_key: None,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.lookup = self.lookup.with_retry_policy(policy);
        self
    }

    /// A credential used by sessions that have not supplied their own.
    pub fn with_default_api_key(mut self, api_key: Option<String>) -> Self {
        self.default_api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub async fn execute(&self, session: &Mutex<StudySession>, command: StudyCommand) -> Executed {
        debug!(?command, "executing study command");
        match command {
            StudyCommand::Study {
                topic,
                mode,
                options,
            } => self.study(session, topic, mode, options).await,
            StudyCommand::Restudy {
                index,
                mode,
                options,
            } => {
                let topic = session
                    .lock()
                    .await
                    .history()
                    .get(index)
                    .map(|e| e.topic.clone());
                match topic {
                    Some(topic) => self.study(session, topic, mode, options).await,
                    None => {
                        let outcome = StudyOutcome::Rejected {
                            message: format!(
                                "There is no study history entry at position {}.",
                                index
                            ),
                        };
                        rejected(session, outcome).await
                    }
                }
            }
            StudyCommand::Quiz { difficulty, count } => {
                if let Some(outcome) = invalid_question_count(count) {
                    return rejected(session, outcome).await;
                }
                let (ticket, snapshot) = self.begin_on_current(session).await;
                let outcome = match snapshot {
                    Some((current, api_key)) => {
                        self.quiz(session, ticket, &current, api_key.as_deref(), difficulty, count)
                            .await
                    }
                    None => needs_research("Please research a topic first to generate a quiz!"),
                };
                Executed {
                    request_id: ticket.id,
                    outcome,
                }
            }
            StudyCommand::SubmitQuiz { answers } => {
                let mut state = session.lock().await;
                let ticket = state.begin_query();
                let outcome = match state.last_quiz() {
                    Some(questions) => grade(questions, &answers),
                    None => StudyOutcome::Rejected {
                        message: "There is no quiz to submit. Generate a quiz first.".to_string(),
                    },
                };
                Executed {
                    request_id: ticket.id,
                    outcome,
                }
            }
            StudyCommand::Notes { style } => {
                let (ticket, snapshot) = self.begin_on_current(session).await;
                let outcome = match snapshot {
                    Some((current, api_key)) => {
                        self.notes(session, ticket, &current, api_key.as_deref(), style)
                            .await
                    }
                    None => needs_research("Please research a topic first to create study notes!"),
                };
                Executed {
                    request_id: ticket.id,
                    outcome,
                }
            }
            StudyCommand::Related => {
                let (ticket, snapshot) = self.begin_on_current(session).await;
                let outcome = match snapshot {
                    Some((current, _)) => self.related(session, ticket, &current.topic).await,
                    None => needs_research("Please research a topic first to find related topics!"),
                };
                Executed {
                    request_id: ticket.id,
                    outcome,
                }
            }
            StudyCommand::History { limit } => {
                let mut state = session.lock().await;
                let ticket = state.begin_query();
                let history = state.history();
                let entries = history.recent(limit.unwrap_or(history.len())).to_vec();
                let first_index = history.len() - entries.len();
                Executed {
                    request_id: ticket.id,
                    outcome: StudyOutcome::History {
                        first_index,
                        entries,
                    },
                }
            }
            StudyCommand::ClearHistory => {
                let mut state = session.lock().await;
                let ticket = state.begin_query();
                state.history_mut().clear();
                info!("study history cleared");
                Executed {
                    request_id: ticket.id,
                    outcome: StudyOutcome::HistoryCleared,
                }
            }
        }
    }

    async fn study(
        &self,
        session: &Mutex<StudySession>,
        topic: String,
        mode: StudyMode,
        options: StudyOptions,
    ) -> Executed {
        let topic = topic.trim().to_string();
        if topic.is_empty() {
            let outcome = StudyOutcome::Rejected {
                message: "Enter a topic to study.".to_string(),
            };
            return rejected(session, outcome).await;
        }
        if matches!(mode, StudyMode::Quiz) {
            if let Some(outcome) = invalid_question_count(options.question_count) {
                return rejected(session, outcome).await;
            }
        }

        let (ticket, api_key) = {
            let mut state = session.lock().await;
            let ticket = state.begin_action();
            state.history_mut().record(&topic, mode, Utc::now());
            (ticket, self.credential(&state))
        };

        info!(topic = %topic, mode = mode.label(), request_id = ticket.id, "researching topic");
        let lookup = self.lookup.lookup(&topic).await;

        if !lookup.success {
            return Executed {
                request_id: ticket.id,
                outcome: StudyOutcome::Studied {
                    lookup,
                    follow_up: None,
                },
            };
        }

        let current = CurrentStudy {
            topic: topic.clone(),
            title: lookup.title.clone(),
            content: lookup.content.clone(),
        };
        if !session.lock().await.commit_current(ticket, current.clone()) {
            info!(topic = %topic, request_id = ticket.id, "research result superseded");
            return superseded(ticket);
        }

        let follow_up = match mode {
            StudyMode::Research => None,
            StudyMode::Quiz => Some(
                self.quiz(
                    session,
                    ticket,
                    &current,
                    api_key.as_deref(),
                    options.difficulty,
                    options.question_count,
                )
                .await,
            ),
            StudyMode::Notes => Some(
                self.notes(session, ticket, &current, api_key.as_deref(), options.notes_style)
                    .await,
            ),
            StudyMode::Related => Some(self.related(session, ticket, &current.topic).await),
        };

        Executed {
            request_id: ticket.id,
            outcome: StudyOutcome::Studied {
                lookup,
                follow_up: follow_up.map(Box::new),
            },
        }
    }

    async fn quiz(
        &self,
        session: &Mutex<StudySession>,
        ticket: RequestTicket,
        current: &CurrentStudy,
        api_key: Option<&str>,
        difficulty: Difficulty,
        count: usize,
    ) -> StudyOutcome {
        let quiz = derive_quiz(
            &self.gateway,
            api_key,
            &current.content,
            &current.topic,
            difficulty,
            count,
        )
        .await;

        if !session.lock().await.commit_quiz(ticket, quiz.questions.clone()) {
            return StudyOutcome::Superseded;
        }
        StudyOutcome::Quiz {
            topic: current.topic.clone(),
            difficulty,
            quiz,
        }
    }

    async fn notes(
        &self,
        session: &Mutex<StudySession>,
        ticket: RequestTicket,
        current: &CurrentStudy,
        api_key: Option<&str>,
        style: NotesStyle,
    ) -> StudyOutcome {
        let (notes, failure) = match style {
            NotesStyle::Basic => (basic_notes(&current.content), None),
            NotesStyle::Enhanced => {
                let derived =
                    derive_notes(&self.gateway, api_key, &current.content, &current.topic).await;
                (derived.notes, derived.failure)
            }
        };

        if !session.lock().await.is_latest(ticket) {
            return StudyOutcome::Superseded;
        }
        StudyOutcome::Notes {
            topic: current.topic.clone(),
            notes,
            failure,
        }
    }

    async fn related(
        &self,
        session: &Mutex<StudySession>,
        ticket: RequestTicket,
        topic: &str,
    ) -> StudyOutcome {
        let suggestions = self.related.suggest(topic).await;
        if !session.lock().await.is_latest(ticket) {
            return StudyOutcome::Superseded;
        }
        StudyOutcome::Related {
            topic: topic.to_string(),
            suggestions,
        }
    }

    /// Starts an action on the current topic, snapshotting what it needs so
    /// the session lock is not held across network calls.
    async fn begin_on_current(
        &self,
        session: &Mutex<StudySession>,
    ) -> (RequestTicket, Option<(CurrentStudy, Option<String>)>) {
        let mut state = session.lock().await;
        match state.current().cloned() {
            Some(current) => {
                let ticket = state.begin_action();
                (ticket, Some((current, self.credential(&state))))
            }
            None => (state.begin_query(), None),
        }
    }

    fn credential(&self, state: &StudySession) -> Option<String> {
        state
            .api_key()
            .map(str::to_string)
            .or_else(|| self.default_api_key.clone())
    }
}

fn needs_research(message: &str) -> StudyOutcome {
    StudyOutcome::NeedsResearch {
        message: message.to_string(),
    }
}

/// Invalid commands take a query ticket so they never supersede an action.
async fn rejected(session: &Mutex<StudySession>, outcome: StudyOutcome) -> Executed {
    let ticket = session.lock().await.begin_query();
    Executed {
        request_id: ticket.id,
        outcome,
    }
}

fn invalid_question_count(count: usize) -> Option<StudyOutcome> {
    if (1..=MAX_QUESTION_COUNT).contains(&count) {
        return None;
    }
    Some(StudyOutcome::Rejected {
        message: format!(
            "The number of quiz questions must be between 1 and {}.",
            MAX_QUESTION_COUNT
        ),
    })
}

fn superseded(ticket: RequestTicket) -> Executed {
    Executed {
        request_id: ticket.id,
        outcome: StudyOutcome::Superseded,
    }
}

fn grade(questions: &[QuizQuestion], answers: &[String]) -> StudyOutcome {
    let total = questions.len();
    let answered = answers
        .iter()
        .take(total)
        .filter(|a| !a.trim().is_empty())
        .count();
    StudyOutcome::QuizGraded { answered, total }
}
