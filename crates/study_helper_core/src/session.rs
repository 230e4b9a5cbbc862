//! crates/study_helper_core/src/session.rs
//!
//! Per-session study state. A session is owned by one registry entry and only
//! mutated through the command executor.

use crate::domain::{QuizQuestion, StudyHistory};
use std::fmt;

/// The most recently researched topic and its content.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentStudy {
    /// The topic as the user typed it.
    pub topic: String,
    /// The canonical title the lookup resolved to.
    pub title: String,
    pub content: String,
}

/// Identifies one request against a session. Ids increase monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub id: u64,
}

#[derive(Default)]
pub struct StudySession {
    api_key: Option<String>,
    current: Option<CurrentStudy>,
    history: StudyHistory,
    last_quiz: Option<Vec<QuizQuestion>>,
    next_request_id: u64,
    latest_action: u64,
}

impl StudySession {
    pub fn new(api_key: Option<String>) -> Self {
        let mut session = Self::default();
        session.set_api_key(api_key);
        session
    }

    /// Replaces the session credential. Blank keys clear it.
    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Starts a user action whose result may update session state. Any
    /// action still in flight becomes stale.
    pub fn begin_action(&mut self) -> RequestTicket {
        let ticket = self.next_ticket();
        self.latest_action = ticket.id;
        ticket
    }

    /// Starts a read-only or local request that does not supersede actions.
    pub fn begin_query(&mut self) -> RequestTicket {
        self.next_ticket()
    }

    fn next_ticket(&mut self) -> RequestTicket {
        self.next_request_id += 1;
        RequestTicket {
            id: self.next_request_id,
        }
    }

    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        ticket.id == self.latest_action
    }

    pub fn current(&self) -> Option<&CurrentStudy> {
        self.current.as_ref()
    }

    /// Stores a freshly researched topic if `ticket` is still the latest
    /// action. Returns whether the state was updated.
    pub fn commit_current(&mut self, ticket: RequestTicket, current: CurrentStudy) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.current = Some(current);
        self.last_quiz = None;
        true
    }

    pub fn commit_quiz(&mut self, ticket: RequestTicket, questions: Vec<QuizQuestion>) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.last_quiz = Some(questions);
        true
    }

    pub fn last_quiz(&self) -> Option<&[QuizQuestion]> {
        self.last_quiz.as_deref()
    }

    pub fn history(&self) -> &StudyHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut StudyHistory {
        &mut self.history
    }
}

impl fmt::Debug for StudySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("current", &self.current.as_ref().map(|c| &c.topic))
            .field("history", &self.history.len())
            .field("latest_action", &self.latest_action)
            .finish()
    }
}
