use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::parser::Explanation;
use crate::agent::query::StudyQuery;
use crate::retrieval::youtube::{DEFAULT_VIDEO_COUNT, VIDEO_COUNT_STEP};

pub const HISTORY_DISPLAY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Gist,
    KeyPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Helpful,
    NotHelpful,
}

/// Everything one browser session remembers between page loads.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: Uuid,
    pub query: Option<StudyQuery>,
    pub video_count: u32,
    pub view: View,
    pub last_question: Option<String>,
    pub last_explanation: Option<Explanation>,
    pub last_web_available: bool,
    pub history: Vec<HistoryEntry>,
    pub feedback: Option<Feedback>,
}

impl SessionState {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            query: None,
            video_count: DEFAULT_VIDEO_COUNT,
            view: View::default(),
            last_question: None,
            last_explanation: None,
            last_web_available: false,
            history: Vec::new(),
            feedback: None,
        }
    }

    /// A new question resets the video threshold and any prior feedback.
    pub fn ask(&mut self, query: StudyQuery) {
        self.query = Some(query);
        self.video_count = DEFAULT_VIDEO_COUNT;
        self.feedback = None;
    }

    pub fn more_videos(&mut self) {
        self.video_count = self.video_count.saturating_add(VIDEO_COUNT_STEP);
    }

    /// The memoized explanation, if it was produced for exactly `question`.
    pub fn cached_explanation(&self, question: &str) -> Option<&Explanation> {
        match (&self.last_question, &self.last_explanation) {
            (Some(last), Some(explanation)) if last == question => Some(explanation),
            _ => None,
        }
    }

    /// Stores the explanation for `question`, error text included, and logs it
    /// to history.
    pub fn remember(&mut self, question: &str, explanation: &Explanation, web_available: bool) {
        self.last_question = Some(question.to_string());
        self.last_explanation = Some(explanation.clone());
        self.last_web_available = web_available;
        self.history.push(HistoryEntry {
            question: question.to_string(),
            answer: explanation.as_text(),
        });
    }

    /// The newest entries first, at most five.
    pub fn recent_history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter().rev().take(HISTORY_DISPLAY_LIMIT)
    }
}

type SharedSession = Arc<tokio::sync::Mutex<SessionState>>;

#[derive(Debug)]
struct StoredSession {
    state: SharedSession,
    touched: Instant,
}

/// Per-session state keyed by cookie id. The outer lock is held only to look
/// up a session; each session has its own async lock for the render.
/// Sessions idle for `ttl` are dropped on the next lookup.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, StoredSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SharedSession) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.touched) < self.ttl);
        if sessions.len() < before {
            tracing::debug!(expired = before - sessions.len(), "dropped idle sessions");
        }

        let id = match id {
            Some(id) if sessions.contains_key(&id) => id,
            _ => Uuid::new_v4(),
        };
        let stored = sessions.entry(id).or_insert_with(|| StoredSession {
            state: Arc::new(tokio::sync::Mutex::new(SessionState::new(id))),
            touched: now,
        });
        stored.touched = now;
        (id, stored.state.clone())
    }

    pub fn count(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
