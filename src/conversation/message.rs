use crate::llm::Turn;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn in the log. Never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Position in the log since the last clear
    pub index: usize,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(role: Role, content: String, index: usize) -> Self {
        Self {
            role,
            content,
            index,
            created_at: Utc::now(),
        }
    }

    /// The message as the model sees it (assistant turns are "model")
    pub fn to_turn(&self) -> Turn {
        match self.role {
            Role::User => Turn::user(self.content.clone()),
            Role::Assistant => Turn::model(self.content.clone()),
        }
    }
}

/// What the UI observes after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub messages: Vec<Message>,
    pub active_personality_id: String,
    pub awaiting_response: bool,
}
