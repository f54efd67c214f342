use super::prompts::PRIMING_ACKNOWLEDGMENT;
use serde::Serialize;

/// Speaker of a turn as the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Everything a stateless backend needs to answer the newest user turn.
///
/// Turn order is always: priming pair, prior history in log order, new turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRequest {
    pub priming: [Turn; 2],
    pub history: Vec<Turn>,
    pub new_turn: Turn,
    /// Conversation generation the request was built in
    #[serde(skip)]
    pub generation: u64,
}

impl ModelRequest {
    pub fn new(system_prompt: &str, history: Vec<Turn>, new_turn: Turn, generation: u64) -> Self {
        Self {
            priming: Self::priming_pair(system_prompt),
            history,
            new_turn,
            generation,
        }
    }

    /// The system prompt sent as a user instruction, followed by the canned
    /// acknowledgment from the model.
    pub fn priming_pair(system_prompt: &str) -> [Turn; 2] {
        [
            Turn::user(system_prompt),
            Turn::model(PRIMING_ACKNOWLEDGMENT),
        ]
    }

    /// All turns in send order
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.priming
            .iter()
            .chain(self.history.iter())
            .chain(std::iter::once(&self.new_turn))
    }

    /// Number of turns including the priming pair
    pub fn turn_count(&self) -> usize {
        self.priming.len() + self.history.len() + 1
    }

    /// Rough size estimate for logging (1 token ≈ 4 characters)
    pub fn estimate_tokens(&self) -> usize {
        self.turns().map(|turn| turn.text.len() / 4 + 4).sum()
    }

    /// Summary for debugging
    pub fn summary(&self) -> String {
        format!(
            "Request: {} turns ({} history), ~{} tokens, generation {}",
            self.turn_count(),
            self.history.len(),
            self.estimate_tokens(),
            self.generation
        )
    }
}
