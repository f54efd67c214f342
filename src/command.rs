//! Command detection for typed and transcribed input.
//!
//! Input is checked for command phrases before it reaches the model. Matching
//! is a case-insensitive substring search, first match wins, in this order:
//!
//! | Phrase contains | Command |
//! |-----------------|---------|
//! | "clear chat", "clear history", "delete chat" | `ClearHistory` |
//! | "change personality", "switch personality", "switch to" | `SwitchPersonality` (or `Help` listing names) |
//! | "what can you do", "help", "commands" | `Help` |
//!
//! Substring matching means a chat message such as "please help me clear
//! history of WW2" is taken as a command. That false positive is accepted
//! behaviour; the tests pin it down.

use crate::llm::prompts::{ConversationTemplates, HELP_TEXT};

const CLEAR_PHRASES: [&str; 3] = ["clear chat", "clear history", "delete chat"];
const SWITCH_PHRASES: [&str; 3] = ["change personality", "switch personality", "switch to"];
const HELP_PHRASES: [&str; 3] = ["what can you do", "help", "commands"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ClearHistory,
    /// Switch to the personality with this id.
    SwitchPersonality(String),
    /// Informational text for the user: the capability summary, or the list
    /// of valid names when a switch target was not recognised.
    Help(String),
    /// Ordinary chat message.
    None,
}

impl Command {
    pub fn is_command(&self) -> bool {
        !matches!(self, Command::None)
    }
}

pub struct CommandInterpreter;

impl CommandInterpreter {
    /// Classify `text` against the known personality ids.
    pub fn interpret<S: AsRef<str>>(text: &str, known_personality_ids: &[S]) -> Command {
        let lowered = text.trim().to_lowercase();

        if contains_any(&lowered, &CLEAR_PHRASES) {
            return Command::ClearHistory;
        }

        if contains_any(&lowered, &SWITCH_PHRASES) {
            let ids: Vec<&str> = known_personality_ids.iter().map(|id| id.as_ref()).collect();
            return match ids.iter().find(|id| lowered.contains(&id.to_lowercase())) {
                Some(id) => Command::SwitchPersonality(id.to_string()),
                None => Command::Help(ConversationTemplates::unknown_personality(&ids)),
            };
        }

        if contains_any(&lowered, &HELP_PHRASES) {
            return Command::Help(HELP_TEXT.to_string());
        }

        Command::None
    }
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| text.contains(phrase))
}
