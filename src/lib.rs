//! Voice and text chat front-end with switchable LLM personalities.
//!
//! The core is the conversation controller: one authoritative message log,
//! command interception ahead of the model, personality switches that reset
//! the conversation, and a per-message speech audio cache. Speech recognition,
//! speech synthesis and the model itself sit behind traits so any backend (or
//! a test double) can be plugged in.

pub mod audio_sink;
pub mod command;
pub mod config;
pub mod conversation;
pub mod error;
pub mod language;
pub mod llm;
pub mod personality;
pub mod session;
pub mod stt;
pub mod tts;
pub mod tts_cache;

pub use command::{Command, CommandInterpreter};
pub use conversation::{ConversationController, Message, Phase, Role, StateSnapshot};
pub use error::{ChatError, Result};
pub use language::Language;
pub use personality::{Personality, PersonalityCatalog};
pub use session::{ChatSession, Outcome, SessionSettings, VoiceInput};
pub use tts_cache::{AudioBytes, TtsCache};
