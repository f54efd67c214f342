//! The single authoritative conversation.
//!
//! [`ConversationController`] owns the message log, the active personality and
//! the speech audio cache, and is the only thing allowed to change them. All
//! mutators take `&mut self` and finish before returning, so no intermediate
//! state is ever observable.
//!
//! A chat turn moves the controller through two phases:
//!
//! ```text
//!   Idle --append_user_turn--> AwaitingResponse
//!   AwaitingResponse --append_assistant_turn | record_error--> Idle
//! ```
//!
//! Clearing or switching personality resets to `Idle` and starts a new
//! generation; replies built against an older generation are refused.

mod message;

pub use message::{Message, Role, StateSnapshot};

use crate::error::{ChatError, Result};
use crate::llm::{ConversationTemplates, LLMError, ModelRequest, Turn};
use crate::personality::{Personality, PersonalityCatalog};
use crate::tts::Synthesizer;
use crate::tts_cache::{AudioBytes, AudioSlot, TtsCache};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
}

pub struct ConversationState {
    messages: Vec<Message>,
    personality: Personality,
    audio: Arc<TtsCache>,
}

pub struct ConversationController {
    catalog: Arc<PersonalityCatalog>,
    state: ConversationState,
    phase: Phase,
    generation: u64,
}

impl ConversationController {
    /// Start with the catalog's first personality
    pub fn new(catalog: Arc<PersonalityCatalog>) -> Self {
        let personality = catalog.default_personality().clone();
        Self::with_personality_unchecked(catalog, personality)
    }

    pub fn with_personality(catalog: Arc<PersonalityCatalog>, id: &str) -> Result<Self> {
        let personality = catalog.get(id)?.clone();
        Ok(Self::with_personality_unchecked(catalog, personality))
    }

    fn with_personality_unchecked(catalog: Arc<PersonalityCatalog>, personality: Personality) -> Self {
        Self {
            catalog,
            state: ConversationState {
                messages: Vec::new(),
                personality,
                audio: Arc::new(TtsCache::new()),
            },
            phase: Phase::Idle,
            generation: 0,
        }
    }

    pub fn list_personalities(&self) -> &[Personality] {
        self.catalog.list()
    }

    pub fn catalog(&self) -> &PersonalityCatalog {
        &self.catalog
    }

    pub fn personality(&self) -> &Personality {
        &self.state.personality
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.state.messages.get(index)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Read-only view of the audio cache; audio is only produced through
    /// [`Self::audio_slot`] or [`Self::get_or_synthesize`].
    pub fn tts_cache(&self) -> &TtsCache {
        &self.state.audio
    }

    pub fn current_state(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.state.messages.clone(),
            active_personality_id: self.state.personality.id.clone(),
            awaiting_response: self.phase == Phase::AwaitingResponse,
        }
    }

    /// Append the user's chat turn and start waiting for the reply.
    pub fn append_user_turn(&mut self, text: impl Into<String>) -> Result<&Message> {
        if self.phase == Phase::AwaitingResponse {
            return Err(ChatError::Busy);
        }
        self.phase = Phase::AwaitingResponse;
        Ok(self.push(Role::User, text.into()))
    }

    /// Payload for the pending user turn: priming pair, prior history, new turn.
    pub fn build_model_request(&self) -> Result<ModelRequest> {
        if self.phase != Phase::AwaitingResponse {
            return Err(ChatError::InvalidState(
                "no user turn is waiting for a response".to_string(),
            ));
        }

        let (pending, history) = self
            .state
            .messages
            .split_last()
            .filter(|(last, _)| last.role == Role::User)
            .ok_or_else(|| {
                ChatError::InvalidState("last message is not a user turn".to_string())
            })?;

        let history = history.iter().map(Message::to_turn).collect();
        Ok(ModelRequest::new(
            &self.state.personality.system_prompt,
            history,
            Turn::user(pending.content.clone()),
            self.generation,
        ))
    }

    /// Append the model's reply right after the user turn that triggered it.
    pub fn append_assistant_turn(&mut self, text: impl Into<String>) -> Result<&Message> {
        if self.phase != Phase::AwaitingResponse {
            return Err(ChatError::InvalidState(
                "no request is waiting for a response".to_string(),
            ));
        }
        self.phase = Phase::Idle;
        Ok(self.push(Role::Assistant, text.into()))
    }

    /// Append an error as a visible assistant turn and return to idle.
    pub fn record_error(&mut self, text: impl Into<String>) -> &Message {
        self.phase = Phase::Idle;
        self.push(Role::Assistant, text.into())
    }

    /// Append an informational assistant message, e.g. the help text.
    pub fn append_notice(&mut self, text: impl Into<String>) -> Result<&Message> {
        if self.phase == Phase::AwaitingResponse {
            return Err(ChatError::Busy);
        }
        Ok(self.push(Role::Assistant, text.into()))
    }

    /// Apply the backend outcome for a request built in `generation`.
    ///
    /// A reply for an older generation is discarded and leaves the log as is.
    pub fn complete_request(
        &mut self,
        generation: u64,
        outcome: std::result::Result<String, LLMError>,
    ) -> Result<&Message> {
        if generation != self.generation {
            return Err(ChatError::Stale(generation));
        }
        match outcome {
            Ok(reply) => self.append_assistant_turn(reply),
            Err(e) => {
                if self.phase != Phase::AwaitingResponse {
                    return Err(ChatError::InvalidState(
                        "no request is waiting for a response".to_string(),
                    ));
                }
                log::error!("❌ Backend request failed: {}", e);
                Ok(self.record_error(ConversationTemplates::backend_error(&e.to_string())))
            }
        }
    }

    /// Replace the active personality; log and audio are cleared with it.
    pub fn switch_personality(&mut self, id: &str) -> Result<&Personality> {
        let personality = self.catalog.get(id)?.clone();
        log::info!(
            "🎭 Switching personality {} -> {}",
            self.state.personality.id,
            personality.id
        );
        self.reset();
        self.state.personality = personality;
        Ok(&self.state.personality)
    }

    /// Empty the log and the audio cache together.
    pub fn clear_history(&mut self) {
        log::info!(
            "🧹 Clearing {} messages and {} cached audio clips",
            self.state.messages.len(),
            self.state.audio.len()
        );
        self.reset();
    }

    /// Cache slot for an assistant message in the current log
    pub fn audio_slot(&self, index: usize) -> Result<(AudioSlot, String)> {
        match self.state.messages.get(index) {
            Some(message) if message.role == Role::Assistant => {
                Ok((self.state.audio.slot(index), message.content.clone()))
            }
            Some(_) => Err(ChatError::NotFound(format!(
                "message {} is not an assistant message",
                index
            ))),
            None => Err(ChatError::NotFound(format!("message {}", index))),
        }
    }

    /// Audio for the assistant message at `index`, synthesized at most once.
    ///
    /// Holds `&self` across the synthesis; callers sharing the controller
    /// behind a lock should take the slot from [`Self::audio_slot`] instead.
    pub async fn get_or_synthesize(
        &self,
        index: usize,
        synthesizer: &dyn Synthesizer,
    ) -> Result<AudioBytes> {
        let (slot, text) = self.audio_slot(index)?;
        Ok(slot.get_or_synthesize(&text, synthesizer).await?)
    }

    fn reset(&mut self) {
        self.state.messages.clear();
        self.state.audio.clear();
        self.phase = Phase::Idle;
        self.generation += 1;
    }

    fn push(&mut self, role: Role, content: String) -> &Message {
        let index = self.state.messages.len();
        log::debug!("📝 {} message {} ({} chars)", role, index, content.len());
        self.state.messages.push(Message::new(role, content, index));
        &self.state.messages[index]
    }
}
