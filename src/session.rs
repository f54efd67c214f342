//! Event handlers between the UI and the conversation.
//!
//! [`ChatSession`] runs the input pipeline: transcribe (voice only), check for
//! a command, then either execute it or dispatch a chat turn to the model.
//! The controller sits behind a mutex that is only held for the synchronous
//! state changes; transcription, the model call and synthesis all run with
//! the lock released, so a second submission during a model call sees the
//! controller waiting and is rejected with [`ChatError::Busy`].

use crate::command::{Command, CommandInterpreter};
use crate::conversation::{ConversationController, Message, Phase, Role, StateSnapshot};
use crate::error::{ChatError, Result};
use crate::language::Language;
use crate::llm::{ConversationTemplates, LLMClient, LLMError};
use crate::personality::{Personality, PersonalityCatalog};
use crate::stt::Transcriber;
use crate::tts::Synthesizer;
use crate::tts_cache::AudioBytes;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Language voice input is recognised in
    pub language: Language,
    /// Play the newest reply's audio without being asked
    pub auto_play: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            language: Language::English,
            auto_play: true,
        }
    }
}

/// What a submission did to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model answered
    Reply(Message),
    /// The model call failed; the error is now the latest assistant message
    Failed(Message),
    /// A command produced information for the user (help, unknown personality)
    Notice(Message),
    Cleared,
    Switched(Personality),
    /// Nothing to do (empty input)
    Ignored,
}

impl Outcome {
    /// One-line status for the UI, if the outcome warrants one
    pub fn status(&self) -> Option<String> {
        match self {
            Outcome::Cleared => Some(ConversationTemplates::history_cleared().to_string()),
            Outcome::Switched(p) => Some(ConversationTemplates::switched_to(&p.name)),
            Outcome::Failed(message) => Some(format!("❌ {}", message.content)),
            Outcome::Reply(_) | Outcome::Notice(_) | Outcome::Ignored => None,
        }
    }
}

/// Result of a voice submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInput {
    pub transcript: String,
    pub outcome: Outcome,
}

/// Records a cancellation if a dispatch future is dropped before the model
/// call settles, so the controller never stays waiting.
struct PendingTurn<'a> {
    controller: &'a Mutex<ConversationController>,
    generation: u64,
    settled: bool,
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut controller = self.controller.lock().unwrap_or_else(PoisonError::into_inner);
        if controller.generation() == self.generation && controller.phase() == Phase::AwaitingResponse {
            log::warn!("🛑 Model call abandoned, recording it as cancelled");
            controller.record_error(ConversationTemplates::backend_error(
                &LLMError::Cancelled.to_string(),
            ));
        }
    }
}

pub struct ChatSession {
    controller: Mutex<ConversationController>,
    llm: Arc<dyn LLMClient>,
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    settings: Mutex<SessionSettings>,
    last_recording: Mutex<Option<u64>>,
    cancel: Mutex<CancellationToken>,
}

impl ChatSession {
    pub fn new(
        controller: ConversationController,
        llm: Arc<dyn LLMClient>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            controller: Mutex::new(controller),
            llm,
            transcriber,
            synthesizer,
            settings: Mutex::new(SessionSettings::default()),
            last_recording: Mutex::new(None),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Session over the built-in catalog, starting with its first personality
    pub fn with_builtin_catalog(
        llm: Arc<dyn LLMClient>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        let controller = ConversationController::new(Arc::new(PersonalityCatalog::builtin()));
        Self::new(controller, llm, transcriber, synthesizer)
    }

    fn controller(&self) -> MutexGuard<'_, ConversationController> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> SessionSettings {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_language(&self, language: Language) {
        log::info!("🌐 Speech recognition language: {} ({})", language, language.code());
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .language = language;
    }

    pub fn set_auto_play(&self, auto_play: bool) {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .auto_play = auto_play;
    }

    pub fn list_personalities(&self) -> Vec<Personality> {
        self.controller().list_personalities().to_vec()
    }

    pub fn personality(&self) -> Personality {
        self.controller().personality().clone()
    }

    pub fn current_state(&self) -> StateSnapshot {
        self.controller().current_state()
    }

    pub fn switch_personality(&self, id: &str) -> Result<Personality> {
        let mut controller = self.controller();
        let personality = controller.switch_personality(id)?.clone();
        // Cancel under the controller lock so no new turn can pick up the old token
        self.cancel_pending();
        Ok(personality)
    }

    pub fn clear_history(&self) {
        let mut controller = self.controller();
        controller.clear_history();
        self.cancel_pending();
    }

    /// Abort the in-flight model call, if any. The call is recorded as an
    /// error turn unless the conversation was reset in the meantime.
    pub fn cancel_pending(&self) {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Typed input: command check, then chat.
    pub async fn submit_text(&self, text: &str) -> Result<Outcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Ignored);
        }

        let command = {
            let controller = self.controller();
            CommandInterpreter::interpret(text, &controller.catalog().ids())
        };
        self.execute(command, text).await
    }

    /// Recorded input: transcribe in the selected language, then as typed input.
    ///
    /// Returns `None` when the recording is identical to the previous one.
    pub async fn submit_audio(&self, audio: &[u8]) -> Result<Option<VoiceInput>> {
        let digest = {
            let mut hasher = DefaultHasher::new();
            audio.hash(&mut hasher);
            hasher.finish()
        };
        {
            let mut last = self
                .last_recording
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *last == Some(digest) {
                log::debug!("🔁 Same recording as last time, ignoring");
                return Ok(None);
            }
            *last = Some(digest);
        }

        let language = self.settings().language;
        log::info!("🎙️ Recording received ({} bytes), transcribing", audio.len());
        let transcript = self
            .transcriber
            .transcribe(audio, language.code())
            .await
            .map_err(|e| {
                log::warn!("❌ Transcription failed: {}", e);
                ChatError::Transcription(e)
            })?;
        log::info!("{}", ConversationTemplates::transcribed(&transcript));

        let outcome = self.submit_text(&transcript).await?;
        Ok(Some(VoiceInput {
            transcript,
            outcome,
        }))
    }

    async fn execute(&self, command: Command, text: &str) -> Result<Outcome> {
        match command {
            Command::ClearHistory => {
                log::info!("✨ Command: clear history");
                self.clear_history();
                Ok(Outcome::Cleared)
            }
            Command::SwitchPersonality(id) => {
                log::info!("✨ Command: switch personality to {}", id);
                Ok(Outcome::Switched(self.switch_personality(&id)?))
            }
            Command::Help(info) => {
                log::info!("✨ Command: help");
                let message = self.controller().append_notice(info)?.clone();
                Ok(Outcome::Notice(message))
            }
            Command::None => self.dispatch(text).await,
        }
    }

    /// Append the user turn, call the model, record the reply or the error.
    async fn dispatch(&self, text: &str) -> Result<Outcome> {
        // The token is taken with the user turn, so a cancel can never fall between them
        let (request, cancel) = {
            let mut controller = self.controller();
            controller.append_user_turn(text)?;
            match controller.build_model_request() {
                Ok(request) => (request, self.cancel_token()),
                Err(e) => {
                    controller.record_error(ConversationTemplates::backend_error(&e.to_string()));
                    return Err(e);
                }
            }
        };
        let mut pending = PendingTurn {
            controller: &self.controller,
            generation: request.generation,
            settled: false,
        };

        log::info!("🤖 Sending to LLM: {}", request.summary());
        let outcome = tokio::select! {
            result = self.llm.send(&request) => result,
            _ = cancel.cancelled() => Err(LLMError::Cancelled),
        };
        pending.settled = true;
        let failed = outcome.is_err();

        let mut controller = self.controller();
        match controller.complete_request(request.generation, outcome) {
            Ok(message) if failed => Ok(Outcome::Failed(message.clone())),
            Ok(message) => {
                log::info!("📨 Reply received ({} chars)", message.content.len());
                Ok(Outcome::Reply(message.clone()))
            }
            Err(e) => {
                log::warn!("🗑️ Discarding reply: {}", e);
                Err(e)
            }
        }
    }

    /// Speech audio for the assistant message at `index`, synthesized once.
    pub async fn audio_for(&self, index: usize) -> Result<AudioBytes> {
        let (slot, text) = self.controller().audio_slot(index)?;
        Ok(slot
            .get_or_synthesize(&text, self.synthesizer.as_ref())
            .await?)
    }

    /// Message indices whose audio is already cached
    pub fn cached_audio(&self) -> Vec<usize> {
        self.controller().tts_cache().cached_indices()
    }

    /// Index of the reply that should play automatically, if any
    pub fn autoplay_index(&self) -> Option<usize> {
        if !self.settings().auto_play {
            return None;
        }
        let controller = self.controller();
        controller
            .messages()
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.index)
    }
}
