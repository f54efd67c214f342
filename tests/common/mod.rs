//! Test doubles for the model, transcriber and synthesizer.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use voice_chat_rs::{
    llm::{LLMClient, LLMError, ModelRequest},
    stt::{STTError, Transcriber},
    tts::{Synthesizer, TTSError},
    ChatSession, ConversationController, PersonalityCatalog,
};

type Responder = Box<dyn Fn(&ModelRequest) -> Result<String, LLMError> + Send + Sync>;

/// Model double that records every request it receives.
pub struct MockLLM {
    requests: Mutex<Vec<ModelRequest>>,
    respond: Responder,
    gate: Option<Arc<Notify>>,
    started: Notify,
}

impl MockLLM {
    fn with_responder(respond: Responder, gate: Option<Arc<Notify>>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            respond,
            gate,
            started: Notify::new(),
        }
    }

    /// Replies "echo: <new turn>"
    pub fn echo() -> Self {
        Self::with_responder(Box::new(|r| Ok(format!("echo: {}", r.new_turn.text))), None)
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::with_responder(Box::new(move |_| Err(LLMError::Backend(message.clone()))), None)
    }

    /// Echoes, but only after `gate` is notified
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self::with_responder(
            Box::new(|r| Ok(format!("echo: {}", r.new_turn.text))),
            Some(gate),
        )
    }

    /// Notified once per call, as soon as the call starts
    pub fn started(&self) -> &Notify {
        &self.started
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LLMClient for MockLLM {
    async fn send(&self, request: &ModelRequest) -> Result<String, LLMError> {
        self.requests.lock().unwrap().push(request.clone());
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        (self.respond)(request)
    }
}

/// Transcriber double returning a fixed transcript or failure.
pub struct MockTranscriber {
    transcript: Option<String>,
    unavailable: bool,
    language_codes: Mutex<Vec<String>>,
}

impl MockTranscriber {
    pub fn saying(transcript: &str) -> Self {
        Self {
            transcript: Some(transcript.to_string()),
            unavailable: false,
            language_codes: Mutex::new(Vec::new()),
        }
    }

    pub fn unintelligible() -> Self {
        Self {
            transcript: None,
            unavailable: false,
            language_codes: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            transcript: None,
            unavailable: true,
            language_codes: Mutex::new(Vec::new()),
        }
    }

    /// Language codes passed to each call, in order
    pub fn language_codes(&self) -> Vec<String> {
        self.language_codes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _audio: &[u8], language_code: &str) -> Result<String, STTError> {
        self.language_codes
            .lock()
            .unwrap()
            .push(language_code.to_string());
        match &self.transcript {
            Some(text) => Ok(text.clone()),
            None if self.unavailable => Err(STTError::ServiceUnavailable("offline".to_string())),
            None => Err(STTError::Unintelligible("no speech".to_string())),
        }
    }
}

/// Synthesizer double that counts calls and can fail the first few.
pub struct CountingSynth {
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl CountingSynth {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    pub fn failing_first(failures: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            delay: Duration::from_millis(0),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Synthesizer for CountingSynth {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TTSError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TTSError::SynthesisFailed("rate limited".to_string()));
        }
        Ok(format!("mp3:{}", text).into_bytes())
    }
}

/// Session over the built-in catalog wired to the given doubles.
pub fn session(
    llm: Arc<MockLLM>,
    transcriber: Arc<MockTranscriber>,
    synth: Arc<CountingSynth>,
) -> ChatSession {
    let controller = ConversationController::new(Arc::new(PersonalityCatalog::builtin()));
    ChatSession::new(controller, llm, transcriber, synth)
}

/// Session with an echoing model and default doubles
pub fn echo_session() -> (ChatSession, Arc<MockLLM>, Arc<CountingSynth>) {
    let llm = Arc::new(MockLLM::echo());
    let synth = Arc::new(CountingSynth::new());
    let session = session(
        llm.clone(),
        Arc::new(MockTranscriber::saying("hello")),
        synth.clone(),
    );
    (session, llm, synth)
}
