use crate::config::ConfigError;
use crate::llm::LLMError;
use crate::stt::STTError;
use crate::tts::TTSError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A response is still pending, wait for it before sending more input")]
    Busy,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Stale response for generation {0}, conversation was reset")]
    Stale(u64),

    #[error("Transcription error: {0}")]
    Transcription(#[from] STTError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] TTSError),

    #[error("LLM error: {0}")]
    Backend(#[from] LLMError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for ChatError {
    fn from(err: ConfigError) -> Self {
        ChatError::Config(err.to_string())
    }
}
