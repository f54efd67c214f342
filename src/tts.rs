use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Longest text the translate endpoint accepts per request
pub const MAX_CHUNK_CHARS: usize = 100;

static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^.!?;:,\n]+[.!?;:,\n]*").expect("sentence break pattern is valid")
});

#[derive(Error, Debug)]
pub enum TTSError {
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),
}

impl From<reqwest::Error> for TTSError {
    fn from(err: reqwest::Error) -> Self {
        TTSError::SynthesisFailed(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render text as encoded audio (MP3).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TTSError>;
}

#[derive(Debug, Clone)]
pub struct TTSConfig {
    pub base_url: String,
    pub lang: String,
    pub slow: bool,
    pub timeout: Duration,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com/translate_tts".to_string(),
            lang: "en".to_string(),
            slow: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Google Translate speech endpoint, the one gTTS talks to
pub struct GoogleTTS {
    client: Client,
    config: TTSConfig,
}

impl GoogleTTS {
    pub fn new() -> Result<Self, TTSError> {
        Self::with_config(TTSConfig::default())
    }

    pub fn with_config(config: TTSConfig) -> Result<Self, TTSError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn chunk_url(&self, chunk: &str, idx: usize, total: usize) -> Result<Url, TTSError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| TTSError::SynthesisFailed(format!("bad endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("ie", "UTF-8")
            .append_pair("q", chunk)
            .append_pair("tl", &self.config.lang)
            .append_pair("ttsspeed", if self.config.slow { "0.3" } else { "1" })
            .append_pair("total", &total.to_string())
            .append_pair("idx", &idx.to_string())
            .append_pair("textlen", &chunk.chars().count().to_string())
            .append_pair("client", "tw-ob");
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Synthesizer for GoogleTTS {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TTSError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(TTSError::SynthesisFailed("no text to speak".to_string()));
        }

        log::info!(
            "🔊 Synthesizing {} chars in {} chunk(s)",
            text.chars().count(),
            chunks.len()
        );

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let url = self.chunk_url(chunk, idx, chunks.len())?;
            let response = self
                .client
                .get(url)
                .header("Referer", "http://translate.google.com/")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(TTSError::SynthesisFailed(format!(
                    "chunk {} rejected with status {}",
                    idx,
                    status.as_u16()
                )));
            }

            let bytes = response.bytes().await?;
            log::debug!("📥 Chunk {}: {} bytes", idx, bytes.len());
            audio.extend_from_slice(&bytes);
        }

        // MP3 frames concatenate into a playable stream
        Ok(audio)
    }
}

/// Split text into pieces of at most `max_chars` characters, preferring
/// punctuation boundaries, then whitespace, then a hard cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    for sentence in SENTENCE_BREAK.find_iter(text) {
        let sentence = sentence.as_str().trim();
        if sentence.is_empty() || sentence.chars().all(|c| !c.is_alphanumeric()) {
            continue;
        }
        if sentence.chars().count() <= max_chars {
            pieces.push(sentence.to_string());
        } else {
            pieces.extend(split_words(sentence, max_chars));
        }
    }

    // Merge short neighbours back together to save requests
    let mut chunks: Vec<String> = Vec::new();
    for piece in pieces {
        match chunks.last_mut() {
            Some(last) if last.chars().count() + 1 + piece.chars().count() <= max_chars => {
                last.push(' ');
                last.push_str(&piece);
            }
            _ => chunks.push(piece),
        }
    }
    chunks
}

fn split_words(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for word in sentence.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                out.push(piece.iter().collect());
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}
