use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum STTError {
    #[error("Could not understand the audio: {0}")]
    Unintelligible(String),
    #[error("Speech recognition service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<reqwest::Error> for STTError {
    fn from(err: reqwest::Error) -> Self {
        STTError::ServiceUnavailable(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Turn recorded audio into text in the given BCP-47 language.
    async fn transcribe(&self, audio: &[u8], language_code: &str) -> Result<String, STTError>;
}

#[derive(Debug, Clone)]
pub struct STTConfig {
    pub base_url: String,
    pub model: Option<String>,
    pub server_timeout: Duration,
}

impl Default for STTConfig {
    fn default() -> Self {
        Self {
            base_url: "https://speech.googleapis.com/v1".to_string(),
            model: None,
            server_timeout: Duration::from_secs(10),
        }
    }
}

/// Header facts needed to describe LINEAR16 audio to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub samples: u32,
}

impl WavInfo {
    pub fn read(audio: &[u8]) -> Result<Self, STTError> {
        let reader = hound::WavReader::new(Cursor::new(audio))
            .map_err(|e| STTError::Unintelligible(format!("not a WAV recording: {}", e)))?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(STTError::Unintelligible(format!(
                "unsupported sample format: {:?} {} bit",
                spec.sample_format, spec.bits_per_sample
            )));
        }

        Ok(Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            samples: reader.duration(),
        })
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples as f32 / self.sample_rate as f32
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

pub struct GoogleSTT {
    client: Client,
    api_key: String,
    config: STTConfig,
}

impl GoogleSTT {
    pub fn new(api_key: String) -> Result<Self, STTError> {
        Self::with_config(api_key, STTConfig::default())
    }

    pub fn with_config(api_key: String, config: STTConfig) -> Result<Self, STTError> {
        let client = Client::builder().timeout(config.server_timeout).build()?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    pub fn build_payload(&self, audio: &[u8], info: &WavInfo, language_code: &str) -> serde_json::Value {
        let mut config = json!({
            "encoding": "LINEAR16",
            "sampleRateHertz": info.sample_rate,
            "audioChannelCount": info.channels,
            "languageCode": language_code,
        });
        if let Some(model) = &self.config.model {
            config["model"] = json!(model);
        }

        json!({
            "config": config,
            "audio": { "content": BASE64.encode(audio) }
        })
    }

    /// Best transcript across all result segments
    pub fn parse_response(response_text: &str) -> Result<String, STTError> {
        let response: RecognizeResponse = serde_json::from_str(response_text)
            .map_err(|e| STTError::ServiceUnavailable(format!("invalid response: {}", e)))?;

        let transcript = response
            .results
            .iter()
            .filter_map(|result| result.alternatives.first())
            .map(|alt| alt.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if transcript.is_empty() {
            return Err(STTError::Unintelligible("no speech recognised".to_string()));
        }

        Ok(transcript)
    }
}

#[async_trait::async_trait]
impl Transcriber for GoogleSTT {
    async fn transcribe(&self, audio: &[u8], language_code: &str) -> Result<String, STTError> {
        let info = WavInfo::read(audio)?;
        log::info!(
            "🎤 Transcribing {:.1}s of audio ({} Hz, {} ch) in {}",
            info.duration_secs(),
            info.sample_rate,
            info.channels,
            language_code
        );

        let url = format!("{}/speech:recognize", self.config.base_url);
        let payload = self.build_payload(audio, &info, language_code);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(STTError::ServiceUnavailable(format!(
                "{} - {}",
                status.as_u16(),
                error_text
            )));
        }

        let response_text = response.text().await?;
        let transcript = Self::parse_response(&response_text)?;
        log::info!("✅ Transcribed: '{}'", transcript);
        Ok(transcript)
    }
}
