use secrecy::{ExposeSecret, SecretBox};
use std::env;
use thiserror::Error;

pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
pub const SPEECH_KEY_VAR: &str = "GOOGLE_SPEECH_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid API key format for {service}: {reason}")]
    InvalidKeyFormat { service: String, reason: String },
}

/// Configuration for API services
#[derive(Debug)]
pub struct ApiConfig {
    pub gemini_key: SecretBox<String>,
    pub speech_key: Option<SecretBox<String>>,
}

impl ApiConfig {
    /// Load API configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let gemini_key = Self::load_api_key(GEMINI_KEY_VAR, "Gemini")?;

        // Speech recognition may use its own key, otherwise the Gemini key is reused
        let speech_key = match Self::load_api_key(SPEECH_KEY_VAR, "Google Speech") {
            Ok(key) => Some(key),
            Err(ConfigError::MissingEnvVar(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            gemini_key,
            speech_key,
        })
    }

    /// Load and validate a single API key from environment
    fn load_api_key(env_var: &str, service_name: &str) -> Result<SecretBox<String>, ConfigError> {
        let key = env::var(env_var).map_err(|_| ConfigError::MissingEnvVar(env_var.to_string()))?;

        if key.trim().is_empty() {
            return Err(ConfigError::InvalidKeyFormat {
                service: service_name.to_string(),
                reason: "API key cannot be empty".to_string(),
            });
        }

        Self::validate_key_format(key.trim(), service_name)?;

        Ok(SecretBox::new(Box::new(key.trim().to_string())))
    }

    /// Google API keys share the "AIza" prefix
    fn validate_key_format(key: &str, service: &str) -> Result<(), ConfigError> {
        match service {
            "Gemini" | "Google Speech" => {
                if !key.starts_with("AIza") {
                    return Err(ConfigError::InvalidKeyFormat {
                        service: service.to_string(),
                        reason: "Google API keys should start with 'AIza'".to_string(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Get Gemini API key (use only when making API calls)
    pub fn gemini_key(&self) -> &str {
        self.gemini_key.expose_secret()
    }

    /// Get the speech recognition key, falling back to the Gemini key
    pub fn speech_key(&self) -> &str {
        match &self.speech_key {
            Some(key) => key.expose_secret(),
            None => self.gemini_key(),
        }
    }
}

/// Load configuration with helpful error messages for development
pub fn load_config() -> Result<ApiConfig, ConfigError> {
    match ApiConfig::load() {
        Ok(config) => {
            log::info!("Successfully loaded API configuration");
            if config.speech_key.is_none() {
                log::info!(
                    "{} not set, speech recognition will use the Gemini key",
                    SPEECH_KEY_VAR
                );
            }
            Ok(config)
        }
        Err(ConfigError::MissingEnvVar(var)) => {
            log::error!("Missing required environment variable: {}", var);
            log::error!("Create a .env file in the project root with:");
            log::error!("{}=your_api_key_here", var);
            Err(ConfigError::MissingEnvVar(var))
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}
