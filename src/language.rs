//! Speech recognition languages offered to the user.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// A language the transcriber can be asked to recognise.
///
/// The display name is what the user picks; [`Language::code`] is the BCP-47
/// tag sent to the speech service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Language {
    #[default]
    English,
    French,
    Spanish,
    German,
    #[strum(to_string = "Chinese (Mandarin)", serialize = "Chinese")]
    Chinese,
    Japanese,
    Korean,
    Italian,
    Portuguese,
    Russian,
    Arabic,
    Hindi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::French => "fr-FR",
            Language::Spanish => "es-ES",
            Language::German => "de-DE",
            Language::Chinese => "zh-CN",
            Language::Japanese => "ja-JP",
            Language::Korean => "ko-KR",
            Language::Italian => "it-IT",
            Language::Portuguese => "pt-BR",
            Language::Russian => "ru-RU",
            Language::Arabic => "ar-SA",
            Language::Hindi => "hi-IN",
        }
    }

    /// Accepts a display name ("French") or a code ("fr-FR").
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        value
            .parse::<Language>()
            .ok()
            .or_else(|| Self::iter().find(|lang| lang.code().eq_ignore_ascii_case(value)))
    }

    /// Code for a display name, defaulting to English for anything unknown.
    pub fn code_for(name: &str) -> &'static str {
        Self::parse(name).unwrap_or_default().code()
    }

    pub fn all() -> Vec<Language> {
        Self::iter().collect()
    }
}
