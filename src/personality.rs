//! Personality catalog.
//!
//! A personality is a named system prompt that biases every reply the model
//! gives. The catalog is fixed at startup and never mutated; the built-in set
//! ships four personalities, listed in the order the UI presents them.

use crate::error::{ChatError, Result};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Personality {
    /// Unique key, identical to the display name ("Gaming Pro")
    pub id: String,
    pub name: String,
    pub icon: String,
    pub system_prompt: String,
    pub description: String,
}

impl Personality {
    pub fn new(
        name: impl Into<String>,
        icon: impl Into<String>,
        system_prompt: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            icon: icon.into(),
            system_prompt: system_prompt.into(),
            description: description.into(),
        }
    }

    /// Heading shown above the conversation, e.g. "🎮 Gaming Pro"
    pub fn title(&self) -> String {
        format!("{} {}", self.icon, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct PersonalityCatalog {
    personalities: Vec<Personality>,
}

impl PersonalityCatalog {
    /// Build a catalog from an explicit list, keeping its order.
    pub fn new(personalities: Vec<Personality>) -> Result<Self> {
        if personalities.is_empty() {
            return Err(ChatError::Config(
                "personality catalog cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for personality in &personalities {
            if !seen.insert(personality.id.as_str()) {
                return Err(ChatError::Config(format!(
                    "duplicate personality id '{}'",
                    personality.id
                )));
            }
        }

        Ok(Self { personalities })
    }

    /// The four personalities the application ships with.
    pub fn builtin() -> Self {
        Self {
            personalities: vec![
                Personality::new(
                    "AI Buddy",
                    "🤖",
                    "You are a helpful, friendly, and enthusiastic AI assistant who can help with anything. You're capable, confident, and always ready to tackle any challenge. You approach every task with a positive attitude and provide clear, practical solutions.",
                    "A versatile AI assistant ready to help with any task",
                ),
                Personality::new(
                    "Chat Buddy",
                    "💬",
                    "You are a friendly conversationalist who loves to chat about absolutely anything! You're engaging, curious, and enjoy deep conversations on any topic - from everyday life to philosophy, hobbies, current events, random thoughts, and everything in between. You're a great listener and always keep the conversation flowing naturally.",
                    "A friendly companion for casual conversations about anything",
                ),
                Personality::new(
                    "Gaming Pro",
                    "🎮",
                    "You are an expert gaming professional with deep knowledge of video games across all platforms and genres. You provide strategic advice, tips, tricks, game recommendations, build guides, walkthroughs, and gaming industry insights. You're passionate about gaming culture and help players improve their skills and enjoy their gaming experience to the fullest.",
                    "Expert gaming advisor for strategies, tips, and game recommendations",
                ),
                Personality::new(
                    "Study Buddy",
                    "📚",
                    "You are a patient and supportive study companion who helps students learn effectively. You break down complex topics into understandable pieces, provide clear explanations, create study strategies, help with homework, offer practice questions, and motivate students to achieve their academic goals. You adapt your teaching style to each student's needs and make learning engaging and fun.",
                    "Your personal tutor for studying and learning any subject",
                ),
            ],
        }
    }

    pub fn list(&self) -> &[Personality] {
        &self.personalities
    }

    pub fn get(&self, id: &str) -> Result<&Personality> {
        self.personalities
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ChatError::NotFound(format!("personality '{}'", id)))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.personalities.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn default_personality(&self) -> &Personality {
        // new() and builtin() both guarantee at least one entry
        &self.personalities[0]
    }

    pub fn len(&self) -> usize {
        self.personalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personalities.is_empty()
    }
}

impl Default for PersonalityCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
