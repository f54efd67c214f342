// Canned texts shown to the user or replayed to the model

/// Model turn that closes the priming pair after the system prompt.
pub const PRIMING_ACKNOWLEDGMENT: &str = "I understand. I'll respond according to this personality.";

/// Fixed reply to a help command.
pub const HELP_TEXT: &str = "I can respond to these voice commands:
- 'Clear chat' - Clears conversation history
- 'Change personality to [name]' - Switches AI personality
- I can also chat with you in multiple languages!";

pub struct ConversationTemplates;

impl ConversationTemplates {
    /// Reply to a switch command whose target is not in the catalog
    pub fn unknown_personality<S: AsRef<str>>(available: &[S]) -> String {
        let names: Vec<&str> = available.iter().map(|s| s.as_ref()).collect();
        format!(
            "I couldn't find that personality. Available options: {}",
            names.join(", ")
        )
    }

    /// Assistant turn recorded when the backend fails
    pub fn backend_error(detail: &str) -> String {
        format!("Error: {}", detail)
    }

    pub fn history_cleared() -> &'static str {
        "✨ Voice Command Executed: Chat history cleared!"
    }

    pub fn switched_to(name: &str) -> String {
        format!("✨ Voice Command Executed: Switched to {}!", name)
    }

    pub fn transcribed(text: &str) -> String {
        format!("✅ Ready! Transcribed: \"{}\"", text)
    }

    pub fn unintelligible() -> &'static str {
        "❌ Error: Sorry, I couldn't understand the audio. Please try speaking more clearly and try again."
    }

    pub fn service_unavailable() -> &'static str {
        "❌ Error: Could not connect to speech recognition service. Check your internet connection."
    }

    pub fn busy() -> &'static str {
        "⏳ Still thinking about your last message. Please wait a moment and try again."
    }

    pub fn audio_failed() -> &'static str {
        "⚠️ Audio generation failed (rate limit or error)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_personality_lists_names() {
        let text = ConversationTemplates::unknown_personality(&["AI Buddy", "Gaming Pro"]);
        assert_eq!(
            text,
            "I couldn't find that personality. Available options: AI Buddy, Gaming Pro"
        );
    }

    #[test]
    fn test_help_text_is_multiline() {
        assert!(HELP_TEXT.lines().count() >= 3);
        assert!(HELP_TEXT.contains("Clear chat"));
        assert!(HELP_TEXT.contains("Change personality"));
    }
}
