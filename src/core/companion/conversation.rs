use super::GeminiClient;
use super::gemini::GenerationOptions;
use super::prompts::{COMPANION_NAME, COMPANION_SYSTEM};
use crate::core::recovery::ErrorKind;
use crate::error::CompanionError;
use std::fmt::Write;

/// Turns sent back to the model as context.
pub const CONTEXT_TURNS: usize = 6;

pub const OFFLINE_REPLY: &str = "No hay internet, el chat no está disponible por el momento.";
pub const GREETING: &str = "Hola, soy Mindful+. ¿Cómo te sientes hoy?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Companion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// One chat session with the companion. History lives only in memory.
#[derive(Debug, Default)]
pub struct Conversation {
    history: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting() -> Self {
        let mut conversation = Self::new();
        conversation.push(Speaker::Companion, GREETING);
        conversation
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.history.push(Turn {
            speaker,
            text: text.into(),
        });
    }

    /// Prompt for `message`: the last [`CONTEXT_TURNS`] turns followed by the
    /// new user line.
    pub fn prompt_for(&self, message: &str) -> String {
        let start = self.history.len().saturating_sub(CONTEXT_TURNS);
        let mut prompt = String::new();
        for turn in &self.history[start..] {
            let label = match turn.speaker {
                Speaker::User => "Usuario",
                Speaker::Companion => COMPANION_NAME,
            };
            let _ = writeln!(prompt, "{label}: {}", turn.text);
        }
        let _ = write!(prompt, "Usuario: {message}\n{COMPANION_NAME}:");
        prompt
    }

    /// Sends `message` and records both sides of the exchange.
    ///
    /// Transport failures become a canned reply instead of an error so the
    /// chat stays usable; configuration errors are returned.
    pub async fn send(
        &mut self,
        client: &GeminiClient,
        message: &str,
    ) -> Result<String, CompanionError> {
        let message = message.trim();
        let prompt = self.prompt_for(message);
        let reply = match client
            .generate(Some(COMPANION_SYSTEM), &prompt, &GenerationOptions::default())
            .await
        {
            Ok(text) => text,
            Err(CompanionError::MissingApiKey) => return Err(CompanionError::MissingApiKey),
            Err(e) => Self::fallback_reply(&e),
        };

        self.push(Speaker::User, message);
        self.push(Speaker::Companion, reply.clone());
        Ok(reply)
    }

    fn fallback_reply(error: &CompanionError) -> String {
        match error.kind() {
            ErrorKind::Unreachable | ErrorKind::Timeout => {
                tracing::info!(error = %error, "companion unreachable");
                OFFLINE_REPLY.to_string()
            }
            kind => {
                tracing::warn!(error = %error, %kind, "companion reply failed");
                format!("Lo siento, hubo un error al procesar tu mensaje ({kind}).")
            }
        }
    }
}
