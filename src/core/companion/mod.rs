//! Generative companion: the daily phrase attached to a check-in, the daily
//! recommendation, and the chat.

pub mod conversation;
pub mod gemini;
mod gemini_types;
pub mod prompts;

pub use conversation::Conversation;
pub use gemini::{GeminiClient, GenerationOptions};

use crate::core::remote::truncate_chars;
use crate::core::scoring::Diagnosis;
use crate::error::CompanionError;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;

pub const FALLBACK_PHRASE: &str = "Sigue adelante: cada paso cuenta.";
pub const FALLBACK_RECOMMENDATION: &str = "Hoy te recomiendo tomarte un momento para respirar \
     profundamente y agradecer algo bueno de tu día.";

pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, CompanionError>> + Send + 'a>>;

/// Inputs for the short phrase shown after a check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseRequest {
    pub diagnosis: Diagnosis,
    pub emotions: Vec<String>,
    pub day_tags: Vec<String>,
    pub note: String,
    pub max_chars: usize,
}

pub trait PhraseGenerator: Send + Sync {
    /// Model identifier recorded next to the generated text.
    fn model(&self) -> &str;

    fn phrase_for_diagnostic<'a>(&'a self, request: &'a PhraseRequest) -> GenerateFuture<'a>;
}

/// A note as read back for the daily recommendation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DayNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// A stored check-in as read back for the daily recommendation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDiagnostic {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub sleep_hours: i64,
}

/// Generates today's recommendation, cut to `max_chars`.
///
/// Callers fall back to [`FALLBACK_RECOMMENDATION`] on error.
pub async fn recommendation_for_day(
    client: &GeminiClient,
    display_name: &str,
    notes: &[DayNote],
    diagnostics: &[DayDiagnostic],
    max_chars: usize,
) -> Result<String, CompanionError> {
    let prompt = prompts::recommendation_prompt(display_name, notes, diagnostics, max_chars);
    let options = GenerationOptions {
        temperature: 0.8,
        top_p: Some(0.9),
        top_k: Some(40),
        max_output_tokens: 600,
    };

    let text = client
        .generate(Some(prompts::RECOMMENDATION_SYSTEM), &prompt, &options)
        .await?;
    Ok(truncate_chars(&text, max_chars))
}
