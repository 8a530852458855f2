//! Google Gemini `generateContent` client.
//!
//! API key resolution order: explicit key, `GEMINI_API_KEY`, `GOOGLE_API_KEY`.

use super::gemini_types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use super::prompts;
use super::{GenerateFuture, PhraseGenerator, PhraseRequest};
use crate::core::recovery::ErrorKind;
use crate::core::remote::build_remote_client;
use crate::core::remote::truncate_chars;
use crate::error::CompanionError;
use reqwest::Client;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Sampling knobs for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: None,
            top_k: None,
            max_output_tokens: 512,
        }
    }
}

pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: Option<&str>, model: Option<&str>, timeout_secs: u64) -> Self {
        let api_key = api_key
            .filter(|key| !key.is_empty())
            .map(String::from)
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|key| !key.is_empty());

        Self {
            api_key,
            model: model.unwrap_or(DEFAULT_GEMINI_MODEL).to_string(),
            base_url: DEFAULT_GEMINI_URL.to_string(),
            client: build_remote_client(timeout_secs),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_name(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    fn build_request(
        system_prompt: Option<&str>,
        message: &str,
        options: &GenerationOptions,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(message)],
            }],
            system_instruction: system_prompt.map(|sys| Content {
                role: None,
                parts: vec![Part::text(sys)],
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
                max_output_tokens: options.max_output_tokens,
            },
        }
    }

    fn extract_text(result: &GenerateContentResponse) -> Result<String, CompanionError> {
        let text = result
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(CompanionError::EmptyResponse);
        }
        Ok(text.to_string())
    }

    pub async fn generate(
        &self,
        system_prompt: Option<&str>,
        message: &str,
        options: &GenerationOptions,
    ) -> Result<String, CompanionError> {
        let api_key = self.api_key.as_ref().ok_or(CompanionError::MissingApiKey)?;
        let url = format!("{}/{}:generateContent", self.base_url, self.model_name());
        let request = Self::build_request(system_prompt, message, options);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| CompanionError::Request {
                kind: ErrorKind::from_reqwest(&e),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CompanionError::Request {
                kind: ErrorKind::from_status(status.as_u16()),
                message: format!("Gemini API error ({status}): {error_text}"),
            });
        }

        let result: GenerateContentResponse =
            response.json().await.map_err(|e| CompanionError::Request {
                kind: ErrorKind::MalformedResponse,
                message: e.to_string(),
            })?;

        if let Some(err) = result.error.as_ref() {
            return Err(CompanionError::Request {
                kind: ErrorKind::Rejected,
                message: format!("Gemini API error: {}", err.message),
            });
        }

        Self::extract_text(&result)
    }

    pub async fn phrase(&self, request: &PhraseRequest) -> Result<String, CompanionError> {
        let prompt = prompts::phrase_prompt(request);
        let text = self
            .generate(
                Some(prompts::PHRASE_SYSTEM),
                &prompt,
                &GenerationOptions {
                    temperature: 0.9,
                    max_output_tokens: 128,
                    ..GenerationOptions::default()
                },
            )
            .await?;
        Ok(truncate_chars(text.trim_matches('"'), request.max_chars))
    }
}

impl PhraseGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn phrase_for_diagnostic<'a>(&'a self, request: &'a PhraseRequest) -> GenerateFuture<'a> {
        Box::pin(self.phrase(request))
    }
}
