//! User-facing write flows: scored check-ins and journal notes.
//!
//! Both flows write through a [`RemoteWriter`] with a bounded wait and fall
//! back to the offline queue on any failure, so the user never loses input.

pub mod recommendation;

pub use recommendation::{
    DailyRecommendation, DayWindow, RecommendationSource, daily_recommendation, day_window,
};

use crate::core::companion::{FALLBACK_PHRASE, PhraseGenerator, PhraseRequest};
use crate::core::offline::{OfflineQueue, QueuedAction};
use crate::core::recovery::ErrorKind;
use crate::core::remote::{NoteDraft, RemoteWriter, truncate_chars};
use crate::core::scoring::{MoodInput, ScoreResult};
use crate::core::session::SessionContext;
use crate::core::task::{BackgroundTask, TaskOutcome};
use crate::error::{MoodwellError, RemoteWriteError};
use serde_json::{Map, Value, json};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const NOTE_IN_DIAGNOSTIC_MAX_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInSettings {
    pub write_timeout: Duration,
    pub phrase_timeout: Duration,
    pub phrase_max_chars: usize,
}

impl Default for CheckInSettings {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(8),
            phrase_timeout: Duration::from_secs(15),
            phrase_max_chars: 120,
        }
    }
}

/// What the user filled in on the check-in screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticForm {
    pub mood: i32,
    pub emotions: Vec<String>,
    pub day_tags: Vec<String>,
    pub note: String,
    pub sleep_hours: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticOutcome {
    Saved {
        id: String,
        result: ScoreResult,
        phrase: String,
    },
    /// The write did not go through; it will be replayed later.
    QueuedOffline {
        result: ScoreResult,
        reason: ErrorKind,
    },
}

impl DiagnosticOutcome {
    pub fn result(&self) -> ScoreResult {
        match self {
            Self::Saved { result, .. } | Self::QueuedOffline { result, .. } => *result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteOutcome {
    Saved { id: String },
    QueuedOffline { reason: ErrorKind },
}

pub struct CheckIn {
    remote: Arc<dyn RemoteWriter>,
    queue: Arc<OfflineQueue>,
    phrases: Option<Arc<dyn PhraseGenerator>>,
    settings: CheckInSettings,
}

impl CheckIn {
    pub fn new(remote: Arc<dyn RemoteWriter>, queue: Arc<OfflineQueue>) -> Self {
        Self {
            remote,
            queue,
            phrases: None,
            settings: CheckInSettings::default(),
        }
    }

    #[must_use]
    pub fn with_phrases(mut self, phrases: Arc<dyn PhraseGenerator>) -> Self {
        self.phrases = Some(phrases);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: CheckInSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Scores the form and stores it, queueing it offline if the write fails.
    ///
    /// The score never depends on the network. On a successful write the
    /// daily phrase is generated and attached to the stored diagnostic;
    /// problems there are logged and the fallback phrase is returned.
    pub async fn submit_diagnostic(
        &self,
        session: &SessionContext,
        form: DiagnosticForm,
    ) -> Result<DiagnosticOutcome, MoodwellError> {
        let user = session.require_user()?;
        let input = MoodInput::new(form.mood, form.emotions.iter().cloned(), form.sleep_hours)?;
        let result = input.score();
        let payload = diagnostic_payload(&form, result);

        tracing::info!(
            uid = %user.uid,
            score = result.score,
            diagnosis = %result.diagnosis,
            "check-in scored"
        );

        let written = self
            .bounded(self.remote.create_diagnostic(&user.uid, &payload))
            .await;
        let id = match written {
            Ok(id) => id,
            Err(e) => {
                self.queue
                    .enqueue(QueuedAction::diagnostic(user.uid.clone(), payload))?;
                tracing::warn!(
                    kind = %e.kind,
                    recovery = %e.kind.recovery(),
                    error = %e.message,
                    "diagnostic saved offline"
                );
                return Ok(DiagnosticOutcome::QueuedOffline {
                    result,
                    reason: e.kind,
                });
            }
        };

        let request = PhraseRequest {
            diagnosis: result.diagnosis,
            emotions: form.emotions,
            day_tags: form.day_tags,
            note: form.note,
            max_chars: self.settings.phrase_max_chars,
        };
        let phrase = match self.generate_phrase(request).await {
            Some((phrase, model)) => {
                self.annotate(&user.uid, &id, &phrase, &model).await;
                phrase
            }
            None => FALLBACK_PHRASE.to_string(),
        };

        Ok(DiagnosticOutcome::Saved { id, result, phrase })
    }

    /// Stores a journal note, queueing it offline if the write fails.
    pub async fn save_note(
        &self,
        session: &SessionContext,
        note: NoteDraft,
    ) -> Result<NoteOutcome, MoodwellError> {
        let user = session.require_user()?;
        if note.is_blank() {
            return Err(anyhow::anyhow!("a note needs a title or some content").into());
        }

        let write = self.remote.create_note(&user.uid, &note);
        match self.bounded(write).await {
            Ok(id) => Ok(NoteOutcome::Saved { id }),
            Err(e) => {
                self.queue.enqueue(QueuedAction::note(
                    user.uid.clone(),
                    &note.title,
                    &note.content,
                ))?;
                tracing::warn!(kind = %e.kind, error = %e.message, "note saved offline");
                Ok(NoteOutcome::QueuedOffline { reason: e.kind })
            }
        }
    }

    async fn bounded<T>(
        &self,
        write: impl Future<Output = Result<T, RemoteWriteError>>,
    ) -> Result<T, RemoteWriteError> {
        let limit = self.settings.write_timeout;
        tokio::time::timeout(limit, write)
            .await
            .unwrap_or_else(|_| Err(RemoteWriteError::timeout(limit)))
    }

    async fn generate_phrase(&self, request: PhraseRequest) -> Option<(String, String)> {
        let generator = self.phrases.clone()?;
        let task = BackgroundTask::spawn("daily_phrase", self.settings.phrase_timeout, async move {
            let model = generator.model().to_string();
            generator
                .phrase_for_diagnostic(&request)
                .await
                .map(|phrase| (phrase, model))
        });

        match task.join().await {
            TaskOutcome::Completed(Ok((phrase, model))) if !phrase.trim().is_empty() => {
                Some((phrase, model))
            }
            TaskOutcome::Completed(Ok(_)) => None,
            TaskOutcome::Completed(Err(e)) => {
                tracing::warn!(error = %e, kind = %e.kind(), "daily phrase generation failed");
                None
            }
            TaskOutcome::TimedOut | TaskOutcome::Cancelled => None,
        }
    }

    async fn annotate(&self, owner_id: &str, diagnostic_id: &str, phrase: &str, model: &str) {
        let mut fields = Map::new();
        fields.insert("phrase".into(), Value::String(phrase.to_string()));
        fields.insert("phraseChars".into(), json!(phrase.chars().count()));
        fields.insert("model".into(), Value::String(model.to_string()));

        let write = self
            .remote
            .update_diagnostic(owner_id, diagnostic_id, &fields);
        if let Err(e) = self.bounded(write).await {
            tracing::warn!(
                diagnostic_id,
                kind = %e.kind,
                error = %e.message,
                "could not attach phrase to diagnostic"
            );
        }
    }
}

/// Stored shape of a check-in.
pub fn diagnostic_payload(form: &DiagnosticForm, result: ScoreResult) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("mood".into(), json!(form.mood));
    payload.insert("emotions".into(), json!(form.emotions));
    payload.insert("dayTags".into(), json!(form.day_tags));
    payload.insert(
        "note".into(),
        Value::String(truncate_chars(form.note.trim(), NOTE_IN_DIAGNOSTIC_MAX_CHARS)),
    );
    payload.insert("sleepHours".into(), json!(form.sleep_hours));
    payload.insert("score".into(), json!(result.score));
    payload.insert("diagnosis".into(), json!(result.diagnosis));
    payload
}
