use crate::core::offline::QueuedAction;
use crate::core::recovery::ErrorKind;
use std::time::Duration;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Moodwell.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; application edges (config loading,
/// command dispatch) continue to use `anyhow::Result` for context chains.
#[derive(Debug, Error)]
pub enum MoodwellError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Scoring ─────────────────────────────────────────────────────────
    #[error("scoring: {0}")]
    Scoring(#[from] ScoringError),

    // ── Offline queue ───────────────────────────────────────────────────
    #[error("queue: {0}")]
    Queue(#[from] QueueError),

    // ── Remote store ────────────────────────────────────────────────────
    #[error("remote: {0}")]
    Remote(#[from] RemoteWriteError),

    // ── Companion / generation ──────────────────────────────────────────
    #[error("companion: {0}")]
    Companion(#[from] CompanionError),

    // ── Session ─────────────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Professional profile ────────────────────────────────────────────
    #[error("profile: {0}")]
    Profile(#[from] ProfileError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Scoring errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("mood rating {0} is outside 1..=5")]
    MoodOutOfRange(i32),
}

// ─── Offline queue errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("storage read failed for key {key}: {message}")]
    Read { key: String, message: String },

    #[error("storage write failed for key {key}: {message}")]
    Write { key: String, message: String },

    #[error("failed to serialize queue: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Replayed actions that failed again could not be written back. They are
    /// carried here so the caller still holds them.
    #[error("{} unconfirmed action(s) could not be re-queued: {source}", .actions.len())]
    Requeue {
        actions: Vec<QueuedAction>,
        #[source]
        source: Box<QueueError>,
    },
}

// ─── Remote write errors ────────────────────────────────────────────────────

/// Any failure of an attempted remote commit.
///
/// The offline queue treats every variant the same way (re-queue); the kind is
/// kept so logs and the recovery table can tell them apart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} write failure: {message}")]
pub struct RemoteWriteError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RemoteWriteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(ErrorKind::Timeout, format!("no answer within {after:?}"))
    }
}

// ─── Companion errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CompanionError {
    #[error("Gemini API key not found; set GEMINI_API_KEY or companion.api_key")]
    MissingApiKey,

    #[error("Gemini request failed ({kind}): {message}")]
    Request { kind: ErrorKind, message: String },

    #[error("Gemini returned no text")]
    EmptyResponse,
}

impl CompanionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Request { kind, .. } => *kind,
            Self::MissingApiKey | Self::EmptyResponse => ErrorKind::GenerationFailed,
        }
    }
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no user is signed in")]
    NotSignedIn,
}

// ─── Profile errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("only professional accounts have a directory profile")]
    NotProfessional,

    #[error("{0}")]
    Invalid(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, MoodwellError>;
