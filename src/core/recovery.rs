//! Failure kinds and the recovery each one gets.
//!
//! Every failure surfaced by the remote store, the local queue storage or the
//! companion is classified into an [`ErrorKind`]. [`ErrorKind::recovery`] is
//! the single decision table callers consult instead of catching everything
//! and guessing.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// DNS/connect failure, no route to the remote store.
    Unreachable,
    /// The remote call did not answer within its bounded wait.
    Timeout,
    /// The remote store answered with a non-auth error status.
    Rejected,
    /// The id token was refused (401/403).
    Unauthorized,
    /// The remote answered 2xx but the body could not be decoded.
    MalformedResponse,
    /// The persisted queue could not be parsed.
    CorruptStorage,
    /// A queued action carries a `type` this build cannot dispatch.
    UnknownAction,
    /// The generative model call failed or returned nothing.
    GenerationFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Recovery {
    /// Keep the write in the offline queue and tell the user it will sync later.
    QueueOffline,
    /// Leave the action queued without dispatching it; report it.
    KeepPending,
    /// Treat the stored value as empty after backing it up.
    ResetToEmpty,
    /// Continue with a canned local text.
    UseFallback,
}

impl ErrorKind {
    pub const fn recovery(self) -> Recovery {
        match self {
            // Unauthorized included: the queued write carries the uid, not
            // the token, so it can be committed after the user signs in again.
            Self::Unreachable
            | Self::Timeout
            | Self::Rejected
            | Self::Unauthorized
            | Self::MalformedResponse => Recovery::QueueOffline,
            Self::UnknownAction => Recovery::KeepPending,
            Self::CorruptStorage => Recovery::ResetToEmpty,
            Self::GenerationFailed => Recovery::UseFallback,
        }
    }

    /// Whether a later attempt may succeed without any change on our side.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Unreachable | Self::Timeout)
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            408 | 504 => Self::Timeout,
            _ => Self::Rejected,
        }
    }

    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() {
            Self::Unreachable
        } else if err.is_decode() || err.is_body() {
            Self::MalformedResponse
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else {
            Self::Unreachable
        }
    }
}
