//! Explicit session context passed to every flow that needs a user.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    #[default]
    Normal,
    Professional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub uid: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub id_token: Option<String>,
    pub role: UserRole,
}

impl SessionUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            username: None,
            id_token: None,
            role: UserRole::Normal,
        }
    }

    /// Name used when addressing the user: username, then the local part of
    /// the email, then a generic word.
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.username.as_deref().map(str::trim)
            && !name.is_empty()
        {
            return name;
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("amigo")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    user: Option<SessionUser>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> Result<&SessionUser, SessionError> {
        self.user.as_ref().ok_or(SessionError::NotSignedIn)
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::debug!(uid = %user.uid, "signed out");
        }
    }
}
