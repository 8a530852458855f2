//! Help directory: professional profiles and the listing users browse.
//!
//! A professional account keeps its directory entry in the `professional`
//! map of its `users/{uid}` document. Only accounts with
//! [`UserRole::Professional`] may read or change their own entry; anyone can
//! list the directory.

use crate::core::remote::{FirestoreClient, parse_records};
use crate::core::session::{SessionContext, SessionUser, UserRole};
use crate::error::ProfileError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfessionalProfile {
    pub full_name: String,
    pub specialty: String,
    /// Professional licence number.
    pub cedula: String,
    pub phone: String,
    pub purpose: String,
    /// Degree, e.g. "Licenciatura" or "Maestría".
    pub level: String,
    pub state: String,
    pub municipality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Fields to change on a profile; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub specialty: Option<String>,
    pub cedula: Option<String>,
    pub phone: Option<String>,
    pub purpose: Option<String>,
    pub level: Option<String>,
    pub state: Option<String>,
    pub municipality: Option<String>,
    pub photo_url: Option<String>,
}

impl ProfessionalProfile {
    /// Copy with `changes` applied and every field trimmed.
    pub fn with_changes(&self, changes: ProfileChanges) -> Self {
        let pick = |change: Option<String>, current: &str| {
            change.as_deref().unwrap_or(current).trim().to_string()
        };
        let photo_url = changes
            .photo_url
            .or_else(|| self.photo_url.clone())
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Self {
            full_name: pick(changes.full_name, &self.full_name),
            specialty: pick(changes.specialty, &self.specialty),
            cedula: pick(changes.cedula, &self.cedula),
            phone: pick(changes.phone, &self.phone),
            purpose: pick(changes.purpose, &self.purpose),
            level: pick(changes.level, &self.level),
            state: pick(changes.state, &self.state),
            municipality: pick(changes.municipality, &self.municipality),
            photo_url,
        }
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.full_name.is_empty() || self.specialty.is_empty() {
            return Err(ProfileError::Invalid(
                "full name and specialty are required".into(),
            ));
        }
        if !all_digits(&self.cedula, 5..=10) {
            return Err(ProfileError::Invalid(
                "licence number must be 5 to 10 digits".into(),
            ));
        }
        if !all_digits(&self.phone, 10..=10) {
            return Err(ProfileError::Invalid("phone must be 10 digits".into()));
        }
        if self.state.is_empty() || self.municipality.is_empty() {
            return Err(ProfileError::Invalid(
                "state and municipality are required".into(),
            ));
        }
        Ok(())
    }

    /// "Level Full Name" when a level is set.
    pub fn display_name(&self) -> String {
        if self.level.is_empty() {
            self.full_name.clone()
        } else {
            format!("{} {}", self.level, self.full_name)
        }
    }

    fn to_fields(&self) -> anyhow::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => anyhow::bail!("profile serialized to {other}"),
        }
    }
}

fn all_digits(text: &str, len: std::ops::RangeInclusive<usize>) -> bool {
    len.contains(&text.len()) && text.chars().all(|c| c.is_ascii_digit())
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Username, or the email when there is none.
    pub handle: String,
    pub profile: ProfessionalProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserRecord {
    username: Option<String>,
    email: Option<String>,
    professional: Option<ProfessionalProfile>,
}

impl UserRecord {
    fn into_listing(self) -> Option<Listing> {
        let profile = self.professional?;
        let handle = self
            .username
            .filter(|name| !name.trim().is_empty())
            .or(self.email)
            .unwrap_or_default();
        Some(Listing { handle, profile })
    }
}

/// Narrows the directory; unset fields match everything. Comparison ignores
/// case and surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    pub specialty: Option<String>,
    pub state: Option<String>,
    pub municipality: Option<String>,
}

impl DirectoryFilter {
    pub fn matches(&self, profile: &ProfessionalProfile) -> bool {
        let same = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .is_none_or(|wanted| wanted.trim().to_lowercase() == actual.trim().to_lowercase())
        };
        same(&self.specialty, &profile.specialty)
            && same(&self.state, &profile.state)
            && same(&self.municipality, &profile.municipality)
    }
}

fn require_professional(session: &SessionContext) -> anyhow::Result<&SessionUser> {
    let user = session.require_user()?;
    if user.role != UserRole::Professional {
        return Err(ProfileError::NotProfessional.into());
    }
    Ok(user)
}

/// The signed-in professional's directory entry, if it was ever written.
pub async fn my_profile(
    store: &FirestoreClient,
    session: &SessionContext,
) -> anyhow::Result<Option<ProfessionalProfile>> {
    let user = require_professional(session)?;
    let record = store
        .user_profile(&user.uid)
        .await
        .context("reading profile")?;
    Ok(record
        .and_then(|record| parse_records::<UserRecord>(vec![record]).pop())
        .and_then(|record| record.professional))
}

/// Applies `changes` to the stored entry, validates the result and writes it.
pub async fn update_my_profile(
    store: &FirestoreClient,
    session: &SessionContext,
    changes: ProfileChanges,
) -> anyhow::Result<ProfessionalProfile> {
    let user = require_professional(session)?;
    let current = my_profile(store, session).await?.unwrap_or_default();
    let updated = current.with_changes(changes);
    updated.validate()?;

    store
        .update_professional_profile(&user.uid, &updated.to_fields()?)
        .await
        .context("saving profile")?;
    tracing::info!(uid = %user.uid, "professional profile saved");
    Ok(updated)
}

/// Directory entries matching `filter`, sorted by name.
pub async fn find_professionals(
    store: &FirestoreClient,
    filter: &DirectoryFilter,
) -> anyhow::Result<Vec<Listing>> {
    let records = store
        .list_professionals()
        .await
        .context("listing professionals")?;
    let mut listings: Vec<Listing> = parse_records::<UserRecord>(records)
        .into_iter()
        .filter_map(UserRecord::into_listing)
        .filter(|listing| filter.matches(&listing.profile))
        .collect();
    listings.sort_by(|a, b| a.profile.full_name.cmp(&b.profile.full_name));
    Ok(listings)
}
