//! Reading back and editing the signed-in user's notes and check-ins.
//!
//! These are online-only: unlike creating a note, editing or deleting one
//! is never queued.

use crate::core::remote::{FirestoreClient, NoteDraft, parse_records};
use crate::core::session::SessionContext;
use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const NOTES_LIST_LIMIT: usize = 100;
pub const DIAGNOSTICS_LIST_LIMIT: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredNote {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredDiagnostic {
    pub id: String,
    pub mood: i64,
    pub score: i64,
    pub diagnosis: String,
    pub emotions: Vec<String>,
    pub day_tags: Vec<String>,
    pub note: String,
    pub sleep_hours: i64,
    pub phrase: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Most recently edited notes first.
pub async fn recent_notes(
    store: &FirestoreClient,
    session: &SessionContext,
) -> anyhow::Result<Vec<StoredNote>> {
    let user = session.require_user()?;
    let records = store
        .list_notes(&user.uid, NOTES_LIST_LIMIT)
        .await
        .context("listing notes")?;
    Ok(parse_records(records))
}

pub async fn note(
    store: &FirestoreClient,
    session: &SessionContext,
    note_id: &str,
) -> anyhow::Result<Option<StoredNote>> {
    let user = session.require_user()?;
    let record = store
        .get_note(&user.uid, note_id)
        .await
        .with_context(|| format!("reading note {note_id}"))?;
    Ok(record.and_then(|record| parse_records(vec![record]).pop()))
}

pub async fn edit_note(
    store: &FirestoreClient,
    session: &SessionContext,
    note_id: &str,
    draft: &NoteDraft,
) -> anyhow::Result<()> {
    let user = session.require_user()?;
    if draft.is_blank() {
        bail!("a note needs a title or some content");
    }

    let found = store
        .update_note(&user.uid, note_id, draft)
        .await
        .with_context(|| format!("updating note {note_id}"))?;
    if !found {
        bail!("there is no note {note_id}");
    }
    tracing::info!(uid = %user.uid, note_id, "note updated");
    Ok(())
}

pub async fn delete_note(
    store: &FirestoreClient,
    session: &SessionContext,
    note_id: &str,
) -> anyhow::Result<()> {
    let user = session.require_user()?;
    store
        .delete_note(&user.uid, note_id)
        .await
        .with_context(|| format!("deleting note {note_id}"))?;
    tracing::info!(uid = %user.uid, note_id, "note deleted");
    Ok(())
}

/// Newest check-ins first.
pub async fn recent_diagnostics(
    store: &FirestoreClient,
    session: &SessionContext,
) -> anyhow::Result<Vec<StoredDiagnostic>> {
    let user = session.require_user()?;
    let records = store
        .list_diagnostics(&user.uid, DIAGNOSTICS_LIST_LIMIT)
        .await
        .context("listing check-ins")?;
    Ok(parse_records(records))
}
