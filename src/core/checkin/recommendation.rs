//! Daily recommendation: read today's notes and check-ins, generate one
//! text, store it under today's date key.

use crate::core::companion::{
    DayDiagnostic, DayNote, FALLBACK_RECOMMENDATION, GeminiClient, recommendation_for_day,
};
use crate::core::recovery::ErrorKind;
use crate::core::remote::{FirestoreClient, parse_records};
use crate::core::session::SessionContext;
use anyhow::Context;
use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::{Map, json};
use strum::Display;

pub const RECOMMENDATION_MAX_CHARS: usize = 550;
/// Newest notes and check-ins of the day fed to the model.
pub const DAY_NOTES_LIMIT: usize = 30;
pub const DAY_DIAGNOSTICS_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RecommendationSource {
    /// Already generated earlier today.
    Stored,
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRecommendation {
    pub date: String,
    pub text: String,
    pub source: RecommendationSource,
}

/// A local calendar day as a `YYYY-MM-DD` key and its `[start, end)` instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    pub key: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start, self.end)
    }
}

/// The local day `now` falls in.
pub fn day_window<Tz: TimeZone>(now: &DateTime<Tz>) -> DayWindow {
    let tz = now.timezone();
    let day = now.date_naive();
    let next = day.succ_opt().unwrap_or(day);
    DayWindow {
        key: day.format("%Y-%m-%d").to_string(),
        start: local_midnight(&tz, day),
        end: local_midnight(&tz, next),
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => at.with_timezone(&Utc),
        // no local midnight that day (DST gap); the UTC reading is close enough
        LocalResult::None => midnight.and_utc(),
    }
}

/// Returns today's recommendation, generating and storing it when there is
/// none yet or when `refresh` is set.
pub async fn daily_recommendation(
    store: &FirestoreClient,
    companion: &GeminiClient,
    session: &SessionContext,
    refresh: bool,
) -> anyhow::Result<DailyRecommendation> {
    let user = session.require_user()?;
    let today = day_window(&Local::now());
    let date = today.key.clone();

    if !refresh
        && let Some(stored) = store
            .recommendation_for_date(&user.uid, &date)
            .await
            .context("reading today's recommendation")?
        && !stored.text.trim().is_empty()
    {
        return Ok(DailyRecommendation {
            date,
            text: stored.text,
            source: RecommendationSource::Stored,
        });
    }

    let notes: Vec<DayNote> = parse_records(
        store
            .documents_between(
                &user.uid,
                "notes",
                "updatedAt",
                today.bounds(),
                DAY_NOTES_LIMIT,
            )
            .await
            .context("listing today's notes")?,
    );
    let diagnostics: Vec<DayDiagnostic> = parse_records(
        store
            .documents_between(
                &user.uid,
                "diagnostics",
                "createdAt",
                today.bounds(),
                DAY_DIAGNOSTICS_LIMIT,
            )
            .await
            .context("listing today's check-ins")?,
    );

    let (text, source) = match recommendation_for_day(
        companion,
        user.display_name(),
        &notes,
        &diagnostics,
        RECOMMENDATION_MAX_CHARS,
    )
    .await
    {
        Ok(text) => (text, RecommendationSource::Generated),
        Err(e) => {
            tracing::warn!(
                error = %e,
                kind = %e.kind(),
                recovery = %ErrorKind::GenerationFailed.recovery(),
                "recommendation generation failed; using fallback"
            );
            (
                FALLBACK_RECOMMENDATION.to_string(),
                RecommendationSource::Fallback,
            )
        }
    };

    let mut meta = Map::new();
    meta.insert("source".into(), json!(source.to_string()));
    meta.insert("model".into(), json!(companion.model()));
    meta.insert("notes".into(), json!(notes.len()));
    meta.insert("diagnostics".into(), json!(diagnostics.len()));
    store
        .upsert_recommendation(&user.uid, &date, &text, &meta)
        .await
        .context("storing today's recommendation")?;

    tracing::info!(uid = %user.uid, %date, %source, "daily recommendation ready");
    Ok(DailyRecommendation { date, text, source })
}
