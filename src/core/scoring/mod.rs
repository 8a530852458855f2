//! Local, deterministic wellbeing scoring.
//!
//! A check-in is scored entirely on-device so it works offline:
//!
//! 1. base `(mood - 1) * 25`
//! 2. emotion adjustment, ±6 per recognised tag, saturated to ±18
//! 3. sleep adjustment, +8 / +2 / -8 / 0 depending on hours
//! 4. the sum clamped to `0..=100` and bucketed into a [`Diagnosis`]

mod types;


pub use types::{DAY_TAGS, Diagnosis, Emotion, MoodInput, ScoreResult};

use std::collections::BTreeSet;

const EMOTION_STEP: i32 = 6;
const EMOTION_CAP: i32 = 18;

/// Sum of the per-emotion contributions, clamped to `-18..=18`.
///
/// Each recognised emotion counts once even if several tags resolve to it.
pub fn emotion_adjustment<S: AsRef<str>>(tags: impl IntoIterator<Item = S>) -> i32 {
    let emotions: BTreeSet<Emotion> = tags
        .into_iter()
        .filter_map(|tag| Emotion::from_tag(tag.as_ref()))
        .collect();

    let raw: i32 = emotions
        .iter()
        .map(|emotion| {
            if emotion.is_positive() {
                EMOTION_STEP
            } else {
                -EMOTION_STEP
            }
        })
        .sum();

    raw.clamp(-EMOTION_CAP, EMOTION_CAP)
}

pub const fn sleep_adjustment(sleep_hours: i32) -> i32 {
    match sleep_hours {
        7..=9 => 8,
        5..=6 | 10..=11 => 2,
        ..=4 | 12.. => -8,
    }
}

/// Scores one check-in.
///
/// Total over integers: only the final sum is clamped, so an out-of-range
/// `mood_rating` still yields a bounded score. Callers that take user input
/// should go through [`MoodInput::new`], which rejects ratings outside 1..=5.
pub fn compute_score_and_diagnosis<S: AsRef<str>>(
    mood_rating: i32,
    emotion_tags: impl IntoIterator<Item = S>,
    sleep_hours: i32,
) -> ScoreResult {
    let base = mood_rating.saturating_sub(1).saturating_mul(25);
    let total = base
        .saturating_add(emotion_adjustment(emotion_tags))
        .saturating_add(sleep_adjustment(sleep_hours));

    // clamp guarantees 0..=100
    let score = u8::try_from(total.clamp(0, 100)).unwrap_or(100);

    ScoreResult {
        score,
        diagnosis: Diagnosis::from_score(score),
    }
}
