use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::EnumIter;

/// Day-context labels offered alongside a check-in. Stored on the
/// diagnostic, never scored.
pub const DAY_TAGS: [&str; 12] = [
    "buen día",
    "mal día",
    "peleé con mi pareja",
    "problemas en el trabajo/escuela",
    "tráfico",
    "poco tiempo",
    "logré una meta",
    "hice ejercicio",
    "salí con amigos",
    "tiempo en familia",
    "muchas tareas",
    "otro",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum Emotion {
    Joy,
    Calm,
    Motivation,
    Gratitude,
    Hope,
    Sadness,
    Anxiety,
    Anger,
    Stress,
    Frustration,
    Loneliness,
    Fatigue,
}

impl Emotion {
    /// Label shown to the user and persisted on diagnostics.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Joy => "alegría",
            Self::Calm => "calma",
            Self::Motivation => "motivación",
            Self::Gratitude => "gratitud",
            Self::Hope => "esperanza",
            Self::Sadness => "tristeza",
            Self::Anxiety => "ansiedad",
            Self::Anger => "enojo",
            Self::Stress => "estrés",
            Self::Frustration => "frustración",
            Self::Loneliness => "soledad",
            Self::Fatigue => "cansancio",
        }
    }

    pub const fn alias(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Calm => "calm",
            Self::Motivation => "motivation",
            Self::Gratitude => "gratitude",
            Self::Hope => "hope",
            Self::Sadness => "sadness",
            Self::Anxiety => "anxiety",
            Self::Anger => "anger",
            Self::Stress => "stress",
            Self::Frustration => "frustration",
            Self::Loneliness => "loneliness",
            Self::Fatigue => "fatigue",
        }
    }

    pub const fn is_positive(self) -> bool {
        matches!(
            self,
            Self::Joy | Self::Calm | Self::Motivation | Self::Gratitude | Self::Hope
        )
    }

    /// Resolves a free-form tag against either label set. Case and
    /// surrounding whitespace are ignored.
    pub fn from_tag(tag: &str) -> Option<Self> {
        use strum::IntoEnumIterator;

        let needle = tag.trim().to_lowercase();
        Self::iter().find(|emotion| emotion.label() == needle || emotion.alias() == needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter)]
pub enum Diagnosis {
    #[serde(rename = "Muy bajo")]
    VeryLow,
    #[serde(rename = "Bajo")]
    Low,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Positivo")]
    Positive,
    #[serde(rename = "Muy positivo")]
    VeryPositive,
}

impl Diagnosis {
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..=24 => Self::VeryLow,
            25..=44 => Self::Low,
            45..=59 => Self::Neutral,
            60..=79 => Self::Positive,
            _ => Self::VeryPositive,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Muy bajo",
            Self::Low => "Bajo",
            Self::Neutral => "Neutral",
            Self::Positive => "Positivo",
            Self::VeryPositive => "Muy positivo",
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub score: u8,
    pub diagnosis: Diagnosis,
}

/// One check-in's scoring inputs. Built per submission, never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodInput {
    mood_rating: u8,
    emotion_tags: BTreeSet<String>,
    sleep_hours: i32,
}

impl MoodInput {
    pub fn new<I, S>(mood_rating: i32, emotion_tags: I, sleep_hours: i32) -> Result<Self, ScoringError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mood_rating = u8::try_from(mood_rating)
            .ok()
            .filter(|rating| (1..=5).contains(rating))
            .ok_or(ScoringError::MoodOutOfRange(mood_rating))?;

        Ok(Self {
            mood_rating,
            emotion_tags: emotion_tags.into_iter().map(Into::into).collect(),
            sleep_hours,
        })
    }

    pub fn mood_rating(&self) -> u8 {
        self.mood_rating
    }

    pub fn emotion_tags(&self) -> &BTreeSet<String> {
        &self.emotion_tags
    }

    pub fn sleep_hours(&self) -> i32 {
        self.sleep_hours
    }

    pub fn score(&self) -> ScoreResult {
        super::compute_score_and_diagnosis(
            i32::from(self.mood_rating),
            &self.emotion_tags,
            self.sleep_hours,
        )
    }
}
