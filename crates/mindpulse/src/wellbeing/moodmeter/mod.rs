//! Moodmeter: a bounded 0-100 wellbeing score built from four weighted signals.
//!
//! Starting from a neutral 50, the score adds keyword sentiment from the weekly
//! survey (40%), the recent mood average (30%), and check-in consistency (20%),
//! then subtracts a penalty for risk vocabulary (10%). Each signal is bounded to
//! 25 points before weighting and the total is rounded half-up and clamped.

mod rules;

use serde::{Deserialize, Serialize};

use super::domain::{MoodSample, WeeklySurveyResponse};

const BASE_SCORE: f64 = 50.0;
const SENTIMENT_WEIGHT: f64 = 0.4;
const MOOD_HISTORY_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.2;
const RISK_WEIGHT: f64 = 0.1;

/// Wellbeing score, always within `0..=100`, including when read back from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub struct MoodmeterScore(u8);

impl MoodmeterScore {
    pub const MAX: u8 = 100;

    /// Round half-up and clamp a raw weighted total.
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_nan() {
            return Self(BASE_SCORE as u8);
        }
        let rounded = (raw + 0.5).floor().clamp(0.0, Self::MAX as f64);
        Self(rounded as u8)
    }

    /// Clamp an already-integral score, e.g. one read back from storage.
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for MoodmeterScore {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<MoodmeterScore> for u8 {
    fn from(score: MoodmeterScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for MoodmeterScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/100", self.0)
    }
}

/// Signal feeding the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Sentiment,
    MoodHistory,
    Consistency,
    RiskPenalty,
}

/// One bounded signal and the points it moved the final score by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub raw: f64,
    pub weight: f64,
    /// Signed points added to the base score; negative for the risk penalty.
    pub contribution: f64,
}

/// Score plus the audit trail of how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodmeterBreakdown {
    pub score: MoodmeterScore,
    pub unrounded: f64,
    pub components: Vec<ScoreComponent>,
}

impl MoodmeterBreakdown {
    pub fn component(&self, factor: ScoreFactor) -> Option<&ScoreComponent> {
        self.components
            .iter()
            .find(|component| component.factor == factor)
    }
}

/// Compute the score together with each weighted component.
pub fn score_breakdown(
    survey: &WeeklySurveyResponse,
    recent_moods: &[MoodSample],
    check_in_count: u32,
) -> MoodmeterBreakdown {
    let sentiment = rules::sentiment_component(survey);
    let mood_history = rules::mood_history_component(recent_moods);
    let consistency = rules::consistency_component(check_in_count);
    let risk = rules::risk_penalty(&survey.risks);

    let components = vec![
        ScoreComponent {
            factor: ScoreFactor::Sentiment,
            raw: sentiment,
            weight: SENTIMENT_WEIGHT,
            contribution: sentiment * SENTIMENT_WEIGHT,
        },
        ScoreComponent {
            factor: ScoreFactor::MoodHistory,
            raw: mood_history,
            weight: MOOD_HISTORY_WEIGHT,
            contribution: mood_history * MOOD_HISTORY_WEIGHT,
        },
        ScoreComponent {
            factor: ScoreFactor::Consistency,
            raw: consistency,
            weight: CONSISTENCY_WEIGHT,
            contribution: consistency * CONSISTENCY_WEIGHT,
        },
        ScoreComponent {
            factor: ScoreFactor::RiskPenalty,
            raw: risk,
            weight: RISK_WEIGHT,
            contribution: -(risk * RISK_WEIGHT),
        },
    ];

    let unrounded = BASE_SCORE
        + components
            .iter()
            .map(|component| component.contribution)
            .sum::<f64>();

    MoodmeterBreakdown {
        score: MoodmeterScore::from_raw(unrounded),
        unrounded,
        components,
    }
}

/// Wellbeing score for a weekly survey, the latest (up to seven) mood samples in any
/// order, and the user's check-in count.
pub fn compute_score(
    survey: &WeeklySurveyResponse,
    recent_moods: &[MoodSample],
    check_in_count: u32,
) -> MoodmeterScore {
    score_breakdown(survey, recent_moods, check_in_count).score
}
