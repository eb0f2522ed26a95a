use serde::Serialize;

use crate::wellbeing::domain::{Mood, MoodSample, NudgeCategory};
use crate::wellbeing::moodmeter::MoodmeterScore;
use crate::wellbeing::repository::SurveyRecord;

const TREND_WINDOW: usize = 3;
const LOW_SCORE_THRESHOLD: u8 = 50;
const RISK_DETAIL_CHARS: usize = 50;

/// The parts of this week's survey the analyzer looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveySnapshot {
    pub moodmeter_score: Option<MoodmeterScore>,
    pub risks: String,
    pub mood: String,
    pub wellbeing: String,
}

impl From<&SurveyRecord> for SurveySnapshot {
    fn from(record: &SurveyRecord) -> Self {
        Self {
            moodmeter_score: record.moodmeter_score,
            risks: record.response.risks.clone(),
            mood: record.response.mood.clone(),
            wellbeing: record.response.wellbeing.clone(),
        }
    }
}

/// Outcome of scanning a user's recent activity. Serialized as-is into the nudge prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NudgeAnalysis {
    pub trigger: bool,
    pub category: NudgeCategory,
    pub rationale: String,
    pub check_in_count: usize,
    pub recent_mood: Option<Mood>,
    pub moodmeter_score: Option<MoodmeterScore>,
}

/// Decide whether a user should get a nudge and what kind.
///
/// `recent` holds the latest check-ins newest first. Rules run in a fixed order and a
/// later match replaces the category chosen by an earlier one, so engagement beats risk
/// awareness, which beats a low score, which beats the mood trend.
pub fn analyze(recent: &[MoodSample], survey: Option<&SurveySnapshot>) -> NudgeAnalysis {
    let mut trigger = false;
    let mut category = NudgeCategory::General;
    let mut rationale = String::new();

    if recent.len() >= TREND_WINDOW {
        let window = &recent[..TREND_WINDOW];
        let negative = window.iter().filter(|sample| sample.mood.is_negative()).count();

        if negative >= 2 {
            trigger = true;
            category = NudgeCategory::MoodSupport;
            rationale = "User has been experiencing negative moods recently.".to_string();
        } else if window.iter().all(|sample| sample.mood.is_positive()) {
            trigger = true;
            category = NudgeCategory::Celebration;
            rationale =
                "User has been consistently positive. Encourage maintaining this momentum."
                    .to_string();
        }
    }

    if let Some(survey) = survey {
        if let Some(score) = survey.moodmeter_score {
            if score.value() < LOW_SCORE_THRESHOLD {
                trigger = true;
                category = NudgeCategory::WellbeingConcern;
                rationale = format!(
                    "User's wellbeing score is low ({}). They may need support.",
                    score.value()
                );
            }
        }

        if survey.risks.chars().count() > RISK_DETAIL_CHARS {
            trigger = true;
            category = NudgeCategory::RiskAwareness;
            rationale = "User mentioned concerns in their weekly survey.".to_string();
        }
    }

    if recent.is_empty() {
        trigger = true;
        category = NudgeCategory::Engagement;
        rationale = "User has not been checking in. Encourage regular engagement.".to_string();
    }

    NudgeAnalysis {
        trigger,
        category,
        rationale,
        check_in_count: recent.len(),
        recent_mood: recent.first().map(|sample| sample.mood),
        moodmeter_score: survey.and_then(|survey| survey.moodmeter_score),
    }
}
