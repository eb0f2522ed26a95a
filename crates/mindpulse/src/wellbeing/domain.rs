use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for user profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for stored nudges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NudgeId(pub String);

impl NudgeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Five-point self-reported mood captured by a daily check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VerySad,
    Sad,
    Neutral,
    Happy,
    VeryHappy,
}

impl Mood {
    /// Signed value used by the moodmeter history component.
    pub fn score_value(self) -> i32 {
        match self {
            Mood::VerySad => -20,
            Mood::Sad => -10,
            Mood::Neutral => 0,
            Mood::Happy => 10,
            Mood::VeryHappy => 20,
        }
    }

    /// 1..=5 value plotted on mood trend charts.
    pub fn chart_value(self) -> u8 {
        match self {
            Mood::VerySad => 1,
            Mood::Sad => 2,
            Mood::Neutral => 3,
            Mood::Happy => 4,
            Mood::VeryHappy => 5,
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Mood::Sad | Mood::VerySad)
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Mood::Happy | Mood::VeryHappy)
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::VerySad => "very_sad",
            Mood::Sad => "sad",
            Mood::Neutral => "neutral",
            Mood::Happy => "happy",
            Mood::VeryHappy => "very_happy",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::VerySad => "😢",
            Mood::Sad => "😟",
            Mood::Neutral => "😐",
            Mood::Happy => "🙂",
            Mood::VeryHappy => "😄",
        }
    }
}

/// One recorded mood check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodSample {
    pub mood: Mood,
    pub date: DateTime<Utc>,
}

/// Free-text answers to the weekly wellbeing survey.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklySurveyResponse {
    pub mood: String,
    pub wellbeing: String,
    pub health: String,
    pub productivity: String,
    pub risks: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_input: Option<String>,
}

/// Access level attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Employee,
    Admin,
}

/// Directory entry for a person using the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: UserRole,
}

impl UserProfile {
    /// Name shown to managers, falling back to the local part of the e-mail address.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

/// Reason a nudge was generated; drives the tone of the generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeCategory {
    MoodSupport,
    Celebration,
    WellbeingConcern,
    RiskAwareness,
    Engagement,
    General,
}

impl NudgeCategory {
    pub fn label(self) -> &'static str {
        match self {
            NudgeCategory::MoodSupport => "mood_support",
            NudgeCategory::Celebration => "celebration",
            NudgeCategory::WellbeingConcern => "wellbeing_concern",
            NudgeCategory::RiskAwareness => "risk_awareness",
            NudgeCategory::Engagement => "engagement",
            NudgeCategory::General => "general",
        }
    }
}

/// Speaker of a coach conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Monday of the week containing `date`. Every weekly record is keyed by this date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}
