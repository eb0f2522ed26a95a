use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ChatRole, Mood, MoodSample, NudgeCategory, NudgeId, UserId, UserProfile,
    WeeklySurveyResponse,
};
use super::moodmeter::MoodmeterScore;

/// Stored daily mood check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
    pub user_id: UserId,
    pub mood: Mood,
    pub recorded_at: DateTime<Utc>,
}

impl CheckInRecord {
    pub fn sample(&self) -> MoodSample {
        MoodSample {
            mood: self.mood,
            date: self.recorded_at,
        }
    }
}

/// Stored weekly survey together with the values derived at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub user_id: UserId,
    pub week_start: NaiveDate,
    pub response: WeeklySurveyResponse,
    pub moodmeter_score: Option<MoodmeterScore>,
    pub ai_summary: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Stored coaching nudge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeRecord {
    pub id: NudgeId,
    pub user_id: UserId,
    pub text: String,
    pub category: NudgeCategory,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// One turn of a coach conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user_id: UserId,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Read access to the user directory.
pub trait ProfileStore: Send + Sync {
    fn profiles(&self) -> Result<Vec<UserProfile>, RepositoryError>;
    fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
}

/// Mood check-in history.
pub trait MoodStore: Send + Sync {
    fn append_check_in(&self, record: CheckInRecord) -> Result<(), RepositoryError>;
    /// Up to `limit` check-ins for the user, newest first.
    fn recent_check_ins(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<CheckInRecord>, RepositoryError>;
    fn check_in_count(&self, user_id: &UserId) -> Result<u32, RepositoryError>;
}

/// Weekly survey records keyed by user and week start.
pub trait SurveyStore: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the user already has a survey for that week.
    fn insert_survey(&self, record: SurveyRecord) -> Result<SurveyRecord, RepositoryError>;
    fn survey_for_week(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> Result<Option<SurveyRecord>, RepositoryError>;
}

/// Nudge rows owned by a user.
pub trait NudgeStore: Send + Sync {
    fn unread_nudge_count(&self, user_id: &UserId) -> Result<usize, RepositoryError>;
    fn insert_nudge(&self, record: NudgeRecord) -> Result<NudgeRecord, RepositoryError>;
    /// Up to `limit` nudges for the user, newest first.
    fn nudges(&self, user_id: &UserId, limit: usize) -> Result<Vec<NudgeRecord>, RepositoryError>;
    fn mark_nudge_read(&self, user_id: &UserId, id: &NudgeId) -> Result<(), RepositoryError>;
    fn delete_nudge(&self, user_id: &UserId, id: &NudgeId) -> Result<(), RepositoryError>;
}

/// Coach conversation log.
pub trait ChatStore: Send + Sync {
    fn append_message(&self, message: ChatMessage) -> Result<(), RepositoryError>;
    /// The last `limit` messages for the user in chronological order.
    fn chat_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;
}

/// Everything the wellbeing service and nudge batch read or write.
pub trait WellbeingStore: ProfileStore + MoodStore + SurveyStore + NudgeStore + ChatStore {}

impl<T> WellbeingStore for T where
    T: ProfileStore + MoodStore + SurveyStore + NudgeStore + ChatStore
{
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
