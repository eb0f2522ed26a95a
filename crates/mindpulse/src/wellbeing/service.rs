use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;

use crate::config::NudgeConfig;

use super::domain::{
    week_start, ChatRole, Mood, MoodSample, NudgeId, UserId, UserProfile, UserRole,
    WeeklySurveyResponse,
};
use super::generator::{GenerationError, TextGenerator};
use super::moodmeter::{compute_score, MoodmeterScore};
use super::nudges::{NudgeBatch, NudgeBatchError, NudgeBatchReport, CHECK_IN_WINDOW};
use super::prompt::{coach_prompt, survey_summary_prompt};
use super::repository::{
    ChatMessage, CheckInRecord, NudgeRecord, RepositoryError, SurveyRecord, WellbeingStore,
};

/// Points plotted on the stats mood chart.
pub const MOOD_TREND_POINTS: usize = 14;
/// Conversation turns fed back into the coach prompt.
pub const COACH_CONTEXT_MESSAGES: usize = 10;

/// Per-user dashboard numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_id: UserId,
    pub check_in_total: u32,
    pub week_start: NaiveDate,
    pub weekly_survey_completed: bool,
    pub recent_mood: Option<Mood>,
    pub mood_trend: Vec<MoodTrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodTrendPoint {
    pub date: NaiveDate,
    pub mood: Mood,
    pub value: u8,
}

/// One row of the manager view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMemberSummary {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
    pub survey_completed: bool,
    pub moodmeter_score: Option<MoodmeterScore>,
    pub ai_summary: Option<String>,
}

/// Weekly survey progress across everyone except the requesting admin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOverview {
    pub week_start: NaiveDate,
    pub members: Vec<TeamMemberSummary>,
    pub completed: usize,
    pub completion_rate: f64,
    pub average_score: Option<f64>,
}

/// Facade over the store and text generator used by the HTTP layer and CLI.
pub struct WellbeingService<S: ?Sized, G: ?Sized> {
    store: Arc<S>,
    generator: Arc<G>,
    nudges: NudgeConfig,
}

impl<S, G> WellbeingService<S, G>
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, generator: Arc<G>, nudges: NudgeConfig) -> Self {
        Self {
            store,
            generator,
            nudges,
        }
    }

    /// Record a mood check-in for an existing user.
    pub fn record_check_in(
        &self,
        user_id: &UserId,
        mood: Mood,
        recorded_at: DateTime<Utc>,
    ) -> Result<CheckInRecord, WellbeingServiceError> {
        self.require_profile(user_id)?;

        let record = CheckInRecord {
            user_id: user_id.clone(),
            mood,
            recorded_at,
        };
        self.store.append_check_in(record.clone())?;
        Ok(record)
    }

    /// Score, summarize, and store this week's survey. A failed summary leaves the
    /// record without one rather than rejecting the submission.
    pub fn submit_weekly_survey(
        &self,
        user_id: &UserId,
        response: WeeklySurveyResponse,
        now: DateTime<Utc>,
    ) -> Result<SurveyRecord, WellbeingServiceError> {
        self.require_profile(user_id)?;

        let week = week_start(now.date_naive());
        if self.store.survey_for_week(user_id, week)?.is_some() {
            return Err(WellbeingServiceError::SurveyAlreadySubmitted { week_start: week });
        }

        let recent: Vec<MoodSample> = self
            .store
            .recent_check_ins(user_id, CHECK_IN_WINDOW)?
            .iter()
            .map(CheckInRecord::sample)
            .collect();
        let check_ins = self.store.check_in_count(user_id)?;
        let score = compute_score(&response, &recent, check_ins);

        let ai_summary = match self.generator.generate(&survey_summary_prompt(&response)) {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(%user_id, error = %err, "survey summary unavailable");
                None
            }
        };

        let record = SurveyRecord {
            user_id: user_id.clone(),
            week_start: week,
            response,
            moodmeter_score: Some(score),
            ai_summary,
            completed_at: now,
        };

        match self.store.insert_survey(record) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => {
                Err(WellbeingServiceError::SurveyAlreadySubmitted { week_start: week })
            }
            Err(other) => Err(other.into()),
        }
    }

    pub fn user_stats(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<UserStats, WellbeingServiceError> {
        self.require_profile(user_id)?;

        let week = week_start(now.date_naive());
        let check_in_total = self.store.check_in_count(user_id)?;
        let weekly_survey_completed = self.store.survey_for_week(user_id, week)?.is_some();

        let mut recent = self.store.recent_check_ins(user_id, MOOD_TREND_POINTS)?;
        let recent_mood = recent.first().map(|record| record.mood);
        recent.reverse();

        let mood_trend = recent
            .iter()
            .map(|record| MoodTrendPoint {
                date: record.recorded_at.date_naive(),
                mood: record.mood,
                value: record.mood.chart_value(),
            })
            .collect();

        Ok(UserStats {
            user_id: user_id.clone(),
            check_in_total,
            week_start: week,
            weekly_survey_completed,
            recent_mood,
            mood_trend,
        })
    }

    pub fn nudges(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<NudgeRecord>, WellbeingServiceError> {
        Ok(self.store.nudges(user_id, limit)?)
    }

    pub fn mark_nudge_read(
        &self,
        user_id: &UserId,
        nudge_id: &NudgeId,
    ) -> Result<(), WellbeingServiceError> {
        Ok(self.store.mark_nudge_read(user_id, nudge_id)?)
    }

    pub fn delete_nudge(
        &self,
        user_id: &UserId,
        nudge_id: &NudgeId,
    ) -> Result<(), WellbeingServiceError> {
        Ok(self.store.delete_nudge(user_id, nudge_id)?)
    }

    /// Store the user's message, ask the generator for a reply, and store the reply.
    ///
    /// The user's message is kept even when generation fails.
    pub fn coach_reply(
        &self,
        user_id: &UserId,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage, WellbeingServiceError> {
        let content = message.trim();
        if content.is_empty() {
            return Err(WellbeingServiceError::EmptyMessage);
        }
        self.require_profile(user_id)?;

        self.store.append_message(ChatMessage {
            user_id: user_id.clone(),
            role: ChatRole::User,
            content: content.to_string(),
            created_at: now,
        })?;

        let history = self.store.chat_history(user_id, COACH_CONTEXT_MESSAGES)?;
        let reply = self.generator.generate(&coach_prompt(&history))?;

        let reply = ChatMessage {
            user_id: user_id.clone(),
            role: ChatRole::Assistant,
            content: reply,
            created_at: now,
        };
        self.store.append_message(reply.clone())?;
        Ok(reply)
    }

    pub fn chat_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, WellbeingServiceError> {
        Ok(self.store.chat_history(user_id, limit)?)
    }

    /// Current-week survey progress for every profile other than the requesting admin.
    pub fn team_overview(
        &self,
        admin_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<TeamOverview, WellbeingServiceError> {
        let admin = self.require_profile(admin_id)?;
        if admin.role != UserRole::Admin {
            return Err(WellbeingServiceError::NotPermitted);
        }

        let week = week_start(now.date_naive());
        let mut members = Vec::new();
        for profile in self.store.profiles()? {
            if profile.id == admin.id {
                continue;
            }
            let survey = self.store.survey_for_week(&profile.id, week)?;
            members.push(TeamMemberSummary {
                display_name: profile.display_name(),
                user_id: profile.id,
                email: profile.email,
                survey_completed: survey.is_some(),
                moodmeter_score: survey.as_ref().and_then(|record| record.moodmeter_score),
                ai_summary: survey.and_then(|record| record.ai_summary),
            });
        }

        let completed = members.iter().filter(|member| member.survey_completed).count();
        let completion_rate = if members.is_empty() {
            0.0
        } else {
            completed as f64 / members.len() as f64
        };
        let scores: Vec<f64> = members
            .iter()
            .filter_map(|member| member.moodmeter_score)
            .map(|score| f64::from(score.value()))
            .collect();
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        Ok(TeamOverview {
            week_start: week,
            members,
            completed,
            completion_rate,
            average_score,
        })
    }

    /// Run the nudge batch over the shared store and generator.
    pub fn generate_nudges(
        &self,
        now: DateTime<Utc>,
    ) -> Result<NudgeBatchReport, WellbeingServiceError> {
        let batch = NudgeBatch::new(
            Arc::clone(&self.store),
            Arc::clone(&self.generator),
            self.nudges,
        );
        Ok(batch.run_on(now)?)
    }

    fn require_profile(&self, user_id: &UserId) -> Result<UserProfile, WellbeingServiceError> {
        self.store
            .profile(user_id)?
            .ok_or_else(|| WellbeingServiceError::UnknownUser(user_id.clone()))
    }
}

/// Error raised by the wellbeing service.
#[derive(Debug, thiserror::Error)]
pub enum WellbeingServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Batch(#[from] NudgeBatchError),
    #[error("weekly survey for the week of {week_start} was already submitted")]
    SurveyAlreadySubmitted { week_start: NaiveDate },
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("team overview is restricted to admins")]
    NotPermitted,
    #[error("unknown user {0}")]
    UnknownUser(UserId),
}
