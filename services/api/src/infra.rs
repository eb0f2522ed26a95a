use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use mindpulse::config::GeneratorConfig;
use mindpulse::error::AppError;
use mindpulse::wellbeing::{
    ChatCompletionsGenerator, ChatMessage, ChatStore, CheckInRecord, GenerationError, Mood,
    MoodStore, NudgeId, NudgeRecord, NudgeStore, ProfileStore, RepositoryError, SurveyRecord,
    SurveyStore, TextGenerator, UserId, UserProfile,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Serializable contents of the in-memory store, used to seed it from and write it back to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct StoreSnapshot {
    pub(crate) profiles: Vec<UserProfile>,
    pub(crate) check_ins: Vec<CheckInRecord>,
    pub(crate) surveys: Vec<SurveyRecord>,
    pub(crate) nudges: Vec<NudgeRecord>,
    pub(crate) messages: Vec<ChatMessage>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryWellbeingStore {
    state: Arc<Mutex<StoreSnapshot>>,
}

impl InMemoryWellbeingStore {
    pub(crate) fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }

    pub(crate) fn snapshot(&self) -> StoreSnapshot {
        self.state.lock().expect("store mutex poisoned").clone()
    }

    pub(crate) fn add_profile(&self, profile: UserProfile) {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .profiles
            .push(profile);
    }
}

impl ProfileStore for InMemoryWellbeingStore {
    fn profiles(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let guard = self.state.lock().expect("store mutex poisoned");
        Ok(guard.profiles.clone())
    }

    fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let guard = self.state.lock().expect("store mutex poisoned");
        Ok(guard.profiles.iter().find(|profile| &profile.id == id).cloned())
    }
}

impl MoodStore for InMemoryWellbeingStore {
    fn append_check_in(&self, record: CheckInRecord) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        guard.check_ins.push(record);
        Ok(())
    }

    fn recent_check_ins(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<CheckInRecord>, RepositoryError> {
        let guard = self.state.lock().expect("store mutex poisoned");
        let mut records: Vec<CheckInRecord> = guard
            .check_ins
            .iter()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        records.truncate(limit);
        Ok(records)
    }

    fn check_in_count(&self, user_id: &UserId) -> Result<u32, RepositoryError> {
        let guard = self.state.lock().expect("store mutex poisoned");
        let count = guard
            .check_ins
            .iter()
            .filter(|record| &record.user_id == user_id)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

impl SurveyStore for InMemoryWellbeingStore {
    fn insert_survey(&self, record: SurveyRecord) -> Result<SurveyRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        let exists = guard
            .surveys
            .iter()
            .any(|row| row.user_id == record.user_id && row.week_start == record.week_start);
        if exists {
            return Err(RepositoryError::Conflict);
        }
        guard.surveys.push(record.clone());
        Ok(record)
    }

    fn survey_for_week(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> Result<Option<SurveyRecord>, RepositoryError> {
        let guard = self.state.lock().expect("store mutex poisoned");
        Ok(guard
            .surveys
            .iter()
            .find(|row| &row.user_id == user_id && row.week_start == week_start)
            .cloned())
    }
}

impl NudgeStore for InMemoryWellbeingStore {
    fn unread_nudge_count(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let guard = self.state.lock().expect("store mutex poisoned");
        Ok(guard
            .nudges
            .iter()
            .filter(|nudge| &nudge.user_id == user_id && !nudge.read)
            .count())
    }

    fn insert_nudge(&self, record: NudgeRecord) -> Result<NudgeRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        if guard.nudges.iter().any(|nudge| nudge.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.nudges.push(record.clone());
        Ok(record)
    }

    fn nudges(&self, user_id: &UserId, limit: usize) -> Result<Vec<NudgeRecord>, RepositoryError> {
        let guard = self.state.lock().expect("store mutex poisoned");
        let mut records: Vec<NudgeRecord> = guard
            .nudges
            .iter()
            .filter(|nudge| &nudge.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }

    fn mark_nudge_read(&self, user_id: &UserId, id: &NudgeId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        match guard
            .nudges
            .iter_mut()
            .find(|nudge| &nudge.user_id == user_id && &nudge.id == id)
        {
            Some(nudge) => {
                nudge.read = true;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_nudge(&self, user_id: &UserId, id: &NudgeId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        match guard
            .nudges
            .iter()
            .position(|nudge| &nudge.user_id == user_id && &nudge.id == id)
        {
            Some(index) => {
                guard.nudges.remove(index);
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

impl ChatStore for InMemoryWellbeingStore {
    fn append_message(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        guard.messages.push(message);
        Ok(())
    }

    fn chat_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let guard = self.state.lock().expect("store mutex poisoned");
        let messages: Vec<&ChatMessage> = guard
            .messages
            .iter()
            .filter(|message| &message.user_id == user_id)
            .collect();
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.into_iter().skip(skip).cloned().collect())
    }
}

/// Canned replies used when no generation endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let reply = if prompt.starts_with("Generate a brief summary of this weekly survey") {
            "Weekly survey received. Review the answers directly for details."
        } else if prompt.contains("\"category\": \"mood_support\"") {
            "The last few days sound heavy. Try a short walk or a chat with someone you trust today."
        } else if prompt.contains("\"category\": \"celebration\"") {
            "You've had a great run lately. Note one thing that helped so you can repeat it next week."
        } else if prompt.contains("\"category\": \"wellbeing_concern\"") {
            "Your wellbeing score dipped this week. Block fifteen minutes today for something that recharges you."
        } else if prompt.contains("\"category\": \"risk_awareness\"") {
            "Thanks for sharing your concerns. Consider raising one of them with your manager this week."
        } else if prompt.contains("\"category\": \"engagement\"") {
            "We haven't heard from you in a while. A ten-second mood check-in helps you spot patterns."
        } else {
            "Thanks for checking in. What is one small thing that would make tomorrow easier?"
        };
        Ok(reply.to_string())
    }
}

/// Chat-completions client when an API key is configured, otherwise the offline generator.
pub(crate) fn build_generator(config: &GeneratorConfig) -> Arc<dyn TextGenerator> {
    if config.api_key.is_none() {
        info!("GENERATOR_API_KEY not set; using offline text generator");
        return Arc::new(OfflineGenerator);
    }

    match ChatCompletionsGenerator::from_config(config) {
        Ok(generator) => {
            info!(model = generator.model(), "using chat-completions text generator");
            Arc::new(generator)
        }
        Err(err) => {
            warn!(error = %err, "falling back to offline text generator");
            Arc::new(OfflineGenerator)
        }
    }
}

pub(crate) fn load_snapshot(path: &Path) -> Result<StoreSnapshot, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&raw)?;
    Ok(snapshot)
}

pub(crate) fn save_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<(), AppError> {
    let raw = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, raw)?;
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_mood(raw: &str) -> Result<Mood, String> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "very_sad" => Ok(Mood::VerySad),
        "sad" => Ok(Mood::Sad),
        "neutral" => Ok(Mood::Neutral),
        "happy" => Ok(Mood::Happy),
        "very_happy" => Ok(Mood::VeryHappy),
        other => Err(format!(
            "unknown mood '{other}' (expected very_sad, sad, neutral, happy, very_happy)"
        )),
    }
}

/// Noon UTC on `date`, or the current instant when no date is given.
pub(crate) fn instant_for(date: Option<NaiveDate>) -> chrono::DateTime<Utc> {
    match date {
        Some(day) => Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
            + chrono::Duration::hours(12),
        None => Utc::now(),
    }
}
