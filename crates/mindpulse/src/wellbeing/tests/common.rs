use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::NudgeConfig;
use crate::wellbeing::domain::{Mood, NudgeId, UserId, UserProfile, UserRole};
use crate::wellbeing::generator::{GenerationError, TextGenerator};
use crate::wellbeing::repository::{
    ChatMessage, ChatStore, CheckInRecord, MoodStore, NudgeRecord, NudgeStore, ProfileStore,
    RepositoryError, SurveyRecord, SurveyStore,
};
use crate::wellbeing::service::WellbeingService;

/// Wednesday; the current week starts on 2026-10-12.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 15, 0, 0).unwrap()
}

pub(super) fn this_week() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 12).expect("valid date")
}

pub(super) fn employee(id: &str, name: Option<&str>) -> UserProfile {
    UserProfile {
        id: UserId(id.to_string()),
        email: format!("{id}@example.com"),
        name: name.map(str::to_string),
        role: UserRole::Employee,
    }
}

pub(super) fn admin(id: &str) -> UserProfile {
    UserProfile {
        role: UserRole::Admin,
        ..employee(id, Some("Morgan Admin"))
    }
}

#[derive(Default)]
struct Tables {
    profiles: Vec<UserProfile>,
    check_ins: Vec<CheckInRecord>,
    surveys: Vec<SurveyRecord>,
    nudges: Vec<NudgeRecord>,
    messages: Vec<ChatMessage>,
    broken_check_ins: Vec<UserId>,
    broken_nudge_writes: Vec<UserId>,
}

#[derive(Default)]
pub(super) struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub(super) fn with_profiles(profiles: Vec<UserProfile>) -> Self {
        let store = Self::default();
        store.tables.lock().expect("store mutex poisoned").profiles = profiles;
        store
    }

    /// Check-ins one day apart ending at [`now`], given oldest first.
    pub(super) fn seed_moods(&self, user: &str, moods: &[Mood]) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let count = moods.len() as i64;
        for (index, mood) in moods.iter().enumerate() {
            tables.check_ins.push(CheckInRecord {
                user_id: UserId(user.to_string()),
                mood: *mood,
                recorded_at: now() - Duration::days(count - 1 - index as i64),
            });
        }
    }

    pub(super) fn seed_unread_nudges(&self, user: &str, count: usize) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        for index in 0..count {
            tables.nudges.push(NudgeRecord {
                id: NudgeId(format!("seed-{user}-{index}")),
                user_id: UserId(user.to_string()),
                text: "Remember to stretch.".to_string(),
                category: crate::wellbeing::domain::NudgeCategory::General,
                read: false,
                created_at: now() - Duration::hours(index as i64 + 1),
            });
        }
    }

    /// Make check-in reads for `user` fail as if the table were unreachable.
    pub(super) fn break_check_ins_for(&self, user: &str) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables.broken_check_ins.push(UserId(user.to_string()));
    }

    /// Make nudge inserts for `user` fail.
    pub(super) fn break_nudge_writes_for(&self, user: &str) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables.broken_nudge_writes.push(UserId(user.to_string()));
    }

    pub(super) fn surveys(&self) -> Vec<SurveyRecord> {
        self.tables.lock().expect("store mutex poisoned").surveys.clone()
    }

    pub(super) fn all_nudges(&self) -> Vec<NudgeRecord> {
        self.tables.lock().expect("store mutex poisoned").nudges.clone()
    }

    pub(super) fn messages(&self) -> Vec<ChatMessage> {
        self.tables.lock().expect("store mutex poisoned").messages.clone()
    }
}

impl ProfileStore for MemoryStore {
    fn profiles(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        Ok(self.tables.lock().expect("store mutex poisoned").profiles.clone())
    }

    fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.profiles.iter().find(|profile| &profile.id == id).cloned())
    }
}

impl MoodStore for MemoryStore {
    fn append_check_in(&self, record: CheckInRecord) -> Result<(), RepositoryError> {
        self.tables
            .lock()
            .expect("store mutex poisoned")
            .check_ins
            .push(record);
        Ok(())
    }

    fn recent_check_ins(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<CheckInRecord>, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        if tables.broken_check_ins.contains(user_id) {
            return Err(RepositoryError::Unavailable("check-ins offline".to_string()));
        }
        let mut records: Vec<CheckInRecord> = tables
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
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .check_ins
            .iter()
            .filter(|record| &record.user_id == user_id)
            .count() as u32)
    }
}

impl SurveyStore for MemoryStore {
    fn insert_survey(&self, record: SurveyRecord) -> Result<SurveyRecord, RepositoryError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        if tables.surveys.iter().any(|existing| {
            existing.user_id == record.user_id && existing.week_start == record.week_start
        }) {
            return Err(RepositoryError::Conflict);
        }
        tables.surveys.push(record.clone());
        Ok(record)
    }

    fn survey_for_week(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> Result<Option<SurveyRecord>, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .surveys
            .iter()
            .find(|record| &record.user_id == user_id && record.week_start == week_start)
            .cloned())
    }
}

impl NudgeStore for MemoryStore {
    fn unread_nudge_count(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .nudges
            .iter()
            .filter(|nudge| &nudge.user_id == user_id && !nudge.read)
            .count())
    }

    fn insert_nudge(&self, record: NudgeRecord) -> Result<NudgeRecord, RepositoryError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        if tables.broken_nudge_writes.contains(&record.user_id) {
            return Err(RepositoryError::Unavailable("nudges offline".to_string()));
        }
        tables.nudges.push(record.clone());
        Ok(record)
    }

    fn nudges(&self, user_id: &UserId, limit: usize) -> Result<Vec<NudgeRecord>, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        let mut records: Vec<NudgeRecord> = tables
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
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let nudge = tables
            .nudges
            .iter_mut()
            .find(|nudge| &nudge.user_id == user_id && &nudge.id == id)
            .ok_or(RepositoryError::NotFound)?;
        nudge.read = true;
        Ok(())
    }

    fn delete_nudge(&self, user_id: &UserId, id: &NudgeId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let before = tables.nudges.len();
        tables
            .nudges
            .retain(|nudge| !(&nudge.user_id == user_id && &nudge.id == id));
        if tables.nudges.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl ChatStore for MemoryStore {
    fn append_message(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        self.tables
            .lock()
            .expect("store mutex poisoned")
            .messages
            .push(message);
        Ok(())
    }

    fn chat_history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        let messages: Vec<ChatMessage> = tables
            .messages
            .iter()
            .filter(|message| &message.user_id == user_id)
            .cloned()
            .collect();
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.into_iter().skip(skip).collect())
    }
}

/// Generator returning a fixed reply, or failing, while recording every prompt.
#[derive(Default)]
pub(super) struct ScriptedGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(super) fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing() -> Self {
        Self::default()
    }

    pub(super) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("generator mutex poisoned").clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .expect("generator mutex poisoned")
            .push(prompt.to_string());
        self.reply.clone().ok_or(GenerationError::Status {
            status: 503,
            body: "model overloaded".to_string(),
        })
    }
}

/// Store whose every call fails as if the database were down.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl ProfileStore for UnavailableStore {
    fn profiles(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        offline()
    }

    fn profile(&self, _id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        offline()
    }
}

impl MoodStore for UnavailableStore {
    fn append_check_in(&self, _record: CheckInRecord) -> Result<(), RepositoryError> {
        offline()
    }

    fn recent_check_ins(
        &self,
        _user_id: &UserId,
        _limit: usize,
    ) -> Result<Vec<CheckInRecord>, RepositoryError> {
        offline()
    }

    fn check_in_count(&self, _user_id: &UserId) -> Result<u32, RepositoryError> {
        offline()
    }
}

impl SurveyStore for UnavailableStore {
    fn insert_survey(&self, _record: SurveyRecord) -> Result<SurveyRecord, RepositoryError> {
        offline()
    }

    fn survey_for_week(
        &self,
        _user_id: &UserId,
        _week_start: NaiveDate,
    ) -> Result<Option<SurveyRecord>, RepositoryError> {
        offline()
    }
}

impl NudgeStore for UnavailableStore {
    fn unread_nudge_count(&self, _user_id: &UserId) -> Result<usize, RepositoryError> {
        offline()
    }

    fn insert_nudge(&self, _record: NudgeRecord) -> Result<NudgeRecord, RepositoryError> {
        offline()
    }

    fn nudges(
        &self,
        _user_id: &UserId,
        _limit: usize,
    ) -> Result<Vec<NudgeRecord>, RepositoryError> {
        offline()
    }

    fn mark_nudge_read(&self, _user_id: &UserId, _id: &NudgeId) -> Result<(), RepositoryError> {
        offline()
    }

    fn delete_nudge(&self, _user_id: &UserId, _id: &NudgeId) -> Result<(), RepositoryError> {
        offline()
    }
}

impl ChatStore for UnavailableStore {
    fn append_message(&self, _message: ChatMessage) -> Result<(), RepositoryError> {
        offline()
    }

    fn chat_history(
        &self,
        _user_id: &UserId,
        _limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        offline()
    }
}

pub(super) type TestService = WellbeingService<MemoryStore, ScriptedGenerator>;

pub(super) fn build_service(
    profiles: Vec<UserProfile>,
    generator: ScriptedGenerator,
) -> (TestService, Arc<MemoryStore>, Arc<ScriptedGenerator>) {
    let store = Arc::new(MemoryStore::with_profiles(profiles));
    let generator = Arc::new(generator);
    let service = WellbeingService::new(
        Arc::clone(&store),
        Arc::clone(&generator),
        NudgeConfig::default(),
    );
    (service, store, generator)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
