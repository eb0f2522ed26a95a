//! Employee wellbeing: mood check-ins, weekly surveys scored by the moodmeter,
//! generated nudges, coach chat, and the manager overview.

pub mod domain;
pub mod generator;
pub mod moodmeter;
pub mod nudges;
pub mod prompt;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    week_start, ChatRole, Mood, MoodSample, NudgeCategory, NudgeId, UserId, UserProfile,
    UserRole, WeeklySurveyResponse,
};
pub use generator::{ChatCompletionsGenerator, GenerationError, TextGenerator};
pub use moodmeter::{compute_score, score_breakdown, MoodmeterBreakdown, MoodmeterScore};
pub use nudges::{analyze, NudgeAnalysis, NudgeBatch, NudgeBatchError, NudgeBatchReport};
pub use repository::{
    ChatMessage, ChatStore, CheckInRecord, MoodStore, NudgeRecord, NudgeStore, ProfileStore,
    RepositoryError, SurveyRecord, SurveyStore, WellbeingStore,
};
pub use router::wellbeing_router;
pub use service::{TeamOverview, UserStats, WellbeingService, WellbeingServiceError};
