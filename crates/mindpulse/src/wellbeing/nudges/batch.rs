use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::NudgeConfig;
use crate::wellbeing::domain::{
    week_start, MoodSample, NudgeCategory, NudgeId, UserId, UserProfile, UserRole,
};
use crate::wellbeing::generator::TextGenerator;
use crate::wellbeing::prompt::nudge_prompt;
use crate::wellbeing::repository::{NudgeRecord, RepositoryError, WellbeingStore};

use super::analyzer::{analyze, SurveySnapshot};

/// Number of recent check-ins the analyzer sees.
pub const CHECK_IN_WINDOW: usize = 7;

/// A nudge stored during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedNudge {
    pub user_id: UserId,
    pub nudge_id: NudgeId,
    pub text: String,
    pub category: NudgeCategory,
}

/// Step at which a user's processing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Read,
    Generation,
    Write,
}

/// A user the batch could not finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub user_id: UserId,
    pub stage: BatchStage,
    pub reason: String,
}

/// Result of one pass over all employees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NudgeBatchReport {
    pub generated_at: DateTime<Utc>,
    pub employees_scanned: usize,
    pub created: Vec<CreatedNudge>,
    pub skipped_unread_cap: Vec<UserId>,
    pub not_triggered: usize,
    pub failures: Vec<BatchFailure>,
}

impl NudgeBatchReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn message(&self) -> String {
        format!("Generated {} nudges", self.created_count())
    }
}

/// Only the profile listing can abort a run; everything else is recorded per user.
#[derive(Debug, thiserror::Error)]
pub enum NudgeBatchError {
    #[error("unable to list profiles: {0}")]
    Profiles(#[source] RepositoryError),
}

enum UserOutcome {
    Created(CreatedNudge),
    UnreadCapReached,
    NotTriggered,
}

/// Scans every employee and stores a generated nudge for those whose activity calls for one.
pub struct NudgeBatch<S: ?Sized, G: ?Sized> {
    store: Arc<S>,
    generator: Arc<G>,
    config: NudgeConfig,
}

impl<S, G> NudgeBatch<S, G>
where
    S: WellbeingStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    pub fn new(store: Arc<S>, generator: Arc<G>, config: NudgeConfig) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    pub fn run(&self) -> Result<NudgeBatchReport, NudgeBatchError> {
        self.run_on(Utc::now())
    }

    /// Run the batch as if the current time were `now`; it picks the survey week and
    /// timestamps new nudges.
    pub fn run_on(&self, now: DateTime<Utc>) -> Result<NudgeBatchReport, NudgeBatchError> {
        let employees: Vec<UserProfile> = self
            .store
            .profiles()
            .map_err(NudgeBatchError::Profiles)?
            .into_iter()
            .filter(|profile| profile.role == UserRole::Employee)
            .collect();

        let mut report = NudgeBatchReport {
            generated_at: now,
            employees_scanned: employees.len(),
            created: Vec::new(),
            skipped_unread_cap: Vec::new(),
            not_triggered: 0,
            failures: Vec::new(),
        };

        for profile in &employees {
            match self.process(&profile.id, now) {
                Ok(UserOutcome::Created(nudge)) => {
                    info!(
                        user_id = %nudge.user_id,
                        category = nudge.category.label(),
                        "nudge created"
                    );
                    report.created.push(nudge);
                }
                Ok(UserOutcome::UnreadCapReached) => {
                    report.skipped_unread_cap.push(profile.id.clone());
                }
                Ok(UserOutcome::NotTriggered) => report.not_triggered += 1,
                Err(failure) => {
                    warn!(
                        user_id = %failure.user_id,
                        stage = ?failure.stage,
                        reason = %failure.reason,
                        "nudge generation skipped"
                    );
                    report.failures.push(failure);
                }
            }
        }

        info!(
            employees = report.employees_scanned,
            created = report.created_count(),
            capped = report.skipped_unread_cap.len(),
            failures = report.failures.len(),
            "nudge batch finished"
        );

        Ok(report)
    }

    fn process(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<UserOutcome, BatchFailure> {
        let fail = |stage: BatchStage, reason: String| BatchFailure {
            user_id: user_id.clone(),
            stage,
            reason,
        };
        let read_failure = |err: RepositoryError| fail(BatchStage::Read, err.to_string());

        let unread = self.store.unread_nudge_count(user_id).map_err(read_failure)?;
        if unread >= self.config.unread_cap {
            return Ok(UserOutcome::UnreadCapReached);
        }

        let recent: Vec<MoodSample> = self
            .store
            .recent_check_ins(user_id, CHECK_IN_WINDOW)
            .map_err(read_failure)?
            .iter()
            .map(|record| record.sample())
            .collect();
        let survey = self
            .store
            .survey_for_week(user_id, week_start(now.date_naive()))
            .map_err(read_failure)?
            .as_ref()
            .map(SurveySnapshot::from);

        let analysis = analyze(&recent, survey.as_ref());
        if !analysis.trigger {
            return Ok(UserOutcome::NotTriggered);
        }

        let text = self
            .generator
            .generate(&nudge_prompt(&analysis))
            .map_err(|err| fail(BatchStage::Generation, err.to_string()))?;

        let stored = self
            .store
            .insert_nudge(NudgeRecord {
                id: NudgeId::generate(),
                user_id: user_id.clone(),
                text,
                category: analysis.category,
                read: false,
                created_at: now,
            })
            .map_err(|err| fail(BatchStage::Write, err.to_string()))?;

        Ok(UserOutcome::Created(CreatedNudge {
            user_id: stored.user_id,
            nudge_id: stored.id,
            text: stored.text,
            category: stored.category,
        }))
    }
}
