//! Nudges: short coaching messages generated when recent activity suggests a user
//! could use encouragement, support, or a reminder to check in.

mod analyzer;
mod batch;

pub use analyzer::{analyze, NudgeAnalysis, SurveySnapshot};
pub use batch::{
    BatchFailure, BatchStage, CreatedNudge, NudgeBatch, NudgeBatchError, NudgeBatchReport,
    CHECK_IN_WINDOW,
};
