use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Mood, MoodSample, NudgeId, UserId, WeeklySurveyResponse};
use super::generator::TextGenerator;
use super::moodmeter::score_breakdown;
use super::repository::{RepositoryError, WellbeingStore};
use super::service::{WellbeingService, WellbeingServiceError};

const DEFAULT_NUDGE_LIMIT: usize = 5;
const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    #[serde(default)]
    pub survey: WeeklySurveyResponse,
    #[serde(default)]
    pub recent_moods: Vec<MoodSample>,
    #[serde(default)]
    pub check_in_count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckInRequest {
    pub mood: Mood,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoachRequest {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamOverviewQuery {
    pub admin_id: String,
}

type SharedService<S, G> = Arc<WellbeingService<S, G>>;

/// Router exposing check-ins, surveys, stats, nudges, coach chat, and the team overview.
pub fn wellbeing_router<S, G>(service: SharedService<S, G>) -> Router
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/moodmeter/score", post(score_handler))
        .route(
            "/api/v1/users/:user_id/check-ins",
            post(check_in_handler::<S, G>),
        )
        .route(
            "/api/v1/users/:user_id/weekly-survey",
            post(survey_handler::<S, G>),
        )
        .route("/api/v1/users/:user_id/stats", get(stats_handler::<S, G>))
        .route("/api/v1/users/:user_id/nudges", get(nudges_handler::<S, G>))
        .route(
            "/api/v1/users/:user_id/nudges/:nudge_id/read",
            post(mark_read_handler::<S, G>),
        )
        .route(
            "/api/v1/users/:user_id/nudges/:nudge_id",
            axum::routing::delete(delete_nudge_handler::<S, G>),
        )
        .route(
            "/api/v1/users/:user_id/coach",
            post(coach_handler::<S, G>).get(chat_history_handler::<S, G>),
        )
        .route("/api/v1/team/overview", get(team_overview_handler::<S, G>))
        .route("/api/v1/nudges/generate", post(generate_nudges_handler::<S, G>))
        .with_state(service)
}

pub(crate) async fn score_handler(Json(request): Json<ScoreRequest>) -> Response {
    let breakdown = score_breakdown(
        &request.survey,
        &request.recent_moods,
        request.check_in_count,
    );
    (StatusCode::OK, Json(breakdown)).into_response()
}

pub(crate) async fn check_in_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Path(user_id): Path<String>,
    Json(request): Json<CheckInRequest>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    let recorded_at = request.recorded_at.unwrap_or_else(Utc::now);
    match service.record_check_in(&UserId(user_id), request.mood, recorded_at) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn survey_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Path(user_id): Path<String>,
    Json(response): Json<WeeklySurveyResponse>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        service.submit_weekly_survey(&UserId(user_id), response, Utc::now())
    })
    .await;

    match outcome {
        Ok(Ok(record)) => (StatusCode::CREATED, Json(record)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(join) => worker_failure(join),
    }
}

pub(crate) async fn stats_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    match service.user_stats(&UserId(user_id), Utc::now()) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn nudges_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_NUDGE_LIMIT);
    match service.nudges(&UserId(user_id), limit) {
        Ok(nudges) => (StatusCode::OK, Json(nudges)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn mark_read_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Path((user_id, nudge_id)): Path<(String, String)>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    match service.mark_nudge_read(&UserId(user_id), &NudgeId(nudge_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_nudge_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Path((user_id, nudge_id)): Path<(String, String)>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    match service.delete_nudge(&UserId(user_id), &NudgeId(nudge_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn coach_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Path(user_id): Path<String>,
    Json(request): Json<CoachRequest>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        service.coach_reply(&UserId(user_id), &request.message, Utc::now())
    })
    .await;

    match outcome {
        Ok(Ok(reply)) => (StatusCode::OK, Json(reply)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(join) => worker_failure(join),
    }
}

pub(crate) async fn chat_history_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    match service.chat_history(&UserId(user_id), limit) {
        Ok(history) => (StatusCode::OK, Json(history)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn team_overview_handler<S, G>(
    State(service): State<SharedService<S, G>>,
    Query(query): Query<TeamOverviewQuery>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    match service.team_overview(&UserId(query.admin_id), Utc::now()) {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn generate_nudges_handler<S, G>(
    State(service): State<SharedService<S, G>>,
) -> Response
where
    S: WellbeingStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || service.generate_nudges(Utc::now())).await;

    match outcome {
        Ok(Ok(report)) => {
            let payload = json!({
                "message": report.message(),
                "nudges": report.created,
                "skipped_unread_cap": report.skipped_unread_cap,
                "not_triggered": report.not_triggered,
                "failures": report.failures,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(Err(err)) => error_response(err),
        Err(join) => worker_failure(join),
    }
}

fn error_response(err: WellbeingServiceError) -> Response {
    let status = match &err {
        WellbeingServiceError::UnknownUser(_)
        | WellbeingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        WellbeingServiceError::SurveyAlreadySubmitted { .. }
        | WellbeingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        WellbeingServiceError::NotPermitted => StatusCode::FORBIDDEN,
        WellbeingServiceError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
        WellbeingServiceError::Generation(_) => StatusCode::BAD_GATEWAY,
        WellbeingServiceError::Repository(RepositoryError::Unavailable(_))
        | WellbeingServiceError::Batch(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn worker_failure(err: tokio::task::JoinError) -> Response {
    tracing::error!(error = %err, "blocking task failed");
    let payload = json!({
        "error": "request could not be completed",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
