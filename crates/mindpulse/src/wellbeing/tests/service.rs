use super::common::*;
use chrono::Duration;

use crate::wellbeing::domain::{ChatRole, Mood, NudgeId, UserId, WeeklySurveyResponse};
use crate::wellbeing::repository::RepositoryError;
use crate::wellbeing::service::{WellbeingServiceError, MOOD_TREND_POINTS};

fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

#[test]
fn survey_submission_stores_score_and_summary() {
    let (service, store, generator) = build_service(
        vec![employee("u-1", Some("Riley"))],
        ScriptedGenerator::replying("Riley had a steady week."),
    );
    store.seed_moods("u-1", &[Mood::VeryHappy, Mood::VeryHappy, Mood::VeryHappy]);

    let record = service
        .submit_weekly_survey(&user("u-1"), WeeklySurveyResponse::default(), now())
        .expect("survey accepted");

    // history 25 * 0.3 + consistency 10 * 0.2 on top of 50
    assert_eq!(record.moodmeter_score.map(|score| score.value()), Some(60));
    assert_eq!(record.week_start, this_week());
    assert_eq!(record.ai_summary.as_deref(), Some("Riley had a steady week."));
    assert_eq!(store.surveys().len(), 1);

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("Generate a brief summary of this weekly survey"));
}

#[test]
fn second_survey_in_the_same_week_is_rejected() {
    let (service, store, generator) = build_service(
        vec![employee("u-1", None)],
        ScriptedGenerator::replying("summary"),
    );

    service
        .submit_weekly_survey(&user("u-1"), WeeklySurveyResponse::default(), now())
        .expect("first survey accepted");

    let later_that_week = now() + Duration::days(3);
    let err = service
        .submit_weekly_survey(&user("u-1"), WeeklySurveyResponse::default(), later_that_week)
        .expect_err("duplicate rejected");

    assert!(matches!(
        err,
        WellbeingServiceError::SurveyAlreadySubmitted { week_start } if week_start == this_week()
    ));
    assert_eq!(store.surveys().len(), 1);
    assert_eq!(generator.prompts().len(), 1);
}

#[test]
fn survey_is_kept_when_summary_generation_fails() {
    let (service, store, _) =
        build_service(vec![employee("u-1", None)], ScriptedGenerator::failing());

    let record = service
        .submit_weekly_survey(&user("u-1"), WeeklySurveyResponse::default(), now())
        .expect("survey accepted without summary");

    assert!(record.ai_summary.is_none());
    assert_eq!(record.moodmeter_score.map(|score| score.value()), Some(50));
    assert_eq!(store.surveys().len(), 1);
}

#[test]
fn unknown_users_cannot_check_in() {
    let (service, _, _) = build_service(Vec::new(), ScriptedGenerator::failing());

    let err = service
        .record_check_in(&user("ghost"), Mood::Happy, now())
        .expect_err("unknown user");
    assert!(matches!(err, WellbeingServiceError::UnknownUser(id) if id.0 == "ghost"));
}

#[test]
fn stats_report_recent_trend_in_chronological_order() {
    let (service, store, _) =
        build_service(vec![employee("u-1", None)], ScriptedGenerator::failing());

    let mut moods = vec![Mood::VerySad, Mood::VerySad];
    moods.extend([Mood::Neutral; 13]);
    moods.push(Mood::VeryHappy);
    store.seed_moods("u-1", &moods);

    let stats = service.user_stats(&user("u-1"), now()).expect("stats");

    assert_eq!(stats.check_in_total, 16);
    assert!(!stats.weekly_survey_completed);
    assert_eq!(stats.recent_mood, Some(Mood::VeryHappy));
    assert_eq!(stats.mood_trend.len(), MOOD_TREND_POINTS);
    assert!(stats.mood_trend.iter().all(|point| point.mood != Mood::VerySad));
    assert_eq!(stats.mood_trend.first().map(|point| point.value), Some(3));
    assert_eq!(stats.mood_trend.last().map(|point| point.value), Some(5));
    assert!(stats
        .mood_trend
        .windows(2)
        .all(|pair| pair[0].date < pair[1].date));
}

#[test]
fn coach_reply_stores_both_sides_of_the_conversation() {
    let (service, store, generator) = build_service(
        vec![employee("u-1", None)],
        ScriptedGenerator::replying("Try blocking an hour for focus work."),
    );

    let reply = service
        .coach_reply(&user("u-1"), "  Too many meetings this week ", now())
        .expect("reply");

    assert_eq!(reply.role, ChatRole::Assistant);
    let messages = store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "Too many meetings this week");
    assert_eq!(messages[1].content, "Try blocking an hour for focus work.");
    assert!(generator.prompts()[0].contains("Employee: Too many meetings this week"));
}

#[test]
fn blank_coach_message_is_rejected_before_storage() {
    let (service, store, generator) = build_service(
        vec![employee("u-1", None)],
        ScriptedGenerator::replying("unused"),
    );

    let err = service
        .coach_reply(&user("u-1"), "   ", now())
        .expect_err("empty message");

    assert!(matches!(err, WellbeingServiceError::EmptyMessage));
    assert!(store.messages().is_empty());
    assert!(generator.prompts().is_empty());
}

#[test]
fn failed_coach_reply_keeps_the_user_message() {
    let (service, store, _) =
        build_service(vec![employee("u-1", None)], ScriptedGenerator::failing());

    let err = service
        .coach_reply(&user("u-1"), "Hello?", now())
        .expect_err("generation fails");

    assert!(matches!(err, WellbeingServiceError::Generation(_)));
    let messages = store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, ChatRole::User);
}

#[test]
fn team_overview_summarizes_everyone_but_the_admin() {
    let (service, _, _) = build_service(
        vec![
            admin("boss"),
            employee("u-1", Some("Riley")),
            employee("u-2", None),
        ],
        ScriptedGenerator::replying("Feeling settled."),
    );
    service
        .submit_weekly_survey(&user("u-1"), WeeklySurveyResponse::default(), now())
        .expect("survey accepted");

    let overview = service.team_overview(&user("boss"), now()).expect("overview");

    assert_eq!(overview.week_start, this_week());
    assert_eq!(overview.members.len(), 2);
    assert_eq!(overview.completed, 1);
    assert!((overview.completion_rate - 0.5).abs() < f64::EPSILON);
    assert_eq!(overview.average_score, Some(50.0));

    let riley = &overview.members[0];
    assert_eq!(riley.display_name, "Riley");
    assert_eq!(riley.ai_summary.as_deref(), Some("Feeling settled."));

    let unnamed = &overview.members[1];
    assert_eq!(unnamed.display_name, "u-2");
    assert!(!unnamed.survey_completed);
    assert!(unnamed.moodmeter_score.is_none());
}

#[test]
fn team_overview_requires_admin_role() {
    let (service, _, _) = build_service(
        vec![employee("u-1", None), employee("u-2", None)],
        ScriptedGenerator::failing(),
    );

    let err = service
        .team_overview(&user("u-1"), now())
        .expect_err("not permitted");
    assert!(matches!(err, WellbeingServiceError::NotPermitted));
}

#[test]
fn nudges_are_scoped_to_their_owner() {
    let (service, store, _) = build_service(
        vec![employee("u-1", None), employee("u-2", None)],
        ScriptedGenerator::failing(),
    );
    store.seed_unread_nudges("u-1", 2);
    let nudge = NudgeId("seed-u-1-0".to_string());

    let err = service
        .mark_nudge_read(&user("u-2"), &nudge)
        .expect_err("other user's nudge");
    assert!(matches!(
        err,
        WellbeingServiceError::Repository(RepositoryError::NotFound)
    ));

    service
        .mark_nudge_read(&user("u-1"), &nudge)
        .expect("owner marks read");
    let listed = service.nudges(&user("u-1"), 5).expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, nudge);
    assert!(listed[0].read);

    service.delete_nudge(&user("u-1"), &nudge).expect("delete");
    assert_eq!(store.all_nudges().len(), 1);
}
