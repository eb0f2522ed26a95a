use crate::infra::{
    build_generator, instant_for, load_snapshot, parse_date, parse_mood, save_snapshot,
    InMemoryWellbeingStore, OfflineGenerator,
};
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use mindpulse::config::{AppConfig, NudgeConfig};
use mindpulse::error::AppError;
use mindpulse::telemetry;
use mindpulse::wellbeing::{
    score_breakdown, Mood, MoodSample, MoodmeterBreakdown, NudgeBatch, NudgeBatchReport,
    UserId, UserProfile, UserRole, WeeklySurveyResponse, WellbeingService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    /// JSON file holding the weekly survey answers; omitted answers are treated as blank
    #[arg(long)]
    pub(crate) survey: Option<PathBuf>,
    /// Recent moods, oldest first, comma separated (e.g. sad,neutral,happy)
    #[arg(long, value_delimiter = ',', value_parser = parse_mood)]
    pub(crate) moods: Vec<Mood>,
    /// Total check-ins for the user (defaults to the number of moods given)
    #[arg(long)]
    pub(crate) check_ins: Option<u32>,
    /// Print the breakdown as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct NudgeRunArgs {
    /// JSON store snapshot with profiles, check-ins, surveys, and nudges
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Run as of this date (YYYY-MM-DD) instead of now
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Write created nudges back into the snapshot file
    #[arg(long)]
    pub(crate) save: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Run the demo as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        survey,
        moods,
        check_ins,
        json,
    } = args;

    let survey = match survey {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => WeeklySurveyResponse::default(),
    };
    let samples = samples_ending_now(&moods);
    let check_ins = check_ins.unwrap_or(moods.len() as u32);

    let breakdown = score_breakdown(&survey, &samples, check_ins);
    if json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        render_breakdown(&breakdown);
    }
    Ok(())
}

pub(crate) fn run_nudge_batch(args: NudgeRunArgs) -> Result<(), AppError> {
    let NudgeRunArgs { data, today, save } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let store = InMemoryWellbeingStore::from_snapshot(load_snapshot(&data)?);
    let generator = build_generator(&config.generator);
    let batch = NudgeBatch::new(Arc::new(store.clone()), generator, config.nudges);

    let report = batch.run_on(instant_for(today))?;
    render_report(&report);

    if save {
        save_snapshot(&data, &store.snapshot())?;
        println!("Snapshot updated: {}", data.display());
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = instant_for(args.today);
    let store = Arc::new(InMemoryWellbeingStore::default());
    for profile in demo_team() {
        store.add_profile(profile);
    }
    let service = WellbeingService::new(
        Arc::clone(&store),
        Arc::new(OfflineGenerator),
        NudgeConfig::default(),
    );

    println!("MindPulse demo ({})", now.date_naive());

    let week: [(&str, &[Mood]); 3] = [
        ("avery", &[Mood::Happy, Mood::Neutral, Mood::Sad, Mood::VerySad]),
        ("blake", &[Mood::Neutral, Mood::Happy, Mood::Happy, Mood::VeryHappy]),
        ("casey", &[]),
    ];
    println!("\nCheck-ins");
    for (user, moods) in week {
        let user_id = UserId(user.to_string());
        for (index, mood) in moods.iter().enumerate() {
            let at = now - Duration::days((moods.len() - index) as i64);
            service.record_check_in(&user_id, *mood, at)?;
        }
        let trail: Vec<&str> = moods.iter().map(|mood| mood.emoji()).collect();
        let trail = if trail.is_empty() {
            "none".to_string()
        } else {
            trail.join(" ")
        };
        println!("- {user}: {trail}");
    }

    println!("\nWeekly surveys");
    let surveys = [
        (
            "avery",
            WeeklySurveyResponse {
                mood: "Tired and a bit anxious".to_string(),
                wellbeing: "Struggling to switch off in the evenings".to_string(),
                health: "Poor sleep".to_string(),
                productivity: "Overwhelmed by the release backlog".to_string(),
                risks: "Close to burnout; constant stress from on-call and a conflict in the team"
                    .to_string(),
                ..WeeklySurveyResponse::default()
            },
        ),
        (
            "blake",
            WeeklySurveyResponse {
                mood: "Great, energetic".to_string(),
                wellbeing: "Feeling positive".to_string(),
                health: "Good".to_string(),
                productivity: "Very productive sprint".to_string(),
                ..WeeklySurveyResponse::default()
            },
        ),
    ];
    for (user, response) in surveys {
        let record = service.submit_weekly_survey(&UserId(user.to_string()), response, now)?;
        let score = record
            .moodmeter_score
            .map(|score| score.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        println!("- {user}: moodmeter {score}");
    }

    println!("\nNudge batch");
    let report = service.generate_nudges(now)?;
    render_report(&report);

    println!("\nCoach");
    let casey = UserId("casey".to_string());
    let reply = service.coach_reply(&casey, "I keep forgetting to check in.", now)?;
    println!("- casey: I keep forgetting to check in.");
    println!("- coach: {}", reply.content);

    println!("\nTeam overview");
    let overview = service.team_overview(&UserId("lead".to_string()), now)?;
    println!(
        "Week of {}: {}/{} surveys ({:.0}%)",
        overview.week_start,
        overview.completed,
        overview.members.len(),
        overview.completion_rate * 100.0
    );
    if let Some(average) = overview.average_score {
        println!("Average moodmeter: {average:.1}");
    }
    for member in &overview.members {
        let status = match member.moodmeter_score {
            Some(score) => format!("completed, {score}"),
            None => "pending".to_string(),
        };
        println!("- {} <{}>: {}", member.display_name, member.email, status);
    }

    Ok(())
}

fn demo_team() -> Vec<UserProfile> {
    let profile = |id: &str, name: Option<&str>, role| UserProfile {
        id: UserId(id.to_string()),
        email: format!("{id}@mindpulse.example"),
        name: name.map(str::to_string),
        role,
    };
    vec![
        profile("lead", Some("Jordan Reyes"), UserRole::Admin),
        profile("avery", Some("Avery Chen"), UserRole::Employee),
        profile("blake", Some("Blake Okafor"), UserRole::Employee),
        profile("casey", None, UserRole::Employee),
    ]
}

/// Oldest-first moods laid out one per day, the last one yesterday.
fn samples_ending_now(moods: &[Mood]) -> Vec<MoodSample> {
    let now = Utc::now();
    moods
        .iter()
        .enumerate()
        .map(|(index, mood)| MoodSample {
            mood: *mood,
            date: now - Duration::days((moods.len() - index) as i64),
        })
        .collect()
}

fn render_breakdown(breakdown: &MoodmeterBreakdown) {
    println!(
        "Moodmeter score: {} (unrounded {:.2})",
        breakdown.score, breakdown.unrounded
    );
    for component in &breakdown.components {
        println!(
            "- {:?}: raw {:.1} x {:.0}% -> {:+.2}",
            component.factor,
            component.raw,
            component.weight * 100.0,
            component.contribution
        );
    }
}

fn render_report(report: &NudgeBatchReport) {
    println!(
        "{} ({} employees scanned, {} not triggered, {} at unread cap, {} failed)",
        report.message(),
        report.employees_scanned,
        report.not_triggered,
        report.skipped_unread_cap.len(),
        report.failures.len()
    );
    for nudge in &report.created {
        println!(
            "- [{}] {}: {}",
            nudge.category.label(),
            nudge.user_id,
            nudge.text
        );
    }
    for failure in &report.failures {
        println!(
            "- failed {} at {:?}: {}",
            failure.user_id, failure.stage, failure.reason
        );
    }
}
