use super::super::domain::{MoodSample, WeeklySurveyResponse};

pub(crate) const COMPONENT_LIMIT: f64 = 25.0;

pub(crate) const POSITIVE_KEYWORDS: [&str; 10] = [
    "good",
    "great",
    "excellent",
    "happy",
    "energetic",
    "productive",
    "well",
    "positive",
    "optimistic",
    "confident",
];

pub(crate) const NEGATIVE_KEYWORDS: [&str; 10] = [
    "bad",
    "poor",
    "tired",
    "stressed",
    "anxious",
    "overwhelmed",
    "difficult",
    "struggling",
    "worried",
    "exhausted",
];

pub(crate) const RISK_KEYWORDS: [&str; 10] = [
    "burnout",
    "conflict",
    "difficulty",
    "struggling",
    "overwhelmed",
    "anxious",
    "depressed",
    "stress",
    "exhausted",
    "crisis",
];

const KEYWORD_POINTS: i32 = 3;
const DETAIL_BONUS: i32 = 5;
const IMPROVING_TREND_BONUS: f64 = 5.0;

/// Number of keywords from `keywords` that appear anywhere in `text`.
/// Each keyword counts at most once, matching on substrings.
fn distinct_matches(text: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .count()
}

/// Keyword sentiment of the four descriptive survey answers, in [-25, 25].
pub(crate) fn sentiment_component(survey: &WeeklySurveyResponse) -> f64 {
    let text = format!(
        "{} {} {} {}",
        survey.mood, survey.wellbeing, survey.health, survey.productivity
    )
    .to_lowercase();

    let positive = distinct_matches(&text, &POSITIVE_KEYWORDS) as i32;
    let negative = distinct_matches(&text, &NEGATIVE_KEYWORDS) as i32;
    let mut raw = positive * KEYWORD_POINTS - negative * KEYWORD_POINTS;

    let length = text.chars().count();
    if length > 100 {
        raw += DETAIL_BONUS;
    }
    if length > 200 {
        raw += DETAIL_BONUS;
    }

    (raw as f64).clamp(-COMPONENT_LIMIT, COMPONENT_LIMIT)
}

/// Average mapped mood plus a bonus when the three latest samples never dip, in [-25, 25].
///
/// Samples may arrive in any order; they are put in chronological order before the
/// trend check so "latest three" always means the three most recent check-ins.
pub(crate) fn mood_history_component(recent: &[MoodSample]) -> f64 {
    if recent.is_empty() {
        return 0.0;
    }

    let mut ordered: Vec<&MoodSample> = recent.iter().collect();
    ordered.sort_by_key(|sample| sample.date);

    let total: i32 = ordered.iter().map(|sample| sample.mood.score_value()).sum();
    let mut value = total as f64 / ordered.len() as f64;

    if ordered.len() >= 3 {
        let latest = &ordered[ordered.len() - 3..];
        let improving = latest
            .windows(2)
            .all(|pair| pair[1].mood.score_value() >= pair[0].mood.score_value());
        if improving {
            value += IMPROVING_TREND_BONUS;
        }
    }

    value.clamp(-COMPONENT_LIMIT, COMPONENT_LIMIT)
}

/// Reward for showing up regularly, in [0, 25].
pub(crate) fn consistency_component(check_in_count: u32) -> f64 {
    match check_in_count {
        0 => 0.0,
        1..=2 => 5.0,
        3..=6 => 10.0,
        7..=13 => 15.0,
        14..=29 => 20.0,
        _ => 25.0,
    }
}

/// Penalty for risk vocabulary in the concerns answer, in [0, 25].
pub(crate) fn risk_penalty(risks: &str) -> f64 {
    if risks.trim().is_empty() {
        return 0.0;
    }

    match distinct_matches(&risks.to_lowercase(), &RISK_KEYWORDS) {
        0 => 0.0,
        1..=2 => 10.0,
        3..=4 => 15.0,
        _ => 25.0,
    }
}
