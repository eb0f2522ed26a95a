//! Prompt text handed to the [`TextGenerator`](super::generator::TextGenerator).

use super::domain::{ChatRole, WeeklySurveyResponse};
use super::nudges::NudgeAnalysis;
use super::repository::ChatMessage;

/// Prompt asking for a short coaching message grounded in the analysis payload.
pub fn nudge_prompt(analysis: &NudgeAnalysis) -> String {
    let payload = match serde_json::to_string_pretty(analysis) {
        Ok(json) => json,
        Err(_) => analysis.rationale.clone(),
    };

    format!(
        "Generate a brief, supportive coaching message (2-3 sentences max) for an employee \
         based on this analysis:\n{payload}\n\n\
         The message should be:\n\
         - Encouraging and supportive\n\
         - Actionable with a specific suggestion\n\
         - Personal but professional\n\
         - Focused on wellbeing and growth\n\n\
         Generate only the message text, no explanations."
    )
}

/// Prompt asking for a manager-facing summary of a weekly survey.
pub fn survey_summary_prompt(response: &WeeklySurveyResponse) -> String {
    let payload = serde_json::to_string(response).unwrap_or_default();
    format!("Generate a brief summary of this weekly survey: {payload}")
}

/// Prompt for the next coach reply given the conversation so far, oldest first.
pub fn coach_prompt(history: &[ChatMessage]) -> String {
    let mut prompt = String::from(
        "You are a supportive workplace wellbeing coach. Reply to the employee's latest \
         message in a warm, practical tone and keep it under 120 words.\n\nConversation:\n",
    );

    for message in history {
        let speaker = match message.role {
            ChatRole::User => "Employee",
            ChatRole::Assistant => "Coach",
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(message.content.trim());
        prompt.push('\n');
    }

    prompt.push_str("Coach:");
    prompt
}
