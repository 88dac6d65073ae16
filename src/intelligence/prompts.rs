//! Prompt builders for the completion endpoint.

/// System prompt for the chat assistant.
pub const CHAT_SYSTEM: &str = "You are a helpful assistant. Reply short and friendly.";

/// System prompt for task tips.
pub const TIP_SYSTEM: &str = "You are a helpful assistant. Give a short tip.";

/// System prompt for the monthly financial report.
pub const FINANCE_SYSTEM: &str =
    "You are a helpful financial assistant. Keep advice friendly and short.";

/// System prompt for day-plan advice.
pub const ADVICE_SYSTEM: &str = "You are a helpful assistant.";

/// Short tip requested when a task is created.
pub fn task_tip_prompt(title: &str, time: &str) -> String {
    format!("I have a task titled \"{title}\" at {time}. Give me a short helpful tip.")
}

/// Suggestion for the next upcoming task, optionally with weather context.
pub fn smart_advice_prompt(
    title: &str,
    day: &str,
    time: &str,
    weather: Option<(f64, &str)>,
) -> String {
    match weather {
        Some((temperature, clothing)) => format!(
            "My task is: {title}. Date: {day}, {time}. Weather: {temperature:.0}°C. {clothing} \
             Please provide a short, helpful suggestion."
        ),
        None => format!(
            "My task is: {title}. Date: {day}, {time}. \
             Please provide a short, helpful suggestion."
        ),
    }
}

/// Friendly tip over a month of ledger records.
pub fn monthly_report_prompt(earned: f64, spent: f64, records: &[String]) -> String {
    format!(
        "This month, I earned {earned}₸ and spent {spent}₸. Here are the records: {}. \
         Please give me a short and friendly financial tip.",
        records.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_tip_prompt() {
        let prompt = task_tip_prompt("Meeting", "09:00");
        assert_eq!(
            prompt,
            "I have a task titled \"Meeting\" at 09:00. Give me a short helpful tip."
        );
    }

    #[test]
    fn test_smart_advice_prompt_with_weather() {
        let prompt = smart_advice_prompt(
            "Meeting",
            "05.06.2025",
            "09:00",
            Some((21.6, "Wear a light jacket. It's a bit chilly.")),
        );
        assert!(prompt.contains("My task is: Meeting."));
        assert!(prompt.contains("Weather: 22°C."));
        assert!(prompt.contains("light jacket"));
    }

    #[test]
    fn test_smart_advice_prompt_without_weather() {
        let prompt = smart_advice_prompt("Meeting", "05.06.2025", "09:00", None);
        assert!(!prompt.contains("Weather:"));
        assert!(prompt.ends_with("Please provide a short, helpful suggestion."));
    }

    #[test]
    fn test_monthly_report_prompt() {
        let prompt = monthly_report_prompt(
            300000.0,
            42000.0,
            &["Monthly income +300000₸".to_string(), "Groceries - -42000₸".to_string()],
        );
        assert!(prompt.starts_with("This month, I earned 300000₸ and spent 42000₸."));
        assert!(prompt.contains("Monthly income +300000₸, Groceries - -42000₸"));
    }
}
