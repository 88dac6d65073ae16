//! AI-backed assistant flows: chat replies, task tips, day-plan advice, and
//! the monthly financial tip.
//!
//! Every flow shares one degradation rule: a failed completion yields a fixed
//! fallback string and a log line, never an error to the caller. The chat and
//! advice flows bridge Kazakh input through the translation endpoint.

pub mod client;
pub mod lang;
pub mod prompts;

pub use client::{ChatMessage, CompletionClient, CompletionProvider};
pub use lang::Lang;

use chrono::NaiveDateTime;

use crate::db::JarvisDb;
use crate::helpers::task_instant;
use crate::translate::TranslateClient;
use crate::weather::{clothing_advice, WeatherReport};

/// Reply when the chat completion fails.
pub const CHAT_FALLBACK: &str = "Sorry, no reply was found.";

/// Reminder body when the task-tip completion fails.
pub const TIP_FALLBACK: &str = "Reminder.";

/// Report tip when the financial completion fails.
pub const REPORT_FALLBACK: &str = "No financial tip is available right now.";

/// Advice when the suggestion completion fails.
pub const ADVICE_FALLBACK: &str = "No advice could be generated right now.";

/// Advice when the owner has no task still ahead of them.
pub const NO_UPCOMING_TASK: &str = "No upcoming task was found.";

/// Run a completion with Kazakh bridging.
///
/// Kazakh prompts are translated kk -> en before the request and the reply
/// en -> kk after. A failed translation falls back to the untranslated text;
/// only the completion itself can fail this function.
pub async fn bridged_completion(
    provider: &dyn CompletionProvider,
    translator: &TranslateClient,
    language: Lang,
    system: &str,
    prompt: &str,
) -> Result<String, String> {
    let bridged = if language == Lang::Kazakh {
        let translated = translator.translate(prompt, "kk", "en").await;
        if translated.is_empty() {
            prompt.to_string()
        } else {
            translated
        }
    } else {
        prompt.to_string()
    };

    let reply = provider
        .complete(&[ChatMessage::system(system), ChatMessage::user(bridged)])
        .await?;

    if language == Lang::Kazakh {
        let back = translator.translate(&reply, "en", "kk").await;
        if !back.is_empty() {
            return Ok(back);
        }
    }
    Ok(reply)
}

/// Answer a chat message and log the exchange.
pub async fn chat_reply(
    db: &JarvisDb,
    provider: &dyn CompletionProvider,
    translator: &TranslateClient,
    owner: &str,
    message: &str,
) -> String {
    let language = lang::detect(message);
    let reply = match bridged_completion(provider, translator, language, prompts::CHAT_SYSTEM, message)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            log::warn!("Chat completion for {} failed: {}", owner, e);
            CHAT_FALLBACK.to_string()
        }
    };

    if let Err(e) = db.insert_chat_entry(owner, message, &reply) {
        log::warn!("Failed to log chat exchange for {}: {}", owner, e);
    }

    reply
}

/// Short tip for a newly created task. Used as the body of the hour-before
/// reminder, so it always returns something.
pub async fn task_tip(provider: &dyn CompletionProvider, title: &str, time: &str) -> String {
    let messages = [
        ChatMessage::system(prompts::TIP_SYSTEM),
        ChatMessage::user(prompts::task_tip_prompt(title, time)),
    ];
    match provider.complete(&messages).await {
        Ok(tip) => tip,
        Err(e) => {
            log::warn!("Task tip completion failed: {}", e);
            TIP_FALLBACK.to_string()
        }
    }
}

/// Generate advice for the owner's next upcoming task and log it.
///
/// The prompt combines the task with current conditions when a weather
/// report is available; without one the suggestion is asked for the task
/// alone.
pub async fn smart_advice(
    db: &JarvisDb,
    provider: &dyn CompletionProvider,
    translator: &TranslateClient,
    owner: &str,
    weather: Option<&WeatherReport>,
    now: NaiveDateTime,
) -> String {
    let tasks = match db.list_tasks(owner) {
        Ok(tasks) => tasks,
        Err(e) => {
            log::warn!("Task query for advice failed for {}: {}", owner, e);
            Vec::new()
        }
    };

    let next = tasks
        .iter()
        .filter_map(|t| task_instant(&t.day, &t.time).map(|at| (at, t)))
        .filter(|(at, _)| *at > now)
        .min_by_key(|(at, _)| *at);

    let Some((_, task)) = next else {
        return NO_UPCOMING_TASK.to_string();
    };

    let weather_ctx = weather.map(|r| (r.temperature, clothing_advice(r.temperature)));
    let prompt = prompts::smart_advice_prompt(&task.title, &task.day, &task.time, weather_ctx);

    let language = lang::detect(&task.title);
    let advice =
        match bridged_completion(provider, translator, language, prompts::ADVICE_SYSTEM, &prompt)
            .await
        {
            Ok(advice) => advice,
            Err(e) => {
                log::warn!("Advice completion for {} failed: {}", owner, e);
                return ADVICE_FALLBACK.to_string();
            }
        };

    if let Err(e) = db.insert_advice(owner, &advice) {
        log::warn!("Failed to log advice for {}: {}", owner, e);
    }

    advice
}

/// Friendly tip over a month of ledger lines.
pub async fn financial_tip(
    provider: &dyn CompletionProvider,
    earned: f64,
    spent: f64,
    records: &[String],
) -> String {
    let messages = [
        ChatMessage::system(prompts::FINANCE_SYSTEM),
        ChatMessage::user(prompts::monthly_report_prompt(earned, spent, records)),
    ];
    match provider.complete(&messages).await {
        Ok(tip) => tip,
        Err(e) => {
            log::warn!("Financial tip completion failed: {}", e);
            REPORT_FALLBACK.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::db::tests::{sample_task, test_db};

    /// Scripted provider: returns a fixed reply or a fixed error.
    struct ScriptedProvider {
        reply: Result<String, String>,
    }

    impl ScriptedProvider {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("unreachable endpoint".to_string()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, String> {
            self.reply.clone()
        }
    }

    fn dead_translator() -> TranslateClient {
        // Connection-refused base: every translation fails fast and yields ""
        TranslateClient::new("http://127.0.0.1:1")
    }

    #[tokio::test]
    async fn test_chat_reply_logs_exchange() {
        let db = test_db();
        let provider = ScriptedProvider::ok("hi there");
        let reply = chat_reply(&db, &provider, &dead_translator(), "user-1", "hello").await;
        assert_eq!(reply, "hi there");

        let log = db.recent_chat("user-1", 10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].question, "hello");
        assert_eq!(log[0].reply, "hi there");
    }

    #[tokio::test]
    async fn test_chat_reply_falls_back_on_failure() {
        let db = test_db();
        let provider = ScriptedProvider::failing();
        let reply = chat_reply(&db, &provider, &dead_translator(), "user-1", "hello").await;
        assert_eq!(reply, CHAT_FALLBACK);

        // The failed exchange is still logged with the fallback reply
        let log = db.recent_chat("user-1", 10).unwrap();
        assert_eq!(log[0].reply, CHAT_FALLBACK);
    }

    #[tokio::test]
    async fn test_task_tip_fallback() {
        let provider = ScriptedProvider::failing();
        assert_eq!(task_tip(&provider, "Meeting", "09:00").await, TIP_FALLBACK);
    }

    #[tokio::test]
    async fn test_smart_advice_without_upcoming_task() {
        let db = test_db();
        let provider = ScriptedProvider::ok("unused");
        let now = NaiveDate::from_ymd_opt(2025, 6, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        // A task earlier the same day is not "upcoming"
        db.insert_task(&sample_task("user-1", "Standup", "05.06.2025", "09:00"))
            .unwrap();

        let advice =
            smart_advice(&db, &provider, &dead_translator(), "user-1", None, now).await;
        assert_eq!(advice, NO_UPCOMING_TASK);
    }

    #[tokio::test]
    async fn test_smart_advice_picks_earliest_upcoming_and_logs() {
        let db = test_db();
        let provider = ScriptedProvider::ok("Leave ten minutes early.");
        let now = NaiveDate::from_ymd_opt(2025, 6, 5)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        db.insert_task(&sample_task("user-1", "Dinner", "05.06.2025", "19:00"))
            .unwrap();
        db.insert_task(&sample_task("user-1", "Meeting", "05.06.2025", "09:00"))
            .unwrap();

        let advice =
            smart_advice(&db, &provider, &dead_translator(), "user-1", None, now).await;
        assert_eq!(advice, "Leave ten minutes early.");

        let log = db.recent_advice("user-1", 10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].text, "Leave ten minutes early.");
    }

    #[tokio::test]
    async fn test_financial_tip_fallback() {
        let provider = ScriptedProvider::failing();
        let tip = financial_tip(&provider, 300000.0, 42000.0, &[]).await;
        assert_eq!(tip, REPORT_FALLBACK);
    }
}
