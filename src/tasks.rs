//! Task service: validation, creation, and the creation-time reminder flow.
//!
//! Creating a task also asks the completion endpoint for a short tip and
//! enqueues the one-hour-before reminder with that tip as its body. Both
//! steps are best-effort: a failed tip falls back to a fixed string and a
//! failed enqueue is logged, so task creation itself only fails on invalid
//! input or a storage fault.

use chrono::Utc;
use serde::Deserialize;

use crate::db::{DbTask, JarvisDb};
use crate::helpers::{parse_day_key, parse_time};
use crate::intelligence::{self, CompletionProvider};
use crate::reminders;

/// Input for task creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Day-key, `DD.MM.YYYY`.
    pub day: String,
    /// Time of day, `HH:MM`.
    pub time: String,
}

/// Validate and store a new task.
pub fn create_task(db: &JarvisDb, owner: &str, new: &NewTask) -> Result<DbTask, String> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }
    if parse_day_key(&new.day).is_none() {
        return Err(format!("Day must be DD.MM.YYYY, got '{}'", new.day));
    }
    if parse_time(&new.time).is_none() {
        return Err(format!("Time must be HH:MM, got '{}'", new.time));
    }

    let task = DbTask {
        id: uuid::Uuid::new_v4().to_string(),
        owner: owner.to_string(),
        title: title.to_string(),
        description: new
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from),
        day: new.day.clone(),
        time: new.time.clone(),
        created_at: Utc::now().to_rfc3339(),
    };

    db.insert_task(&task).map_err(|e| e.to_string())?;
    Ok(task)
}

/// Create a task, then request its tip and enqueue the hour-before reminder.
pub async fn create_task_with_reminder(
    db: &JarvisDb,
    provider: &dyn CompletionProvider,
    owner: &str,
    new: &NewTask,
) -> Result<DbTask, String> {
    let task = create_task(db, owner, new)?;

    let tip = intelligence::task_tip(provider, &task.title, &task.time).await;
    if let Err(e) = reminders::schedule_hour_before_reminder(db, &task, &tip) {
        log::warn!("Failed to enqueue reminder for task {}: {}", task.id, e);
    }

    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::db::tests::test_db;
    use crate::intelligence::ChatMessage;

    struct FailingProvider;

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, String> {
            Err("down".to_string())
        }
    }

    fn new_task(title: &str, day: &str, time: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            day: day.to_string(),
            time: time.to_string(),
        }
    }

    #[test]
    fn test_create_task_validates_input() {
        let db = test_db();
        assert!(create_task(&db, "user-1", &new_task("", "05.06.2025", "09:00")).is_err());
        assert!(create_task(&db, "user-1", &new_task("Meeting", "2025-06-05", "09:00")).is_err());
        assert!(create_task(&db, "user-1", &new_task("Meeting", "05.06.2025", "9am")).is_err());

        let task = create_task(&db, "user-1", &new_task("  Meeting  ", "05.06.2025", "09:00"))
            .expect("valid task should be created");
        assert_eq!(task.title, "Meeting");
        assert_eq!(db.tasks_for_day("user-1", "05.06.2025").unwrap().len(), 1);
    }

    #[test]
    fn test_blank_description_is_dropped() {
        let db = test_db();
        let mut new = new_task("Meeting", "05.06.2025", "09:00");
        new.description = Some("   ".to_string());
        let task = create_task(&db, "user-1", &new).unwrap();
        assert_eq!(task.description, None);
    }

    #[tokio::test]
    async fn test_creation_enqueues_reminder_with_fallback_tip() {
        let db = test_db();
        let task = create_task_with_reminder(
            &db,
            &FailingProvider,
            "user-1",
            &new_task("Meeting", "05.06.2025", "09:00"),
        )
        .await
        .expect("creation should survive a failing tip provider");

        let due = db.due_reminders("2025-06-05T08:00").unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].body, intelligence::TIP_FALLBACK);
        assert_eq!(due[0].task_id.as_deref(), Some(task.id.as_str()));
    }
}
