//! Reminder policy engine.
//!
//! Decides what to surface at each trigger point and composes the payload:
//!
//! - Evening summary: today's tasks; falls back to tomorrow's only when today
//!   is completely empty. The two days are never merged.
//! - Morning summary: today's tasks only, plus the weather line.
//! - Hour-before reminders: one-shot rows addressed exactly 60 minutes ahead
//!   of a task's due instant, drained by the scheduler loop.
//! - Weather alerts: immediate passthrough dispatch.
//!
//! A failed task query degrades to "no tasks found"; nothing on this path is
//! ever surfaced to the caller as an error.

use chrono::{Duration, NaiveDateTime, Utc};

use crate::db::{DbError, DbReminder, DbTask, JarvisDb};
use crate::helpers::task_instant;
use crate::notify::{NotificationMessage, Notifier};

/// Evening title when today still has tasks.
pub const TITLE_TODAY: &str = "Today's tasks";

/// Evening title after falling back to tomorrow.
pub const TITLE_TOMORROW: &str = "Tomorrow's tasks";

/// Morning summary title.
pub const TITLE_MORNING: &str = "Today's tasks and advice";

/// Weather alert title.
pub const TITLE_WEATHER_ALERT: &str = "Weather alert";

/// Body used when neither day has tasks.
pub const NO_TASKS_FOUND: &str = "No tasks found";

/// Empty-state line inside the morning summary.
pub const NO_TASKS_TODAY: &str = "No tasks for today";

/// Wall-clock minute key for reminder rows: `YYYY-MM-DDTHH:MM`.
pub fn minute_key(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M").to_string()
}

/// Render a task list as a notification body, one line per task.
pub fn format_task_lines(tasks: &[DbTask]) -> String {
    tasks
        .iter()
        .map(|t| format!("• {} ({})", t.title, t.time))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fetch a day's tasks, degrading a query failure to an empty list.
fn tasks_or_empty(db: &JarvisDb, owner: &str, day: &str) -> Vec<DbTask> {
    match db.tasks_for_day(owner, day) {
        Ok(tasks) => tasks,
        Err(e) => {
            log::warn!("Task query for {} on {} failed: {}", owner, day, e);
            Vec::new()
        }
    }
}

/// Evening selection: today's tasks, else tomorrow's, else the empty-state
/// message. Always prefers today; never merges the two days.
pub fn select_evening_summary(
    db: &JarvisDb,
    owner: &str,
    today: &str,
    tomorrow: &str,
) -> NotificationMessage {
    let today_tasks = tasks_or_empty(db, owner, today);
    if !today_tasks.is_empty() {
        return NotificationMessage {
            title: TITLE_TODAY.to_string(),
            body: format_task_lines(&today_tasks),
        };
    }

    let tomorrow_tasks = tasks_or_empty(db, owner, tomorrow);
    let body = if tomorrow_tasks.is_empty() {
        NO_TASKS_FOUND.to_string()
    } else {
        format_task_lines(&tomorrow_tasks)
    };

    NotificationMessage {
        title: TITLE_TOMORROW.to_string(),
        body,
    }
}

/// Morning selection: today's tasks only (no fallback), combined with the
/// weather summary when one is available.
pub fn select_morning_summary(
    db: &JarvisDb,
    owner: &str,
    today: &str,
    weather: Option<&str>,
) -> NotificationMessage {
    let tasks = tasks_or_empty(db, owner, today);
    let list = if tasks.is_empty() {
        NO_TASKS_TODAY.to_string()
    } else {
        format_task_lines(&tasks)
    };

    let body = match weather {
        Some(w) if !w.is_empty() => format!("{list}\n\nWeather: {w}"),
        _ => list,
    };

    NotificationMessage {
        title: TITLE_MORNING.to_string(),
        body,
    }
}

/// Trigger instant for a task reminder: due instant minus exactly one hour.
pub fn hour_before(due: NaiveDateTime) -> NaiveDateTime {
    due - Duration::minutes(60)
}

/// Enqueue the one-hour-before reminder for a task.
///
/// Repeated scheduling for the same task enqueues another row; the creation
/// flow carries no dedup key, so neither does this.
pub fn schedule_hour_before_reminder(
    db: &JarvisDb,
    task: &DbTask,
    tip: &str,
) -> Result<(), DbError> {
    let Some(due) = task_instant(&task.day, &task.time) else {
        log::warn!(
            "Task {} has unparseable schedule ({} {}); no reminder enqueued",
            task.id,
            task.day,
            task.time
        );
        return Ok(());
    };

    let reminder = DbReminder {
        id: uuid::Uuid::new_v4().to_string(),
        owner: task.owner.clone(),
        task_id: Some(task.id.clone()),
        title: format!("Starting in one hour: {}", task.title),
        body: tip.to_string(),
        fire_at: minute_key(hour_before(due)),
        sent_at: None,
        created_at: Utc::now().to_rfc3339(),
    };

    db.insert_reminder(&reminder)
}

/// Compose an immediate weather alert. No decision logic; passthrough.
pub fn weather_alert_message(message: &str) -> NotificationMessage {
    NotificationMessage {
        title: TITLE_WEATHER_ALERT.to_string(),
        body: message.to_string(),
    }
}

/// Send every unsent reminder whose fire minute has passed, marking each as
/// sent. Called from the scheduler loop each tick.
pub async fn dispatch_due_reminders(db: &JarvisDb, notifier: &Notifier, now_local: NaiveDateTime) {
    let due = match db.due_reminders(&minute_key(now_local)) {
        Ok(due) => due,
        Err(e) => {
            log::warn!("Due-reminder query failed: {}", e);
            return;
        }
    };

    for reminder in due {
        let profile = db.get_profile(&reminder.owner).ok().flatten();
        let message = NotificationMessage {
            title: reminder.title.clone(),
            body: reminder.body.clone(),
        };
        notifier.deliver(&reminder.owner, profile.as_ref(), &message).await;

        if let Err(e) = db.mark_reminder_sent(&reminder.id) {
            log::warn!("Failed to mark reminder {} sent: {}", reminder.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::db::tests::{sample_task, test_db};

    const TODAY: &str = "05.06.2025";
    const TOMORROW: &str = "06.06.2025";

    #[test]
    fn test_evening_prefers_today_even_when_tomorrow_has_tasks() {
        let db = test_db();
        db.insert_task(&sample_task("user-1", "Meeting", TODAY, "09:00")).unwrap();
        db.insert_task(&sample_task("user-1", "Dentist", TOMORROW, "11:00")).unwrap();

        let msg = select_evening_summary(&db, "user-1", TODAY, TOMORROW);
        assert_eq!(msg.title, TITLE_TODAY);
        assert_eq!(msg.body, "• Meeting (09:00)");
        assert!(
            !msg.body.contains("Dentist"),
            "evening summary must never merge tomorrow into today"
        );
    }

    #[test]
    fn test_evening_falls_back_to_tomorrow_when_today_empty() {
        let db = test_db();
        db.insert_task(&sample_task("user-1", "Dentist", TOMORROW, "11:00")).unwrap();

        let msg = select_evening_summary(&db, "user-1", TODAY, TOMORROW);
        assert_eq!(msg.title, TITLE_TOMORROW);
        assert_eq!(msg.body, "• Dentist (11:00)");
    }

    #[test]
    fn test_evening_with_both_days_empty_uses_fixed_body() {
        let db = test_db();
        let msg = select_evening_summary(&db, "user-1", TODAY, TOMORROW);
        assert_eq!(msg.body, NO_TASKS_FOUND);
        assert!(!msg.body.is_empty());
    }

    #[test]
    fn test_evening_ignores_other_owners() {
        let db = test_db();
        db.insert_task(&sample_task("user-2", "Meeting", TODAY, "09:00")).unwrap();

        let msg = select_evening_summary(&db, "user-1", TODAY, TOMORROW);
        assert_eq!(msg.body, NO_TASKS_FOUND);
    }

    #[test]
    fn test_task_line_formatting() {
        let tasks = vec![
            sample_task("user-1", "Meeting", TODAY, "09:00"),
            sample_task("user-1", "Lunch", TODAY, "13:30"),
        ];
        assert_eq!(format_task_lines(&tasks), "• Meeting (09:00)\n• Lunch (13:30)");
    }

    #[test]
    fn test_morning_combines_tasks_and_weather() {
        let db = test_db();
        db.insert_task(&sample_task("user-1", "Meeting", TODAY, "09:00")).unwrap();

        let msg = select_morning_summary(&db, "user-1", TODAY, Some("22.1°C, Clouds"));
        assert_eq!(msg.title, TITLE_MORNING);
        assert_eq!(msg.body, "• Meeting (09:00)\n\nWeather: 22.1°C, Clouds");
    }

    #[test]
    fn test_morning_has_no_fallback_to_tomorrow() {
        let db = test_db();
        db.insert_task(&sample_task("user-1", "Dentist", TOMORROW, "11:00")).unwrap();

        let msg = select_morning_summary(&db, "user-1", TODAY, None);
        assert_eq!(msg.body, NO_TASKS_TODAY);
    }

    #[test]
    fn test_morning_without_weather_omits_weather_line() {
        let db = test_db();
        db.insert_task(&sample_task("user-1", "Meeting", TODAY, "09:00")).unwrap();

        let msg = select_morning_summary(&db, "user-1", TODAY, None);
        assert_eq!(msg.body, "• Meeting (09:00)");

        let msg = select_morning_summary(&db, "user-1", TODAY, Some(""));
        assert_eq!(msg.body, "• Meeting (09:00)");
    }

    #[test]
    fn test_hour_before_is_exactly_sixty_minutes() {
        let due = NaiveDate::from_ymd_opt(2025, 6, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(minute_key(hour_before(due)), "2025-06-05T08:00");
    }

    #[test]
    fn test_hour_before_crosses_day_boundary() {
        let due = NaiveDate::from_ymd_opt(2025, 6, 5)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap();
        assert_eq!(minute_key(hour_before(due)), "2025-06-04T23:30");
    }

    #[test]
    fn test_schedule_hour_before_reminder_enqueues_row() {
        let db = test_db();
        let task = sample_task("user-1", "Meeting", TODAY, "09:00");
        schedule_hour_before_reminder(&db, &task, "Prepare the agenda.").unwrap();

        let due = db.due_reminders("2025-06-05T08:00").unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "Starting in one hour: Meeting");
        assert_eq!(due[0].body, "Prepare the agenda.");
        assert_eq!(due[0].fire_at, "2025-06-05T08:00");
        assert_eq!(due[0].task_id.as_deref(), Some(task.id.as_str()));

        // One minute earlier it is not yet due
        assert!(db.due_reminders("2025-06-05T07:59").unwrap().is_empty());
    }

    #[test]
    fn test_scheduling_twice_enqueues_twice() {
        // The creation flow has no dedup key; re-invocation schedules again.
        let db = test_db();
        let task = sample_task("user-1", "Meeting", TODAY, "09:00");
        schedule_hour_before_reminder(&db, &task, "tip").unwrap();
        schedule_hour_before_reminder(&db, &task, "tip").unwrap();
        assert_eq!(db.due_reminders("2025-06-05T08:00").unwrap().len(), 2);
    }

    #[test]
    fn test_unparseable_task_schedules_nothing() {
        let db = test_db();
        let task = sample_task("user-1", "Meeting", "not-a-day", "09:00");
        schedule_hour_before_reminder(&db, &task, "tip").unwrap();
        assert!(db.due_reminders("9999-12-31T23:59").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_marks_reminders_sent() {
        let db = test_db();
        let task = sample_task("user-1", "Meeting", TODAY, "09:00");
        schedule_hour_before_reminder(&db, &task, "tip").unwrap();

        let notifier = Notifier::new("http://127.0.0.1:1");
        let now = NaiveDate::from_ymd_opt(2025, 6, 5)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        dispatch_due_reminders(&db, &notifier, now).await;
        assert!(db.due_reminders("2025-06-05T08:00").unwrap().is_empty());

        // Re-dispatch finds nothing: delivery is once per row
        dispatch_due_reminders(&db, &notifier, now).await;
        assert!(db.due_reminders("2025-06-05T08:00").unwrap().is_empty());
    }

    #[test]
    fn test_weather_alert_is_passthrough() {
        let msg = weather_alert_message("Rain expected tomorrow. Bring an umbrella!");
        assert_eq!(msg.title, TITLE_WEATHER_ALERT);
        assert_eq!(msg.body, "Rain expected tomorrow. Bring an umbrella!");
    }
}
