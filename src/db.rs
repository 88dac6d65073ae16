//! SQLite-based durable state for tasks, the finance ledger, and reminders.
//!
//! The database lives at `~/.jarvis/jarvis.db`. It replaces the hosted
//! document database of the mobile app with explicit request/response
//! queries: every engine evaluation reads a point-in-time snapshot, decides,
//! writes, and discards its working set.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),
}

/// A row from the `tasks` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTask {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    /// Day-key, `DD.MM.YYYY`.
    pub day: String,
    /// Time of day, `HH:MM`.
    pub time: String,
    pub created_at: String,
}

/// A row from the `monthly_income` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbIncomeConfig {
    pub owner: String,
    /// Month-key, `YYYY-MM`.
    pub month: String,
    pub amount: f64,
    /// Day of month the income arrives, 1-28.
    pub payday: u32,
    pub created_at: String,
}

/// A row from the `finance_records` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbFinanceRecord {
    pub id: String,
    pub owner: String,
    pub record_type: String,
    pub amount: f64,
    pub title: String,
    pub month: String,
    /// Calendar day the record was auto-posted on; NULL for manual entries.
    pub posted_day: Option<u32>,
    pub created_at: String,
}

/// A row from the `reminders` table (pending one-shot notifications).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbReminder {
    pub id: String,
    pub owner: String,
    pub task_id: Option<String>,
    pub title: String,
    pub body: String,
    /// Local wall-clock minute to deliver at, `YYYY-MM-DDTHH:MM`.
    pub fire_at: String,
    pub sent_at: Option<String>,
    pub created_at: String,
}

/// A row from the `profiles` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbProfile {
    pub owner: String,
    pub name: String,
    pub city: String,
    pub push_token: String,
    pub updated_at: String,
}

/// A row from the `advice_log` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAdvice {
    pub id: String,
    pub owner: String,
    pub text: String,
    pub created_at: String,
}

/// A row from the `chat_log` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbChatEntry {
    pub id: String,
    pub owner: String,
    pub question: String,
    pub reply: String,
    pub created_at: String,
}

/// SQLite connection wrapper.
///
/// Intentionally NOT `Clone` or `Sync`: connections are cheap to open, so
/// jobs and request handlers open one per evaluation instead of sharing.
pub struct JarvisDb {
    conn: Connection,
}

impl JarvisDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database at `~/.jarvis/jarvis.db` and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL improves concurrent reads from jobs and the HTTP layer
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        // Schema is idempotent (IF NOT EXISTS throughout)
        conn.execute_batch(include_str!("schema.sql"))?;

        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.jarvis/jarvis.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".jarvis").join("jarvis.db"))
    }

    /// All owners known to the service (profile, income config, or tasks).
    ///
    /// Recurring jobs iterate this set; there is no ambient current user.
    pub fn owners(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT owner FROM profiles
             UNION SELECT owner FROM monthly_income
             UNION SELECT owner FROM tasks
             ORDER BY owner",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut owners = Vec::new();
        for row in rows {
            owners.push(row?);
        }
        Ok(owners)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Insert a new task row.
    pub fn insert_task(&self, task: &DbTask) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO tasks (id, owner, title, description, day, time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id,
                task.owner,
                task.title,
                task.description,
                task.day,
                task.time,
                task.created_at
            ],
        )?;
        Ok(())
    }

    /// All tasks for an owner, newest first.
    pub fn list_tasks(&self, owner: &str) -> Result<Vec<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, title, description, day, time, created_at
             FROM tasks
             WHERE owner = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![owner], Self::task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Tasks for an owner on a specific day-key, newest first.
    pub fn tasks_for_day(&self, owner: &str, day: &str) -> Result<Vec<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, title, description, day, time, created_at
             FROM tasks
             WHERE owner = ?1 AND day = ?2
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![owner, day], Self::task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Get a single task by ID, scoped to its owner.
    pub fn get_task(&self, owner: &str, id: &str) -> Result<Option<DbTask>, DbError> {
        let task = self
            .conn
            .query_row(
                "SELECT id, owner, title, description, day, time, created_at
                 FROM tasks
                 WHERE owner = ?1 AND id = ?2",
                params![owner, id],
                Self::task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    /// Delete a task. Returns true if a row was removed.
    pub fn delete_task(&self, owner: &str, id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE owner = ?1 AND id = ?2",
            params![owner, id],
        )?;
        Ok(changed > 0)
    }

    fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbTask> {
        Ok(DbTask {
            id: row.get(0)?,
            owner: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            day: row.get(4)?,
            time: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    // =========================================================================
    // Monthly income config
    // =========================================================================

    /// Create or overwrite the income config for (owner, month).
    pub fn upsert_income_config(&self, config: &DbIncomeConfig) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO monthly_income (owner, month, amount, payday, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (owner, month) DO UPDATE SET
               amount = excluded.amount,
               payday = excluded.payday,
               created_at = excluded.created_at",
            params![
                config.owner,
                config.month,
                config.amount,
                config.payday,
                config.created_at
            ],
        )?;
        Ok(())
    }

    /// Income config for (owner, month), if declared.
    pub fn get_income_config(
        &self,
        owner: &str,
        month: &str,
    ) -> Result<Option<DbIncomeConfig>, DbError> {
        let config = self
            .conn
            .query_row(
                "SELECT owner, month, amount, payday, created_at
                 FROM monthly_income
                 WHERE owner = ?1 AND month = ?2",
                params![owner, month],
                |row| {
                    Ok(DbIncomeConfig {
                        owner: row.get(0)?,
                        month: row.get(1)?,
                        amount: row.get(2)?,
                        payday: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(config)
    }

    // =========================================================================
    // Finance ledger
    // =========================================================================

    /// Insert a manual ledger record (income or expense).
    pub fn insert_finance_record(&self, record: &DbFinanceRecord) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO finance_records
               (id, owner, record_type, amount, title, month, posted_day, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.owner,
                record.record_type,
                record.amount,
                record.title,
                record.month,
                record.posted_day,
                record.created_at
            ],
        )?;
        Ok(())
    }

    /// Atomically insert an auto-income record for (owner, month, day).
    ///
    /// Returns true if the row was inserted, false if one already existed for
    /// that calendar day. The partial unique index on
    /// (owner, month, posted_day) makes the check-and-insert a single
    /// statement, so concurrent evaluations cannot double-post.
    pub fn insert_auto_income(
        &self,
        owner: &str,
        month: &str,
        day: u32,
        amount: f64,
        title: &str,
    ) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO finance_records
               (id, owner, record_type, amount, title, month, posted_day, created_at)
             VALUES (?1, ?2, 'auto-income', ?3, ?4, ?5, ?6, ?7)",
            params![id, owner, amount, title, month, day, now],
        )?;
        Ok(changed > 0)
    }

    /// Ledger records for an owner, newest first, optionally scoped to a month.
    pub fn finance_records(
        &self,
        owner: &str,
        month: Option<&str>,
    ) -> Result<Vec<DbFinanceRecord>, DbError> {
        let mut records = Vec::new();

        match month {
            Some(month) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, owner, record_type, amount, title, month, posted_day, created_at
                     FROM finance_records
                     WHERE owner = ?1 AND month = ?2
                     ORDER BY created_at DESC",
                )?;
                let rows = stmt.query_map(params![owner, month], Self::finance_from_row)?;
                for row in rows {
                    records.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, owner, record_type, amount, title, month, posted_day, created_at
                     FROM finance_records
                     WHERE owner = ?1
                     ORDER BY created_at DESC",
                )?;
                let rows = stmt.query_map(params![owner], Self::finance_from_row)?;
                for row in rows {
                    records.push(row?);
                }
            }
        }

        Ok(records)
    }

    /// Delete a ledger record. Returns true if a row was removed.
    pub fn delete_finance_record(&self, owner: &str, id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM finance_records WHERE owner = ?1 AND id = ?2",
            params![owner, id],
        )?;
        Ok(changed > 0)
    }

    fn finance_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbFinanceRecord> {
        Ok(DbFinanceRecord {
            id: row.get(0)?,
            owner: row.get(1)?,
            record_type: row.get(2)?,
            amount: row.get(3)?,
            title: row.get(4)?,
            month: row.get(5)?,
            posted_day: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    // =========================================================================
    // Reminders
    // =========================================================================

    /// Enqueue a one-shot reminder addressed to a wall-clock minute.
    pub fn insert_reminder(&self, reminder: &DbReminder) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO reminders
               (id, owner, task_id, title, body, fire_at, sent_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                reminder.id,
                reminder.owner,
                reminder.task_id,
                reminder.title,
                reminder.body,
                reminder.fire_at,
                reminder.sent_at,
                reminder.created_at
            ],
        )?;
        Ok(())
    }

    /// Unsent reminders whose fire time is at or before `now_key`
    /// (`YYYY-MM-DDTHH:MM`; the format compares lexicographically).
    pub fn due_reminders(&self, now_key: &str) -> Result<Vec<DbReminder>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, task_id, title, body, fire_at, sent_at, created_at
             FROM reminders
             WHERE sent_at IS NULL AND fire_at <= ?1
             ORDER BY fire_at",
        )?;

        let rows = stmt.query_map(params![now_key], |row| {
            Ok(DbReminder {
                id: row.get(0)?,
                owner: row.get(1)?,
                task_id: row.get(2)?,
                title: row.get(3)?,
                body: row.get(4)?,
                fire_at: row.get(5)?,
                sent_at: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;

        let mut reminders = Vec::new();
        for row in rows {
            reminders.push(row?);
        }
        Ok(reminders)
    }

    /// Mark a reminder as delivered.
    pub fn mark_reminder_sent(&self, id: &str) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE reminders SET sent_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(())
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Create or overwrite an owner's profile.
    pub fn upsert_profile(&self, profile: &DbProfile) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO profiles (owner, name, city, push_token, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (owner) DO UPDATE SET
               name = excluded.name,
               city = excluded.city,
               push_token = excluded.push_token,
               updated_at = excluded.updated_at",
            params![
                profile.owner,
                profile.name,
                profile.city,
                profile.push_token,
                profile.updated_at
            ],
        )?;
        Ok(())
    }

    /// An owner's profile, if one has been saved.
    pub fn get_profile(&self, owner: &str) -> Result<Option<DbProfile>, DbError> {
        let profile = self
            .conn
            .query_row(
                "SELECT owner, name, city, push_token, updated_at
                 FROM profiles
                 WHERE owner = ?1",
                params![owner],
                |row| {
                    Ok(DbProfile {
                        owner: row.get(0)?,
                        name: row.get(1)?,
                        city: row.get(2)?,
                        push_token: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    // =========================================================================
    // Advice + chat logs
    // =========================================================================

    /// Append a generated advice entry.
    pub fn insert_advice(&self, owner: &str, text: &str) -> Result<DbAdvice, DbError> {
        let advice = DbAdvice {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            text: text.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.conn.execute(
            "INSERT INTO advice_log (id, owner, text, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![advice.id, advice.owner, advice.text, advice.created_at],
        )?;
        Ok(advice)
    }

    /// Most recent advice entries for an owner.
    pub fn recent_advice(&self, owner: &str, limit: u32) -> Result<Vec<DbAdvice>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, text, created_at
             FROM advice_log
             WHERE owner = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![owner, limit], |row| {
            Ok(DbAdvice {
                id: row.get(0)?,
                owner: row.get(1)?,
                text: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Append a chat exchange.
    pub fn insert_chat_entry(
        &self,
        owner: &str,
        question: &str,
        reply: &str,
    ) -> Result<DbChatEntry, DbError> {
        let entry = DbChatEntry {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            question: question.to_string(),
            reply: reply.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.conn.execute(
            "INSERT INTO chat_log (id, owner, question, reply, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.owner,
                entry.question,
                entry.reply,
                entry.created_at
            ],
        )?;
        Ok(entry)
    }

    /// Most recent chat exchanges for an owner.
    pub fn recent_chat(&self, owner: &str, limit: u32) -> Result<Vec<DbChatEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, question, reply, created_at
             FROM chat_log
             WHERE owner = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![owner, limit], |row| {
            Ok(DbChatEntry {
                id: row.get(0)?,
                owner: row.get(1)?,
                question: row.get(2)?,
                reply: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Create a temporary database for testing.
    ///
    /// We leak the `TempDir` so the directory persists for the duration of
    /// the test. Test temp dirs are cleaned up by the OS.
    pub(crate) fn test_db() -> JarvisDb {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("test_jarvis.db");
        std::mem::forget(dir);
        JarvisDb::open_at(path).expect("Failed to open test database")
    }

    pub(crate) fn sample_task(owner: &str, title: &str, day: &str, time: &str) -> DbTask {
        DbTask {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            title: title.to_string(),
            description: None,
            day: day.to_string(),
            time: time.to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_open_creates_tables() {
        let db = test_db();
        for table in ["tasks", "monthly_income", "finance_records", "reminders", "profiles"] {
            let count: i32 = db
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap_or_else(|_| panic!("{table} table should exist"));
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn test_task_round_trip() {
        let db = test_db();
        let task = sample_task("user-1", "Meeting", "05.06.2025", "09:00");
        db.insert_task(&task).expect("insert should succeed");

        let for_day = db.tasks_for_day("user-1", "05.06.2025").unwrap();
        assert_eq!(for_day.len(), 1);
        assert_eq!(for_day[0].title, "Meeting");

        // Other owners and other days see nothing
        assert!(db.tasks_for_day("user-2", "05.06.2025").unwrap().is_empty());
        assert!(db.tasks_for_day("user-1", "06.06.2025").unwrap().is_empty());

        assert!(db.delete_task("user-1", &task.id).unwrap());
        assert!(!db.delete_task("user-1", &task.id).unwrap());
    }

    #[test]
    fn test_income_config_upsert_overwrites() {
        let db = test_db();
        let mut config = DbIncomeConfig {
            owner: "user-1".to_string(),
            month: "2025-06".to_string(),
            amount: 300000.0,
            payday: 5,
            created_at: Utc::now().to_rfc3339(),
        };
        db.upsert_income_config(&config).unwrap();

        config.amount = 320000.0;
        config.payday = 10;
        db.upsert_income_config(&config).unwrap();

        let stored = db.get_income_config("user-1", "2025-06").unwrap().unwrap();
        assert_eq!(stored.amount, 320000.0);
        assert_eq!(stored.payday, 10);

        assert!(db.get_income_config("user-1", "2025-07").unwrap().is_none());
    }

    #[test]
    fn test_auto_income_inserts_once_per_day() {
        let db = test_db();

        let first = db
            .insert_auto_income("user-1", "2025-06", 5, 300000.0, "Monthly income")
            .unwrap();
        assert!(first, "first insert should post");

        let second = db
            .insert_auto_income("user-1", "2025-06", 5, 300000.0, "Monthly income")
            .unwrap();
        assert!(!second, "same-day insert must be ignored");

        let records = db.finance_records("user-1", Some("2025-06")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_type, "auto-income");
        assert_eq!(records[0].posted_day, Some(5));

        // A different day or owner is a separate slot
        assert!(db
            .insert_auto_income("user-1", "2025-06", 6, 300000.0, "Monthly income")
            .unwrap());
        assert!(db
            .insert_auto_income("user-2", "2025-06", 5, 150000.0, "Monthly income")
            .unwrap());
    }

    #[test]
    fn test_manual_records_do_not_collide_with_auto_income_slot() {
        let db = test_db();
        for i in 0..2 {
            let record = DbFinanceRecord {
                id: format!("rec-{i}"),
                owner: "user-1".to_string(),
                record_type: "expense".to_string(),
                amount: 1500.0,
                title: "Groceries".to_string(),
                month: "2025-06".to_string(),
                posted_day: None,
                created_at: Utc::now().to_rfc3339(),
            };
            db.insert_finance_record(&record).expect("manual inserts are unconstrained");
        }
        assert_eq!(db.finance_records("user-1", Some("2025-06")).unwrap().len(), 2);
    }

    #[test]
    fn test_due_reminders_ordering_and_sent_filter() {
        let db = test_db();
        let mk = |id: &str, fire_at: &str| DbReminder {
            id: id.to_string(),
            owner: "user-1".to_string(),
            task_id: None,
            title: "Starting in one hour: Meeting".to_string(),
            body: "Prepare the agenda.".to_string(),
            fire_at: fire_at.to_string(),
            sent_at: None,
            created_at: Utc::now().to_rfc3339(),
        };

        db.insert_reminder(&mk("r-late", "2025-06-05T08:00")).unwrap();
        db.insert_reminder(&mk("r-early", "2025-06-05T07:00")).unwrap();
        db.insert_reminder(&mk("r-future", "2025-06-05T23:00")).unwrap();

        let due = db.due_reminders("2025-06-05T08:00").unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].id, "r-early");
        assert_eq!(due[1].id, "r-late");

        db.mark_reminder_sent("r-early").unwrap();
        let due = db.due_reminders("2025-06-05T08:00").unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "r-late");
    }

    #[test]
    fn test_owners_union() {
        let db = test_db();
        db.insert_task(&sample_task("task-owner", "T", "01.01.2025", "10:00"))
            .unwrap();
        db.upsert_income_config(&DbIncomeConfig {
            owner: "income-owner".to_string(),
            month: "2025-01".to_string(),
            amount: 1000.0,
            payday: 1,
            created_at: Utc::now().to_rfc3339(),
        })
        .unwrap();
        db.upsert_profile(&DbProfile {
            owner: "profile-owner".to_string(),
            name: "A".to_string(),
            city: "Almaty".to_string(),
            push_token: String::new(),
            updated_at: Utc::now().to_rfc3339(),
        })
        .unwrap();

        let owners = db.owners().unwrap();
        assert_eq!(owners, vec!["income-owner", "profile-owner", "task-owner"]);
    }

    #[test]
    fn test_chat_and_advice_logs() {
        let db = test_db();
        db.insert_chat_entry("user-1", "hello", "hi there").unwrap();
        db.insert_advice("user-1", "Bring an umbrella.").unwrap();

        let chat = db.recent_chat("user-1", 10).unwrap();
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].reply, "hi there");

        let advice = db.recent_advice("user-1", 10).unwrap();
        assert_eq!(advice.len(), 1);
        assert_eq!(advice[0].text, "Bring an umbrella.");
    }
}
