use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::types::{Config, ExecutionRecord, ExecutionTrigger, JobId, JobStatus};

/// Maximum number of execution records to keep in memory
const MAX_HISTORY_SIZE: usize = 100;

/// Shared application state
pub struct AppState {
    pub config: RwLock<Config>,
    pub job_status: Mutex<HashMap<JobId, JobStatus>>,
    pub execution_history: Mutex<Vec<ExecutionRecord>>,
    pub last_scheduled_run: Mutex<HashMap<JobId, DateTime<Utc>>>,
}

impl AppState {
    pub fn new() -> Self {
        let config = match load_config() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using default configuration", e);
                Config::default()
            }
        };
        let history = load_execution_history().unwrap_or_default();

        Self {
            config: RwLock::new(config),
            job_status: Mutex::new(HashMap::new()),
            execution_history: Mutex::new(history),
            last_scheduled_run: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot the current configuration.
    pub fn config(&self) -> Config {
        self.config
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Resolve the service timezone, falling back to UTC on a bad value.
    pub fn service_tz(&self) -> Tz {
        let tz_name = self.config().timezone;
        tz_name.parse().unwrap_or_else(|_| {
            log::warn!("Invalid timezone '{}'; falling back to UTC", tz_name);
            Tz::UTC
        })
    }

    /// Get current status of a job
    pub fn get_job_status(&self, job: JobId) -> JobStatus {
        self.job_status
            .lock()
            .map(|guard| guard.get(&job).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Update job status
    pub fn set_job_status(&self, job: JobId, status: JobStatus) {
        if let Ok(mut guard) = self.job_status.lock() {
            guard.insert(job, status);
        }
    }

    /// Add an execution record to history
    pub fn add_execution_record(&self, record: ExecutionRecord) {
        if let Ok(mut guard) = self.execution_history.lock() {
            guard.insert(0, record);

            // Trim to max size
            if guard.len() > MAX_HISTORY_SIZE {
                guard.truncate(MAX_HISTORY_SIZE);
            }
        }

        // Persist to disk (fire and forget)
        let _ = self.save_execution_history();
    }

    /// Update an existing execution record
    pub fn update_execution_record(&self, id: &str, f: impl FnOnce(&mut ExecutionRecord)) {
        if let Ok(mut guard) = self.execution_history.lock() {
            if let Some(record) = guard.iter_mut().find(|r| r.id == id) {
                f(record);
            }
        }

        let _ = self.save_execution_history();
    }

    /// Get execution history
    pub fn get_execution_history(&self, limit: usize) -> Vec<ExecutionRecord> {
        self.execution_history
            .lock()
            .map(|guard| guard.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Record when a scheduled run last occurred
    pub fn set_last_scheduled_run(&self, job: JobId, time: DateTime<Utc>) {
        if let Ok(mut guard) = self.last_scheduled_run.lock() {
            guard.insert(job, time);
        }
    }

    /// Get when a job last ran on schedule
    pub fn get_last_scheduled_run(&self, job: JobId) -> Option<DateTime<Utc>> {
        self.last_scheduled_run
            .lock()
            .ok()
            .and_then(|guard| guard.get(&job).cloned())
    }

    /// Save execution history to disk
    fn save_execution_history(&self) -> Result<(), String> {
        let history = self
            .execution_history
            .lock()
            .map_err(|_| "Lock poisoned")?
            .clone();

        let path = get_state_dir()?.join("execution_history.json");
        let content =
            serde_json::to_string_pretty(&history).map_err(|e| format!("Serialize error: {}", e))?;

        fs::write(&path, content).map_err(|e| format!("Write error: {}", e))?;

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the canonical config file path (~/.jarvis/config.json)
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".jarvis").join("config.json"))
}

/// Get the state directory (~/.jarvis)
fn get_state_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    let state_dir = home.join(".jarvis");

    if !state_dir.exists() {
        fs::create_dir_all(&state_dir).map_err(|e| format!("Failed to create state dir: {}", e))?;
    }

    Ok(state_dir)
}

/// Load configuration from ~/.jarvis/config.json
pub fn load_config() -> Result<Config, String> {
    let path = config_path()?;

    if !path.exists() {
        return Err(format!("Config file not found at {}", path.display()));
    }

    let content =
        fs::read_to_string(&path).map_err(|e| format!("Failed to read config: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}

/// Reload configuration from disk
pub fn reload_config(state: &AppState) -> Result<Config, String> {
    let config = load_config()?;
    let mut guard = state.config.write().map_err(|_| "Lock poisoned")?;
    *guard = config.clone();
    Ok(config)
}

/// Load execution history from disk
fn load_execution_history() -> Result<Vec<ExecutionRecord>, String> {
    let path = get_state_dir()?.join("execution_history.json");

    if !path.exists() {
        return Ok(Vec::new());
    }

    let content =
        fs::read_to_string(&path).map_err(|e| format!("Failed to read history: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse history: {}", e))
}

/// Create a new execution record
pub fn create_execution_record(job: JobId, trigger: ExecutionTrigger) -> ExecutionRecord {
    ExecutionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        job,
        started_at: Utc::now(),
        finished_at: None,
        duration_secs: None,
        success: false,
        error_message: None,
        trigger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_tz_falls_back_to_utc() {
        let state = AppState::new();
        if let Ok(mut guard) = state.config.write() {
            guard.timezone = "Not/AZone".to_string();
        }
        assert_eq!(state.service_tz(), Tz::UTC);

        if let Ok(mut guard) = state.config.write() {
            guard.timezone = "Asia/Almaty".to_string();
        }
        assert_eq!(state.service_tz().name(), "Asia/Almaty");
    }

    #[test]
    fn test_job_status_defaults_to_idle() {
        let state = AppState::new();
        assert!(matches!(state.get_job_status(JobId::Morning), JobStatus::Idle));
    }
}
