use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Configuration stored in ~/.jarvis/config.json
///
/// Every field carries a serde default so a partial (or missing) config file
/// still yields a runnable service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Timezone used to interpret task day/time values and to resolve
    /// "today" for the engines. Schedule entries carry their own timezone.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub schedules: Schedules,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub push: PushConfig,
    /// Bind address for the HTTP API.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8553".to_string()
}

fn default_timezone() -> String {
    "Asia/Almaty".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            schedules: Schedules::default(),
            ai: AiConfig::default(),
            translate: TranslateConfig::default(),
            weather: WeatherConfig::default(),
            push: PushConfig::default(),
            listen_addr: default_listen_addr(),
        }
    }
}

/// Chat-completion endpoint configuration (OpenAI-compatible shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// Bearer token. Empty means the completion client is disabled and every
    /// AI-backed flow degrades to its fixed fallback string.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            api_key: String::new(),
            model: default_ai_model(),
        }
    }
}

fn default_ai_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_ai_model() -> String {
    "mistralai/mistral-7b-instruct:free".to_string()
}

/// Translation endpoint configuration (Lingva-compatible path shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateConfig {
    #[serde(default = "default_translate_base_url")]
    pub base_url: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            base_url: default_translate_base_url(),
        }
    }
}

fn default_translate_base_url() -> String {
    "https://lingva.ml".to_string()
}

/// Weather endpoint configuration (OpenWeather-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Empty means weather lookups are skipped and morning summaries carry
    /// no weather line.
    #[serde(default)]
    pub api_key: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            api_key: String::new(),
        }
    }
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

/// Push gateway configuration (Expo-compatible send endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfig {
    #[serde(default = "default_push_base_url")]
    pub base_url: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            base_url: default_push_base_url(),
        }
    }
}

fn default_push_base_url() -> String {
    "https://exp.host".to_string()
}

/// Schedule configuration for the recurring jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedules {
    #[serde(default = "ScheduleEntry::default_morning")]
    pub morning: ScheduleEntry,
    #[serde(default = "ScheduleEntry::default_evening")]
    pub evening: ScheduleEntry,
    #[serde(default = "ScheduleEntry::default_income")]
    pub income: ScheduleEntry,
}

impl Default for Schedules {
    fn default() -> Self {
        Self {
            morning: ScheduleEntry::default_morning(),
            evening: ScheduleEntry::default_evening(),
            income: ScheduleEntry::default_income(),
        }
    }
}

/// A single schedule entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub enabled: bool,
    pub cron: String,
    pub timezone: String,
}

impl ScheduleEntry {
    /// Default schedule for the morning summary: 8 AM daily
    pub fn default_morning() -> Self {
        Self {
            enabled: true,
            cron: "0 8 * * *".to_string(),
            timezone: "Asia/Almaty".to_string(),
        }
    }

    /// Default schedule for the evening summary: 10 PM daily
    pub fn default_evening() -> Self {
        Self {
            enabled: true,
            cron: "0 22 * * *".to_string(),
            timezone: "Asia/Almaty".to_string(),
        }
    }

    /// Default schedule for the recurring-income check: shortly after midnight
    pub fn default_income() -> Self {
        Self {
            enabled: true,
            cron: "5 0 * * *".to_string(),
            timezone: "Asia/Almaty".to_string(),
        }
    }
}

impl Default for ScheduleEntry {
    fn default() -> Self {
        Self::default_morning()
    }
}

/// Job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobId {
    Morning,
    Evening,
    IncomeCheck,
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobId::Morning => write!(f, "morning"),
            JobId::Evening => write!(f, "evening"),
            JobId::IncomeCheck => write!(f, "income_check"),
        }
    }
}

impl std::str::FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" => Ok(JobId::Morning),
            "evening" => Ok(JobId::Evening),
            "income_check" | "income" => Ok(JobId::IncomeCheck),
            _ => Err(format!("Unknown job: {}", s)),
        }
    }
}

/// Current status of a job
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
#[derive(Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running {
        #[serde(rename = "startedAt")]
        started_at: DateTime<Utc>,
        #[serde(rename = "executionId")]
        execution_id: String,
    },
    Completed {
        #[serde(rename = "finishedAt")]
        finished_at: DateTime<Utc>,
        #[serde(rename = "durationSecs")]
        duration_secs: u64,
        #[serde(rename = "executionId")]
        execution_id: String,
    },
    Failed {
        error: JobError,
        #[serde(rename = "executionId")]
        execution_id: String,
    },
}

/// Record of a job execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: String,
    pub job: JobId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<u64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub trigger: ExecutionTrigger,
}

/// What triggered the execution
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionTrigger {
    Scheduled,
    Manual,
    Missed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").expect("empty config should parse");
        assert!(config.schedules.morning.enabled);
        assert_eq!(config.schedules.evening.cron, "0 22 * * *");
        assert_eq!(config.ai.base_url, "https://openrouter.ai/api/v1");
        assert!(config.ai.api_key.is_empty());
        assert_eq!(config.listen_addr, "127.0.0.1:8553");
    }

    #[test]
    fn test_job_id_round_trip() {
        for job in [JobId::Morning, JobId::Evening, JobId::IncomeCheck] {
            let parsed: JobId = job.to_string().parse().expect("display should parse back");
            assert_eq!(parsed, job);
        }
        assert!("nonsense".parse::<JobId>().is_err());
    }
}
