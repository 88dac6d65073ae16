//! HTTP API surface.
//!
//! The screens of the mobile app become a small REST API. Authentication is
//! external: callers identify the owner through the `x-owner-id` header and
//! the service threads that identifier through every engine call.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::db::{DbProfile, JarvisDb};
use crate::executor::request_job_execution;
use crate::finance;
use crate::helpers::month_key;
use crate::intelligence::{self, CompletionClient};
use crate::notify::Notifier;
use crate::reminders;
use crate::scheduler::{get_next_run_time, SchedulerMessage};
use crate::state::{reload_config, AppState};
use crate::tasks::{self, NewTask};
use crate::translate::TranslateClient;
use crate::types::JobId;
use crate::weather::WeatherClient;

/// Shared handler state
#[derive(Clone)]
pub struct ServerState {
    pub app: Arc<AppState>,
    pub scheduler_tx: mpsc::Sender<SchedulerMessage>,
}

impl ServerState {
    fn completion(&self) -> CompletionClient {
        CompletionClient::new(&self.app.config().ai)
    }

    fn translator(&self) -> TranslateClient {
        TranslateClient::new(&self.app.config().translate.base_url)
    }

    fn weather(&self) -> WeatherClient {
        let config = self.app.config();
        WeatherClient::new(&config.weather.base_url, &config.weather.api_key)
    }

    fn notifier(&self) -> Notifier {
        Notifier::new(&self.app.config().push.base_url)
    }

    /// Today's date in the service timezone.
    fn today(&self) -> chrono::NaiveDate {
        Utc::now().with_timezone(&self.app.service_tz()).date_naive()
    }
}

/// Build the API router.
pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/profile", get(get_profile).put(put_profile))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).delete(delete_task))
        .route("/finance/records", get(list_finance_records).post(add_finance_record))
        .route("/finance/records/:id", axum::routing::delete(delete_finance_record))
        .route("/finance/summary", get(finance_summary))
        .route("/finance/report", get(finance_report))
        .route("/income/config", get(get_income_config).put(put_income_config))
        .route("/chat", post(chat))
        .route("/translate", post(translate))
        .route("/advice", post(generate_advice).get(recent_advice))
        .route("/alerts/weather", post(weather_alert))
        .route("/jobs/status", get(jobs_status))
        .route("/jobs/history", get(jobs_history))
        .route("/jobs/:job/run", post(run_job))
        .route("/jobs/:job/next-run", get(job_next_run))
        .route("/config/reload", post(config_reload));

    Router::new().nest("/api", api).with_state(state)
}

/// Read the owner identifier from the request headers.
fn owner_from(headers: &HeaderMap) -> Result<String, (StatusCode, &'static str)> {
    headers
        .get("x-owner-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "Missing x-owner-id header"))
}

/// Open the database, mapping failure to a 500.
fn open_db() -> Result<JarvisDb, (StatusCode, &'static str)> {
    JarvisDb::open().map_err(|e| {
        log::error!("Failed to open database: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable")
    })
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// =============================================================================
// Profile
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    push_token: String,
}

async fn get_profile(headers: HeaderMap) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match db.get_profile(&owner) {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "No profile saved").into_response(),
        Err(e) => {
            log::error!("Profile query failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Profile query failed").into_response()
        }
    }
}

async fn put_profile(headers: HeaderMap, Json(request): Json<ProfileRequest>) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    let profile = DbProfile {
        owner,
        name: request.name.trim().to_string(),
        city: request.city.trim().to_string(),
        push_token: request.push_token.trim().to_string(),
        updated_at: Utc::now().to_rfc3339(),
    };

    match db.upsert_profile(&profile) {
        Ok(()) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => {
            log::error!("Profile save failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Profile save failed").into_response()
        }
    }
}

// =============================================================================
// Tasks
// =============================================================================

#[derive(Deserialize)]
struct TaskListQuery {
    day: Option<String>,
}

async fn list_tasks(headers: HeaderMap, Query(query): Query<TaskListQuery>) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    let result = match query.day.as_deref() {
        Some(day) => db.tasks_for_day(&owner, day),
        None => db.list_tasks(&owner),
    };

    match result {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => {
            log::error!("Task listing failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Task listing failed").into_response()
        }
    }
}

async fn create_task(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(new): Json<NewTask>,
) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match tasks::create_task_with_reminder(&db, &state.completion(), &owner, &new).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

async fn get_task(headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match db.get_task(&owner, &id) {
        Ok(Some(task)) => (StatusCode::OK, Json(task)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Task not found").into_response(),
        Err(e) => {
            log::error!("Task query failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Task query failed").into_response()
        }
    }
}

async fn delete_task(headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match db.delete_task(&owner, &id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Task not found").into_response(),
        Err(e) => {
            log::error!("Task delete failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Task delete failed").into_response()
        }
    }
}

// =============================================================================
// Finance
// =============================================================================

#[derive(Deserialize)]
struct MonthQuery {
    month: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewFinanceRecord {
    record_type: String,
    amount: f64,
    title: String,
}

async fn list_finance_records(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    let month = query.month.unwrap_or_else(|| month_key(state.today()));
    match db.finance_records(&owner, Some(&month)) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            log::error!("Ledger listing failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Ledger listing failed").into_response()
        }
    }
}

async fn add_finance_record(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(new): Json<NewFinanceRecord>,
) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match finance::add_record(
        &db,
        &owner,
        &new.record_type,
        new.amount,
        &new.title,
        state.today(),
    ) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

async fn delete_finance_record(headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match db.delete_finance_record(&owner, &id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Record not found").into_response(),
        Err(e) => {
            log::error!("Record delete failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Record delete failed").into_response()
        }
    }
}

async fn finance_summary(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    let month = query.month.unwrap_or_else(|| month_key(state.today()));
    match finance::month_summary(&db, &owner, &month) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            log::error!("Summary failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Summary failed").into_response()
        }
    }
}

async fn finance_report(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    let month = query.month.unwrap_or_else(|| month_key(state.today()));

    let summary = match finance::month_summary(&db, &owner, &month) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Summary failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Summary failed").into_response();
        }
    };

    let records = db.finance_records(&owner, Some(&month)).unwrap_or_default();
    let lines = finance::report_lines(&records);
    let tip = intelligence::financial_tip(
        &state.completion(),
        summary.income_total,
        summary.expense_total,
        &lines,
    )
    .await;

    (StatusCode::OK, Json(json!({ "summary": summary, "tip": tip }))).into_response()
}

// =============================================================================
// Income config
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeConfigRequest {
    amount: f64,
    payday: u32,
}

async fn get_income_config(State(state): State<ServerState>, headers: HeaderMap) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match db.get_income_config(&owner, &month_key(state.today())) {
        Ok(Some(config)) => (StatusCode::OK, Json(config)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "No income config for this month").into_response(),
        Err(e) => {
            log::error!("Income config query failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Income config query failed").into_response()
        }
    }
}

async fn put_income_config(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<IncomeConfigRequest>,
) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match finance::set_income_config(&db, &owner, state.today(), request.amount, request.payday) {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

// =============================================================================
// Assistant
// =============================================================================

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

async fn chat(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    if request.message.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Message is required").into_response();
    }
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    let reply = intelligence::chat_reply(
        &db,
        &state.completion(),
        &state.translator(),
        &owner,
        request.message.trim(),
    )
    .await;

    (StatusCode::OK, Json(json!({ "reply": reply }))).into_response()
}

#[derive(Deserialize)]
struct TranslateRequest {
    text: String,
    source: String,
    target: String,
}

async fn translate(
    State(state): State<ServerState>,
    Json(request): Json<TranslateRequest>,
) -> impl IntoResponse {
    let translation = state
        .translator()
        .translate(&request.text, &request.source, &request.target)
        .await;
    Json(json!({ "translation": translation }))
}

async fn generate_advice(State(state): State<ServerState>, headers: HeaderMap) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    let profile = db.get_profile(&owner).ok().flatten();
    let report = match profile.as_ref() {
        Some(p) => state.weather().report_for_city(&p.city).await,
        None => None,
    };

    let now = Utc::now()
        .with_timezone(&state.app.service_tz())
        .naive_local();
    let advice = intelligence::smart_advice(
        &db,
        &state.completion(),
        &state.translator(),
        &owner,
        report.as_ref(),
        now,
    )
    .await;

    (StatusCode::OK, Json(json!({ "advice": advice }))).into_response()
}

#[derive(Deserialize)]
struct AdviceQuery {
    limit: Option<u32>,
}

async fn recent_advice(headers: HeaderMap, Query(query): Query<AdviceQuery>) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    match db.recent_advice(&owner, query.limit.unwrap_or(10)) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => {
            log::error!("Advice listing failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Advice listing failed").into_response()
        }
    }
}

#[derive(Deserialize)]
struct WeatherAlertRequest {
    message: String,
}

async fn weather_alert(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<WeatherAlertRequest>,
) -> impl IntoResponse {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(e) => return e.into_response(),
    };
    let db = match open_db() {
        Ok(db) => db,
        Err(e) => return e.into_response(),
    };

    let profile = db.get_profile(&owner).ok().flatten();
    let message = reminders::weather_alert_message(&request.message);
    state.notifier().deliver(&owner, profile.as_ref(), &message).await;

    StatusCode::ACCEPTED.into_response()
}

// =============================================================================
// Jobs + config
// =============================================================================

async fn jobs_status(State(state): State<ServerState>) -> impl IntoResponse {
    let statuses: serde_json::Map<String, serde_json::Value> =
        [JobId::Morning, JobId::Evening, JobId::IncomeCheck]
            .into_iter()
            .map(|job| {
                (
                    job.to_string(),
                    serde_json::to_value(state.app.get_job_status(job)).unwrap_or_default(),
                )
            })
            .collect();
    Json(serde_json::Value::Object(statuses))
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn jobs_history(
    State(state): State<ServerState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    Json(state.app.get_execution_history(query.limit.unwrap_or(20)))
}

async fn run_job(State(state): State<ServerState>, Path(job): Path<String>) -> impl IntoResponse {
    let job: JobId = match job.parse() {
        Ok(job) => job,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    match request_job_execution(&state.scheduler_tx, job) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e).into_response(),
    }
}

async fn job_next_run(State(state): State<ServerState>, Path(job): Path<String>) -> impl IntoResponse {
    let job: JobId = match job.parse() {
        Ok(job) => job,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let config = state.app.config();
    let entry = match job {
        JobId::Morning => config.schedules.morning.clone(),
        JobId::Evening => config.schedules.evening.clone(),
        JobId::IncomeCheck => config.schedules.income.clone(),
    };

    match get_next_run_time(&entry) {
        Ok(next) => Json(json!({ "job": job, "nextRun": next })).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn config_reload(State(state): State<ServerState>) -> impl IntoResponse {
    match reload_config(&state.app) {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e).into_response(),
    }
}
