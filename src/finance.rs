//! Finance ledger and the recurring-income poster.
//!
//! The poster is evaluated once per scheduled tick per owner and must never
//! double-post: the decision sequence is load config -> payday match ->
//! atomic conditional insert. The insert itself carries the idempotency
//! guarantee (partial unique index on owner/month/day), so two concurrent
//! evaluations cannot both post.

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::db::{DbError, DbFinanceRecord, DbIncomeConfig, JarvisDb};
use crate::helpers::month_key;

/// Title given to auto-posted income records.
pub const AUTO_INCOME_TITLE: &str = "Monthly income";

pub const TYPE_INCOME: &str = "income";
pub const TYPE_AUTO_INCOME: &str = "auto-income";
pub const TYPE_EXPENSE: &str = "expense";

/// Outcome of one recurring-income evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeCheckOutcome {
    /// No config declared for this month.
    NoConfig,
    /// Config exists but today is not the payday.
    NotPayday,
    /// An auto-income record was already posted today.
    AlreadyPosted,
    /// A new auto-income record was inserted.
    Posted,
}

/// Evaluate the recurring-income state machine for one owner and day.
///
/// Safe to run any number of times per day: after the first successful post,
/// every further evaluation lands on `AlreadyPosted`.
pub fn run_income_check(
    db: &JarvisDb,
    owner: &str,
    today: NaiveDate,
) -> Result<IncomeCheckOutcome, DbError> {
    let month = month_key(today);

    let Some(config) = db.get_income_config(owner, &month)? else {
        return Ok(IncomeCheckOutcome::NoConfig);
    };

    if config.payday != today.day() {
        return Ok(IncomeCheckOutcome::NotPayday);
    }

    let posted = db.insert_auto_income(owner, &month, today.day(), config.amount, AUTO_INCOME_TITLE)?;
    if posted {
        log::info!(
            "Auto-posted monthly income of {} for {} ({})",
            config.amount,
            owner,
            month
        );
        Ok(IncomeCheckOutcome::Posted)
    } else {
        Ok(IncomeCheckOutcome::AlreadyPosted)
    }
}

/// Declare (or overwrite) the income config for the current month.
pub fn set_income_config(
    db: &JarvisDb,
    owner: &str,
    today: NaiveDate,
    amount: f64,
    payday: u32,
) -> Result<DbIncomeConfig, String> {
    if amount <= 0.0 {
        return Err("Income amount must be positive".to_string());
    }
    if !(1..=28).contains(&payday) {
        return Err(format!("Payday must be between 1 and 28, got {}", payday));
    }

    let config = DbIncomeConfig {
        owner: owner.to_string(),
        month: month_key(today),
        amount,
        payday,
        created_at: Utc::now().to_rfc3339(),
    };
    db.upsert_income_config(&config).map_err(|e| e.to_string())?;
    Ok(config)
}

/// Insert a manual ledger record (income or expense).
pub fn add_record(
    db: &JarvisDb,
    owner: &str,
    record_type: &str,
    amount: f64,
    title: &str,
    today: NaiveDate,
) -> Result<DbFinanceRecord, String> {
    if record_type != TYPE_INCOME && record_type != TYPE_EXPENSE {
        return Err(format!(
            "Record type must be '{}' or '{}', got '{}'",
            TYPE_INCOME, TYPE_EXPENSE, record_type
        ));
    }
    if amount <= 0.0 {
        return Err("Amount must be positive".to_string());
    }
    if title.trim().is_empty() {
        return Err("Title is required".to_string());
    }

    let record = DbFinanceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        owner: owner.to_string(),
        record_type: record_type.to_string(),
        amount,
        title: title.trim().to_string(),
        month: month_key(today),
        posted_day: None,
        created_at: Utc::now().to_rfc3339(),
    };
    db.insert_finance_record(&record).map_err(|e| e.to_string())?;
    Ok(record)
}

/// Aggregates for one month of ledger records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month: String,
    pub income_total: f64,
    pub expense_total: f64,
    pub balance: f64,
    pub income_count: usize,
    pub expense_count: usize,
}

/// Compute the month summary. Auto-income counts as income.
pub fn month_summary(db: &JarvisDb, owner: &str, month: &str) -> Result<MonthSummary, DbError> {
    let records = db.finance_records(owner, Some(month))?;

    let mut summary = MonthSummary {
        month: month.to_string(),
        income_total: 0.0,
        expense_total: 0.0,
        balance: 0.0,
        income_count: 0,
        expense_count: 0,
    };

    for record in &records {
        match record.record_type.as_str() {
            TYPE_INCOME | TYPE_AUTO_INCOME => {
                summary.income_total += record.amount;
                summary.income_count += 1;
            }
            TYPE_EXPENSE => {
                summary.expense_total += record.amount;
                summary.expense_count += 1;
            }
            other => log::warn!("Skipping record {} with unknown type '{}'", record.id, other),
        }
    }

    summary.balance = summary.income_total - summary.expense_total;
    Ok(summary)
}

/// Render ledger records as prompt lines for the monthly report.
pub fn report_lines(records: &[DbFinanceRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| match r.record_type.as_str() {
            TYPE_INCOME | TYPE_AUTO_INCOME => Some(format!("{} +{}₸", r.title, r.amount)),
            TYPE_EXPENSE => Some(format!("{} - -{}₸", r.title, r.amount)),
            _ => None,
        })
        .collect()
}
