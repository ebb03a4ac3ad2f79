//! Spending summaries over expenses and mileage logs.

use axum::{Json, extract::{Query, State}, response::IntoResponse};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::CurrentUser,
    db::with_lock_retry,
    expense::{Expense, ExpenseInstance, list_expenses},
    mileage::{MileageLog, list_mileage_logs},
    recurring::{expand_recurring_expenses, list_recurring_expenses},
};

/// Totals over a user's expenses for a date range.
///
/// Virtual instances from recurring expense templates are folded in, and
/// mileage deductions are counted through their mirror expenses.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    /// The sum of all expense amounts in the range.
    pub total: f64,
    /// How many expenses fall in the range.
    pub count: u64,
    /// The mean expense amount, zero when the range is empty.
    pub average: f64,
}

/// Totals over a user's mileage logs.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct MileageSummary {
    /// How many trips were logged.
    pub log_count: u64,
    /// Total miles across all trips, personal included.
    pub total_miles: i64,
    /// Total business miles across all trips.
    pub business_miles: i64,
    /// The total deductible amount.
    pub deduction: f64,
}

/// Optional date-range filter, both bounds inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    /// The earliest date to include.
    pub start_date: Option<Date>,
    /// The latest date to include.
    pub end_date: Option<Date>,
}

/// Optional year filter for the mileage summary.
#[derive(Debug, Default, Deserialize)]
pub struct MileageSummaryParams {
    /// Restrict the summary to trips in one calendar year, e.g. for a tax
    /// return.
    pub year: Option<i32>,
}

/// Summarise a user's expenses over a date range, recurring instances
/// included.
///
/// Shared between the REST handler and the `get_expense_summary` tool.
pub(crate) async fn compute_expense_summary(
    state: &AppState,
    user_id: crate::user::UserId,
    start_date: Option<Date>,
    end_date: Option<Date>,
) -> Result<ExpenseSummary, Error> {
    let (expenses, templates) = with_lock_retry(&state.db_connection, move |connection| {
        let expenses = list_expenses(user_id, start_date, end_date, connection)?;
        let templates = list_recurring_expenses(user_id, connection)?;
        Ok((expenses, templates))
    })
    .await?;

    let today = OffsetDateTime::now_utc().date();
    let virtual_instances = expand_recurring_expenses(&templates, today, start_date, end_date);

    Ok(summarize_expenses(&expenses, &virtual_instances))
}

/// Summarise a user's mileage logs, optionally restricted to one year.
pub(crate) async fn compute_mileage_summary(
    state: &AppState,
    user_id: crate::user::UserId,
    year: Option<i32>,
) -> Result<MileageSummary, Error> {
    let logs = with_lock_retry(&state.db_connection, move |connection| {
        list_mileage_logs(user_id, None, connection)
    })
    .await?;

    Ok(summarize_mileage(&logs, year))
}

/// A route handler for summarising expenses over a date range.
pub async fn get_expense_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<SummaryParams>,
) -> Result<impl IntoResponse, Error> {
    let summary =
        compute_expense_summary(&state, user.id, params.start_date, params.end_date).await?;

    Ok(Json(summary))
}

/// A route handler for summarising mileage logs, optionally for one year.
pub async fn get_mileage_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<MileageSummaryParams>,
) -> Result<impl IntoResponse, Error> {
    let summary = compute_mileage_summary(&state, user.id, params.year).await?;

    Ok(Json(summary))
}

fn summarize_expenses(
    expenses: &[Expense],
    virtual_instances: &[ExpenseInstance],
) -> ExpenseSummary {
    let total: f64 = expenses.iter().map(|expense| expense.amount).sum::<f64>()
        + virtual_instances
            .iter()
            .map(|instance| instance.amount)
            .sum::<f64>();
    let count = (expenses.len() + virtual_instances.len()) as u64;
    let average = if count == 0 {
        0.0
    } else {
        total / count as f64
    };

    ExpenseSummary {
        total,
        count,
        average,
    }
}

fn summarize_mileage(logs: &[MileageLog], year: Option<i32>) -> MileageSummary {
    let mut summary = MileageSummary {
        log_count: 0,
        total_miles: 0,
        business_miles: 0,
        deduction: 0.0,
    };

    for log in logs {
        if year.is_some_and(|year| log.date.year() != year) {
            continue;
        }

        summary.log_count += 1;
        summary.total_miles += log.odometer_end - log.odometer_start;
        summary.business_miles += log.business_miles;
        summary.deduction += log.deduction;
    }

    summary
}
