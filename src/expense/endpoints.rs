//! Route handlers for the expense JSON API.

use std::cmp::Reverse;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::CurrentUser,
    db::with_lock_retry,
    expense::{
        ExpenseData, ExpenseId, ExpenseInstance, create_expense, delete_expense, get_expense,
        list_expenses, update_expense,
    },
    pagination::Pagination,
    recurring::{expand_recurring_expenses, list_recurring_expenses},
};

/// The JSON body for creating or updating an expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseBody {
    /// When the money was spent.
    pub date: Date,
    /// What the expense was for.
    pub description: String,
    /// Who was paid.
    pub recipient: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The portion of the amount spent on materials.
    pub materials: Option<f64>,
    /// Hours of labour associated with the expense.
    pub hours: Option<f64>,
    /// Tag names to attach, created if they do not exist yet.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExpenseBody {
    pub(crate) fn validate(self) -> Result<ExpenseData, Error> {
        ExpenseData::new(
            self.date,
            &self.description,
            &self.recipient,
            self.amount,
            self.materials,
            self.hours,
            self.tags,
        )
    }
}

/// Optional date-range filter for expense listings, both bounds inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeParams {
    /// The earliest date to include.
    pub start_date: Option<Date>,
    /// The latest date to include.
    pub end_date: Option<Date>,
}

/// List stored expenses merged with virtual recurring instances, newest
/// first. Paging is applied after the merge so pages stay in date order.
///
/// Shared between the REST listing and the `list_expenses` tool.
pub(crate) async fn list_merged_expenses(
    state: &AppState,
    user_id: crate::user::UserId,
    start_date: Option<Date>,
    end_date: Option<Date>,
    pagination: Pagination,
) -> Result<Vec<ExpenseInstance>, Error> {
    let (expenses, templates) = with_lock_retry(&state.db_connection, move |connection| {
        let expenses = list_expenses(user_id, start_date, end_date, connection)?;
        let templates = list_recurring_expenses(user_id, connection)?;
        Ok((expenses, templates))
    })
    .await?;

    let today = OffsetDateTime::now_utc().date();
    let mut instances: Vec<ExpenseInstance> =
        expenses.into_iter().map(ExpenseInstance::from).collect();
    instances.extend(expand_recurring_expenses(
        &templates, today, start_date, end_date,
    ));

    // Stored expenses sort ahead of virtual instances on the same date.
    instances.sort_by_key(|instance| Reverse((instance.date, instance.id.unwrap_or(i64::MIN))));

    Ok(pagination.apply(instances))
}

/// A route handler for listing expenses.
///
/// The listing merges stored expenses with virtual instances expanded from
/// the user's recurring expense templates, newest first.
pub async fn get_expenses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(range): Query<DateRangeParams>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, Error> {
    let instances =
        list_merged_expenses(&state, user.id, range.start_date, range.end_date, pagination)
            .await?;

    Ok(Json(instances))
}

/// A route handler for fetching a single stored expense.
pub async fn get_expense_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(expense_id): Path<ExpenseId>,
) -> Result<impl IntoResponse, Error> {
    let expense = with_lock_retry(&state.db_connection, move |connection| {
        get_expense(user.id, expense_id, connection)
    })
    .await?;

    Ok(Json(expense))
}

/// A route handler for creating an expense.
pub async fn create_expense_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ExpenseBody>,
) -> Result<impl IntoResponse, Error> {
    let data = body.validate()?;

    let expense = with_lock_retry(&state.db_connection, move |connection| {
        create_expense(user.id, data.clone(), connection)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// A route handler for updating an expense and replacing its tags.
pub async fn update_expense_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(expense_id): Path<ExpenseId>,
    Json(body): Json<ExpenseBody>,
) -> Result<impl IntoResponse, Error> {
    let data = body.validate()?;

    let expense = with_lock_retry(&state.db_connection, move |connection| {
        update_expense(user.id, expense_id, data.clone(), connection)
    })
    .await?;

    Ok(Json(expense))
}

/// A route handler for deleting an expense.
///
/// Expenses that mirror a mileage log are refused with 409, the client
/// should delete the mileage log instead.
pub async fn delete_expense_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(expense_id): Path<ExpenseId>,
) -> Result<impl IntoResponse, Error> {
    with_lock_retry(&state.db_connection, move |connection| {
        delete_expense(user.id, expense_id, connection)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
