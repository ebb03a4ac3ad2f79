//! Route handlers for the recurring expense JSON API.

use axum::{Json, extract::{Path, State}, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    db::with_lock_retry,
    recurring::{
        RecurringExpenseData, RecurringExpenseId, create_recurring_expense,
        delete_recurring_expense, list_recurring_expenses, update_recurring_expense,
    },
};

/// The JSON body for creating or updating a recurring expense template.
#[derive(Debug, Deserialize)]
pub struct RecurringExpenseBody {
    /// What the recurring cost is for.
    pub description: String,
    /// Who is paid each month.
    pub recipient: String,
    /// The amount charged each month.
    pub amount: f64,
    /// The day of the month the charge lands on, 1 to 31.
    pub day_of_month: u8,
    /// The year of the first charge.
    pub start_year: i32,
    /// The month of the first charge, 1 to 12.
    pub start_month: u8,
    /// The year of the final charge, omitted for open-ended templates.
    pub end_year: Option<i32>,
    /// The month of the final charge, omitted for open-ended templates.
    pub end_month: Option<u8>,
    /// Tag names to attach to every expanded instance.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RecurringExpenseBody {
    fn validate(self) -> Result<RecurringExpenseData, Error> {
        RecurringExpenseData::new(
            &self.description,
            &self.recipient,
            self.amount,
            self.day_of_month,
            self.start_year,
            self.start_month,
            self.end_year,
            self.end_month,
            self.tags,
        )
    }
}

/// A route handler for listing the signed-in user's recurring expense
/// templates.
pub async fn get_recurring_expenses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, Error> {
    let templates = with_lock_retry(&state.db_connection, move |connection| {
        list_recurring_expenses(user.id, connection)
    })
    .await?;

    Ok(Json(templates))
}

/// A route handler for creating a recurring expense template.
pub async fn create_recurring_expense_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<RecurringExpenseBody>,
) -> Result<impl IntoResponse, Error> {
    let data = body.validate()?;

    let template = with_lock_retry(&state.db_connection, move |connection| {
        create_recurring_expense(user.id, data.clone(), connection)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(template)))
}

/// A route handler for updating a recurring expense template.
///
/// Instances are expanded at read time, so the change applies retroactively
/// to every month the template covers.
pub async fn update_recurring_expense_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecurringExpenseId>,
    Json(body): Json<RecurringExpenseBody>,
) -> Result<impl IntoResponse, Error> {
    let data = body.validate()?;

    let template = with_lock_retry(&state.db_connection, move |connection| {
        update_recurring_expense(user.id, id, data.clone(), connection)
    })
    .await?;

    Ok(Json(template))
}

/// A route handler for deleting a recurring expense template, which removes
/// every instance it produced.
pub async fn delete_recurring_expense_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecurringExpenseId>,
) -> Result<impl IntoResponse, Error> {
    with_lock_retry(&state.db_connection, move |connection| {
        delete_recurring_expense(user.id, id, connection)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
