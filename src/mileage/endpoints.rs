//! Route handlers for the mileage log JSON API.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    db::with_lock_retry,
    mileage::{
        MileageLogData, MileageLogId, create_mileage_log, delete_mileage_log, list_mileage_logs,
        update_mileage_log,
    },
    vehicle::VehicleId,
};

/// The JSON body for creating or updating a mileage log.
#[derive(Debug, Deserialize)]
pub struct MileageLogBody {
    /// The vehicle the trip was driven in.
    pub vehicle_id: VehicleId,
    /// When the trip happened.
    pub date: Date,
    /// What the trip was for.
    pub purpose: String,
    /// The odometer reading at the start of the trip.
    pub odometer_start: i64,
    /// The odometer reading at the end of the trip.
    pub odometer_end: i64,
    /// Miles of the trip that were personal rather than business.
    #[serde(default)]
    pub personal_miles: i64,
    /// Tag names to attach, created if they do not exist yet.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MileageLogBody {
    pub(crate) fn validate(self) -> Result<MileageLogData, Error> {
        MileageLogData::new(
            self.vehicle_id,
            self.date,
            &self.purpose,
            self.odometer_start,
            self.odometer_end,
            self.personal_miles,
            self.tags,
        )
    }
}

/// Optional filters for the mileage log listing.
#[derive(Debug, Default, Deserialize)]
pub struct MileageLogParams {
    /// Restrict the listing to one vehicle.
    pub vehicle_id: Option<VehicleId>,
}

/// A route handler for listing the signed-in user's mileage logs, newest
/// first.
pub async fn get_mileage_logs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<MileageLogParams>,
) -> Result<impl IntoResponse, Error> {
    let logs = with_lock_retry(&state.db_connection, move |connection| {
        list_mileage_logs(user.id, params.vehicle_id, connection)
    })
    .await?;

    Ok(Json(logs))
}

/// A route handler for logging a trip.
///
/// The deductible amount is mirrored into the expense table in the same
/// transaction, so the trip shows up in expense listings immediately.
pub async fn create_mileage_log_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<MileageLogBody>,
) -> Result<impl IntoResponse, Error> {
    let data = body.validate()?;

    let log = with_lock_retry(&state.db_connection, move |connection| {
        create_mileage_log(user.id, data.clone(), connection)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(log)))
}

/// A route handler for updating a mileage log, which also brings its mirror
/// expense in line.
pub async fn update_mileage_log_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(log_id): Path<MileageLogId>,
    Json(body): Json<MileageLogBody>,
) -> Result<impl IntoResponse, Error> {
    let data = body.validate()?;

    let log = with_lock_retry(&state.db_connection, move |connection| {
        update_mileage_log(user.id, log_id, data.clone(), connection)
    })
    .await?;

    Ok(Json(log))
}

/// A route handler for deleting a mileage log and its mirror expense.
pub async fn delete_mileage_log_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(log_id): Path<MileageLogId>,
) -> Result<impl IntoResponse, Error> {
    with_lock_retry(&state.db_connection, move |connection| {
        delete_mileage_log(user.id, log_id, connection)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
