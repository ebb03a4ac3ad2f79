//! Route handlers for the vehicle JSON API.

use axum::{Json, extract::{Path, State}, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    db::with_lock_retry,
    vehicle::{
        VehicleData, VehicleId, create_vehicle, delete_vehicle, list_vehicles, update_vehicle,
    },
};

/// The JSON body for creating or updating a vehicle.
#[derive(Debug, Deserialize)]
pub struct VehicleBody {
    /// A display name for the vehicle.
    pub name: String,
    /// The manufacturer.
    pub make: Option<String>,
    /// The model.
    pub model: Option<String>,
    /// The model year.
    pub year: Option<i32>,
    /// Optional free-text notes.
    pub description: Option<String>,
}

/// A route handler for listing the signed-in user's vehicles.
pub async fn get_vehicles(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, Error> {
    let vehicles = with_lock_retry(&state.db_connection, move |connection| {
        list_vehicles(user.id, connection)
    })
    .await?;

    Ok(Json(vehicles))
}

/// A route handler for creating a vehicle.
pub async fn create_vehicle_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<VehicleBody>,
) -> Result<impl IntoResponse, Error> {
    let data = VehicleData::new(&body.name, body.make, body.model, body.year, body.description)?;

    let vehicle = with_lock_retry(&state.db_connection, move |connection| {
        create_vehicle(user.id, data.clone(), connection)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// A route handler for updating a vehicle's name and notes.
pub async fn update_vehicle_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(vehicle_id): Path<VehicleId>,
    Json(body): Json<VehicleBody>,
) -> Result<impl IntoResponse, Error> {
    let data = VehicleData::new(&body.name, body.make, body.model, body.year, body.description)?;

    let vehicle = with_lock_retry(&state.db_connection, move |connection| {
        update_vehicle(user.id, vehicle_id, data.clone(), connection)
    })
    .await?;

    Ok(Json(vehicle))
}

/// A route handler for deleting a vehicle along with its mileage logs and
/// their mirror expenses.
pub async fn delete_vehicle_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(vehicle_id): Path<VehicleId>,
) -> Result<impl IntoResponse, Error> {
    with_lock_retry(&state.db_connection, move |connection| {
        delete_vehicle(user.id, vehicle_id, connection)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
