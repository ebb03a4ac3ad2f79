//! Vehicles used for business trips.

mod db;
mod domain;
mod endpoints;

pub use db::{
    advance_odometer, create_vehicle, create_vehicle_table, delete_vehicle, get_vehicle,
    list_vehicles, update_vehicle,
};
pub use domain::{Vehicle, VehicleData, VehicleId};
pub use endpoints::{
    VehicleBody, create_vehicle_endpoint, delete_vehicle_endpoint, get_vehicles,
    update_vehicle_endpoint,
};
