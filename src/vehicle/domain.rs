//! Core vehicle domain types.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Database identifier for a vehicle.
pub type VehicleId = i64;

/// A vehicle that business trips are logged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// The vehicle's database ID.
    pub id: VehicleId,
    /// A display name, e.g. "Work truck".
    pub name: String,
    /// The manufacturer, e.g. "Ford".
    pub make: Option<String>,
    /// The model, e.g. "F-150".
    pub model: Option<String>,
    /// The model year.
    pub year: Option<i32>,
    /// Optional free-text notes about the vehicle.
    pub description: Option<String>,
    /// The highest odometer reading seen across the vehicle's mileage logs.
    ///
    /// `None` until the first log is recorded. Kept up to date by the
    /// mileage module so new trips can be pre-filled from where the last
    /// one ended.
    pub last_odometer: Option<i64>,
}

/// Validated input for creating or updating a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleData {
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

impl VehicleData {
    /// Validate raw vehicle fields.
    ///
    /// # Errors
    /// Returns [Error::EmptyVehicleName] if the name is blank.
    pub fn new(
        name: &str,
        make: Option<String>,
        model: Option<String>,
        year: Option<i32>,
        description: Option<String>,
    ) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyVehicleName);
        }

        Ok(Self {
            name: name.to_owned(),
            make,
            model,
            year,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::VehicleData;

    #[test]
    fn new_fails_on_blank_name() {
        let result = VehicleData::new("  ", None, None, None, None);

        assert_eq!(result, Err(Error::EmptyVehicleName));
    }

    #[test]
    fn new_trims_the_name() {
        let data = VehicleData::new(" Work truck ", None, None, None, None).unwrap();

        assert_eq!(data.name, "Work truck");
    }
}
