//! Core mileage log domain types.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, tag::Tag, vehicle::VehicleId};

/// Database identifier for a mileage log.
pub type MileageLogId = i64;

/// A logged business trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileageLog {
    /// The log's database ID.
    pub id: MileageLogId,
    /// The vehicle the trip was driven in.
    pub vehicle_id: VehicleId,
    /// When the trip happened.
    pub date: Date,
    /// What the trip was for, e.g. "Material pickup".
    pub purpose: String,
    /// The odometer reading at the start of the trip.
    pub odometer_start: i64,
    /// The odometer reading at the end of the trip.
    pub odometer_end: i64,
    /// Miles of the trip that were personal rather than business.
    pub personal_miles: i64,
    /// Total trip miles minus personal miles.
    pub business_miles: i64,
    /// The IRS standard mileage rate applied, dollars per mile. Snapshotted
    /// when the log is written, so later rate-table edits leave it alone.
    pub rate: f64,
    /// The deductible amount, business miles times the rate.
    ///
    /// Mirrored into the expense table as an expense named
    /// `Mileage: {purpose}`.
    pub deduction: f64,
    /// The tags attached to the log.
    pub tags: Vec<Tag>,
}

/// Validated input for creating or updating a mileage log.
#[derive(Debug, Clone, PartialEq)]
pub struct MileageLogData {
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
    pub personal_miles: i64,
    /// Tag names to attach, created for the user if they do not exist yet.
    pub tags: Vec<String>,
}

impl MileageLogData {
    /// Validate raw mileage log fields.
    ///
    /// # Errors
    /// Returns [Error::EmptyPurpose], [Error::InvalidOdometerRange] or
    /// [Error::InvalidPersonalMiles] if the corresponding fields are invalid.
    pub fn new(
        vehicle_id: VehicleId,
        date: Date,
        purpose: &str,
        odometer_start: i64,
        odometer_end: i64,
        personal_miles: i64,
        tags: Vec<String>,
    ) -> Result<Self, Error> {
        let purpose = purpose.trim();
        if purpose.is_empty() {
            return Err(Error::EmptyPurpose);
        }

        if odometer_end <= odometer_start {
            return Err(Error::InvalidOdometerRange {
                start: odometer_start,
                end: odometer_end,
            });
        }

        let total = odometer_end - odometer_start;
        if personal_miles < 0 || personal_miles > total {
            return Err(Error::InvalidPersonalMiles {
                personal: personal_miles,
                total,
            });
        }

        Ok(Self {
            vehicle_id,
            date,
            purpose: purpose.to_owned(),
            odometer_start,
            odometer_end,
            personal_miles,
            tags,
        })
    }

    /// Total trip miles minus personal miles.
    pub fn business_miles(&self) -> i64 {
        (self.odometer_end - self.odometer_start) - self.personal_miles
    }
}
