//! Vehicle mileage logs and their mirrored deduction expenses.
//!
//! Each log records a business trip's odometer readings. The deductible
//! amount (business miles times the IRS standard rate for the trip's year)
//! is mirrored into the expense table so mileage shows up in expense
//! listings and totals. The log owns its mirror: every write to a log and
//! its mirror happens in one SQLite transaction, and the mirror can never
//! be edited or deleted on its own.

mod db;
mod domain;
mod endpoints;
mod rates;

pub use db::{
    create_mileage_log, create_mileage_tables, delete_mileage_log, get_mileage_log,
    list_mileage_logs, update_mileage_log,
};
pub use domain::{MileageLog, MileageLogData, MileageLogId};
pub use endpoints::{
    MileageLogBody, create_mileage_log_endpoint, delete_mileage_log_endpoint, get_mileage_logs,
    update_mileage_log_endpoint,
};
pub use rates::get_rate_for_year;
