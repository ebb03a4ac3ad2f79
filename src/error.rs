//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used for an expense description.
    #[error("description cannot be empty")]
    EmptyDescription,

    /// An empty string was used for an expense recipient.
    #[error("recipient cannot be empty")]
    EmptyRecipient,

    /// An expense amount was zero or negative.
    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(f64),

    /// An empty string was used to create a tag name.
    #[error("tag name cannot be empty")]
    EmptyTagName,

    /// The tag name already exists for this user.
    #[error("the tag \"{0}\" already exists")]
    DuplicateTagName(String),

    /// An empty string was used for a vehicle name.
    #[error("vehicle name cannot be empty")]
    EmptyVehicleName,

    /// An empty string was used for a mileage log purpose.
    #[error("trip purpose cannot be empty")]
    EmptyPurpose,

    /// A calendar month outside 1-12 was given for a recurring expense.
    #[error("{0} is not a valid month, expected a number from 1 to 12")]
    InvalidMonth(u8),

    /// A day of month outside 1-31 was given for a recurring expense.
    #[error("{0} is not a valid day of month, expected a number from 1 to 31")]
    InvalidDayOfMonth(u8),

    /// A year outside 1900-2100 was given for a recurring expense.
    ///
    /// Templates are expanded month by month on every listing, so a far-past
    /// start year would make each read iterate thousands of months.
    #[error("{0} is not a valid year, expected a number from 1900 to 2100")]
    InvalidYear(i32),

    /// A recurring expense's end month is earlier than its start month.
    #[error("the end month cannot be before the start month")]
    EndBeforeStart,

    /// A mileage log's end odometer reading does not exceed its start reading.
    #[error("odometer end ({end}) must be greater than odometer start ({start})")]
    InvalidOdometerRange {
        /// The odometer reading at the start of the trip.
        start: i64,
        /// The odometer reading at the end of the trip.
        end: i64,
    },

    /// A mileage log's personal miles are negative or exceed the trip total.
    #[error("personal miles ({personal}) must be between 0 and the trip total ({total})")]
    InvalidPersonalMiles {
        /// The personal miles carve-out.
        personal: i64,
        /// The total miles driven on the trip.
        total: i64,
    },

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A query was given an ID that does not refer to a valid row.
    #[error("a referenced resource does not exist")]
    InvalidForeignKey,

    /// Tried to update an expense that does not exist
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to delete an expense that mirrors a mileage log.
    ///
    /// The mirror expense is owned by its mileage log: deleting the log
    /// deletes the expense, never the other way around.
    #[error("this expense mirrors a mileage log, delete the mileage log instead")]
    ExpenseMirrorsMileageLog,

    /// Tried to update a tag that does not exist
    #[error("tried to update a tag that is not in the database")]
    UpdateMissingTag,

    /// Tried to delete a tag that does not exist
    #[error("tried to delete a tag that is not in the database")]
    DeleteMissingTag,

    /// Tried to update a recurring expense that does not exist
    #[error("tried to update a recurring expense that is not in the database")]
    UpdateMissingRecurringExpense,

    /// Tried to delete a recurring expense that does not exist
    #[error("tried to delete a recurring expense that is not in the database")]
    DeleteMissingRecurringExpense,

    /// Tried to update a vehicle that does not exist
    #[error("tried to update a vehicle that is not in the database")]
    UpdateMissingVehicle,

    /// Tried to delete a vehicle that does not exist
    #[error("tried to delete a vehicle that is not in the database")]
    DeleteMissingVehicle,

    /// Tried to update a mileage log that does not exist
    #[error("tried to update a mileage log that is not in the database")]
    UpdateMissingMileageLog,

    /// Tried to delete a mileage log that does not exist
    #[error("tried to delete a mileage log that is not in the database")]
    DeleteMissingMileageLog,

    /// The multipart form could not be parsed as an uploaded CSV file.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("file is not a CSV")]
    NotCsv,

    /// The CSV had issues that prevented it from being imported.
    #[error("could not import the CSV file: {0}")]
    InvalidCsv(String),

    /// The language model API could not be reached or reported a failure.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("expense parser unavailable: {0}")]
    LlmUnavailable(String),

    /// The language model replied with something that is not a parseable expense.
    #[error("could not understand the parser reply: {0}")]
    InvalidLlmReply(String),

    /// An MCP tool call named a tool that does not exist.
    #[error("unknown tool \"{0}\"")]
    UnknownTool(String),

    /// An MCP tool call's arguments did not match the tool's schema.
    #[error("invalid tool arguments: {0}")]
    InvalidToolArguments(String),

    /// Could not acquire the database, even after retrying.
    #[error("the database is locked")]
    DatabaseLocked,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::InvalidForeignKey
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                Error::DatabaseLocked
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound
            | Error::UpdateMissingExpense
            | Error::DeleteMissingExpense
            | Error::UpdateMissingTag
            | Error::DeleteMissingTag
            | Error::UpdateMissingRecurringExpense
            | Error::DeleteMissingRecurringExpense
            | Error::UpdateMissingVehicle
            | Error::DeleteMissingVehicle
            | Error::UpdateMissingMileageLog
            | Error::DeleteMissingMileageLog
            | Error::UnknownTool(_) => StatusCode::NOT_FOUND,
            Error::EmptyDescription
            | Error::EmptyRecipient
            | Error::NonPositiveAmount(_)
            | Error::EmptyTagName
            | Error::DuplicateTagName(_)
            | Error::EmptyVehicleName
            | Error::EmptyPurpose
            | Error::InvalidMonth(_)
            | Error::InvalidDayOfMonth(_)
            | Error::InvalidYear(_)
            | Error::EndBeforeStart
            | Error::InvalidOdometerRange { .. }
            | Error::InvalidPersonalMiles { .. }
            | Error::InvalidForeignKey
            | Error::MultipartError(_)
            | Error::NotCsv
            | Error::InvalidCsv(_)
            | Error::InvalidToolArguments(_) => StatusCode::BAD_REQUEST,
            Error::ExpenseMirrorsMileageLog => StatusCode::CONFLICT,
            Error::InvalidLlmReply(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::LlmUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::DatabaseLocked | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details are logged on the server, never sent to the client.
        let body = match &self {
            Error::SqlError(error) => {
                tracing::error!("an unexpected error occurred: {}", error);
                Json(json!({"error": "internal server error"}))
            }
            Error::LlmUnavailable(details) => {
                tracing::error!("expense parser unavailable: {}", details);
                Json(json!({"error": "the expense parser is currently unavailable"}))
            }
            error => Json(json!({"error": error.to_string()})),
        };

        (status, body).into_response()
    }
}
