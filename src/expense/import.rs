//! Bulk import of expenses from an uploaded CSV file.
//!
//! The expected header is `date,description,recipient,amount,materials,hours,tags`
//! with ISO dates and semicolon-separated tag names. The whole file is
//! validated before anything is written, so a bad row rejects the import
//! without leaving a partial batch behind.

use axum::{Json, extract::{Multipart, State}, http::StatusCode, response::IntoResponse};
use rusqlite::{Transaction, TransactionBehavior};
use serde::Deserialize;
use serde_json::json;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    auth::CurrentUser,
    db::with_lock_retry,
    expense::{ExpenseData, create_expense},
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// One row of the uploaded CSV, before validation.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    date: String,
    description: String,
    recipient: String,
    amount: f64,
    materials: Option<f64>,
    hours: Option<f64>,
    /// Semicolon-separated tag names, e.g. `Materials;Job: Smith`.
    tags: Option<String>,
}

/// A route handler for importing expenses from a multipart CSV upload.
///
/// Responds with 201 and `{"imported": n}` on success. A row that fails to
/// parse or validate rejects the whole file with 400 and the offending row
/// number.
pub async fn import_expenses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, Error> {
    let field = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
        .ok_or(Error::NotCsv)?;

    let looks_like_csv = field
        .file_name()
        .map(|name| name.to_lowercase().ends_with(".csv"))
        .or_else(|| field.content_type().map(|kind| kind.contains("csv")))
        .unwrap_or(false);
    if !looks_like_csv {
        return Err(Error::NotCsv);
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?;

    let rows = parse_csv(&bytes)?;
    let imported = rows.len();

    with_lock_retry(&state.db_connection, move |connection| {
        let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

        for row in &rows {
            create_expense(user.id, row.clone(), &transaction)?;
        }

        transaction.commit()?;
        Ok(())
    })
    .await?;

    tracing::info!(
        "imported {imported} expenses from CSV for user {}",
        user.id.as_i64()
    );

    Ok((StatusCode::CREATED, Json(json!({"imported": imported}))))
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<ExpenseData>, Error> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();

    for (index, record) in reader.deserialize::<ImportRecord>().enumerate() {
        // Row 1 is the header, so data rows start at 2.
        let row_number = index + 2;
        let record =
            record.map_err(|error| Error::InvalidCsv(format!("row {row_number}: {error}")))?;

        let date = Date::parse(record.date.trim(), DATE_FORMAT).map_err(|_| {
            Error::InvalidCsv(format!(
                "row {row_number}: \"{}\" is not a date in the format YYYY-MM-DD",
                record.date
            ))
        })?;

        let tags = record
            .tags
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();

        let data = ExpenseData::new(
            date,
            &record.description,
            &record.recipient,
            record.amount,
            record.materials,
            record.hours,
            tags,
        )
        .map_err(|error| Error::InvalidCsv(format!("row {row_number}: {error}")))?;

        rows.push(data);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{expense::ExpenseInstance, test_utils::test_server_with_user};

    const VALID_CSV: &str = "\
date,description,recipient,amount,materials,hours,tags
2026-01-15,Lumber,Hardware Store,125.50,125.50,,Materials;Job: Smith
2026-01-16,Fuel,Gas Station,60.00,,,Fuel
2026-01-17,Site labour,J. Doe,400.00,,8,";

    #[tokio::test]
    async fn import_creates_expenses_with_tags() {
        let (server, token, _) = test_server_with_user().await;

        let response = server
            .post("/api/expenses/import")
            .authorization_bearer(&token)
            .multipart(
                axum_test::multipart::MultipartForm::new().add_part(
                    "file",
                    axum_test::multipart::Part::text(VALID_CSV)
                        .file_name("expenses.csv")
                        .mime_type("text/csv"),
                ),
            )
            .await;

        response.assert_status(StatusCode::CREATED);
        response.assert_json(&serde_json::json!({"imported": 3}));

        let instances = server
            .get("/api/expenses")
            .authorization_bearer(&token)
            .await
            .json::<Vec<ExpenseInstance>>();

        assert_eq!(instances.len(), 3);

        let lumber = instances
            .iter()
            .find(|instance| instance.description == "Lumber")
            .expect("Imported expense is missing");
        assert_eq!(lumber.tags.len(), 2);
    }

    #[tokio::test]
    async fn import_rejects_bad_rows_without_importing_any() {
        let (server, token, _) = test_server_with_user().await;

        let csv = "\
date,description,recipient,amount,materials,hours,tags
2026-01-15,Lumber,Hardware Store,125.50,,,
not-a-date,Fuel,Gas Station,60.00,,,";

        let response = server
            .post("/api/expenses/import")
            .authorization_bearer(&token)
            .multipart(
                axum_test::multipart::MultipartForm::new().add_part(
                    "file",
                    axum_test::multipart::Part::text(csv)
                        .file_name("expenses.csv")
                        .mime_type("text/csv"),
                ),
            )
            .await;

        response.assert_status_bad_request();

        let instances = server
            .get("/api/expenses")
            .authorization_bearer(&token)
            .await
            .json::<Vec<ExpenseInstance>>();

        assert!(instances.is_empty());
    }

    #[tokio::test]
    async fn import_rejects_non_csv_files() {
        let (server, token, _) = test_server_with_user().await;

        let response = server
            .post("/api/expenses/import")
            .authorization_bearer(&token)
            .multipart(
                axum_test::multipart::MultipartForm::new().add_part(
                    "file",
                    axum_test::multipart::Part::text("hello")
                        .file_name("notes.txt")
                        .mime_type("text/plain"),
                ),
            )
            .await;

        response.assert_status_bad_request();
    }
}
