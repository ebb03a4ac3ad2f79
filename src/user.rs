//! The user domain model and its database operations.
//!
//! Users are created implicitly the first time a Google ID token for an
//! unknown `google_id` is verified, never through an explicit sign-up flow.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// The ID of a user in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a user ID from a raw integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw integer for the user ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// A registered user, identified by their Google account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's database ID.
    pub id: UserId,
    /// The stable subject identifier from Google. Never serialized, so
    /// deserializing a profile response leaves it empty.
    #[serde(skip_serializing, default)]
    pub google_id: String,
    /// The user's email address, as verified by Google.
    pub email: String,
    /// The user's display name from their Google profile.
    pub name: Option<String>,
    /// URL of the user's Google profile picture.
    pub picture: Option<String>,
    /// Free-text context included in LLM expense-parsing prompts.
    pub expense_context: Option<String>,
    /// Whether the user has admin rights.
    pub is_admin: bool,
    /// When the user first signed in.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The profile fields extracted from a verified Google ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleProfile {
    /// The stable subject identifier from Google.
    pub google_id: String,
    /// The user's email address.
    pub email: String,
    /// The user's display name, if present in the token.
    pub name: Option<String>,
    /// URL of the user's profile picture, if present in the token.
    pub picture: Option<String>,
}

/// Initialize the user table.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            google_id TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            picture TEXT,
            expense_context TEXT,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_user_google_id ON user(google_id);",
    )?;

    Ok(())
}

/// Look up a user by `google_id`, creating them on first sign-in.
///
/// On repeat sign-ins the name and picture are refreshed from the Google
/// profile, since users can change both on Google's side.
pub fn get_or_create_user(profile: &GoogleProfile, connection: &Connection) -> Result<User, Error> {
    let existing = connection
        .prepare(
            "SELECT id, google_id, email, name, picture, expense_context, is_admin, created_at
            FROM user WHERE google_id = :google_id",
        )?
        .query_row(&[(":google_id", &profile.google_id)], map_row);

    match existing {
        Ok(mut user) => {
            connection.execute(
                "UPDATE user SET name = ?1, picture = ?2 WHERE id = ?3",
                (&profile.name, &profile.picture, user.id.as_i64()),
            )?;
            user.name = profile.name.clone();
            user.picture = profile.picture.clone();

            Ok(user)
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            let created_at = OffsetDateTime::now_utc();
            connection.execute(
                "INSERT INTO user (google_id, email, name, picture, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &profile.google_id,
                    &profile.email,
                    &profile.name,
                    &profile.picture,
                    created_at,
                ),
            )?;

            Ok(User {
                id: UserId::new(connection.last_insert_rowid()),
                google_id: profile.google_id.clone(),
                email: profile.email.clone(),
                name: profile.name.clone(),
                picture: profile.picture.clone(),
                expense_context: None,
                is_admin: false,
                created_at,
            })
        }
        Err(error) => Err(error.into()),
    }
}

/// Retrieve a user by their database ID.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, google_id, email, name, picture, expense_context, is_admin, created_at
            FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Replace the user's free-text expense context. `None` clears it.
pub fn set_expense_context(
    user_id: UserId,
    expense_context: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET expense_context = ?1 WHERE id = ?2",
        (expense_context, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        google_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        picture: row.get(4)?,
        expense_context: row.get(5)?,
        is_admin: row.get(6)?,
        created_at: row.get(7)?,
    })
}
