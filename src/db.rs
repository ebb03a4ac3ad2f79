//! Database initialization: connection pragmas and schema creation.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, expense::create_expense_tables, mileage::create_mileage_tables, tag::create_tag_table,
    recurring::create_recurring_expense_tables, user::create_user_table,
    vehicle::create_vehicle_table,
};

/// Create the tables for the domain models if they do not exist, and seed the
/// IRS mileage rate table.
///
/// Also sets the connection pragmas the app relies on: WAL journaling for
/// concurrent readers, a busy timeout so writers queue instead of failing
/// immediately, and foreign key enforcement for the cascade deletes.
///
/// # Errors
/// Returns an error if a table cannot be created or a pragma cannot be set.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "busy_timeout", 30_000)?;
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_tag_table(&transaction)?;
    create_vehicle_table(&transaction)?;
    create_expense_tables(&transaction)?;
    create_recurring_expense_tables(&transaction)?;
    create_mileage_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// How many times [with_lock_retry] attempts a query before giving up.
const LOCK_RETRY_ATTEMPTS: u32 = 5;

/// The delay before the first retry. Doubles on each subsequent attempt.
const LOCK_RETRY_BASE_DELAY: Duration = Duration::from_millis(25);

/// Run `query` against the shared connection, retrying with exponential
/// backoff while SQLite reports the database as locked.
///
/// Other errors are returned immediately. A poisoned connection mutex is
/// reported as [Error::DatabaseLocked] without retrying, since a poisoned
/// lock cannot recover.
pub async fn with_lock_retry<T>(
    db_connection: &Arc<Mutex<Connection>>,
    query: impl Fn(&Connection) -> Result<T, Error>,
) -> Result<T, Error> {
    let mut delay = LOCK_RETRY_BASE_DELAY;

    for attempt in 0..LOCK_RETRY_ATTEMPTS {
        let result = {
            let connection = match db_connection.lock() {
                Ok(connection) => connection,
                Err(error) => {
                    tracing::error!("could not acquire database lock: {error}");
                    return Err(Error::DatabaseLocked);
                }
            };

            query(&connection)
        };

        match result {
            Err(Error::DatabaseLocked) if attempt + 1 < LOCK_RETRY_ATTEMPTS => {
                tracing::warn!(
                    "database is locked, retrying in {}ms (attempt {})",
                    delay.as_millis(),
                    attempt + 1
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            result => return result,
        }
    }

    Err(Error::DatabaseLocked)
}
