//! The IRS standard mileage rate table.

use rusqlite::Connection;

use crate::Error;

/// The published IRS standard mileage rates, dollars per business mile.
const SEED_RATES: [(i32, f64); 3] = [(2023, 0.655), (2024, 0.67), (2025, 0.70)];

/// Create the rate table and seed it with the published rates.
///
/// Seeding uses `INSERT OR IGNORE` so rates that were updated by hand are
/// not overwritten on restart.
pub fn create_rate_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS irs_mileage_rate (
            year INTEGER PRIMARY KEY,
            rate REAL NOT NULL
        );",
    )?;

    for (year, rate) in SEED_RATES {
        connection.execute(
            "INSERT OR IGNORE INTO irs_mileage_rate (year, rate) VALUES (?1, ?2)",
            (year, rate),
        )?;
    }

    Ok(())
}

/// Look up the rate for `year`.
///
/// Years without a published rate fall back to the most recent year at or
/// before them, so a log dated early January still computes a deduction
/// before the new year's rate is announced. Years before the first seeded
/// rate use the earliest rate on record.
pub fn get_rate_for_year(year: i32, connection: &Connection) -> Result<f64, Error> {
    let at_or_before: Result<f64, _> = connection
        .prepare(
            "SELECT rate FROM irs_mileage_rate WHERE year <= ?1 ORDER BY year DESC LIMIT 1",
        )?
        .query_row([year], |row| row.get(0));

    match at_or_before {
        Ok(rate) => Ok(rate),
        Err(rusqlite::Error::QueryReturnedNoRows) => connection
            .prepare("SELECT rate FROM irs_mileage_rate ORDER BY year ASC LIMIT 1")?
            .query_row([], |row| row.get(0))
            .map_err(|error| error.into()),
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{create_rate_table, get_rate_for_year};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_rate_table(&connection).expect("Could not create rate table");
        connection
    }

    #[test]
    fn known_years_use_their_published_rate() {
        let connection = get_test_connection();

        assert_eq!(get_rate_for_year(2023, &connection), Ok(0.655));
        assert_eq!(get_rate_for_year(2024, &connection), Ok(0.67));
        assert_eq!(get_rate_for_year(2025, &connection), Ok(0.70));
    }

    #[test]
    fn future_years_fall_back_to_the_most_recent_rate() {
        let connection = get_test_connection();

        assert_eq!(get_rate_for_year(2030, &connection), Ok(0.70));
    }

    #[test]
    fn years_before_the_first_rate_use_the_earliest_rate() {
        let connection = get_test_connection();

        assert_eq!(get_rate_for_year(2020, &connection), Ok(0.655));
    }

    #[test]
    fn seeding_does_not_overwrite_manual_changes() {
        let connection = get_test_connection();
        connection
            .execute("UPDATE irs_mileage_rate SET rate = 0.71 WHERE year = 2025", [])
            .unwrap();

        create_rate_table(&connection).expect("Could not re-run table creation");

        assert_eq!(get_rate_for_year(2025, &connection), Ok(0.71));
    }
}
