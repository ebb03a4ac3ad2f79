//! Database operations for mileage logs, including mirror expense upkeep.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

use crate::{
    Error,
    expense::{insert_mirror_expense, update_mirror_expense},
    mileage::{
        MileageLog, MileageLogData, MileageLogId,
        rates::{create_rate_table, get_rate_for_year},
    },
    tag::{Tag, TagId, TagName, resolve_tag_names},
    user::UserId,
    vehicle::{VehicleId, advance_odometer, get_vehicle},
};

/// Create the mileage log table, its tag junction table, and the IRS rate
/// table.
pub fn create_mileage_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS mileage_log (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            vehicle_id INTEGER NOT NULL REFERENCES vehicle(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            purpose TEXT NOT NULL,
            odometer_start INTEGER NOT NULL,
            odometer_end INTEGER NOT NULL,
            personal_miles INTEGER NOT NULL DEFAULT 0,
            rate REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_mileage_log_user_date ON mileage_log(user_id, date);

        CREATE TABLE IF NOT EXISTS mileage_log_tag (
            mileage_log_id INTEGER NOT NULL REFERENCES mileage_log(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES user_tag(id) ON DELETE CASCADE,
            PRIMARY KEY (mileage_log_id, tag_id)
        );",
    )?;

    create_rate_table(connection)?;

    Ok(())
}

/// Create a mileage log and its mirror expense in one transaction.
///
/// Also advances the vehicle's last odometer reading.
///
/// # Errors
/// Returns [Error::NotFound] if `data.vehicle_id` does not refer to one of
/// the user's vehicles.
pub fn create_mileage_log(
    user_id: UserId,
    data: MileageLogData,
    connection: &Connection,
) -> Result<MileageLog, Error> {
    get_vehicle(user_id, data.vehicle_id, connection)?;

    let tag_ids = resolve_tag_names(user_id, &data.tags, connection)?;
    // Snapshot the rate for the trip's year so later rate-table changes do
    // not silently rewrite past deductions.
    let rate = get_rate_for_year(data.date.year(), connection)?;
    let deduction = round_cents(data.business_miles() as f64 * rate);

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let log_id: MileageLogId = transaction
        .prepare(
            "INSERT INTO mileage_log
                (user_id, vehicle_id, date, purpose, odometer_start, odometer_end,
                 personal_miles, rate)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                data.vehicle_id,
                data.date,
                &data.purpose,
                data.odometer_start,
                data.odometer_end,
                data.personal_miles,
                rate,
            ),
            |row| row.get(0),
        )?;

    insert_mirror_expense(
        user_id,
        log_id,
        data.date,
        &mirror_description(&data.purpose),
        deduction,
        &transaction,
    )?;
    advance_odometer(user_id, data.vehicle_id, data.odometer_end, &transaction)?;
    set_mileage_log_tags(log_id, &tag_ids, &transaction)?;

    transaction.commit()?;

    get_mileage_log(user_id, log_id, connection)
}

/// Retrieve a single mileage log owned by `user_id`, with its derived fields
/// and tags.
pub fn get_mileage_log(
    user_id: UserId,
    log_id: MileageLogId,
    connection: &Connection,
) -> Result<MileageLog, Error> {
    let mut log = connection
        .prepare(
            "SELECT id, vehicle_id, date, purpose, odometer_start, odometer_end,
                personal_miles, rate
            FROM mileage_log WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((log_id, user_id.as_i64()), map_row)?;

    fill_derived_fields(&mut log);
    log.tags = get_mileage_log_tags(log_id, connection)?;

    Ok(log)
}

/// Retrieve a user's mileage logs, newest first, optionally restricted to
/// one vehicle.
pub fn list_mileage_logs(
    user_id: UserId,
    vehicle_id: Option<VehicleId>,
    connection: &Connection,
) -> Result<Vec<MileageLog>, Error> {
    let mut logs: Vec<MileageLog> = match vehicle_id {
        Some(vehicle_id) => connection
            .prepare(
                "SELECT id, vehicle_id, date, purpose, odometer_start, odometer_end,
                    personal_miles, rate
                FROM mileage_log WHERE user_id = ?1 AND vehicle_id = ?2
                ORDER BY date DESC, id DESC",
            )?
            .query_map((user_id.as_i64(), vehicle_id), map_row)?
            .collect::<Result<_, _>>()?,
        None => connection
            .prepare(
                "SELECT id, vehicle_id, date, purpose, odometer_start, odometer_end,
                    personal_miles, rate
                FROM mileage_log WHERE user_id = ?1
                ORDER BY date DESC, id DESC",
            )?
            .query_map([user_id.as_i64()], map_row)?
            .collect::<Result<_, _>>()?,
    };

    for log in &mut logs {
        fill_derived_fields(log);
        log.tags = get_mileage_log_tags(log.id, connection)?;
    }

    Ok(logs)
}

/// Update a mileage log and bring its mirror expense in line, in one
/// transaction.
pub fn update_mileage_log(
    user_id: UserId,
    log_id: MileageLogId,
    data: MileageLogData,
    connection: &Connection,
) -> Result<MileageLog, Error> {
    match get_mileage_log(user_id, log_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::UpdateMissingMileageLog),
        Err(error) => return Err(error),
    }
    get_vehicle(user_id, data.vehicle_id, connection)?;

    let tag_ids = resolve_tag_names(user_id, &data.tags, connection)?;
    // The trip's year may have changed, so the snapshot is taken again.
    let rate = get_rate_for_year(data.date.year(), connection)?;
    let deduction = round_cents(data.business_miles() as f64 * rate);

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "UPDATE mileage_log
        SET vehicle_id = ?1, date = ?2, purpose = ?3,
            odometer_start = ?4, odometer_end = ?5, personal_miles = ?6, rate = ?7
        WHERE id = ?8 AND user_id = ?9",
        (
            data.vehicle_id,
            data.date,
            &data.purpose,
            data.odometer_start,
            data.odometer_end,
            data.personal_miles,
            rate,
            log_id,
            user_id.as_i64(),
        ),
    )?;

    update_mirror_expense(
        log_id,
        data.date,
        &mirror_description(&data.purpose),
        deduction,
        &transaction,
    )?;
    advance_odometer(user_id, data.vehicle_id, data.odometer_end, &transaction)?;
    set_mileage_log_tags(log_id, &tag_ids, &transaction)?;

    transaction.commit()?;

    get_mileage_log(user_id, log_id, connection)
}

/// Delete a mileage log. Its mirror expense is removed by cascade in the
/// same statement.
pub fn delete_mileage_log(
    user_id: UserId,
    log_id: MileageLogId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM mileage_log WHERE id = ?1 AND user_id = ?2",
        (log_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingMileageLog);
    }

    Ok(())
}

fn mirror_description(purpose: &str) -> String {
    format!("Mileage: {purpose}")
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn fill_derived_fields(log: &mut MileageLog) {
    log.business_miles = (log.odometer_end - log.odometer_start) - log.personal_miles;
    log.deduction = round_cents(log.business_miles as f64 * log.rate);
}

fn get_mileage_log_tags(
    log_id: MileageLogId,
    connection: &Connection,
) -> Result<Vec<Tag>, Error> {
    connection
        .prepare(
            "SELECT user_tag.id, user_tag.name FROM user_tag
            INNER JOIN mileage_log_tag ON mileage_log_tag.tag_id = user_tag.id
            WHERE mileage_log_tag.mileage_log_id = ?1
            ORDER BY user_tag.name ASC",
        )?
        .query_map([log_id], |row| {
            let name: String = row.get(1)?;
            Ok(Tag {
                id: row.get(0)?,
                name: TagName::new_unchecked(&name),
            })
        })?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

fn set_mileage_log_tags(
    log_id: MileageLogId,
    tag_ids: &[TagId],
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM mileage_log_tag WHERE mileage_log_id = ?1",
        [log_id],
    )?;

    for tag_id in tag_ids {
        connection.execute(
            "INSERT INTO mileage_log_tag (mileage_log_id, tag_id) VALUES (?1, ?2)",
            (log_id, tag_id),
        )?;
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<MileageLog, rusqlite::Error> {
    Ok(MileageLog {
        id: row.get(0)?,
        vehicle_id: row.get(1)?,
        date: row.get(2)?,
        purpose: row.get(3)?,
        odometer_start: row.get(4)?,
        odometer_end: row.get(5)?,
        personal_miles: row.get(6)?,
        rate: row.get(7)?,
        business_miles: 0,
        deduction: 0.0,
        tags: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        expense::{delete_expense, list_expenses},
        mileage::{
            MileageLogData, create_mileage_log, delete_mileage_log, get_mileage_log,
            list_mileage_logs, update_mileage_log,
        },
        user::{GoogleProfile, UserId, get_or_create_user},
        vehicle::{VehicleData, VehicleId, create_vehicle, get_vehicle},
    };

    fn get_test_connection() -> (Connection, UserId, VehicleId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let user = get_or_create_user(
            &GoogleProfile {
                google_id: "12345".to_owned(),
                email: "test@test.com".to_owned(),
                name: None,
                picture: None,
            },
            &connection,
        )
        .unwrap();

        let vehicle = create_vehicle(
            user.id,
            VehicleData::new("Truck", None, None, None, None).unwrap(),
            &connection,
        )
        .unwrap();

        (connection, user.id, vehicle.id)
    }

    fn material_pickup(vehicle_id: VehicleId) -> MileageLogData {
        MileageLogData::new(
            vehicle_id,
            date!(2025 - 06 - 15),
            "Material pickup",
            50_000,
            50_040,
            0,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn create_computes_the_deduction_from_the_rate_table() {
        let (connection, user_id, vehicle_id) = get_test_connection();

        let log = create_mileage_log(user_id, material_pickup(vehicle_id), &connection)
            .expect("Could not create mileage log");

        assert_eq!(log.business_miles, 40);
        assert_eq!(log.rate, 0.70);
        assert_eq!(log.deduction, 28.0);
    }

    #[test]
    fn create_writes_a_mirror_expense() {
        let (connection, user_id, vehicle_id) = get_test_connection();

        let log = create_mileage_log(user_id, material_pickup(vehicle_id), &connection).unwrap();

        let expenses = list_expenses(user_id, None, None, &connection).unwrap();
        assert_eq!(expenses.len(), 1);

        let mirror = &expenses[0];
        assert_eq!(mirror.description, "Mileage: Material pickup");
        assert_eq!(mirror.recipient, "IRS Mileage Deduction");
        assert_eq!(mirror.amount, log.deduction);
        assert_eq!(mirror.mileage_log_id, Some(log.id));
    }

    #[test]
    fn create_advances_the_vehicle_odometer() {
        let (connection, user_id, vehicle_id) = get_test_connection();

        create_mileage_log(user_id, material_pickup(vehicle_id), &connection).unwrap();

        let vehicle = get_vehicle(user_id, vehicle_id, &connection).unwrap();
        assert_eq!(vehicle.last_odometer, Some(50_040));
    }

    #[test]
    fn create_fails_on_another_users_vehicle() {
        let (connection, _, vehicle_id) = get_test_connection();
        let other_user = get_or_create_user(
            &GoogleProfile {
                google_id: "67890".to_owned(),
                email: "other@test.com".to_owned(),
                name: None,
                picture: None,
            },
            &connection,
        )
        .unwrap();

        let result = create_mileage_log(other_user.id, material_pickup(vehicle_id), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_keeps_the_mirror_expense_in_sync() {
        let (connection, user_id, vehicle_id) = get_test_connection();
        let log = create_mileage_log(user_id, material_pickup(vehicle_id), &connection).unwrap();

        let data = MileageLogData::new(
            vehicle_id,
            date!(2025 - 06 - 16),
            "Dump run",
            50_000,
            50_020,
            0,
            vec![],
        )
        .unwrap();
        let updated = update_mileage_log(user_id, log.id, data, &connection).unwrap();

        assert_eq!(updated.deduction, 14.0);

        let expenses = list_expenses(user_id, None, None, &connection).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].description, "Mileage: Dump run");
        assert_eq!(expenses[0].amount, 14.0);
        assert_eq!(expenses[0].date, date!(2025 - 06 - 16));
    }

    #[test]
    fn update_missing_log_fails() {
        let (connection, user_id, vehicle_id) = get_test_connection();

        let result = update_mileage_log(user_id, 999, material_pickup(vehicle_id), &connection);

        assert_eq!(result, Err(Error::UpdateMissingMileageLog));
    }

    #[test]
    fn delete_removes_the_mirror_expense() {
        let (connection, user_id, vehicle_id) = get_test_connection();
        let log = create_mileage_log(user_id, material_pickup(vehicle_id), &connection).unwrap();

        delete_mileage_log(user_id, log.id, &connection).expect("Could not delete mileage log");

        assert_eq!(
            get_mileage_log(user_id, log.id, &connection),
            Err(Error::NotFound)
        );
        assert!(list_expenses(user_id, None, None, &connection)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn mirror_expense_cannot_be_deleted_directly() {
        let (connection, user_id, vehicle_id) = get_test_connection();
        create_mileage_log(user_id, material_pickup(vehicle_id), &connection).unwrap();

        let mirror_id = list_expenses(user_id, None, None, &connection).unwrap()[0].id;
        let result = delete_expense(user_id, mirror_id, &connection);

        assert_eq!(result, Err(Error::ExpenseMirrorsMileageLog));
    }

    #[test]
    fn list_filters_by_vehicle() {
        let (connection, user_id, vehicle_id) = get_test_connection();
        let second_vehicle = create_vehicle(
            user_id,
            VehicleData::new("Van", None, None, None, None).unwrap(),
            &connection,
        )
        .unwrap();
        create_mileage_log(user_id, material_pickup(vehicle_id), &connection).unwrap();
        create_mileage_log(user_id, material_pickup(second_vehicle.id), &connection).unwrap();

        let all = list_mileage_logs(user_id, None, &connection).unwrap();
        let only_truck = list_mileage_logs(user_id, Some(vehicle_id), &connection).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(only_truck.len(), 1);
        assert_eq!(only_truck[0].vehicle_id, vehicle_id);
    }

    #[test]
    fn rate_changes_do_not_rewrite_existing_logs() {
        let (connection, user_id, vehicle_id) = get_test_connection();
        let log = create_mileage_log(user_id, material_pickup(vehicle_id), &connection).unwrap();

        connection
            .execute(
                "UPDATE irs_mileage_rate SET rate = 0.99 WHERE year = 2025",
                [],
            )
            .unwrap();

        let fetched = get_mileage_log(user_id, log.id, &connection).unwrap();
        assert_eq!(fetched.rate, 0.70);
        assert_eq!(fetched.deduction, 28.0);
    }

    #[test]
    fn rate_is_chosen_by_the_trip_year() {
        let (connection, user_id, vehicle_id) = get_test_connection();

        let data = MileageLogData::new(
            vehicle_id,
            date!(2024 - 03 - 10),
            "Client visit",
            10_000,
            10_100,
            0,
            vec![],
        )
        .unwrap();
        let log = create_mileage_log(user_id, data, &connection).unwrap();

        assert_eq!(log.rate, 0.67);
        assert_eq!(log.deduction, 67.0);
    }
}
