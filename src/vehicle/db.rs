//! Database operations for vehicles.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    user::UserId,
    vehicle::{Vehicle, VehicleData, VehicleId},
};

/// Initialize the vehicle table.
pub fn create_vehicle_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS vehicle (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            make TEXT,
            model TEXT,
            year INTEGER,
            description TEXT,
            last_odometer INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_vehicle_user_id ON vehicle(user_id);",
    )?;

    Ok(())
}

/// Create a vehicle for `user_id` and return it with its generated ID.
pub fn create_vehicle(
    user_id: UserId,
    data: VehicleData,
    connection: &Connection,
) -> Result<Vehicle, Error> {
    let id: VehicleId = connection
        .prepare(
            "INSERT INTO vehicle (user_id, name, make, model, year, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                &data.name,
                &data.make,
                &data.model,
                data.year,
                &data.description,
            ),
            |row| row.get(0),
        )?;

    Ok(Vehicle {
        id,
        name: data.name,
        make: data.make,
        model: data.model,
        year: data.year,
        description: data.description,
        last_odometer: None,
    })
}

/// Retrieve a single vehicle owned by `user_id`.
pub fn get_vehicle(
    user_id: UserId,
    vehicle_id: VehicleId,
    connection: &Connection,
) -> Result<Vehicle, Error> {
    connection
        .prepare(
            "SELECT id, name, make, model, year, description, last_odometer
            FROM vehicle WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((vehicle_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of a user's vehicles ordered alphabetically by name.
pub fn list_vehicles(user_id: UserId, connection: &Connection) -> Result<Vec<Vehicle>, Error> {
    connection
        .prepare(
            "SELECT id, name, make, model, year, description, last_odometer
            FROM vehicle WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_vehicle| maybe_vehicle.map_err(|error| error.into()))
        .collect()
}

/// Update a vehicle's descriptive fields. The odometer reading is left
/// alone, only the mileage module moves it.
pub fn update_vehicle(
    user_id: UserId,
    vehicle_id: VehicleId,
    data: VehicleData,
    connection: &Connection,
) -> Result<Vehicle, Error> {
    let rows_affected = connection.execute(
        "UPDATE vehicle SET name = ?1, make = ?2, model = ?3, year = ?4, description = ?5
        WHERE id = ?6 AND user_id = ?7",
        (
            &data.name,
            &data.make,
            &data.model,
            data.year,
            &data.description,
            vehicle_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingVehicle);
    }

    get_vehicle(user_id, vehicle_id, connection)
}

/// Delete a vehicle by ID.
///
/// The vehicle's mileage logs are removed by cascade, and their mirror
/// expenses with them.
pub fn delete_vehicle(
    user_id: UserId,
    vehicle_id: VehicleId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM vehicle WHERE id = ?1 AND user_id = ?2",
        (vehicle_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingVehicle);
    }

    Ok(())
}

/// Advance the vehicle's last odometer reading if `odometer_end` is past it.
///
/// Logs can be entered out of order, so an older trip never winds the
/// reading back.
pub fn advance_odometer(
    user_id: UserId,
    vehicle_id: VehicleId,
    odometer_end: i64,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE vehicle
        SET last_odometer = MAX(COALESCE(last_odometer, 0), ?1)
        WHERE id = ?2 AND user_id = ?3",
        (odometer_end, vehicle_id, user_id.as_i64()),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Vehicle, rusqlite::Error> {
    Ok(Vehicle {
        id: row.get(0)?,
        name: row.get(1)?,
        make: row.get(2)?,
        model: row.get(3)?,
        year: row.get(4)?,
        description: row.get(5)?,
        last_odometer: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        user::{GoogleProfile, UserId, get_or_create_user},
        vehicle::{
            VehicleData, advance_odometer, create_vehicle, delete_vehicle, get_vehicle,
            list_vehicles, update_vehicle,
        },
    };

    fn get_test_connection() -> (Connection, UserId) {
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

        (connection, user.id)
    }

    #[test]
    fn create_and_get_round_trips() {
        let (connection, user_id) = get_test_connection();

        let vehicle = create_vehicle(
            user_id,
            VehicleData::new(
                "Work truck",
                Some("Ford".to_owned()),
                Some("F-150".to_owned()),
                Some(2019),
                Some("The red one".to_owned()),
            )
            .unwrap(),
            &connection,
        )
        .expect("Could not create vehicle");

        assert!(vehicle.id > 0);
        assert_eq!(vehicle.last_odometer, None);

        let fetched = get_vehicle(user_id, vehicle.id, &connection).unwrap();
        assert_eq!(fetched, vehicle);
    }

    #[test]
    fn list_returns_only_own_vehicles() {
        let (connection, user_id) = get_test_connection();
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
        create_vehicle(
            user_id,
            VehicleData::new("Truck", None, None, None, None).unwrap(),
            &connection,
        )
        .unwrap();
        create_vehicle(
            other_user.id,
            VehicleData::new("Van", None, None, None, None).unwrap(),
            &connection,
        )
        .unwrap();

        let vehicles = list_vehicles(user_id, &connection).unwrap();

        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].name, "Truck");
    }

    #[test]
    fn update_missing_vehicle_fails() {
        let (connection, user_id) = get_test_connection();

        let result = update_vehicle(
            user_id,
            999,
            VehicleData::new("Truck", None, None, None, None).unwrap(),
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingVehicle));
    }

    #[test]
    fn delete_missing_vehicle_fails() {
        let (connection, user_id) = get_test_connection();

        let result = delete_vehicle(user_id, 999, &connection);

        assert_eq!(result, Err(Error::DeleteMissingVehicle));
    }

    #[test]
    fn advance_odometer_never_goes_backwards() {
        let (connection, user_id) = get_test_connection();
        let vehicle = create_vehicle(
            user_id,
            VehicleData::new("Truck", None, None, None, None).unwrap(),
            &connection,
        )
        .unwrap();

        advance_odometer(user_id, vehicle.id, 50_000, &connection).unwrap();
        advance_odometer(user_id, vehicle.id, 49_000, &connection).unwrap();

        let vehicle = get_vehicle(user_id, vehicle.id, &connection).unwrap();
        assert_eq!(vehicle.last_odometer, Some(50_000));
    }
}
