//! Database operations for tags.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    tag::{Tag, TagId, TagName},
    user::UserId,
};

/// Create a tag for `user_id` and return it with its generated ID.
///
/// # Errors
/// Returns [Error::DuplicateTagName] if the user already has a tag with this
/// name.
pub fn create_tag(user_id: UserId, name: TagName, connection: &Connection) -> Result<Tag, Error> {
    let result = connection.execute(
        "INSERT INTO user_tag (user_id, name) VALUES (?1, ?2);",
        (user_id.as_i64(), name.as_ref()),
    );

    match result {
        Ok(_) => Ok(Tag {
            id: connection.last_insert_rowid(),
            name,
        }),
        Err(rusqlite::Error::SqliteFailure(sql_error, _))
            if sql_error.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(Error::DuplicateTagName(name.to_string()))
        }
        Err(error) => Err(error.into()),
    }
}

/// Retrieve a single tag owned by `user_id`.
pub fn get_tag(user_id: UserId, tag_id: TagId, connection: &Connection) -> Result<Tag, Error> {
    connection
        .prepare("SELECT id, name FROM user_tag WHERE id = :id AND user_id = :user_id;")?
        .query_row(
            &[(":id", &tag_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of a user's tags ordered alphabetically by name.
pub fn get_all_tags(user_id: UserId, connection: &Connection) -> Result<Vec<Tag>, Error> {
    connection
        .prepare("SELECT id, name FROM user_tag WHERE user_id = :user_id ORDER BY name ASC;")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

/// Update a tag's name. Returns an error if the user does not own such a tag.
pub fn update_tag(
    user_id: UserId,
    tag_id: TagId,
    new_name: TagName,
    connection: &Connection,
) -> Result<(), Error> {
    let result = connection.execute(
        "UPDATE user_tag SET name = ?1 WHERE id = ?2 AND user_id = ?3",
        (new_name.as_ref(), tag_id, user_id.as_i64()),
    );

    match result {
        Ok(0) => Err(Error::UpdateMissingTag),
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(sql_error, _))
            if sql_error.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(Error::DuplicateTagName(new_name.to_string()))
        }
        Err(error) => Err(error.into()),
    }
}

/// Delete a tag by ID. Returns an error if the user does not own such a tag.
///
/// Junction rows referencing the tag are removed by cascade, the tagged
/// expenses and logs themselves are untouched.
pub fn delete_tag(user_id: UserId, tag_id: TagId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM user_tag WHERE id = ?1 AND user_id = ?2",
        (tag_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTag);
    }

    Ok(())
}

/// Map tag names to tag IDs for `user_id`, creating any that do not exist yet.
///
/// This backs the attach-by-name behaviour of the expense, recurring expense
/// and mileage log endpoints. Blank names are skipped rather than rejected so
/// a trailing separator in imported data does not fail the whole row.
pub fn resolve_tag_names(
    user_id: UserId,
    names: &[String],
    connection: &Connection,
) -> Result<Vec<TagId>, Error> {
    let mut tag_ids = Vec::with_capacity(names.len());

    for raw_name in names {
        let name = match TagName::new(raw_name) {
            Ok(name) => name,
            Err(Error::EmptyTagName) => continue,
            Err(error) => return Err(error),
        };

        let existing: Result<TagId, _> = connection
            .prepare("SELECT id FROM user_tag WHERE user_id = ?1 AND name = ?2;")?
            .query_row((user_id.as_i64(), name.as_ref()), |row| row.get(0));

        let tag_id = match existing {
            Ok(id) => id,
            Err(rusqlite::Error::QueryReturnedNoRows) => create_tag(user_id, name, connection)?.id,
            Err(error) => return Err(error.into()),
        };

        if !tag_ids.contains(&tag_id) {
            tag_ids.push(tag_id);
        }
    }

    Ok(tag_ids)
}

/// Initialize the tag table and indexes.
pub fn create_tag_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_tag (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE(user_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_user_tag_user_id ON user_tag(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Tag, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = TagName::new_unchecked(&raw_name);

    Ok(Tag { id, name })
}


#[cfg(test)]
mod tag_query_tests {
    use std::collections::HashSet;

    use rusqlite::Connection;

    use crate::{
        Error,
        tag::{TagName, create_tag, get_all_tags, get_tag, resolve_tag_names, update_tag},
        user::{GoogleProfile, UserId, create_user_table, get_or_create_user},
    };

    use super::{create_tag_table, delete_tag};

    fn get_test_db_connection() -> (Connection, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .pragma_update(None, "foreign_keys", "ON")
            .unwrap();
        create_user_table(&connection).expect("Could not create user table");
        create_tag_table(&connection).expect("Could not create tag table");

        let user = get_or_create_user(
            &GoogleProfile {
                google_id: "12345".to_owned(),
                email: "test@test.com".to_owned(),
                name: None,
                picture: None,
            },
            &connection,
        )
        .expect("Could not create test user");

        (connection, user.id)
    }

    #[test]
    fn create_tag_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let name = TagName::new("Terrifically a tag").unwrap();

        let tag = create_tag(user_id, name.clone(), &connection);

        let got_tag = tag.expect("Could not create tag");
        assert!(got_tag.id > 0);
        assert_eq!(got_tag.name, name);
    }

    #[test]
    fn create_tag_fails_on_duplicate_name() {
        let (connection, user_id) = get_test_db_connection();
        let name = TagName::new_unchecked("Materials");
        create_tag(user_id, name.clone(), &connection).expect("Could not create test tag");

        let result = create_tag(user_id, name, &connection);

        assert_eq!(result, Err(Error::DuplicateTagName("Materials".to_owned())));
    }

    #[test]
    fn get_tag_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let name = TagName::new_unchecked("Foo");
        let inserted_tag =
            create_tag(user_id, name, &connection).expect("Could not create test tag");

        let selected_tag = get_tag(user_id, inserted_tag.id, &connection);

        assert_eq!(Ok(inserted_tag), selected_tag);
    }

    #[test]
    fn get_tag_with_invalid_id_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();
        let inserted_tag = create_tag(user_id, TagName::new_unchecked("Foo"), &connection)
            .expect("Could not create test tag");

        let selected_tag = get_tag(user_id, inserted_tag.id + 123, &connection);

        assert_eq!(selected_tag, Err(Error::NotFound));
    }

    #[test]
    fn get_tag_fails_on_other_users_tag() {
        let (connection, user_id) = get_test_db_connection();
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
        let tag = create_tag(other_user.id, TagName::new_unchecked("Secret"), &connection)
            .expect("Could not create test tag");

        let result = get_tag(user_id, tag.id, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn test_get_all_tags() {
        let (connection, user_id) = get_test_db_connection();

        let inserted_tags = HashSet::from([
            create_tag(user_id, TagName::new_unchecked("Foo"), &connection)
                .expect("Could not create test tag"),
            create_tag(user_id, TagName::new_unchecked("Bar"), &connection)
                .expect("Could not create test tag"),
        ]);

        let selected_tags = get_all_tags(user_id, &connection).expect("Could not get all tags");
        let selected_tags = HashSet::from_iter(selected_tags);

        assert_eq!(inserted_tags, selected_tags);
    }

    #[test]
    fn update_tag_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let original_name = TagName::new_unchecked("Original");
        let tag = create_tag(user_id, original_name, &connection)
            .expect("Could not create test tag");

        let new_name = TagName::new_unchecked("Updated");
        let result = update_tag(user_id, tag.id, new_name.clone(), &connection);

        assert!(result.is_ok());

        let updated_tag = get_tag(user_id, tag.id, &connection).expect("Could not get updated tag");
        assert_eq!(updated_tag.name, new_name);
        assert_eq!(updated_tag.id, tag.id);
    }

    #[test]
    fn update_tag_with_invalid_id_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();
        let invalid_id = 999999;
        let new_name = TagName::new_unchecked("Updated");

        let result = update_tag(user_id, invalid_id, new_name, &connection);

        assert_eq!(result, Err(Error::UpdateMissingTag));
    }

    #[test]
    fn delete_tag_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let name = TagName::new_unchecked("ToDelete");
        let tag = create_tag(user_id, name, &connection).expect("Could not create test tag");

        let result = delete_tag(user_id, tag.id, &connection);

        assert!(result.is_ok());

        let get_result = get_tag(user_id, tag.id, &connection);
        assert_eq!(get_result, Err(Error::NotFound));
    }

    #[test]
    fn delete_tag_with_invalid_id_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();
        let invalid_id = 999999;

        let result = delete_tag(user_id, invalid_id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingTag));
    }

    #[test]
    fn resolve_tag_names_creates_missing_tags() {
        let (connection, user_id) = get_test_db_connection();
        let existing = create_tag(user_id, TagName::new_unchecked("Fuel"), &connection)
            .expect("Could not create test tag");

        let tag_ids = resolve_tag_names(
            user_id,
            &["Fuel".to_owned(), "Materials".to_owned()],
            &connection,
        )
        .expect("Could not resolve tag names");

        assert_eq!(tag_ids.len(), 2);
        assert_eq!(tag_ids[0], existing.id);

        let all_tags = get_all_tags(user_id, &connection).unwrap();
        assert_eq!(all_tags.len(), 2);
    }

    #[test]
    fn resolve_tag_names_skips_blank_and_duplicate_names() {
        let (connection, user_id) = get_test_db_connection();

        let tag_ids = resolve_tag_names(
            user_id,
            &[
                "Fuel".to_owned(),
                "  ".to_owned(),
                "Fuel".to_owned(),
                "".to_owned(),
            ],
            &connection,
        )
        .expect("Could not resolve tag names");

        assert_eq!(tag_ids.len(), 1);
    }
}
