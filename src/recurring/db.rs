//! Database operations for recurring expense templates.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    recurring::{RecurringExpense, RecurringExpenseData, RecurringExpenseId},
    tag::{Tag, TagId, TagName, resolve_tag_names},
    user::UserId,
};

/// Create the recurring expense table and its tag junction table.
pub fn create_recurring_expense_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS recurring_expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            recipient TEXT NOT NULL,
            amount REAL NOT NULL,
            day_of_month INTEGER NOT NULL,
            start_year INTEGER NOT NULL,
            start_month INTEGER NOT NULL,
            end_year INTEGER,
            end_month INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_recurring_expense_user_id
            ON recurring_expense(user_id);

        CREATE TABLE IF NOT EXISTS recurring_expense_tag (
            recurring_expense_id INTEGER NOT NULL
                REFERENCES recurring_expense(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES user_tag(id) ON DELETE CASCADE,
            PRIMARY KEY (recurring_expense_id, tag_id)
        );",
    )?;

    Ok(())
}

/// Create a recurring expense template for `user_id`.
pub fn create_recurring_expense(
    user_id: UserId,
    data: RecurringExpenseData,
    connection: &Connection,
) -> Result<RecurringExpense, Error> {
    let tag_ids = resolve_tag_names(user_id, &data.tags, connection)?;

    let id: RecurringExpenseId = connection
        .prepare(
            "INSERT INTO recurring_expense
                (user_id, description, recipient, amount, day_of_month,
                 start_year, start_month, end_year, end_month)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                &data.description,
                &data.recipient,
                data.amount,
                data.day_of_month,
                data.start_year,
                data.start_month,
                data.end_year,
                data.end_month,
            ),
            |row| row.get(0),
        )?;

    set_recurring_expense_tags(id, &tag_ids, connection)?;

    get_recurring_expense(user_id, id, connection)
}

/// Retrieve a single recurring expense template owned by `user_id`.
pub fn get_recurring_expense(
    user_id: UserId,
    id: RecurringExpenseId,
    connection: &Connection,
) -> Result<RecurringExpense, Error> {
    let mut template = connection
        .prepare(
            "SELECT id, description, recipient, amount, day_of_month,
                start_year, start_month, end_year, end_month
            FROM recurring_expense WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_row)?;

    template.tags = get_recurring_expense_tags(id, connection)?;

    Ok(template)
}

/// Retrieve all of a user's recurring expense templates, newest first.
pub fn list_recurring_expenses(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<RecurringExpense>, Error> {
    let mut templates: Vec<RecurringExpense> = connection
        .prepare(
            "SELECT id, description, recipient, amount, day_of_month,
                start_year, start_month, end_year, end_month
            FROM recurring_expense WHERE user_id = ?1 ORDER BY id DESC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .collect::<Result<_, _>>()?;

    for template in &mut templates {
        template.tags = get_recurring_expense_tags(template.id, connection)?;
    }

    Ok(templates)
}

/// Update a template's fields and replace its tags.
///
/// Because instances are expanded at read time, an update retroactively
/// changes every instance the template has ever produced.
pub fn update_recurring_expense(
    user_id: UserId,
    id: RecurringExpenseId,
    data: RecurringExpenseData,
    connection: &Connection,
) -> Result<RecurringExpense, Error> {
    let tag_ids = resolve_tag_names(user_id, &data.tags, connection)?;

    let rows_affected = connection.execute(
        "UPDATE recurring_expense
        SET description = ?1, recipient = ?2, amount = ?3, day_of_month = ?4,
            start_year = ?5, start_month = ?6, end_year = ?7, end_month = ?8
        WHERE id = ?9 AND user_id = ?10",
        (
            &data.description,
            &data.recipient,
            data.amount,
            data.day_of_month,
            data.start_year,
            data.start_month,
            data.end_year,
            data.end_month,
            id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecurringExpense);
    }

    set_recurring_expense_tags(id, &tag_ids, connection)?;

    get_recurring_expense(user_id, id, connection)
}

/// Delete a template by ID. Every instance it produced disappears with it.
pub fn delete_recurring_expense(
    user_id: UserId,
    id: RecurringExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM recurring_expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecurringExpense);
    }

    Ok(())
}

fn get_recurring_expense_tags(
    id: RecurringExpenseId,
    connection: &Connection,
) -> Result<Vec<Tag>, Error> {
    connection
        .prepare(
            "SELECT user_tag.id, user_tag.name FROM user_tag
            INNER JOIN recurring_expense_tag
                ON recurring_expense_tag.tag_id = user_tag.id
            WHERE recurring_expense_tag.recurring_expense_id = ?1
            ORDER BY user_tag.name ASC",
        )?
        .query_map([id], |row| {
            let name: String = row.get(1)?;
            Ok(Tag {
                id: row.get(0)?,
                name: TagName::new_unchecked(&name),
            })
        })?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

fn set_recurring_expense_tags(
    id: RecurringExpenseId,
    tag_ids: &[TagId],
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM recurring_expense_tag WHERE recurring_expense_id = ?1",
        [id],
    )?;

    for tag_id in tag_ids {
        connection.execute(
            "INSERT INTO recurring_expense_tag (recurring_expense_id, tag_id) VALUES (?1, ?2)",
            (id, tag_id),
        )?;
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<RecurringExpense, rusqlite::Error> {
    Ok(RecurringExpense {
        id: row.get(0)?,
        description: row.get(1)?,
        recipient: row.get(2)?,
        amount: row.get(3)?,
        day_of_month: row.get(4)?,
        start_year: row.get(5)?,
        start_month: row.get(6)?,
        end_year: row.get(7)?,
        end_month: row.get(8)?,
        tags: Vec::new(),
    })
}
