//! Database operations for expenses.

use rusqlite::{Connection, Row, types::Value};
use time::Date;

use crate::{
    Error,
    expense::{Expense, ExpenseData, ExpenseId},
    mileage::MileageLogId,
    tag::{Tag, TagId, TagName, resolve_tag_names},
    user::UserId,
};

/// Create the expense table and its tag junction table.
pub fn create_expense_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            recipient TEXT NOT NULL,
            amount REAL NOT NULL,
            materials REAL,
            hours REAL,
            mileage_log_id INTEGER UNIQUE REFERENCES mileage_log(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);

        CREATE TABLE IF NOT EXISTS expense_tag (
            expense_id INTEGER NOT NULL REFERENCES expense(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES user_tag(id) ON DELETE CASCADE,
            PRIMARY KEY (expense_id, tag_id)
        );",
    )?;

    Ok(())
}

/// Create an expense for `user_id` and return it with its tags attached.
///
/// Tag names that do not exist yet are created for the user.
pub fn create_expense(
    user_id: UserId,
    data: ExpenseData,
    connection: &Connection,
) -> Result<Expense, Error> {
    let tag_ids = resolve_tag_names(user_id, &data.tags, connection)?;

    let expense_id: ExpenseId = connection
        .prepare(
            "INSERT INTO expense (user_id, date, description, recipient, amount, materials, hours)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                data.date,
                &data.description,
                &data.recipient,
                data.amount,
                data.materials,
                data.hours,
            ),
            |row| row.get(0),
        )?;

    set_expense_tags(expense_id, &tag_ids, connection)?;

    get_expense(user_id, expense_id, connection)
}

/// Retrieve a single expense owned by `user_id`, with its tags.
pub fn get_expense(
    user_id: UserId,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let mut expense = connection
        .prepare(
            "SELECT id, date, description, recipient, amount, materials, hours, mileage_log_id
            FROM expense WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((expense_id, user_id.as_i64()), map_expense_row)?;

    expense.tags = get_expense_tags(expense_id, connection)?;

    Ok(expense)
}

/// Retrieve all of a user's stored expenses in the given date range, newest
/// first.
///
/// Both bounds are inclusive and optional.
pub fn list_expenses(
    user_id: UserId,
    start_date: Option<Date>,
    end_date: Option<Date>,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let mut sql = String::from(
        "SELECT id, date, description, recipient, amount, materials, hours, mileage_log_id
        FROM expense WHERE user_id = ?1",
    );
    let mut params: Vec<Value> = vec![Value::Integer(user_id.as_i64())];

    if let Some(start_date) = start_date {
        params.push(Value::Text(format_date(start_date)));
        sql.push_str(&format!(" AND date >= ?{}", params.len()));
    }

    if let Some(end_date) = end_date {
        params.push(Value::Text(format_date(end_date)));
        sql.push_str(&format!(" AND date <= ?{}", params.len()));
    }

    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut expenses: Vec<Expense> = connection
        .prepare(&sql)?
        .query_map(rusqlite::params_from_iter(params), map_expense_row)?
        .collect::<Result<_, _>>()?;

    for expense in &mut expenses {
        expense.tags = get_expense_tags(expense.id, connection)?;
    }

    Ok(expenses)
}

/// Update an expense's fields and replace its tags.
///
/// # Errors
/// Returns [Error::ExpenseMirrorsMileageLog] if the expense mirrors a mileage
/// log, and [Error::UpdateMissingExpense] if the user does not own such an
/// expense.
pub fn update_expense(
    user_id: UserId,
    expense_id: ExpenseId,
    data: ExpenseData,
    connection: &Connection,
) -> Result<Expense, Error> {
    match get_expense(user_id, expense_id, connection) {
        Ok(expense) if expense.mileage_log_id.is_some() => {
            return Err(Error::ExpenseMirrorsMileageLog);
        }
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::UpdateMissingExpense),
        Err(error) => return Err(error),
    }

    let tag_ids = resolve_tag_names(user_id, &data.tags, connection)?;

    connection.execute(
        "UPDATE expense
        SET date = ?1, description = ?2, recipient = ?3, amount = ?4, materials = ?5, hours = ?6
        WHERE id = ?7 AND user_id = ?8",
        (
            data.date,
            &data.description,
            &data.recipient,
            data.amount,
            data.materials,
            data.hours,
            expense_id,
            user_id.as_i64(),
        ),
    )?;

    set_expense_tags(expense_id, &tag_ids, connection)?;

    get_expense(user_id, expense_id, connection)
}

/// Delete an expense by ID.
///
/// # Errors
/// Returns [Error::ExpenseMirrorsMileageLog] if the expense mirrors a mileage
/// log. Mirror expenses are removed by deleting their mileage log.
pub fn delete_expense(
    user_id: UserId,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    match get_expense(user_id, expense_id, connection) {
        Ok(expense) if expense.mileage_log_id.is_some() => {
            return Err(Error::ExpenseMirrorsMileageLog);
        }
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::DeleteMissingExpense),
        Err(error) => return Err(error),
    }

    connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (expense_id, user_id.as_i64()),
    )?;

    Ok(())
}

/// Insert the expense row that mirrors a mileage log's deduction.
///
/// Only the mileage module calls this, inside the same transaction that
/// writes the log itself.
pub(crate) fn insert_mirror_expense(
    user_id: UserId,
    mileage_log_id: MileageLogId,
    date: Date,
    description: &str,
    amount: f64,
    connection: &Connection,
) -> Result<ExpenseId, Error> {
    connection
        .prepare(
            "INSERT INTO expense
                (user_id, date, description, recipient, amount, mileage_log_id)
            VALUES (?1, ?2, ?3, 'IRS Mileage Deduction', ?4, ?5)
            RETURNING id",
        )?
        .query_row(
            (user_id.as_i64(), date, description, amount, mileage_log_id),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Bring a mileage log's mirror expense in line with the log's current state.
///
/// Only the mileage module calls this, inside the same transaction that
/// updates the log itself.
pub fn update_mirror_expense(
    mileage_log_id: MileageLogId,
    date: Date,
    description: &str,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense SET date = ?1, description = ?2, amount = ?3 WHERE mileage_log_id = ?4",
        (date, description, amount, mileage_log_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn get_expense_tags(expense_id: ExpenseId, connection: &Connection) -> Result<Vec<Tag>, Error> {
    connection
        .prepare(
            "SELECT user_tag.id, user_tag.name FROM user_tag
            INNER JOIN expense_tag ON expense_tag.tag_id = user_tag.id
            WHERE expense_tag.expense_id = ?1
            ORDER BY user_tag.name ASC",
        )?
        .query_map([expense_id], |row| {
            let name: String = row.get(1)?;
            Ok(Tag {
                id: row.get(0)?,
                name: TagName::new_unchecked(&name),
            })
        })?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

fn set_expense_tags(
    expense_id: ExpenseId,
    tag_ids: &[TagId],
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute("DELETE FROM expense_tag WHERE expense_id = ?1", [expense_id])?;

    for tag_id in tag_ids {
        connection.execute(
            "INSERT INTO expense_tag (expense_id, tag_id) VALUES (?1, ?2)",
            (expense_id, tag_id),
        )?;
    }

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        recipient: row.get(3)?,
        amount: row.get(4)?,
        materials: row.get(5)?,
        hours: row.get(6)?,
        mileage_log_id: row.get(7)?,
        tags: Vec::new(),
    })
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}
