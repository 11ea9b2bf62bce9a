//! Database operations for categories.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName},
    db::get_timestamp,
};

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if the name is already in use.
pub fn create_category(
    name: CategoryName,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Category, Error> {
    let created_at = created_at.replace_nanosecond(0).unwrap_or(created_at);

    connection.execute(
        "INSERT INTO categories (name, created_at) VALUES (?1, ?2);",
        (name.as_ref(), created_at.unix_timestamp()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        created_at,
    })
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, created_at FROM categories WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories, newest first.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, created_at FROM categories ORDER BY created_at DESC, id DESC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Rename a category. Returns an error if the category doesn't exist.
pub fn update_category(
    category_id: CategoryId,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE categories SET name = ?1 WHERE id = ?2",
        (new_name.as_ref(), category_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category by ID and move its transactions to uncategorized.
///
/// Returns the number of transactions that became uncategorized.
///
/// # Errors
///
/// Returns [Error::DeleteMissingCategory] if the category doesn't exist, in
/// which case no transaction is changed.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<usize, Error> {
    let transaction = connection.unchecked_transaction()?;

    let uncategorized = transaction.execute(
        "UPDATE transactions SET category_id = NULL WHERE category_id = ?1",
        [category_id],
    )?;
    let rows_affected =
        transaction.execute("DELETE FROM categories WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    transaction.commit()?;

    Ok(uncategorized)
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let created_at = get_timestamp(row, 2)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        created_at,
    })
}
