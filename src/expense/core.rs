//! Defines the core data models and database queries for income and expense entries.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::ExpenseId,
    db::read_count,
    tax::{TaxType, calculate_total},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether an entry is money earned or money spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl ExpenseType {
    /// The name used for the type in the database and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseType::Income => "income",
            ExpenseType::Expense => "expense",
        }
    }
}

impl Display for ExpenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExpenseType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(ExpenseType::Income),
            "expense" => Ok(ExpenseType::Expense),
            other => Err(format!("invalid entry type \"{other}\"")),
        }
    }
}

impl ToSql for ExpenseType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ExpenseType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        ExpenseType::try_from(value.as_str()?).map_err(|error| FromSqlError::Other(error.into()))
    }
}

/// An income or expense entry owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the entry.
    pub id: ExpenseId,
    /// What the money was earned or spent on.
    pub description: String,
    /// The amount before tax, always greater than zero.
    pub amount: f64,
    /// Whether the entry is income or an expense.
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
    /// How `tax_amount` is applied to `amount`.
    pub tax_type: TaxType,
    /// The flat tax or tax percentage, never negative.
    pub tax_amount: f64,
    /// The amount after tax, see [calculate_total].
    pub total_amount: f64,
    /// The user that owns the entry.
    pub user_id: UserID,
    /// When the entry was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the entry was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The validated fields of an entry that a client may set.
///
/// Use [crate::expense::ExpenseForm] to build these from a request body.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDetails {
    /// What the money was earned or spent on, trimmed and not empty.
    pub description: String,
    /// The amount before tax, greater than zero.
    pub amount: f64,
    /// Whether the entry is income or an expense.
    pub expense_type: ExpenseType,
    /// How `tax_amount` is applied to `amount`.
    pub tax_type: TaxType,
    /// The flat tax or tax percentage, not negative.
    pub tax_amount: f64,
}

impl ExpenseDetails {
    /// The amount after tax.
    pub fn total_amount(&self) -> f64 {
        calculate_total(self.amount, self.tax_type, self.tax_amount)
    }
}

/// Which entries a query may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseScope {
    /// Only entries owned by the user.
    OwnedBy(UserID),
    /// Any entry, regardless of owner.
    Any,
}

impl ExpenseScope {
    fn owner_id(&self) -> Option<i64> {
        match self {
            ExpenseScope::OwnedBy(user_id) => Some(user_id.as_i64()),
            ExpenseScope::Any => None,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table.
///
/// # Errors
/// Returns an error if the table could not be created.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                tax_type TEXT NOT NULL DEFAULT 'flat' CHECK (tax_type IN ('flat', 'percentage')),
                tax_amount REAL NOT NULL DEFAULT 0 CHECK (tax_amount >= 0),
                total_amount REAL NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // The owner-scoped listing filters on user_id and sorts by created_at.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_created ON expense(user_id, created_at)",
        (),
    )?;

    Ok(())
}

const EXPENSE_COLUMNS: &str = "id, description, amount, type, tax_type, tax_amount, \
     total_amount, user_id, created_at, updated_at";

/// Map a database row to an [Expense].
///
/// The row must select the columns in the order of `EXPENSE_COLUMNS`,
/// starting at index `offset`.
pub fn map_expense_row(row: &Row, offset: usize) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(offset)?,
        description: row.get(offset + 1)?,
        amount: row.get(offset + 2)?,
        expense_type: row.get(offset + 3)?,
        tax_type: row.get(offset + 4)?,
        tax_amount: row.get(offset + 5)?,
        total_amount: row.get(offset + 6)?,
        user_id: UserID::new(row.get(offset + 7)?),
        created_at: row.get(offset + 8)?,
        updated_at: row.get(offset + 9)?,
    })
}

/// The columns of an expense prefixed with `table.`, for use in joins.
pub fn qualified_expense_columns(table: &str) -> String {
    EXPENSE_COLUMNS
        .split(", ")
        .map(|column| format!("{table}.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insert a new entry owned by `user_id`.
///
/// The total is calculated from `details`.
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if `user_id` does not refer to a user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    details: &ExpenseDetails,
    user_id: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO expense
                (description, amount, type, tax_type, tax_amount, total_amount, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                &details.description,
                details.amount,
                details.expense_type,
                details.tax_type,
                details.tax_amount,
                details.total_amount(),
                user_id.as_i64(),
                now,
                now,
            ),
            |row| map_expense_row(row, 0),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::UserNotFound,
            error => error.into(),
        })
}

/// Retrieve the entry `id` if it is within `scope`.
///
/// # Errors
/// This function will return a:
/// - [Error::ExpenseNotFound] if `id` does not refer to an entry within `scope`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(
    id: ExpenseId,
    scope: ExpenseScope,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)"
        ))?
        .query_row((id, scope.owner_id()), |row| map_expense_row(row, 0))
        .map_err(not_found_as_expense)
}

/// Retrieve one page of the entries owned by `user_id`, newest first.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn get_expense_page(
    user_id: UserID,
    limit: i64,
    offset: i64,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3"
        ))?
        .query_map((user_id.as_i64(), limit, offset), |row| {
            map_expense_row(row, 0)
        })?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Retrieve every entry owned by `user_id`, newest first.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn get_expenses_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([user_id.as_i64()], |row| map_expense_row(row, 0))?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Count the entries owned by `user_id`.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn count_expenses(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM expense WHERE user_id = ?1",
            [user_id.as_i64()],
            read_count,
        )
        .map_err(Error::from)
}

/// Replace every client editable field of the entry `id` with `details`.
///
/// The total is recalculated and the update time is refreshed. The owner and
/// creation time are kept.
///
/// # Errors
/// This function will return a:
/// - [Error::ExpenseNotFound] if `id` does not refer to an entry within `scope`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    scope: ExpenseScope,
    details: &ExpenseDetails,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "UPDATE expense
             SET description = ?1, amount = ?2, type = ?3, tax_type = ?4,
                 tax_amount = ?5, total_amount = ?6, updated_at = ?7
             WHERE id = ?8 AND (?9 IS NULL OR user_id = ?9)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                &details.description,
                details.amount,
                details.expense_type,
                details.tax_type,
                details.tax_amount,
                details.total_amount(),
                OffsetDateTime::now_utc(),
                id,
                scope.owner_id(),
            ),
            |row| map_expense_row(row, 0),
        )
        .map_err(not_found_as_expense)
}

type RowsAffected = usize;

/// Delete the entry `id` if it is within `scope`.
///
/// # Errors
/// This function will return a:
/// - [Error::ExpenseNotFound] if `id` does not refer to an entry within `scope`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(
    id: ExpenseId,
    scope: ExpenseScope,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected: RowsAffected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)",
        (id, scope.owner_id()),
    )?;

    match rows_affected {
        0 => Err(Error::ExpenseNotFound),
        _ => Ok(()),
    }
}

fn not_found_as_expense(error: rusqlite::Error) -> Error {
    match Error::from(error) {
        Error::NotFound => Error::ExpenseNotFound,
        error => error,
    }
}
