use axum::{Extension, extract::State, http::StatusCode};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    admin::AdminState,
    auth::AuthenticatedUser,
    database_id::ExpenseId,
    db::lock_connection,
    expense::{
        Expense, ExpenseForm, ExpenseScope, create_expense, delete_expense, map_expense_row,
        qualified_expense_columns, update_expense,
    },
    extract::{ApiJson, ApiPath},
    response::ApiResponse,
    user::UserID,
};

/// The owner of an entry as shown to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseOwner {
    /// The owner's ID.
    pub id: UserID,
    /// The owner's display name.
    pub name: String,
    /// The owner's email.
    pub email: String,
}

/// An entry together with its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseWithOwner {
    /// The entry.
    #[serde(flatten)]
    pub expense: Expense,
    /// The user that owns the entry.
    pub user: ExpenseOwner,
}

/// Every entry of every user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseList {
    /// The entries, newest first.
    pub expenses: Vec<ExpenseWithOwner>,
}

fn select_expenses_with_owners(filter: &str) -> String {
    format!(
        "SELECT {}, user.id, user.name, user.email
         FROM expense INNER JOIN user ON user.id = expense.user_id
         {filter}
         ORDER BY expense.created_at DESC, expense.id DESC",
        qualified_expense_columns("expense")
    )
}

/// The number of columns [map_expense_row] reads.
const EXPENSE_COLUMN_COUNT: usize = 10;

fn map_expense_with_owner_row(row: &Row) -> Result<ExpenseWithOwner, rusqlite::Error> {
    Ok(ExpenseWithOwner {
        expense: map_expense_row(row, 0)?,
        user: ExpenseOwner {
            id: UserID::new(row.get(EXPENSE_COLUMN_COUNT)?),
            name: row.get(EXPENSE_COLUMN_COUNT + 1)?,
            email: row.get(EXPENSE_COLUMN_COUNT + 2)?,
        },
    })
}

/// Get every entry with its owner, newest first.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn get_all_expenses_with_owners(
    connection: &Connection,
) -> Result<Vec<ExpenseWithOwner>, Error> {
    connection
        .prepare(&select_expenses_with_owners(""))?
        .query_map([], map_expense_with_owner_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

fn get_expense_with_owner(
    id: ExpenseId,
    connection: &Connection,
) -> Result<ExpenseWithOwner, Error> {
    connection
        .prepare(&select_expenses_with_owners("WHERE expense.id = ?1"))?
        .query_row([id], map_expense_with_owner_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::ExpenseNotFound,
            error => error,
        })
}

/// A route handler for listing every entry of every user.
pub async fn list_all_expenses_endpoint(
    State(state): State<AdminState>,
) -> Result<ApiResponse<ExpenseList>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_expenses_with_owners(&connection)
        .map(|expenses| ApiResponse::ok(ExpenseList { expenses }))
}

/// The body of a request to create an entry on behalf of a user.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminExpenseForm {
    user_id: Option<i64>,
    #[serde(flatten)]
    expense: ExpenseForm,
}

/// A route handler for creating an entry owned by any user.
pub async fn create_any_expense_endpoint(
    State(state): State<AdminState>,
    Extension(admin): Extension<AuthenticatedUser>,
    ApiJson(form): ApiJson<AdminExpenseForm>,
) -> Result<(StatusCode, ApiResponse<Expense>), Error> {
    let user_id = form
        .user_id
        .map(UserID::new)
        .ok_or_else(|| Error::Validation("User ID is required".to_owned()))?;
    let details = form.expense.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    let expense = create_expense(&details, user_id, &connection)?;
    tracing::info!(
        "admin {} created expense {} for user {user_id}",
        admin.id,
        expense.id
    );

    Ok((StatusCode::CREATED, ApiResponse::ok(expense)))
}

/// A route handler for replacing any user's entry.
///
/// The total is recalculated from the request body, the same as when owners
/// edit their own entries.
pub async fn edit_any_expense_endpoint(
    State(state): State<AdminState>,
    Extension(admin): Extension<AuthenticatedUser>,
    ApiPath(expense_id): ApiPath<ExpenseId>,
    ApiJson(form): ApiJson<ExpenseForm>,
) -> Result<ApiResponse<ExpenseWithOwner>, Error> {
    let details = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    update_expense(expense_id, ExpenseScope::Any, &details, &connection)?;
    tracing::info!("admin {} updated expense {expense_id}", admin.id);

    get_expense_with_owner(expense_id, &connection).map(ApiResponse::ok)
}

/// A route handler for deleting any user's entry.
pub async fn delete_any_expense_endpoint(
    State(state): State<AdminState>,
    Extension(admin): Extension<AuthenticatedUser>,
    ApiPath(expense_id): ApiPath<ExpenseId>,
) -> Result<ApiResponse<()>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_expense(expense_id, ExpenseScope::Any, &connection)?;
    tracing::info!("admin {} deleted expense {expense_id}", admin.id);

    Ok(ApiResponse::message("Expense deleted successfully"))
}
