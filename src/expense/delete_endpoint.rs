use axum::{Extension, extract::State};

use crate::{
    Error,
    auth::AuthenticatedUser,
    database_id::ExpenseId,
    db::lock_connection,
    expense::{ExpenseScope, ExpenseState, delete_expense},
    extract::ApiPath,
    response::ApiResponse,
};

/// A route handler for deleting one of the caller's entries.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(expense_id): ApiPath<ExpenseId>,
) -> Result<ApiResponse<()>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_expense(expense_id, ExpenseScope::OwnedBy(user.id), &connection)?;
    tracing::info!("user {} deleted expense {expense_id}", user.id);

    Ok(ApiResponse::message("Expense deleted successfully"))
}
