use axum::{Extension, extract::State};

use crate::{
    Error,
    auth::AuthenticatedUser,
    database_id::ExpenseId,
    db::lock_connection,
    expense::{Expense, ExpenseForm, ExpenseScope, ExpenseState, update_expense},
    extract::{ApiJson, ApiPath},
    response::ApiResponse,
};

/// A route handler for replacing one of the caller's entries.
///
/// Every client editable field is overwritten with the request body and the
/// total is recalculated.
pub async fn edit_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(expense_id): ApiPath<ExpenseId>,
    ApiJson(form): ApiJson<ExpenseForm>,
) -> Result<ApiResponse<Expense>, Error> {
    let details = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    update_expense(
        expense_id,
        ExpenseScope::OwnedBy(user.id),
        &details,
        &connection,
    )
    .map(ApiResponse::ok)
}
