use axum::{Extension, extract::State};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::AuthenticatedUser,
    db::lock_connection,
    expense::{
        Expense, ExpenseState,
        core::{count_expenses, get_expense_page},
    },
    extract::ApiQuery,
    pagination::PageQuery,
    response::ApiResponse,
};

/// One page of a user's entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePage {
    /// The entries on the page, newest first.
    pub expenses: Vec<Expense>,
    /// The one-based number of the page.
    pub current_page: u64,
    /// The number of pages at the requested page size.
    pub total_pages: u64,
    /// The number of entries the user owns.
    pub total_expenses: u64,
}

/// A route handler for paging through the caller's entries, newest first.
///
/// Missing or invalid `page` and `limit` query parameters fall back to the
/// configured defaults.
pub async fn get_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<ApiResponse<ExpensePage>, Error> {
    let page = query.resolve(&state.pagination_config);
    let connection = lock_connection(&state.db_connection)?;

    let expenses = get_expense_page(user.id, page.limit(), page.offset(), &connection)?;
    let total_expenses = count_expenses(user.id, &connection)? as u64;

    Ok(ApiResponse::ok(ExpensePage {
        expenses,
        current_page: page.number,
        total_pages: page.count(total_expenses),
        total_expenses,
    }))
}
