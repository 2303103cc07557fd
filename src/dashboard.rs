//! Aggregated totals over a user's entries.
//!
//! The totals are recomputed from every entry the user owns on each request,
//! no running aggregate is stored.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    db::lock_connection,
    expense::{Expense, ExpenseType, get_expenses_for_user},
    response::ApiResponse,
};

/// The state needed for the dashboard summary.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading entries.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The totals shown on a user's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// The sum of the totals of every income entry.
    pub total_income: f64,
    /// The sum of the totals of every expense entry.
    pub total_expense: f64,
    /// Total income minus total expense.
    pub balance: f64,
    /// The number of entries.
    pub total_records: usize,
}

/// Sum the tax-adjusted totals of `expenses` by type.
pub fn summarize(expenses: &[Expense]) -> DashboardSummary {
    let (total_income, total_expense) =
        expenses
            .iter()
            .fold((0.0, 0.0), |(income, expense), entry| match entry.expense_type {
                ExpenseType::Income => (income + entry.total_amount, expense),
                ExpenseType::Expense => (income, expense + entry.total_amount),
            });

    DashboardSummary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        total_records: expenses.len(),
    }
}

/// A route handler for the caller's dashboard totals.
pub async fn get_dashboard_summary(
    State(state): State<DashboardState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<DashboardSummary>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let expenses = get_expenses_for_user(user.id, &connection)?;

    Ok(ApiResponse::ok(summarize(&expenses)))
}
