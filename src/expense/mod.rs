//! Income and expense entries.
//!
//! This module contains everything related to entries:
//! - The `Expense` model and the validated `ExpenseDetails` for writing one
//! - Database functions for storing, querying, and managing entries
//! - Route handlers for a user's own entries

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod get_endpoint;
mod list_endpoint;
mod state;

pub use core::{
    Expense, ExpenseDetails, ExpenseScope, ExpenseType, create_expense, create_expense_table,
    delete_expense, get_expenses_for_user, map_expense_row,
    qualified_expense_columns, update_expense,
};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use edit_endpoint::edit_expense_endpoint;
pub use form::ExpenseForm;
pub use get_endpoint::get_expense_endpoint;
pub use list_endpoint::{ExpensePage, get_expenses_endpoint};
pub use state::ExpenseState;

#[cfg(test)]
pub use core::count_expenses;
