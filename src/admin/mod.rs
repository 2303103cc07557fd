//! Route handlers that let admins manage every user and every entry.
//!
//! Every handler here must be layered behind both [crate::auth::auth_guard]
//! and [crate::auth::admin_guard].

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod expenses;
mod users;

pub use expenses::{
    create_any_expense_endpoint, delete_any_expense_endpoint, edit_any_expense_endpoint,
    list_all_expenses_endpoint,
};
pub use users::{delete_user_endpoint, list_users_endpoint, update_user_endpoint};

#[cfg(test)]
pub use expenses::ExpenseWithOwner;

/// The state needed for the admin routes.
#[derive(Debug, Clone)]
pub struct AdminState {
    /// The database connection for managing users and entries.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AdminState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
