//! The API endpoints URIs.
//!
//! Routes that take a parameter use axum's `{name}` path syntax.

/// The root route, a health check.
pub const ROOT: &str = "/";

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";

/// The route to create and list the caller's entries.
pub const EXPENSES: &str = "/api/expenses";
/// The route for the totals of the caller's entries.
pub const DASHBOARD: &str = "/api/expenses/dashboard";
/// The route to get, replace or delete one of the caller's entries.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";

/// The route for admins to list every user.
pub const ADMIN_USERS: &str = "/api/expenses/admin/users";
/// The route for admins to update or delete a user.
pub const ADMIN_USER: &str = "/api/expenses/admin/users/{user_id}";
/// The route for admins to list every entry.
pub const ADMIN_ALL_EXPENSES: &str = "/api/expenses/admin/all-expenses";
/// The route for admins to create an entry for any user.
pub const ADMIN_CREATE_EXPENSE: &str = "/api/expenses/admin/create";
/// The route for admins to replace or delete any entry.
pub const ADMIN_EXPENSE: &str = "/api/expenses/admin/expense/{expense_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Only the first `{...}` segment is replaced.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_endpoint(EXPENSE, 42), "/api/expenses/42");
/// ```
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    match (endpoint_path.find('{'), endpoint_path.find('}')) {
        (Some(start), Some(end)) if start < end => {
            format!(
                "{}{id}{}",
                &endpoint_path[..start],
                &endpoint_path[end + 1..]
            )
        }
        _ => endpoint_path.to_owned(),
    }
}
