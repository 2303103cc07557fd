//! Application router configuration with public, protected and admin route definitions.

use std::any::Any;

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{
    AppState, Error,
    admin::{
        create_any_expense_endpoint, delete_any_expense_endpoint, delete_user_endpoint,
        edit_any_expense_endpoint, list_all_expenses_endpoint, list_users_endpoint,
        update_user_endpoint,
    },
    auth::{admin_guard, auth_guard, post_log_in, register_user},
    dashboard::get_dashboard_summary,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, edit_expense_endpoint,
        get_expense_endpoint, get_expenses_endpoint,
    },
    response::ApiResponse,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_health))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in));

    // The admin guard reads the user that the auth guard attaches, so it must
    // be the inner layer.
    let admin_routes = Router::new()
        .route(endpoints::ADMIN_USERS, get(list_users_endpoint))
        .route(
            endpoints::ADMIN_USER,
            put(update_user_endpoint).delete(delete_user_endpoint),
        )
        .route(endpoints::ADMIN_ALL_EXPENSES, get(list_all_expenses_endpoint))
        .route(
            endpoints::ADMIN_CREATE_EXPENSE,
            post(create_any_expense_endpoint),
        )
        .route(
            endpoints::ADMIN_EXPENSE,
            put(edit_any_expense_endpoint).delete(delete_any_expense_endpoint),
        )
        .layer(middleware::from_fn(admin_guard));

    let protected_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(get_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard_summary))
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(edit_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// The root path '/' reports that the server is up.
async fn get_health() -> ApiResponse<()> {
    ApiResponse::message("Expense Tracker API is working!")
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        ApiResponse::<()>::error("Route not found"),
    )
        .into_response()
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_owned()
    };

    Error::Panic(details).into_response()
}
