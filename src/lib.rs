//! An expense tracker for personal finances.
//!
//! Users register and log in with a bearer token, record income and
//! expenses with a flat or percentage tax adjustment and view aggregated
//! totals. Users with the `admin` role can manage every user and every entry.
//!
//! This library provides a REST API that serves JSON.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod admin;
mod app_state;
mod auth;
mod config;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod error;
mod expense;
mod extract;
mod logging;
mod pagination;
mod provision;
mod response;
mod routing;
mod tax;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Claims, JwtKeys, PasswordHash, ValidatedPassword};
pub use config::{DEFAULT_DB_PATH, DEFAULT_JWT_SECRET, ServerConfig, database_path};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{Expense, ExpenseType};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use provision::{ProvisionOutcome, find_existing_user, provision_admin};
pub use response::ApiResponse;
pub use routing::build_router;
pub use tax::{TaxType, calculate_total, round_for_display};
pub use user::{PublicUser, Role, User, UserID, get_user_by_email, normalize_email};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
