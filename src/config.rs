//! Command line and environment configuration for the server.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::PaginationConfig;

/// The database file used when `DATABASE_URL` is not set.
pub const DEFAULT_DB_PATH: &str = "expense_tracker.db";

/// The token secret used when `JWT_SECRET` is not set.
///
/// Anyone who knows this value can forge tokens, so the server warns when it is used.
pub const DEFAULT_JWT_SECRET: &str = "fallback_secret";

const DEFAULT_PORT: u16 = 5000;

/// The SQLite file path in `db_url`, without any leading `sqlite://`.
pub fn database_path(db_url: &str) -> &str {
    db_url.strip_prefix("sqlite://").unwrap_or(db_url)
}

/// The REST API server for the expense tracker.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct ServerConfig {
    /// File path to the application SQLite database. A leading `sqlite://` is ignored.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DB_PATH)]
    pub db_path: String,

    /// The secret used to sign and verify bearer tokens.
    #[arg(long, env = "JWT_SECRET", default_value = DEFAULT_JWT_SECRET, hide_env_values = true, hide_default_value = true)]
    pub jwt_secret: String,

    /// The IP address to serve the API from.
    #[arg(short, long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub address: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The number of entries per page when a request does not specify a limit.
    #[arg(long, env = "PAGE_SIZE", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub page_size: u64,
}

impl ServerConfig {
    /// The path of the SQLite database file.
    pub fn database_path(&self) -> &str {
        database_path(&self.db_path)
    }

    /// The address to bind the server to.
    pub fn socket_address(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Whether the token secret is the publicly known default.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    /// The pagination settings for list routes.
    pub fn pagination_config(&self) -> PaginationConfig {
        PaginationConfig {
            default_page_size: self.page_size,
            ..Default::default()
        }
    }
}
