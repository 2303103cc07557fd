//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::response::ApiResponse;

/// The message sent to the client for any error it is not meant to see the details of.
pub const GENERIC_SERVER_ERROR: &str = "Server error";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request was missing a field or a field had an invalid value.
    ///
    /// The message is shown to the client as is.
    #[error("{0}")]
    Validation(String),

    /// The email address used to register is already taken by another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An admin tried to change a user's email to one that belongs to a
    /// different user.
    #[error("the email address belongs to another user")]
    EmailInUse,

    /// The email and password combination did not match a user.
    ///
    /// The same error is used for an unknown email and a wrong password so
    /// that clients cannot tell which registered emails exist.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request to a protected route did not include a bearer token.
    #[error("no bearer token in the request")]
    MissingToken,

    /// The bearer token was malformed, expired, had a bad signature or
    /// referred to a user that no longer exists.
    #[error("the bearer token is not valid")]
    InvalidToken,

    /// The authenticated user does not have the admin role.
    #[error("admin role required")]
    Forbidden,

    /// The expense does not exist or is not owned by the user.
    #[error("the expense could not be found")]
    ExpenseNotFound,

    /// The user does not exist.
    #[error("the user could not be found")]
    UserNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error occurs when a query returns no rows. Handlers
    /// should convert it to [Error::ExpenseNotFound] or [Error::UserNotFound]
    /// where the resource is known.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The token for a user could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A route handler panicked.
    #[error("a route handler panicked: {0}")]
    Panic(String),
}

impl Error {
    /// The HTTP status code used when responding with this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::DuplicateEmail | Error::EmailInUse => {
                StatusCode::BAD_REQUEST
            }
            Error::InvalidCredentials | Error::MissingToken | Error::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::ExpenseNotFound | Error::UserNotFound | Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message that is safe to show to the client.
    pub fn client_message(&self) -> String {
        match self {
            Error::Validation(message) => message.clone(),
            Error::DuplicateEmail => "User already exists".to_owned(),
            Error::EmailInUse => "Email already exists".to_owned(),
            Error::InvalidCredentials => "Invalid email or password".to_owned(),
            Error::MissingToken => "No token, authorization denied".to_owned(),
            Error::InvalidToken => "Token is not valid".to_owned(),
            Error::Forbidden => "Access denied. Admin only.".to_owned(),
            Error::ExpenseNotFound => "Expense not found".to_owned(),
            Error::UserNotFound => "User not found".to_owned(),
            Error::NotFound => "The requested resource could not be found".to_owned(),
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::Panic(_) => GENERIC_SERVER_ERROR.to_owned(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Any errors that are not handled above are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status, ApiResponse::<()>::error(self.client_message())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, response::ApiResponse};

    async fn response_body(error: Error) -> (StatusCode, ApiResponse<()>) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("could not read response body");

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn maps_taxonomy_to_status_codes() {
        let cases = [
            (Error::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (Error::DuplicateEmail, StatusCode::BAD_REQUEST),
            (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (Error::InvalidToken, StatusCode::UNAUTHORIZED),
            (Error::Forbidden, StatusCode::FORBIDDEN),
            (Error::ExpenseNotFound, StatusCode::NOT_FOUND),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want_status) in cases {
            let (got_status, body) = response_body(error).await;

            assert_eq!(got_status, want_status);
            assert!(!body.success);
            assert!(body.data.is_none());
        }
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let (status, body) = response_body(Error::HashingError(
            "invalid salt length for the bcrypt hash".to_owned(),
        ))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message.as_deref(), Some("Server error"));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn bad_credentials_share_one_message() {
        assert_eq!(
            Error::InvalidCredentials.client_message(),
            "Invalid email or password"
        );
    }
}
