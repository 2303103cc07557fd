//! This file defines the route for handling log-in requests.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{
        register_user::AuthPayload,
        token::{JwtKeys, encode_token},
    },
    db::lock_connection,
    extract::{ApiJson, non_blank},
    response::ApiResponse,
    user::{PublicUser, User, get_user_by_email},
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The keys for signing the token.
    pub jwt_keys: JwtKeys,
    /// The duration for which issued tokens are valid.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a log-in request.
#[derive(Debug, Default, Deserialize)]
pub struct LogInForm {
    email: Option<String>,
    password: Option<String>,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// This function will respond with an error in a few situations.
/// - The email or password is missing (400).
/// - The email does not belong to a registered user (401).
/// - The password is not correct (401, same message as above).
/// - An internal error occurred when verifying the password (500).
pub async fn post_log_in(
    State(state): State<LoginState>,
    ApiJson(form): ApiJson<LogInForm>,
) -> Response {
    match log_in(&state, form) {
        Ok(payload) => ApiResponse::ok(payload)
            .with_message("Login successful")
            .into_response(),
        Err(error) => error.into_response(),
    }
}

fn log_in(state: &LoginState, form: LogInForm) -> Result<AuthPayload, Error> {
    let (Some(email), Some(password)) = (
        non_blank(form.email),
        form.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(Error::Validation(
            "Please provide email and password".to_owned(),
        ));
    };

    let user = find_user(&email, state)?;

    let password_is_correct = user.password_hash.verify(&password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !password_is_correct {
        tracing::info!("wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(
        user.id,
        &state.jwt_keys,
        OffsetDateTime::now_utc(),
        state.token_duration,
    )?;

    tracing::info!("user {} logged in", user.id);

    Ok(AuthPayload {
        token,
        user: PublicUser::from(&user),
    })
}

fn find_user(email: &str, state: &LoginState) -> Result<User, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_user_by_email(email, &connection).map_err(|error| match error {
        Error::NotFound => {
            tracing::info!("log-in attempt for unknown email");
            Error::InvalidCredentials
        }
        error => error,
    })
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        ApiResponse, AppState,
        auth::{log_in::post_log_in, register_user::AuthPayload, token::decode_token},
        test_utils::{TEST_PASSWORD, create_test_user, get_test_app_state},
        user::Role,
    };

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route("/log_in", post(post_log_in))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_app_state();
        let user = create_test_user("foo@bar.baz", Role::User, &state);
        let server = get_test_server(state.clone());

        let response = server
            .post("/log_in")
            .json(&json!({"email": "foo@bar.baz", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let payload = response.json::<ApiResponse<AuthPayload>>().data.unwrap();
        assert_eq!(payload.user.id, user.id);
        assert_eq!(
            decode_token(&payload.token, &state.jwt_keys)
                .unwrap()
                .user_id(),
            user.id
        );
    }

    #[tokio::test]
    async fn log_in_ignores_email_case() {
        let state = get_test_app_state();
        create_test_user("foo@bar.baz", Role::User, &state);
        let server = get_test_server(state);

        server
            .post("/log_in")
            .json(&json!({"email": "Foo@Bar.Baz", "password": TEST_PASSWORD}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server(get_test_app_state());

        for body in [
            json!({}),
            json!({"email": "foo@bar.baz"}),
            json!({"password": TEST_PASSWORD}),
        ] {
            let response = server.post("/log_in").json(&body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json::<ApiResponse<()>>().message.as_deref(),
                Some("Please provide email and password")
            );
        }
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let state = get_test_app_state();
        create_test_user("foo@bar.baz", Role::User, &state);
        let server = get_test_server(state);

        let wrong_password = server
            .post("/log_in")
            .json(&json!({"email": "foo@bar.baz", "password": "definitelyNotTheCorrectPassword"}))
            .await;
        let unknown_email = server
            .post("/log_in")
            .json(&json!({"email": "wrongemail@gmail.com", "password": TEST_PASSWORD}))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);

        let wrong_password = wrong_password.json::<ApiResponse<AuthPayload>>();
        let unknown_email = unknown_email.json::<ApiResponse<AuthPayload>>();
        assert!(wrong_password.data.is_none(), "no token should be issued");
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(
            wrong_password.message.as_deref(),
            Some("Invalid email or password")
        );
    }
}
