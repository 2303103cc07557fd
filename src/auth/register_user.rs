//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{
        password::{PasswordHash, ValidatedPassword},
        token::{JwtKeys, encode_token},
    },
    db::lock_connection,
    extract::{ApiJson, non_blank},
    response::ApiResponse,
    user::{NewUser, PublicUser, Role, create_user},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The keys for signing the token of the new user.
    pub jwt_keys: JwtKeys,
    /// The duration for which issued tokens are valid.
    pub token_duration: Duration,
    /// The bcrypt cost used when hashing the password.
    pub password_cost: u32,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a registration request.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

/// A token and the user it was issued to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    /// The bearer token for protected routes.
    pub token: String,
    /// The user the token was issued to.
    pub user: PublicUser,
}

/// A route handler for creating a new user.
///
/// Responds with 201 and a token for the new user on success.
pub async fn register_user(
    State(state): State<RegistrationState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Response {
    match create_user_and_token(&state, form) {
        Ok(payload) => (
            StatusCode::CREATED,
            ApiResponse::ok(payload).with_message("User created successfully"),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

fn create_user_and_token(
    state: &RegistrationState,
    form: RegisterForm,
) -> Result<AuthPayload, Error> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(form.name),
        non_blank(form.email),
        form.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(Error::Validation(
            "Please provide name, email, and password".to_owned(),
        ));
    };

    // Anything other than a recognised role falls back to the default.
    let role = form
        .role
        .as_deref()
        .and_then(|role| Role::try_from(role).ok())
        .unwrap_or_default();

    let password_hash = PasswordHash::new(ValidatedPassword::new(&password)?, state.password_cost)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        create_user(
            NewUser {
                name,
                email,
                password_hash,
                role,
            },
            &connection,
        )?
    };

    tracing::info!("registered user {} with role {}", user.id, user.role.as_str());

    let token = encode_token(
        user.id,
        &state.jwt_keys,
        OffsetDateTime::now_utc(),
        state.token_duration,
    )?;

    Ok(AuthPayload {
        token,
        user: PublicUser::from(&user),
    })
}
