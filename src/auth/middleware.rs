//! Authentication middleware that validates bearer tokens and the admin role.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::token::{JwtKeys, decode_token},
    db::lock_connection,
    user::{Role, UserID, get_user_by_id},
};

/// The identity of the user making a request, attached by [auth_guard].
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user): Extension<AuthenticatedUser>` to receive it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthenticatedUser {
    /// The ID of the user the token was issued to.
    pub id: UserID,
    /// The role of the user at the time of the request.
    pub role: Role,
}

impl AuthenticatedUser {
    /// Whether the user may use the admin routes.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys for verifying bearer tokens.
    pub jwt_keys: JwtKeys,
    /// The database connection for looking up the token's user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user's ID and current role are placed into the request extensions as an
/// [AuthenticatedUser] and the request is executed normally if the token is
/// valid, otherwise a 401 response is returned.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) if rejection.is_missing() => return Error::MissingToken.into_response(),
        Err(rejection) => {
            tracing::debug!("malformed authorization header: {rejection}");
            return Error::InvalidToken.into_response();
        }
    };

    let authenticated_user = match authenticate(bearer.token(), &state) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(authenticated_user);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

fn authenticate(token: &str, state: &AuthState) -> Result<AuthenticatedUser, Error> {
    let claims = decode_token(token, &state.jwt_keys)?;
    let connection = lock_connection(&state.db_connection)?;

    match get_user_by_id(claims.user_id(), &connection) {
        Ok(user) => Ok(AuthenticatedUser {
            id: user.id,
            role: user.role,
        }),
        Err(Error::NotFound) => {
            tracing::debug!("token refers to missing user {}", claims.sub);
            Err(Error::InvalidToken)
        }
        Err(error) => Err(error),
    }
}

/// Middleware function that only lets admins through.
///
/// Must be layered inside [auth_guard] so that the [AuthenticatedUser] is set.
pub async fn admin_guard(request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthenticatedUser>() {
        Some(user) if user.is_admin() => next.run(request).await,
        Some(user) => {
            tracing::warn!("user {} tried to use an admin route", user.id);
            Error::Forbidden.into_response()
        }
        None => Error::MissingToken.into_response(),
    }
}
