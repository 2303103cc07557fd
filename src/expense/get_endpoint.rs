use axum::{Extension, extract::State};

use crate::{
    Error,
    auth::AuthenticatedUser,
    database_id::ExpenseId,
    db::lock_connection,
    expense::{Expense, ExpenseScope, ExpenseState, core::get_expense},
    extract::ApiPath,
    response::ApiResponse,
};

/// A route handler for fetching one of the caller's entries.
///
/// Entries owned by other users are reported as not found.
pub async fn get_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(expense_id): ApiPath<ExpenseId>,
) -> Result<ApiResponse<Expense>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_expense(expense_id, ExpenseScope::OwnedBy(user.id), &connection).map(ApiResponse::ok)
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;

    use crate::{
        ApiResponse, AppState, Expense, ExpenseType,
        auth::auth_guard,
        expense::get_endpoint::get_expense_endpoint,
        test_utils::{
            create_test_expense, create_test_user, expense_details, get_test_app_state,
            token_for,
        },
        user::Role,
    };

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route("/expenses/{expense_id}", get(get_expense_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn owner_can_get_expense() {
        let state = get_test_app_state();
        let user = create_test_user("foo@bar.baz", Role::User, &state);
        let expense = create_test_expense(
            &expense_details("Salary", 100.0, ExpenseType::Income),
            user.id,
            &state,
        );
        let server = get_test_server(state.clone());

        let response = server
            .get(&format!("/expenses/{}", expense.id))
            .authorization_bearer(token_for(user.id, &state))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<ApiResponse<Expense>>().data, Some(expense));
    }

    #[tokio::test]
    async fn other_users_expense_is_not_found() {
        let state = get_test_app_state();
        let owner = create_test_user("owner@bar.baz", Role::User, &state);
        let other = create_test_user("other@bar.baz", Role::User, &state);
        let expense = create_test_expense(
            &expense_details("Salary", 100.0, ExpenseType::Income),
            owner.id,
            &state,
        );
        let server = get_test_server(state.clone());

        let response = server
            .get(&format!("/expenses/{}", expense.id))
            .authorization_bearer(token_for(other.id, &state))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            response.json::<ApiResponse<()>>().message.as_deref(),
            Some("Expense not found")
        );
    }

    #[tokio::test]
    async fn invalid_id_is_bad_request() {
        let state = get_test_app_state();
        let user = create_test_user("foo@bar.baz", Role::User, &state);
        let server = get_test_server(state.clone());

        let response = server
            .get("/expenses/not-a-number")
            .authorization_bearer(token_for(user.id, &state))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!response.json::<ApiResponse<()>>().success);
    }
}
