use axum::{Extension, extract::State, http::StatusCode};

use crate::{
    Error,
    auth::AuthenticatedUser,
    db::lock_connection,
    expense::{Expense, ExpenseForm, ExpenseState, create_expense},
    extract::ApiJson,
    response::ApiResponse,
};

/// A route handler for creating an entry owned by the caller.
///
/// The total is calculated on the server, any total in the request body is ignored.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(form): ApiJson<ExpenseForm>,
) -> Result<(StatusCode, ApiResponse<Expense>), Error> {
    let details = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    let expense = create_expense(&details, user.id, &connection)?;

    Ok((StatusCode::CREATED, ApiResponse::ok(expense)))
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::post};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        ApiResponse, AppState, Expense, ExpenseType, TaxType,
        auth::auth_guard,
        db::lock_connection,
        expense::{count_expenses, create_endpoint::create_expense_endpoint},
        test_utils::{create_test_user, get_test_app_state, token_for},
        user::Role,
    };

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route("/expenses", post(create_expense_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn creates_expense_with_total() {
        let state = get_test_app_state();
        let user = create_test_user("foo@bar.baz", Role::User, &state);
        let server = get_test_server(state.clone());

        let response = server
            .post("/expenses")
            .authorization_bearer(token_for(user.id, &state))
            .json(&json!({
                "description": "Coffee",
                "amount": 4,
                "type": "expense",
                "taxType": "percentage",
                "taxAmount": 10
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let expense: Expense = response.json::<ApiResponse<Expense>>().data.unwrap();
        assert_eq!(expense.description, "Coffee");
        assert_eq!(expense.expense_type, ExpenseType::Expense);
        assert_eq!(expense.tax_type, TaxType::Percentage);
        assert_eq!(expense.total_amount, 4.0 + 4.0 * 10.0 / 100.0);
        assert_eq!(expense.user_id, user.id);
    }

    #[tokio::test]
    async fn ignores_client_total() {
        let state = get_test_app_state();
        let user = create_test_user("foo@bar.baz", Role::User, &state);
        let server = get_test_server(state.clone());

        let response = server
            .post("/expenses")
            .authorization_bearer(token_for(user.id, &state))
            .json(&json!({
                "description": "Rent",
                "amount": 100,
                "type": "expense",
                "taxAmount": 5,
                "totalAmount": 1
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let expense = response.json::<ApiResponse<Expense>>().data.unwrap();
        assert_eq!(expense.tax_type, TaxType::Flat);
        assert_eq!(expense.total_amount, 105.0);
    }

    #[tokio::test]
    async fn rejects_invalid_amount() {
        let state = get_test_app_state();
        let user = create_test_user("foo@bar.baz", Role::User, &state);
        let server = get_test_server(state.clone());

        let response = server
            .post("/expenses")
            .authorization_bearer(token_for(user.id, &state))
            .json(&json!({"description": "Refund", "amount": -3, "type": "income"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<ApiResponse<()>>();
        assert!(!body.success);
        assert_eq!(body.message.as_deref(), Some("Amount must be greater than 0"));
    }

    #[tokio::test]
    async fn rejects_total_that_overflows() {
        let state = get_test_app_state();
        let user = create_test_user("foo@bar.baz", Role::User, &state);
        let server = get_test_server(state.clone());

        let response = server
            .post("/expenses")
            .authorization_bearer(token_for(user.id, &state))
            .json(&json!({
                "description": "Lottery",
                "amount": 1e308,
                "type": "income",
                "taxType": "flat",
                "taxAmount": 1e308
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<ApiResponse<()>>().message.as_deref(),
            Some("Total amount is too large")
        );
        let connection = lock_connection(&state.db_connection).unwrap();
        assert_eq!(count_expenses(user.id, &connection), Ok(0));
    }

    #[tokio::test]
    async fn requires_token() {
        let server = get_test_server(get_test_app_state());

        server
            .post("/expenses")
            .json(&json!({"description": "Coffee", "amount": 4, "type": "expense"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
