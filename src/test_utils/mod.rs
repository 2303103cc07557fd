#![allow(missing_docs)]

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, PaginationConfig, PasswordHash, ValidatedPassword,
    auth::{TOKEN_DURATION, encode_token},
    db::lock_connection,
    expense::{Expense, ExpenseDetails, ExpenseType, create_expense},
    tax::TaxType,
    user::{NewUser, Role, User, UserID, create_user},
};

/// The password of every user made with [create_test_user].
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// The lowest bcrypt cost, so tests do not spend their time hashing.
const TEST_PASSWORD_COST: u32 = 4;

pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(connection, "42", PaginationConfig::default())
        .expect("Could not create app state")
        .with_password_cost(TEST_PASSWORD_COST)
}

pub(crate) fn create_test_user(email: &str, role: Role, state: &AppState) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_PASSWORD_COST,
    )
    .expect("Could not hash test password");
    let connection = lock_connection(&state.db_connection).unwrap();

    create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: email.to_owned(),
            password_hash,
            role,
        },
        &connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn token_for(user_id: UserID, state: &AppState) -> String {
    encode_token(
        user_id,
        &state.jwt_keys,
        OffsetDateTime::now_utc(),
        TOKEN_DURATION,
    )
    .expect("Could not create test token")
}

pub(crate) fn expense_details(
    description: &str,
    amount: f64,
    expense_type: ExpenseType,
) -> ExpenseDetails {
    ExpenseDetails {
        description: description.to_owned(),
        amount,
        expense_type,
        tax_type: TaxType::Flat,
        tax_amount: 0.0,
    }
}

pub(crate) fn create_test_expense(
    details: &ExpenseDetails,
    user_id: UserID,
    state: &AppState,
) -> Expense {
    let connection = lock_connection(&state.db_connection).unwrap();

    create_expense(details, user_id, &connection).expect("Could not create test expense")
}
