//! Shared helpers for endpoint tests.

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState,
    auth::encode_session_token,
    routing::build_router,
    user::{GoogleProfile, User, get_or_create_user},
};

/// Create an [AppState] backed by an in-memory database.
pub fn get_test_app_state() -> AppState {
    let db_connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(db_connection, "42", "test-client-id", None)
        .expect("Could not create test app state")
}

/// Insert a user directly into the database, as if they had signed in with
/// Google.
pub fn create_test_user(state: &AppState) -> User {
    let connection = state.db_connection.lock().unwrap();

    get_or_create_user(
        &GoogleProfile {
            google_id: "109876543210".to_owned(),
            email: "test@test.com".to_owned(),
            name: Some("Test User".to_owned()),
            picture: None,
        },
        &connection,
    )
    .expect("Could not create test user")
}

/// Create a second, distinct user for cross-user isolation tests.
pub fn create_other_test_user(state: &AppState) -> User {
    let connection = state.db_connection.lock().unwrap();

    get_or_create_user(
        &GoogleProfile {
            google_id: "201234567890".to_owned(),
            email: "other@test.com".to_owned(),
            name: None,
            picture: None,
        },
        &connection,
    )
    .expect("Could not create test user")
}

/// Spin up a test server with the full app router, a signed-in user, and a
/// valid session token for that user.
pub async fn test_server_with_user() -> (TestServer, String, User) {
    let state = get_test_app_state();
    let user = create_test_user(&state);
    let token =
        encode_session_token(user.id, &state.jwt_keys).expect("Could not create session token");

    let server = TestServer::new(build_router(state));

    (server, token, user)
}

/// Issue a session token for an existing user on an existing state.
pub fn token_for(user: &User, state: &AppState) -> String {
    encode_session_token(user.id, &state.jwt_keys).expect("Could not create session token")
}
