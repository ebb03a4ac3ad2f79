//! Route handlers for sign-in and the signed-in user's profile.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{AuthError, CurrentUser, encode_session_token, verify_google_id_token},
    db::with_lock_retry,
    user::{User, get_or_create_user, get_user_by_id, set_expense_context},
};

/// The JSON body for the Google sign-in endpoint.
#[derive(Debug, Deserialize)]
pub struct GoogleAuthBody {
    /// The ID token produced by Google Identity Services on the client.
    pub token: String,
}

/// The JSON response for a successful sign-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The session token to send as a bearer token on subsequent requests.
    pub token: String,
    /// The signed-in user's profile.
    pub user: User,
}

/// A route handler for signing in with a Google ID token.
///
/// Verifies the token against Google's published keys, creates the user on
/// first sign-in, and returns a session token along with the user's profile.
pub async fn google_auth(
    State(state): State<AppState>,
    Json(body): Json<GoogleAuthBody>,
) -> Result<impl IntoResponse, AuthError> {
    let profile =
        verify_google_id_token(&body.token, &state.google_client_id, &state.http_client)
            .await?;

    let user = with_lock_retry(&state.db_connection, move |connection| {
        get_or_create_user(&profile, connection)
    })
    .await
    .map_err(|error| {
        tracing::error!("could not create user during sign-in: {error}");
        AuthError::TokenCreation
    })?;

    let token = encode_session_token(user.id, &state.jwt_keys)?;

    tracing::info!("user {} signed in", user.id.as_i64());

    Ok(Json(AuthResponse { token, user }))
}

/// A route handler for fetching the signed-in user's profile.
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// The JSON body for updating the expense parsing context.
#[derive(Debug, Deserialize)]
pub struct ExpenseContextBody {
    /// Free text describing the user's situation, included in parsing
    /// prompts. `null` clears it.
    pub expense_context: Option<String>,
}

/// A route handler for updating the signed-in user's expense parsing context.
pub async fn update_expense_context(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ExpenseContextBody>,
) -> Result<impl IntoResponse, Error> {
    let updated = with_lock_retry(&state.db_connection, move |connection| {
        set_expense_context(user.id, body.expense_context.as_deref(), connection)?;
        get_user_by_id(user.id, connection)
    })
    .await?;

    Ok((StatusCode::OK, Json(updated)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{test_utils::test_server_with_user, user::User};

    #[tokio::test]
    async fn get_me_returns_signed_in_user() {
        let (server, token, user) = test_server_with_user().await;

        let response = server.get("/api/auth/me").authorization_bearer(&token).await;

        response.assert_status_ok();
        assert_eq!(response.json::<User>().id, user.id);
    }

    #[tokio::test]
    async fn get_me_requires_auth() {
        let (server, _, _) = test_server_with_user().await;

        server.get("/api/auth/me").await.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn update_expense_context_round_trips() {
        let (server, token, _) = test_server_with_user().await;

        let response = server
            .put("/api/auth/context")
            .authorization_bearer(&token)
            .json(&json!({"expense_context": "I am a self-employed plumber"}))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<User>().expense_context.as_deref(),
            Some("I am a self-employed plumber")
        );

        let cleared = server
            .put("/api/auth/context")
            .authorization_bearer(&token)
            .json(&json!({"expense_context": null}))
            .await
            .json::<User>();

        assert_eq!(cleared.expense_context, None);
    }

    #[tokio::test]
    async fn sign_in_with_garbage_token_is_unauthorized() {
        let (server, _, _) = test_server_with_user().await;

        server
            .post("/api/auth/google")
            .json(&json!({"token": "not.a.jwt"}))
            .await
            .assert_status_unauthorized();
    }
}
