//! Authentication: Google sign-in, session tokens and the signed-in user
//! extractor.
//!
//! Clients sign in by posting a Google ID token. The server verifies it
//! against Google's published keys, creates the user on first sign-in and
//! returns a session JWT which the client sends as a bearer token on every
//! subsequent request.

mod endpoints;
mod extract;
mod google;
mod token;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub use endpoints::{get_me, google_auth, update_expense_context};
pub use extract::CurrentUser;
pub use google::verify_google_id_token;
pub use token::{decode_session_token, encode_session_token};

/// The errors that may occur during sign-in or bearer token checks.
#[derive(Debug, PartialEq)]
pub enum AuthError {
    /// The request did not carry a bearer token.
    MissingToken,
    /// The bearer token was malformed, expired, or signed with the wrong key.
    InvalidToken,
    /// The Google ID token failed verification.
    InvalidGoogleToken,
    /// Google's public keys could not be fetched.
    GoogleUnavailable,
    /// The session token could not be created.
    TokenCreation,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "missing bearer token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid or expired token"),
            AuthError::InvalidGoogleToken => {
                (StatusCode::UNAUTHORIZED, "could not verify Google ID token")
            }
            AuthError::GoogleUnavailable => (
                StatusCode::BAD_GATEWAY,
                "could not reach Google to verify the ID token",
            ),
            AuthError::TokenCreation => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
