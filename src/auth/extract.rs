//! An extractor that resolves the bearer token on a request to a user row.

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState,
    auth::{AuthError, decode_session_token},
    db::with_lock_retry,
    user::{User, get_user_by_id},
};

/// The signed-in user making the current request.
///
/// Extracting this from a request verifies the bearer token and loads the
/// user row, so handlers can rely on the user existing. Requests without a
/// valid token are rejected with 401 before the handler runs.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;

        let state = AppState::from_ref(state);
        let user_id = decode_session_token(bearer.token(), &state.jwt_keys)?;

        // A valid token for a deleted user is treated the same as a bad token.
        let user = with_lock_retry(&state.db_connection, move |connection| {
            get_user_by_id(user_id, connection)
        })
        .await
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(CurrentUser(user))
    }
}
