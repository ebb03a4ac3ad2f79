//! Encoding and decoding of session JWTs.

use jsonwebtoken::{Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{app_state::JwtKeys, auth::AuthError, user::UserId};

/// How long a session token stays valid after sign-in.
const SESSION_TOKEN_LIFETIME: Duration = Duration::days(7);

/// The contents of a session JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The database ID of the signed-in user.
    pub sub: i64,
    /// The time the token was issued, as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token, as a unix timestamp.
    pub exp: i64,
}

/// Create a signed session token for `user_id`.
pub fn encode_session_token(user_id: UserId, jwt_keys: &JwtKeys) -> Result<String, AuthError> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        iat: now.unix_timestamp(),
        exp: (now + SESSION_TOKEN_LIFETIME).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &jwt_keys.encoding_key).map_err(|error| {
        tracing::error!("could not create session token: {error}");
        AuthError::TokenCreation
    })
}

/// Verify a session token and return the user ID it was issued for.
///
/// # Errors
/// Returns [AuthError::InvalidToken] if the token is malformed, expired, or
/// was not signed with the server's key.
pub fn decode_session_token(token: &str, jwt_keys: &JwtKeys) -> Result<UserId, AuthError> {
    let token_data: TokenData<Claims> =
        decode(token, &jwt_keys.decoding_key, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

    Ok(UserId::new(token_data.claims.sub))
}
