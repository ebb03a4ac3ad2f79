//! Verification of Google ID tokens against Google's published signing keys.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

use crate::{auth::AuthError, user::GoogleProfile};

/// Where Google publishes the public keys its ID tokens are signed with.
const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// How long to wait for Google before giving up on a sign-in attempt.
const GOOGLE_TIMEOUT: Duration = Duration::from_secs(10);

/// The issuers Google uses for ID tokens. Both forms appear in the wild.
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// The claims in a Google ID token that the app cares about.
#[derive(Debug, Deserialize)]
struct GoogleClaims {
    /// The stable Google account identifier.
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

/// A single RSA public key from Google's JWKS document.
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

/// Verify a Google ID token and extract the signer's profile.
///
/// The token's signature is checked against Google's current public keys,
/// which are fetched fresh for each sign-in. The audience must match the
/// app's OAuth client ID and the issuer must be Google.
///
/// # Errors
/// Returns [AuthError::GoogleUnavailable] if the key fetch fails or times
/// out, and [AuthError::InvalidGoogleToken] for any verification failure.
pub async fn verify_google_id_token(
    id_token: &str,
    client_id: &str,
    http_client: &reqwest::Client,
) -> Result<GoogleProfile, AuthError> {
    let header = decode_header(id_token).map_err(|_| AuthError::InvalidGoogleToken)?;
    let kid = header.kid.ok_or(AuthError::InvalidGoogleToken)?;

    let jwks = fetch_google_keys(http_client).await?;
    let jwk = jwks
        .keys
        .iter()
        .find(|key| key.kid == kid)
        .ok_or(AuthError::InvalidGoogleToken)?;

    let decoding_key =
        DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|error| {
            tracing::error!("could not build key from Google JWKS entry: {error}");
            AuthError::InvalidGoogleToken
        })?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[client_id]);
    validation.set_issuer(&GOOGLE_ISSUERS);

    let token_data = decode::<GoogleClaims>(id_token, &decoding_key, &validation)
        .map_err(|_| AuthError::InvalidGoogleToken)?;

    let claims = token_data.claims;

    Ok(GoogleProfile {
        google_id: claims.sub,
        email: claims.email,
        name: claims.name,
        picture: claims.picture,
    })
}

async fn fetch_google_keys(http_client: &reqwest::Client) -> Result<Jwks, AuthError> {
    let request = async {
        http_client
            .get(GOOGLE_JWKS_URL)
            .send()
            .await?
            .error_for_status()?
            .json::<Jwks>()
            .await
    };

    match tokio::time::timeout(GOOGLE_TIMEOUT, request).await {
        Ok(Ok(jwks)) => Ok(jwks),
        Ok(Err(error)) => {
            tracing::error!("could not fetch Google signing keys: {error}");
            Err(AuthError::GoogleUnavailable)
        }
        Err(_) => {
            tracing::error!(
                "fetching Google signing keys timed out after {}s",
                GOOGLE_TIMEOUT.as_secs()
            );
            Err(AuthError::GoogleUnavailable)
        }
    }
}
