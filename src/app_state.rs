//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{Error, db::initialize};

/// The signing and verification keys for session tokens.
#[derive(Clone)]
pub struct JwtKeys {
    /// The key for signing new session tokens.
    pub encoding_key: EncodingKey,
    /// The key for verifying session tokens on incoming requests.
    pub decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Derive both keys from a shared `secret` string.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys used to sign and verify session tokens.
    pub jwt_keys: JwtKeys,

    /// The OAuth client ID that Google ID tokens must be issued for.
    pub google_client_id: String,

    /// Shared HTTP client for Google JWKS fetches and the Anthropic API.
    pub http_client: reqwest::Client,

    /// API key for the Anthropic messages API. When unset, the expense
    /// parsing endpoint reports the parser as unavailable.
    pub anthropic_api_key: Option<String>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models and seeding the IRS mileage rate table.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        google_client_id: &str,
        anthropic_api_key: Option<String>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys::from_secret(jwt_secret),
            google_client_id: google_client_id.to_owned(),
            http_client: reqwest::Client::new(),
            anthropic_api_key,
        })
    }
}
