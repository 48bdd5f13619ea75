use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SyncError};
use crate::settings::SigningCredentials;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_MINS: i64 = 60;

/// Claims of the self-signed assertion traded for an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(creds: &SigningCredentials, now: DateTime<Utc>) -> Self {
        Claims {
            iss: creds.client_email.clone(),
            sub: creds.client_email.clone(),
            aud: creds.token_uri.clone(),
            scope: DATASTORE_SCOPE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ASSERTION_LIFETIME_MINS)).timestamp(),
        }
    }
}

/// Sign an RS256 assertion with the service account key.
pub fn sign_assertion(creds: &SigningCredentials, now: DateTime<Utc>) -> Result<String> {
    let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())
        .map_err(|e| SyncError::store(format!("invalid service account key: {}", e)))?;
    let mut header = Header::new(Algorithm::RS256);
    header.kid = creds.private_key_id.clone();

    encode(&header, &Claims::new(creds, now), &key)
        .map_err(|e| SyncError::store(format!("failed to sign assertion: {}", e)))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Exchange a signed assertion for a bearer token at the account's token URI.
pub fn fetch_access_token(client: &Client, creds: &SigningCredentials) -> Result<String> {
    let assertion = sign_assertion(creds, Utc::now())?;

    let response = client
        .post(&creds.token_uri)
        .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
        .send()
        .map_err(|e| SyncError::store(format!("token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SyncError::store(format!(
            "token exchange rejected (HTTP {}): {}",
            status,
            body.trim()
        )));
    }

    let token: TokenResponse = response
        .json()
        .map_err(|e| SyncError::store(format!("malformed token response: {}", e)))?;
    info!(
        client_email = %creds.client_email,
        expires_in = token.expires_in,
        "Obtained store access token"
    );
    Ok(token.access_token)
}
