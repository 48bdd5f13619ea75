use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::{Result, SyncError};

pub const DEFAULT_SOURCE_URL: &str = "https://www.geeksforgeeks.org/dsa-sheet-by-love-babbar/";
pub const DEFAULT_COLLECTION: &str = "love_babbar_sheet";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SQLITE_PATH: &str = "data/sheet.sqlite";

/// Where the extracted problems end up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Firestore,
    Sqlite,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Firestore => f.write_str("Firestore"),
            StoreKind::Sqlite => f.write_str("SQLite"),
        }
    }
}

/// Run settings, read from `SHEET_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_source_url")]
    pub source_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from(DEFAULT_SQLITE_PATH)
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_source(None)
    }

    /// `source` replaces the process environment; used by tests.
    pub fn from_source(source: Option<HashMap<String, String>>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(
                Environment::with_prefix("SHEET")
                    .try_parsing(true)
                    .source(source),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

/// Service account fields, read from `FIREBASE_*` variables.
#[derive(Clone, Default, Deserialize)]
pub struct ServiceAccount {
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: Option<String>,
    pub client_email: Option<String>,
    pub client_id: Option<String>,
    pub auth_uri: Option<String>,
    pub token_uri: Option<String>,
    pub auth_provider_x509_cert_url: Option<String>,
    pub client_x509_cert_url: Option<String>,
    pub universe_domain: Option<String>,
}

/// The subset of a service account needed to mint access tokens.
#[derive(Clone)]
pub struct SigningCredentials {
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    pub token_uri: String,
}

impl ServiceAccount {
    pub fn from_env() -> Result<Self> {
        Self::from_source(None)
    }

    pub fn from_source(source: Option<HashMap<String, String>>) -> Result<Self> {
        let account = Config::builder()
            .add_source(Environment::with_prefix("FIREBASE").source(source))
            .build()?
            .try_deserialize()?;
        Ok(account)
    }

    pub fn project_id(&self) -> Result<&str> {
        required(&self.project_id, "FIREBASE_PROJECT_ID")
    }

    pub fn signing(&self) -> Result<SigningCredentials> {
        let client_email = required(&self.client_email, "FIREBASE_CLIENT_EMAIL")?;
        let private_key = required(&self.private_key, "FIREBASE_PRIVATE_KEY")?;
        let token_uri = required(&self.token_uri, "FIREBASE_TOKEN_URI")?;

        Ok(SigningCredentials {
            client_email: client_email.to_string(),
            // .env files usually carry the PEM on one line with literal \n
            private_key: private_key.replace("\\n", "\n"),
            private_key_id: self.private_key_id.clone().filter(|id| !id.is_empty()),
            token_uri: token_uri.to_string(),
        })
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("account_type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .field("auth_provider_x509_cert_url", &self.auth_provider_x509_cert_url)
            .field("client_x509_cert_url", &self.client_x509_cert_url)
            .field("universe_domain", &self.universe_domain)
            .finish()
    }
}

fn required<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SyncError::Config(format!("{} must be set", var)))
}

/// `FIRESTORE_EMULATOR_HOST`, when set, routes store traffic to a local emulator.
pub fn emulator_host() -> Option<String> {
    std::env::var("FIRESTORE_EMULATOR_HOST")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}
