//! Access tokens for Google apis.

pub mod metadata;
pub mod service_account;

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use csv2sheet_error::{Result, ResultExt};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::client::HttpClient;
use service_account::ServiceAccount;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const STORAGE_READ_ONLY_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_only";

/// Scopes needed for reading uploaded objects and writing spreadsheets.
pub const DEFAULT_SCOPES: &[&str] = &[SPREADSHEETS_SCOPE, STORAGE_READ_ONLY_SCOPE];

/// Seconds before expiry at which a cached token is refreshed.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// Where access tokens come from.
pub enum TokenSource {
    /// A fixed bearer token. Never refreshed.
    Static(String),
    /// Sign JWTs with a service account key and exchange them for tokens.
    ServiceAccount(ServiceAccount),
    /// Ask the compute metadata server.
    Metadata { token_url: Url },
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => write!(f, "Static(<redacted>)"),
            Self::ServiceAccount(sa) => f.debug_tuple("ServiceAccount").field(sa).finish(),
            Self::Metadata { token_url } => f
                .debug_struct("Metadata")
                .field("token_url", &token_url.as_str())
                .finish(),
        }
    }
}

impl TokenSource {
    pub fn metadata() -> Self {
        TokenSource::Metadata {
            token_url: Url::parse(metadata::DEFAULT_METADATA_TOKEN_URL)
                .expect("metadata url to be valid"),
        }
    }

    /// Pick a token source, mirroring application default credentials.
    ///
    /// A static token wins, followed by a service account key file, falling
    /// back to the metadata server.
    pub fn resolve(static_token: Option<String>, credentials_path: Option<&Path>) -> Result<Self> {
        if let Some(token) = static_token.filter(|t| !t.is_empty()) {
            return Ok(TokenSource::Static(token));
        }
        if let Some(path) = credentials_path {
            let sa = ServiceAccount::try_from_path(path)?;
            return Ok(TokenSource::ServiceAccount(sa));
        }
        Ok(Self::metadata())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Static(_) => "static",
            Self::ServiceAccount(_) => "service_account",
            Self::Metadata { .. } => "metadata",
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_SKEW_SECS) < expires_at,
            None => true,
        }
    }
}

/// Hands out access tokens, caching them until shortly before expiry.
#[derive(Debug)]
pub struct TokenProvider {
    source: TokenSource,
    scopes: Vec<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(source: TokenSource) -> Self {
        Self::with_scopes(source, DEFAULT_SCOPES)
    }

    pub fn with_scopes(source: TokenSource, scopes: &[&str]) -> Self {
        TokenProvider {
            source,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            cached: Mutex::new(None),
        }
    }

    /// Get an access token, fetching a new one if needed.
    pub async fn access_token<C>(&self, client: &C) -> Result<String>
    where
        C: HttpClient,
    {
        if let TokenSource::Static(token) = &self.source {
            return Ok(token.clone());
        }

        let now = Utc::now();
        if let Some(cached) = self.cached.lock().as_ref() {
            if cached.is_fresh(now) {
                return Ok(cached.token.clone());
            }
        }

        let scopes: Vec<&str> = self.scopes.iter().map(|s| s.as_str()).collect();
        let token = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount(sa) => sa
                .fetch_access_token(client, &scopes.join(" "))
                .await
                .context("Failed to fetch token for service account")?,
            TokenSource::Metadata { token_url } => {
                metadata::fetch_access_token(client, token_url, &scopes).await?
            }
        };
        debug!(source = self.source.kind(), expires_in = token.expires_in, "fetched access token");

        let expires_at = now + Duration::seconds(token.expires_in as i64);
        *self.cached.lock() = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Some(expires_at),
        });

        Ok(token.access_token)
    }
}
