use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use csv2sheet_error::{Csv2SheetError, Result, ResultExt};
use reqwest::{Method, Request};
use ring::signature::RsaKeyPair;
use serde::{Deserialize, Serialize};
use url::Url;

use super::AccessToken;
use crate::client::{HttpClient, read_success_json, set_form_body};

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A service account key as downloaded from the cloud console.
#[derive(Deserialize)]
pub struct ServiceAccount {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    private_key_id: Option<String>,
    private_key: String,
    client_email: String,
    token_uri: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: u64,
    iat: u64,
}

impl ServiceAccount {
    pub fn try_from_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Failed to deserialize json service account key")
    }

    pub fn try_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context_fn(|| {
            format!(
                "Failed to read service account key at '{}'",
                path.display()
            )
        })?;
        Self::try_from_str(&content)
    }

    /// Create a signed JWT for requesting an access token.
    ///
    /// `scope` is a space separated list of oauth scopes.
    pub fn signed_jwt(&self, scope: &str, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp() as u64;
        let exp = (now + Duration::hours(1)).timestamp() as u64;

        let claims = JwtClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat,
            exp,
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
            kid: self.private_key_id.as_deref(),
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD
            .encode(serde_json::to_string(&header).context("Failed to encode jwt header")?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD
            .encode(serde_json::to_string(&claims).context("Failed to encode jwt claims")?);
        let signing_input = format!("{header_b64}.{claims_b64}");

        let key_pair = self.key_pair()?;

        // Sign with PKCS#1 v1.5 SHA-256 (RS256)
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| Csv2SheetError::new("Failed to sign payload"))?;

        let sig_b64 = BASE64_URL_SAFE_NO_PAD.encode(&signature);
        Ok(format!("{signing_input}.{sig_b64}"))
    }

    /// Fetch an access token using this service account.
    pub async fn fetch_access_token<C>(&self, client: &C, scope: &str) -> Result<AccessToken>
    where
        C: HttpClient,
    {
        let jwt = self.signed_jwt(scope, Utc::now())?;

        // Exchange the JWT for an access token
        let params = [("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", &jwt)];
        let url = Url::parse(&self.token_uri).context("Failed to parse token uri as url")?;
        let mut request = Request::new(Method::POST, url);
        set_form_body(&mut request, &params)?;

        let resp = client.do_request(request).await?;
        let token: AccessToken = read_success_json(resp).await?;

        Ok(token)
    }

    fn key_pair(&self) -> Result<RsaKeyPair> {
        let mut reader = std::io::Cursor::new(self.private_key.as_bytes());
        let key = rustls_pemfile::read_one(&mut reader).context("Invalid PEM private key")?;
        match key {
            Some(rustls_pemfile::Item::Pkcs8Key(der)) => {
                RsaKeyPair::from_pkcs8(der.secret_pkcs8_der()).map_err(|_| {
                    Csv2SheetError::new("Failed to create rsa key pair from pkcs8 key")
                })
            }
            Some(rustls_pemfile::Item::Pkcs1Key(der)) => {
                RsaKeyPair::from_der(der.secret_pkcs1_der()).map_err(|_| {
                    Csv2SheetError::new("Failed to create rsa key pair from pkcs1 key")
                })
            }
            _ => Err(Csv2SheetError::new("Missing key")),
        }
    }
}
