use csv2sheet_error::{Result, ResultExt};
use reqwest::header::HeaderValue;
use reqwest::{Method, Request};
use url::Url;

use super::AccessToken;
use crate::client::{HttpClient, read_success_json};

/// Token endpoint for the default service account of the compute instance.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Fetch an access token from the compute metadata server.
///
/// Available when running on Cloud Run, Cloud Functions, GCE, and GKE.
pub async fn fetch_access_token<C>(
    client: &C,
    token_url: &Url,
    scopes: &[&str],
) -> Result<AccessToken>
where
    C: HttpClient,
{
    let mut url = token_url.clone();
    if !scopes.is_empty() {
        url.query_pairs_mut().append_pair("scopes", &scopes.join(","));
    }

    let mut request = Request::new(Method::GET, url);
    request
        .headers_mut()
        .insert("Metadata-Flavor", HeaderValue::from_static("Google"));

    let resp = client
        .do_request(request)
        .await
        .context("Failed to reach metadata server")?;
    read_success_json(resp).await
}
