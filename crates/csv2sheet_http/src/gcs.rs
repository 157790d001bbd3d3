//! Reading objects through the GCS JSON api.

use std::sync::Arc;

use bytes::Bytes;
use csv2sheet_error::{Result, ResultExt};
use reqwest::{Method, Request};
use tracing::debug;
use url::Url;

use crate::auth::TokenProvider;
use crate::client::{HttpClient, read_success_bytes, set_bearer_auth};
use crate::endpoint::join_segments;

#[derive(Debug, Clone)]
pub struct GcsClient<C: HttpClient> {
    client: C,
    tokens: Arc<TokenProvider>,
    endpoint: Url,
}

impl<C> GcsClient<C>
where
    C: HttpClient,
{
    pub fn new(client: C, tokens: Arc<TokenProvider>, endpoint: Url) -> Self {
        GcsClient {
            client,
            tokens,
            endpoint,
        }
    }

    /// Url for downloading the object's content.
    // <https://cloud.google.com/storage/docs/json_api/v1/objects/get>
    pub fn object_media_url(&self, bucket: &str, name: &str) -> Result<Url> {
        let mut url = join_segments(
            &self.endpoint,
            ["storage", "v1", "b", bucket, "o", name],
        )?;
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    /// Read the entire contents of an object into memory.
    pub async fn read_object(&self, bucket: &str, name: &str) -> Result<Bytes> {
        let url = self.object_media_url(bucket, name)?;
        debug!(%bucket, %name, "reading object");

        let token = self.tokens.access_token(&self.client).await?;
        let mut request = Request::new(Method::GET, url);
        set_bearer_auth(&mut request, &token)?;

        let resp = self.client.do_request(request).await?;
        let bytes = read_success_bytes(resp)
            .await
            .context_fn(|| format!("Failed to read object 'gs://{bucket}/{name}'"))?;

        debug!(%bucket, %name, len = bytes.len(), "read object");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::AUTHORIZATION;

    use super::*;
    use crate::auth::TokenSource;
    use crate::endpoint::DEFAULT_STORAGE_ENDPOINT;
    use crate::testutil::{MockHttpClient, MockResponse};

    fn gcs_client(client: &MockHttpClient) -> GcsClient<MockHttpClient> {
        GcsClient::new(
            client.clone(),
            Arc::new(TokenProvider::new(TokenSource::Static("tok".to_string()))),
            Url::parse(DEFAULT_STORAGE_ENDPOINT).unwrap(),
        )
    }

    #[test]
    fn media_url_encodes_name() {
        let client = MockHttpClient::default();
        let gcs = gcs_client(&client);

        let url = gcs
            .object_media_url("my-bucket", "Game Data Definitions - Sheet1.csv")
            .unwrap();
        assert_eq!(
            "https://storage.googleapis.com/storage/v1/b/my-bucket/o/Game%20Data%20Definitions%20-%20Sheet1.csv?alt=media",
            url.as_str()
        );
    }

    #[tokio::test]
    async fn read_chunked_object() {
        let client = MockHttpClient::default();
        client.push_response(MockResponse::bytes(200, "a,b\n1,2\n3,4\n").chunked(3));

        let gcs = gcs_client(&client);
        let bytes = gcs.read_object("bucket", "data.csv").await.unwrap();
        assert_eq!(&b"a,b\n1,2\n3,4\n"[..], &bytes[..]);

        let requests = client.requests();
        assert_eq!(1, requests.len());
        assert_eq!(Method::GET, requests[0].method);
        assert_eq!(
            "Bearer tok",
            requests[0].headers.get(AUTHORIZATION).unwrap().to_str().unwrap()
        );
    }

    #[tokio::test]
    async fn read_missing_object() {
        let client = MockHttpClient::default();
        client.push_response(MockResponse::json(
            404,
            serde_json::json!({"error": {"code": 404, "message": "No such object: bucket/data.csv"}}),
        ));

        let gcs = gcs_client(&client);
        let err = gcs.read_object("bucket", "data.csv").await.unwrap_err();
        assert_eq!("Failed to read object 'gs://bucket/data.csv'", err.get_msg());
    }

    #[tokio::test]
    async fn read_transport_error() {
        let client = MockHttpClient::default();
        client.push_error("connection reset");

        let gcs = gcs_client(&client);
        let err = gcs.read_object("bucket", "data.csv").await.unwrap_err();
        assert_eq!("connection reset", err.get_msg());
    }
}
