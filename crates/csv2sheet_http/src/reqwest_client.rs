use std::time::Duration;

use bytes::Bytes;
use csv2sheet_error::{Csv2SheetError, Result, ResultExt};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::{Request, StatusCode};
use tracing::debug;

use crate::client::{HttpClient, HttpResponse};

/// Default timeout for a single request, including reading the body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Native http client backed by reqwest.
///
/// This _must_ be used within the context of a tokio runtime.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestClient { client }
    }

    pub fn try_default() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .user_agent(concat!("csv2sheet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build http client")?;
        Ok(ReqwestClient { client })
    }
}

impl HttpClient for ReqwestClient {
    type Response = ReqwestResponse;
    type RequestFuture = BoxFuture<'static, Result<Self::Response>>;

    fn do_request(&self, request: Request) -> Self::RequestFuture {
        debug!(method = %request.method(), url = %request.url(), "http request");
        self.client
            .execute(request)
            .map(|result| match result {
                Ok(resp) => Ok(ReqwestResponse(resp)),
                Err(e) => Err(Csv2SheetError::with_source(
                    "Failed to make request",
                    Box::new(e),
                )),
            })
            .boxed()
    }
}

#[derive(Debug)]
pub struct ReqwestResponse(reqwest::Response);

impl HttpResponse for ReqwestResponse {
    type BytesStream = BoxStream<'static, Result<Bytes>>;

    fn status(&self) -> StatusCode {
        self.0.status()
    }

    fn into_bytes_stream(self) -> Self::BytesStream {
        self.0
            .bytes_stream()
            .map_err(|e| Csv2SheetError::with_source("Failed to stream body", Box::new(e)))
            .boxed()
    }
}
