//! A recording http client for tests.
//!
//! Responses are queued up front and handed out in order. Every request is
//! recorded so tests can assert on exactly what would have gone over the wire.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use csv2sheet_error::{Csv2SheetError, Result};
use futures::future::{Ready, ready};
use futures::stream::{self, Iter};
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, StatusCode};
use url::Url;

use crate::client::{HttpClient, HttpResponse};

#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    requests: Vec<RecordedRequest>,
}

#[derive(Debug)]
enum MockReply {
    Response(MockResponse),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RecordedRequest {
    pub fn body_str(&self) -> String {
        match &self.body {
            Some(body) => String::from_utf8_lossy(body).to_string(),
            None => String::new(),
        }
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body_str()).expect("request body to be json")
    }
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    body: Bytes,
    chunk_size: Option<usize>,
}

impl MockResponse {
    pub fn bytes(status: u16, body: impl Into<Bytes>) -> Self {
        MockResponse {
            status: StatusCode::from_u16(status).expect("valid status code"),
            body: body.into(),
            chunk_size: None,
        }
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::bytes(status, body.to_string())
    }

    /// Stream the body in chunks of the given size.
    pub fn chunked(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }
}

impl MockHttpClient {
    /// Queue a response for the next request.
    pub fn push_response(&self, resp: MockResponse) {
        self.state.lock().replies.push_back(MockReply::Response(resp));
    }

    /// Queue a transport error for the next request.
    pub fn push_error(&self, msg: impl Into<String>) {
        self.state.lock().replies.push_back(MockReply::Error(msg.into()));
    }

    /// All requests made so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }
}

impl HttpClient for MockHttpClient {
    type Response = MockResponse;
    type RequestFuture = Ready<Result<MockResponse>>;

    fn do_request(&self, request: Request) -> Self::RequestFuture {
        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request
                .body()
                .and_then(|b| b.as_bytes())
                .map(Bytes::copy_from_slice),
        });

        let result = match state.replies.pop_front() {
            Some(MockReply::Response(resp)) => Ok(resp),
            Some(MockReply::Error(msg)) => Err(Csv2SheetError::new(msg)),
            None => Err(Csv2SheetError::new("No mock response queued")
                .with_field("url", request.url())),
        };
        ready(result)
    }
}

impl HttpResponse for MockResponse {
    type BytesStream = Iter<std::vec::IntoIter<Result<Bytes>>>;

    fn status(&self) -> StatusCode {
        self.status
    }

    fn into_bytes_stream(self) -> Self::BytesStream {
        let chunks: Vec<Result<Bytes>> = match self.chunk_size {
            Some(size) if size > 0 && !self.body.is_empty() => self
                .body
                .chunks(size)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect(),
            _ => vec![Ok(self.body)],
        };
        stream::iter(chunks)
    }
}
