use std::fmt::Debug;

use bytes::{Bytes, BytesMut};
use csv2sheet_error::{Result, ResultExt};
use futures::{Stream, TryStreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Request, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api_error::api_error;

pub trait HttpClient: Sync + Send + Debug + Clone + 'static {
    type Response: HttpResponse;
    type RequestFuture: Future<Output = Result<Self::Response>> + Send + Unpin;

    /// Do the request.
    fn do_request(&self, request: Request) -> Self::RequestFuture;
}

pub trait HttpResponse: Send {
    type BytesStream: Stream<Item = Result<Bytes>> + Send + Unpin;

    fn status(&self) -> StatusCode;

    /// Convert the response body into a byte stream.
    fn into_bytes_stream(self) -> Self::BytesStream;
}

/// Helper to set a json body on this request.
///
/// Overwrites the existing body and 'Content-Type' of the request.
pub fn set_json_body<T>(request: &mut Request, body: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(body).context("Failed to serialize request body to json")?;
    *request.body_mut() = Some(body.into());
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(())
}

/// Helper to set a form body on this request.
///
/// Overwrites the existing body and 'Content-Type' of the request.
pub fn set_form_body<T>(request: &mut Request, body: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let body = serde_urlencoded::to_string(body)
        .context("Failed to serialize request body to url encoded form")?;
    *request.body_mut() = Some(body.into());
    request.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );

    Ok(())
}

/// Set a bearer token on the request.
pub fn set_bearer_auth(request: &mut Request, token: &str) -> Result<()> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .context("Access token is not a valid header value")?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);

    Ok(())
}

/// Collect a full response body from a byte stream.
pub async fn read_bytes_response<S>(mut stream: S) -> Result<Bytes>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.try_next().await? {
        buf.extend_from_slice(chunk.as_ref());
    }
    Ok(buf.freeze())
}

/// Read the body of a successful response, erroring on any non-2xx status.
///
/// Error bodies are inspected for a Google API error document to provide a
/// useful message.
pub async fn read_success_bytes<R>(resp: R) -> Result<Bytes>
where
    R: HttpResponse,
{
    let status = resp.status();
    let body = read_bytes_response(resp.into_bytes_stream()).await?;
    if !status.is_success() {
        return Err(api_error(status, &body));
    }
    Ok(body)
}

/// Same as `read_success_bytes` but deserializes the body as json.
pub async fn read_success_json<T, R>(resp: R) -> Result<T>
where
    T: DeserializeOwned,
    R: HttpResponse,
{
    let body = read_success_bytes(resp).await?;
    serde_json::from_slice(&body).context("Failed to deserialize response body as json")
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use reqwest::Method;
    use url::Url;

    use super::*;

    #[test]
    fn json_body_sets_content_type() {
        let mut req = Request::new(Method::POST, Url::parse("http://localhost/").unwrap());
        set_json_body(&mut req, &serde_json::json!({"a": 1})).unwrap();

        assert_eq!(
            "application/json",
            req.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap()
        );
        assert_eq!(br#"{"a":1}"#, req.body().unwrap().as_bytes().unwrap());
    }

    #[test]
    fn bearer_auth_is_sensitive() {
        let mut req = Request::new(Method::GET, Url::parse("http://localhost/").unwrap());
        set_bearer_auth(&mut req, "abc").unwrap();

        let header = req.headers().get(AUTHORIZATION).unwrap();
        assert_eq!("Bearer abc", header.to_str().unwrap());
        assert!(header.is_sensitive());
    }

    #[tokio::test]
    async fn read_chunked_bytes() {
        let chunks = vec![
            Ok(Bytes::from_static(b"name,")),
            Ok(Bytes::from_static(b"score\n")),
            Ok(Bytes::from_static(b"a,1\n")),
        ];
        let bytes = read_bytes_response(stream::iter(chunks)).await.unwrap();
        assert_eq!(&b"name,score\na,1\n"[..], &bytes[..]);
    }
}
