//! Error documents returned by Google JSON apis.

use csv2sheet_error::Csv2SheetError;
use reqwest::StatusCode;
use serde::Deserialize;

// <https://cloud.google.com/apis/design/errors#http_mapping>
#[derive(Debug, Deserialize)]
struct ApiErrorDocument {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Build an error for a non-success response.
///
/// If the body isn't a Google error document, the (truncated) raw body is
/// included instead.
pub(crate) fn api_error(status: StatusCode, body: &[u8]) -> Csv2SheetError {
    const MAX_BODY_LEN: usize = 512;

    let err = Csv2SheetError::new("Google API request failed").with_field("status", status);

    match serde_json::from_slice::<ApiErrorDocument>(body) {
        Ok(doc) => {
            let err = err.with_field("message", doc.error.message);
            match doc.error.status {
                Some(code) => err.with_field("code", code),
                None => err,
            }
        }
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let text: String = text.chars().take(MAX_BODY_LEN).collect();
            err.with_field("body", text)
        }
    }
}
