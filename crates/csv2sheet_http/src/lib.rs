pub mod auth;
pub mod client;
pub mod endpoint;
pub mod gcs;
pub mod reqwest_client;
pub mod sheets;

mod api_error;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

// Re-export some types to use with the http client.
pub use reqwest::header::HeaderMap;
pub use reqwest::{Method, Request, StatusCode};
pub use url::Url;
