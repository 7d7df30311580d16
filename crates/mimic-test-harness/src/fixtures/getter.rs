//! An async collaborator with an injected transport.
//!
//! There is no HTTP client here: the transport is whatever function the
//! getter is built with, and the default one reports that it is offline.

use futures::future::BoxFuture;
use mimic_mock::{impl_auto_mock, AsyncFnSlot};

/// What a GET request produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GetError {
    #[error("no transport available for {url}")]
    Offline { url: String },

    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },
}

/// Fetches pages under `https://google.com/`.
pub struct GoogleGetter {
    pub http_get_request: AsyncFnSlot<(String,), Response, GetError>,
}

impl_auto_mock!(GoogleGetter { http_get_request });

impl GoogleGetter {
    pub const BASE_URL: &'static str = "https://google.com";

    /// A getter with no network: every request fails with [`GetError::Offline`].
    pub fn new() -> Self {
        Self::with_transport(|url| -> BoxFuture<'static, Result<Response, GetError>> {
            Box::pin(async move { Err::<Response, _>(GetError::Offline { url }) })
        })
    }

    /// A getter that sends requests through `transport`.
    pub fn with_transport<F>(transport: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, Result<Response, GetError>> + Send + Sync + 'static,
    {
        Self {
            http_get_request: AsyncFnSlot::new("http_get_request", move |(url,): (String,)| {
                transport(url)
            }),
        }
    }

    pub async fn http_get_request(&self, url: &str) -> Result<Response, GetError> {
        self.http_get_request.call((url.to_string(),)).await
    }

    /// GET `https://google.com/{sub}`.
    pub async fn http_get_google(&self, sub: &str) -> Result<Response, GetError> {
        let url = format!("{}/{}", Self::BASE_URL, sub);
        tracing::debug!(%url, "fetching");
        self.http_get_request(&url).await
    }
}

impl Default for GoogleGetter {
    fn default() -> Self {
        Self::new()
    }
}
