//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous JSON API client wrapper around `reqwest`.
//! Retrying is left to the caller: each call to [`ApiClient::request`] is exactly
//! one HTTP exchange, so callers can apply their own attempt limits and delays.

use std::time::Duration;

use anyhow::anyhow;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

/// A standardized container for API responses.
///
/// Wraps the deserialized data together with the status code and, when the
/// body was unusable, the raw text for diagnostics.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw body when it could not be used: the error body of a failed
    /// request, or a body that did not deserialize into `T`.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
}

impl<T> ApiResponse<T> {
    /// True only for a plain `200 OK`.
    pub fn is_ok_200(&self) -> bool {
        self.status == 200
    }

    /// The first `max_chars` characters of `error_body`, whitespace collapsed,
    /// with `...` appended when cut. Empty when there is no body.
    pub fn body_excerpt(&self, max_chars: usize) -> String {
        let Some(body) = self.error_body.as_deref() else {
            return String::new();
        };
        let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
        match flat.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &flat[..cut]),
            None => flat,
        }
    }
}

/// A flexible asynchronous HTTP client.
///
/// Holds a base URL and a pooled `reqwest::Client` with a fixed per-request
/// timeout. Cloning is cheap and shares the connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    /// The underlying pooled client.
    inner: reqwest::Client,
    /// The base URL to which all path segments are appended.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient` instance.
    ///
    /// # Arguments
    /// * `base_url` - The absolute base URL for the API (e.g., "https://pubchem.ncbi.nlm.nih.gov/rest/pug/").
    /// * `timeout` - Applied to every request, connect through body.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not an absolute URL that can carry a path,
    /// or if the TLS backend fails to initialize.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(anyhow!("Invalid base URL (must be absolute): {}", base_url));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nsc_mapper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: client,
            base_url: url,
        })
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded, so
    /// caller-supplied values can never escape their path position.
    pub fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Performs a single HTTP request and handles the response.
    ///
    /// A non-2xx status is not an error: it comes back as an `ApiResponse`
    /// with the raw body in `error_body`. Likewise a 2xx body that does not
    /// deserialize into `T` comes back with `data: None` and the raw body.
    ///
    /// # Arguments
    /// * `method` - The HTTP verb (GET, POST, etc.).
    /// * `segments` - Path segments to append to the base URL.
    ///
    /// # Errors
    /// Returns an `anyhow::Error` if URL building or network execution fails,
    /// including timeouts.
    pub async fn request<T>(&self, method: Method, segments: &[&str]) -> anyhow::Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        // 1. Construct the full absolute URL
        let full_url = self.endpoint(segments)?;

        // 2. Execute the request and capture the status
        let response: reqwest::Response = self.inner.request(method, full_url).send().await?;
        let status = response.status();

        // 3. Read the whole body; a read failure mid-stream is a transport error
        let text = response.text().await?;

        let parsed = if status.is_success() {
            serde_json::from_str::<T>(&text).ok()
        } else {
            None
        };
        let error_body = match parsed {
            Some(_) => None,
            None => Some(text),
        };

        Ok(ApiResponse {
            data: parsed,
            error_body,
            status: status.as_u16(),
        })
    }
}
