//! # Data Retrieval Module
//!
//! A centralized location for the HTTP client used to talk to remote services.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A generic JSON `ApiClient` built on `reqwest`, with a base
//!   URL, a fixed request timeout and non-throwing handling of error statuses.
//!   Retry policy lives with the callers (see `pubchem::fetcher`).

/// Generic HTTP API client for single-shot JSON requests.
pub mod ky_http;
