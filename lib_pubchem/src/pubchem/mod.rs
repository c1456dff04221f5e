//! # PubChem Integration Module
//!
//! Maps NSC identifiers onto PubChem substance and compound records.
//!
//! ## Contained Modules:
//!
//! - **`model`**: identifiers, the per-field `Lookup` outcome, `ResultRecord`
//!   and the serde models of the PUG REST bodies.
//! - **`retry`**: attempt limit and the injectable delay strategies.
//! - **`fetcher`**: the per-identifier substance + compound lookup.
//! - **`batch`**: the bounded-concurrency driver over a whole worklist.

/// Identifiers, result records and PUG REST body models.
pub mod model;
/// Retry policy and delay strategies.
pub mod retry;
/// Per-identifier fetch with retries.
pub mod fetcher;
/// Worklist driver with a fixed worker pool.
pub mod batch;

pub use batch::{BatchDriver, DEFAULT_WORKERS};
pub use fetcher::{RecordFetcher, DEFAULT_TIMEOUT, PUBCHEM_BASE_URL};
pub use model::{Lookup, NscId, ResultRecord, NOT_FOUND};
pub use retry::{
    DelayStrategy, FixedDelay, JitteredDelay, RetryConfigError, RetryPolicy, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS,
};
