//! # PubChem Record Fetcher
//!
//! Resolves one NSC identifier into a [`ResultRecord`] with two dependent
//! PUG REST calls:
//!
//! 1. `substance/name/NSC{id}/JSON`, retried per the [`RetryPolicy`] on
//!    non-200 statuses and transport errors.
//! 2. `compound/name/NSC{id}/cids/JSON`, attempted once after the first call
//!    succeeds.
//!
//! Neither call can fail the fetch: every failure path ends in `NotFound`
//! fields, so callers always get exactly one record back.

use std::time::Duration;

use reqwest::Method;
use tokio::time::sleep;

use crate::pubchem::model::{newest_substance, CidResponse, Lookup, NscId, ResultRecord, SubstanceResponse};
use crate::pubchem::retry::RetryPolicy;
use crate::retrieve::ky_http::ApiClient;

/// PUG REST root used when no other base URL is configured.
pub const PUBCHEM_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug/";
/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// How much of an unusable body goes into a log line.
const LOG_BODY_CHARS: usize = 200;

/// # Record Fetcher
///
/// Shared by every worker of a batch; holds no per-identifier state.
#[derive(Debug, Clone)]
pub struct RecordFetcher {
    client: ApiClient,
    policy: RetryPolicy,
}

impl RecordFetcher {
    /// A fetcher over an existing client.
    pub fn new(client: ApiClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// # Fetch One Identifier
    ///
    /// ## Logic:
    /// 1.  GET the substance list, up to `max_attempts` times.
    /// 2.  **On HTTP 200**: pick the newest substance, run the compound lookup
    ///     and return. A body that does not parse counts as an empty list.
    /// 3.  **On any other status or a transport error**: log, wait for the
    ///     policy's delay, and try again. There is no wait after the last attempt.
    /// 4.  Once attempts run out, log the failure and return the all-`NotFound` record.
    pub async fn fetch(&self, nsc_id: &NscId) -> ResultRecord {
        let name = nsc_id.query_name();
        let segments = ["substance", "name", name.as_str(), "JSON"];
        let max_attempts = self.policy.max_attempts();

        for attempt in 1..=max_attempts {
            match self.client.request::<SubstanceResponse>(Method::GET, &segments).await {
                Ok(response) if response.is_ok_200() => {
                    let body = match response.data {
                        Some(body) => body,
                        None => {
                            log::warn!(
                                "{}: substance body could not be parsed, treating as no data: {}",
                                name,
                                response.body_excerpt(LOG_BODY_CHARS)
                            );
                            SubstanceResponse::default()
                        }
                    };
                    return self.assemble(nsc_id, &name, body).await;
                }
                Ok(response) => {
                    log::warn!(
                        "{}: attempt {}/{} received status {}: {}",
                        name,
                        attempt,
                        max_attempts,
                        response.status,
                        response.body_excerpt(LOG_BODY_CHARS)
                    );
                }
                Err(e) => {
                    log::warn!("{}: attempt {}/{} failed: {}", name, attempt, max_attempts, e);
                }
            }

            if attempt < max_attempts {
                let delay = self.policy.delay_after(attempt);
                log::debug!("{}: retrying in {:.1}s", name, delay.as_secs_f64());
                sleep(delay).await;
            }
        }

        log::error!("Failed to fetch data for {} after {} attempts", name, max_attempts);
        ResultRecord::not_found(nsc_id.clone())
    }

    /// Builds the record from a successful substance body plus the compound lookup.
    async fn assemble(&self, nsc_id: &NscId, name: &str, body: SubstanceResponse) -> ResultRecord {
        let (sid, version, synonyms) = match newest_substance(&body.substances) {
            Some(newest) => (
                Lookup::from(newest.substance_id()),
                Lookup::from(newest.declared_version()),
                Lookup::from(newest.joined_synonyms()),
            ),
            None => {
                log::info!("{}: no substance records", name);
                (Lookup::NotFound, Lookup::NotFound, Lookup::NotFound)
            }
        };

        let cid = self.lookup_compound_id(nsc_id).await;

        ResultRecord {
            nsc_id: nsc_id.clone(),
            sid,
            version,
            cid,
            synonyms,
        }
    }

    /// # Compound-ID Lookup
    ///
    /// One attempt, no retry. Returns the first CID listed, or `NotFound` when
    /// the list is empty or the call fails in any way. Failures are only
    /// logged at debug level.
    pub async fn lookup_compound_id(&self, nsc_id: &NscId) -> Lookup<u64> {
        let name = nsc_id.query_name();
        let segments = ["compound", "name", name.as_str(), "cids", "JSON"];

        match self.client.request::<CidResponse>(Method::GET, &segments).await {
            Ok(response) if response.is_ok_200() => match response.data {
                Some(body) => Lookup::from(body.identifier_list.cid.first().copied()),
                None => {
                    log::debug!("{}: CID body could not be parsed", name);
                    Lookup::NotFound
                }
            },
            Ok(response) => {
                log::debug!(
                    "{}: CID lookup returned status {}: {}",
                    name,
                    response.status,
                    response.body_excerpt(LOG_BODY_CHARS)
                );
                Lookup::NotFound
            }
            Err(e) => {
                log::debug!("{}: CID lookup failed: {}", name, e);
                Lookup::NotFound
            }
        }
    }
}
