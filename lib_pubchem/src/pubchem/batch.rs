//! # Batch Driver
//!
//! Runs the [`RecordFetcher`] over a worklist with a fixed number of fetches
//! in flight, and hands back one record per identifier in input order.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};

use crate::pubchem::fetcher::RecordFetcher;
use crate::pubchem::model::{NscId, ResultRecord};

/// Concurrent fetches used when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 3;

/// # Batch Driver
pub struct BatchDriver {
    fetcher: Arc<RecordFetcher>,
    workers: usize,
}

impl BatchDriver {
    /// A driver with `workers` concurrent fetches. Zero is treated as one.
    pub fn new(fetcher: Arc<RecordFetcher>, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
        }
    }

    /// Effective pool size.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetches every identifier and returns the records in input order.
    ///
    /// Completion order across workers is arbitrary; each result carries its
    /// input position and the list is re-sorted before returning.
    pub async fn run(&self, identifiers: Vec<NscId>) -> Vec<ResultRecord> {
        let total = identifiers.len();
        log::info!("Fetching {} identifiers with {} workers", total, self.workers);

        let mut done = 0usize;
        let mut indexed: Vec<(usize, ResultRecord)> = stream::iter(identifiers.into_iter().enumerate())
            .map(|(index, nsc_id)| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let record = fetcher.fetch(&nsc_id).await;
                    (index, record)
                }
            })
            .buffer_unordered(self.workers)
            .inspect(|(_, record)| {
                done += 1;
                log::info!("[{}/{}] {} done", done, total, record.nsc_id);
            })
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        let records: Vec<ResultRecord> = indexed.into_iter().map(|(_, record)| record).collect();

        let complete = records.iter().filter(|r| r.is_complete()).count();
        log::info!(
            "Batch finished: {} records, {} fully resolved, {} with missing fields",
            records.len(),
            complete,
            records.len() - complete
        );

        records
    }
}
