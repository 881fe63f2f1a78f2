//! The fetch-clean-append loop.

use anyhow::bail;
use artic_etl_db::ExhibitionRecord;
use artic_etl_telemetry::{audit, Metrics};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::api_client::ExhibitionsPage;
use crate::error::ApiError;
use crate::transformer::flatten_batch;

/// Anything that can produce pages of raw exhibition objects.
#[async_trait]
pub trait ExhibitionSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<ExhibitionsPage, ApiError>;
}

/// Anything that can persist batches of exhibition records.
///
/// `replace` drops and recreates the destination table from the batch;
/// `append` inserts into the existing table. Both return rows written.
#[async_trait]
pub trait ExhibitionSink: Send + Sync {
    async fn replace(&self, batch: &[ExhibitionRecord]) -> anyhow::Result<u64>;
    async fn append(&self, batch: &[ExhibitionRecord]) -> anyhow::Result<u64>;
}

/// Drives the two-state loop: one replace-semantics write, then
/// append-semantics writes until the running total reaches the threshold.
pub struct Loader<S, W> {
    source: S,
    sink: W,
    threshold: u64,
    metrics: Metrics,
    sample_output_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuditIteration {
    iteration: u64,
    page: u32,
    fetched: usize,
    kept: usize,
    rows_written: u64,
    total_rows: u64,
}

impl<S, W> Loader<S, W>
where
    S: ExhibitionSource,
    W: ExhibitionSink,
{
    pub fn new(
        source: S,
        sink: W,
        threshold: u64,
        metrics: Metrics,
        sample_output_path: Option<String>,
    ) -> Self {
        Self {
            source,
            sink,
            threshold,
            metrics,
            sample_output_path,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Run the loop to completion and return the final running total.
    ///
    /// Every source or sink failure is fatal and propagates immediately;
    /// nothing is retried.
    pub async fn run(&self) -> anyhow::Result<u64> {
        // INIT: first page, replace-semantics write.
        let mut page = 1u32;
        let first = self.source.fetch_page(page).await?;
        if first.data.is_empty() {
            bail!("exhibitions feed returned no records");
        }
        let batch = flatten_batch(&first.data);
        self.metrics
            .inc_records_dropped((first.data.len() - batch.len()) as u64);

        let written = self.sink.replace(&batch).await?;
        self.metrics.inc_rows_written(written);
        let mut total = written;
        info!(total, kept = batch.len(), fetched = first.data.len(), "Stored initial batch");
        self.sample(0, page, first.data.len(), batch.len(), written, total);

        let mut total_pages = first.total_pages;
        // Guards against a full pass over the feed that writes nothing,
        // which would otherwise loop forever.
        let mut wrote_since_wrap = written > 0;
        let mut iteration = 0u64;

        // ACCUMULATE: append-semantics writes until the threshold is met.
        while total < self.threshold {
            iteration += 1;
            let next = match total_pages {
                Some(last) if u64::from(page) >= last => 1,
                _ => page + 1,
            };
            if next == 1 {
                if !wrote_since_wrap {
                    bail!("completed a full pass over the feed without writing any rows");
                }
                wrote_since_wrap = false;
            }
            page = next;

            let fetched = self.source.fetch_page(page).await?;
            if fetched.total_pages.is_some() {
                total_pages = fetched.total_pages;
            }
            if fetched.data.is_empty() {
                if page == 1 {
                    bail!("exhibitions feed returned no records");
                }
                // Ran off the end of the feed; remember where it ended so
                // the cursor wraps on the next pass.
                warn!(page, "Empty page, treating as end of feed");
                total_pages = Some(u64::from(page) - 1);
                continue;
            }

            let batch = flatten_batch(&fetched.data);
            self.metrics
                .inc_records_dropped((fetched.data.len() - batch.len()) as u64);

            let written = self.sink.append(&batch).await?;
            self.metrics.inc_rows_written(written);
            total += written;
            if written > 0 {
                wrote_since_wrap = true;
            }
            info!(total, page, kept = batch.len(), fetched = fetched.data.len(), "Stored batch");
            self.sample(iteration, page, fetched.data.len(), batch.len(), written, total);
        }

        info!(total, threshold = self.threshold, "Loader finished");
        Ok(total)
    }

    fn sample(
        &self,
        iteration: u64,
        page: u32,
        fetched: usize,
        kept: usize,
        rows_written: u64,
        total_rows: u64,
    ) {
        let payload = AuditIteration {
            iteration,
            page,
            fetched,
            kept,
            rows_written,
            total_rows,
        };
        if let Err(e) = audit::write_audit_sample(self.sample_output_path.as_ref(), &payload) {
            warn!("Failed to write audit sample: {}", e);
        }
    }
}
