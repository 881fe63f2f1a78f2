//! Prometheus metrics for the exhibitions loader.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};

/// Metrics collector for the loader.
///
/// Counters live in a per-instance registry rather than the process-global
/// one, so independent instances (one per test, for example) never collide
/// on registration.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pages_fetched: IntCounter,
    records_fetched: IntCounter,
    records_dropped: IntCounter,
    rows_written: IntCounter,
    api_errors: IntCounter,
    api_latency: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance with its own registry.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let pages_fetched = IntCounter::with_opts(Opts::new(
            "artic_etl_pages_fetched_total",
            "Total number of API pages fetched",
        ))?;
        registry.register(Box::new(pages_fetched.clone()))?;

        let records_fetched = IntCounter::with_opts(Opts::new(
            "artic_etl_records_fetched_total",
            "Total number of raw exhibition records fetched",
        ))?;
        registry.register(Box::new(records_fetched.clone()))?;

        let records_dropped = IntCounter::with_opts(Opts::new(
            "artic_etl_records_dropped_total",
            "Total number of records dropped for missing title or image_url",
        ))?;
        registry.register(Box::new(records_dropped.clone()))?;

        let rows_written = IntCounter::with_opts(Opts::new(
            "artic_etl_rows_written_total",
            "Total number of rows written to the destination table",
        ))?;
        registry.register(Box::new(rows_written.clone()))?;

        let api_errors = IntCounter::with_opts(Opts::new(
            "artic_etl_api_errors_total",
            "Total number of failed API requests",
        ))?;
        registry.register(Box::new(api_errors.clone()))?;

        let api_latency = HistogramVec::new(
            HistogramOpts::new(
                "artic_etl_api_latency_seconds",
                "API request latency in seconds",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(api_latency.clone()))?;

        Ok(Self {
            registry,
            pages_fetched,
            records_fetched,
            records_dropped,
            rows_written,
            api_errors,
            api_latency,
        })
    }

    pub fn inc_pages_fetched(&self) {
        self.pages_fetched.inc();
    }

    pub fn inc_records_fetched(&self, count: u64) {
        self.records_fetched.inc_by(count);
    }

    pub fn inc_records_dropped(&self, count: u64) {
        self.records_dropped.inc_by(count);
    }

    pub fn inc_rows_written(&self, count: u64) {
        self.rows_written.inc_by(count);
    }

    pub fn inc_api_errors(&self) {
        self.api_errors.inc();
    }

    /// Record API request latency.
    pub fn observe_api_latency(&self, operation: &str, duration_secs: f64) {
        self.api_latency
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_instances_do_not_collide() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.inc_pages_fetched();
        a.inc_rows_written(42);
        b.inc_pages_fetched();

        let rendered = a.gather().unwrap();
        assert!(rendered.contains("artic_etl_rows_written_total 42"));
        assert!(rendered.contains("artic_etl_pages_fetched_total 1"));
    }
}
