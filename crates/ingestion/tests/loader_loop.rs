//! Loop-behavior tests for the loader, using in-memory source and sink.

use std::sync::Mutex;

use artic_etl_db::ExhibitionRecord;
use artic_etl_ingestion::{ApiError, ExhibitionSink, ExhibitionSource, ExhibitionsPage, Loader};
use artic_etl_telemetry::Metrics;
use async_trait::async_trait;
use serde_json::{json, Value};

fn valid_record(id: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Exhibition {id}"),
        "image_url": format!("https://example.org/{id}.jpg"),
        "web_url": null
    })
}

fn invalid_record(id: i64) -> Value {
    json!({ "id": id, "title": null, "image_url": format!("https://example.org/{id}.jpg") })
}

/// Source returning `rows_per_page` valid records for every page, recording
/// the pages requested.
struct FixedSource {
    rows_per_page: usize,
    total_pages: Option<u64>,
    pages_seen: Mutex<Vec<u32>>,
}

impl FixedSource {
    fn new(rows_per_page: usize, total_pages: Option<u64>) -> Self {
        Self {
            rows_per_page,
            total_pages,
            pages_seen: Mutex::new(Vec::new()),
        }
    }

    fn pages_seen(&self) -> Vec<u32> {
        self.pages_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExhibitionSource for FixedSource {
    async fn fetch_page(&self, page: u32) -> Result<ExhibitionsPage, ApiError> {
        self.pages_seen.lock().unwrap().push(page);
        let past_end = self
            .total_pages
            .is_some_and(|last| u64::from(page) > last);
        let data = if past_end {
            Vec::new()
        } else {
            (0..self.rows_per_page).map(|i| valid_record(i as i64)).collect()
        };
        Ok(ExhibitionsPage {
            data,
            total_pages: self.total_pages,
        })
    }
}

/// Source that fails every request with a server error.
struct FailingSource;

#[async_trait]
impl ExhibitionSource for FailingSource {
    async fn fetch_page(&self, _page: u32) -> Result<ExhibitionsPage, ApiError> {
        Err(ApiError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum WriteCall {
    Replace(usize),
    Append(usize),
}

/// Sink recording every write and the rows it carried.
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<WriteCall>>,
}

impl RecordingSink {
    fn calls(&self) -> Vec<WriteCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExhibitionSink for RecordingSink {
    async fn replace(&self, batch: &[ExhibitionRecord]) -> anyhow::Result<u64> {
        self.calls.lock().unwrap().push(WriteCall::Replace(batch.len()));
        Ok(batch.len() as u64)
    }

    async fn append(&self, batch: &[ExhibitionRecord]) -> anyhow::Result<u64> {
        self.calls.lock().unwrap().push(WriteCall::Append(batch.len()));
        Ok(batch.len() as u64)
    }
}

fn loader<S: ExhibitionSource>(source: S, threshold: u64) -> Loader<S, RecordingSink> {
    Loader::new(
        source,
        RecordingSink::default(),
        threshold,
        Metrics::new().unwrap(),
        None,
    )
}

#[tokio::test]
async fn threshold_250_with_100_row_pages_takes_three_writes() {
    let loader = loader(FixedSource::new(100, None), 250);
    let total = loader.run().await.unwrap();

    // One replace at total=100, appends to 200 then 300, stop at 300 >= 250.
    assert_eq!(total, 300);
}

#[tokio::test]
async fn init_replaces_then_accumulate_appends() {
    let source = FixedSource::new(100, None);
    let sink = RecordingSink::default();
    let loader = Loader::new(source, sink, 250, Metrics::new().unwrap(), None);
    loader.run().await.unwrap();

    assert_eq!(
        loader_sink(&loader).calls(),
        vec![
            WriteCall::Replace(100),
            WriteCall::Append(100),
            WriteCall::Append(100),
        ]
    );
}

#[tokio::test]
async fn page_cursor_advances_each_iteration() {
    let source = FixedSource::new(100, None);
    let sink = RecordingSink::default();
    let loader = Loader::new(source, sink, 250, Metrics::new().unwrap(), None);
    loader.run().await.unwrap();

    assert_eq!(loader_source(&loader).pages_seen(), vec![1, 2, 3]);
}

#[tokio::test]
async fn page_cursor_wraps_at_total_pages() {
    let source = FixedSource::new(100, Some(2));
    let sink = RecordingSink::default();
    let loader = Loader::new(source, sink, 250, Metrics::new().unwrap(), None);
    loader.run().await.unwrap();

    assert_eq!(loader_source(&loader).pages_seen(), vec![1, 2, 1]);
}

#[tokio::test]
async fn server_error_aborts_before_any_write() {
    let source = FailingSource;
    let sink = RecordingSink::default();
    let loader = Loader::new(source, sink, 250, Metrics::new().unwrap(), None);
    let err = loader.run().await.unwrap_err();

    assert!(err.to_string().contains("500"));
    assert!(loader_sink(&loader).calls().is_empty());
}

#[tokio::test]
async fn empty_first_page_is_an_error_not_a_spin() {
    let loader = loader(FixedSource::new(0, Some(0)), 250);
    let err = loader.run().await.unwrap_err();
    assert!(err.to_string().contains("no records"));
}

#[tokio::test]
async fn filtered_rows_shrink_the_written_batch() {
    /// Source mixing valid and invalid rows on every page.
    struct MixedSource;

    #[async_trait]
    impl ExhibitionSource for MixedSource {
        async fn fetch_page(&self, _page: u32) -> Result<ExhibitionsPage, ApiError> {
            let mut data: Vec<Value> = (0..8).map(valid_record).collect();
            data.push(invalid_record(8));
            data.push(invalid_record(9));
            Ok(ExhibitionsPage {
                data,
                total_pages: None,
            })
        }
    }

    let source = MixedSource;
    let sink = RecordingSink::default();
    let loader = Loader::new(source, sink, 10, Metrics::new().unwrap(), None);
    let total = loader.run().await.unwrap();

    // 10 raw, 2 invalid: 8 rows per write, two writes to pass the threshold.
    assert_eq!(total, 16);
    assert_eq!(
        loader_sink(&loader).calls(),
        vec![WriteCall::Replace(8), WriteCall::Append(8)]
    );
}

// Accessors for the loader's parts; Loader owns its source and sink.
fn loader_source<'a, S: ExhibitionSource, W: ExhibitionSink>(loader: &'a Loader<S, W>) -> &'a S {
    loader.source()
}

fn loader_sink<'a, S: ExhibitionSource, W: ExhibitionSink>(loader: &'a Loader<S, W>) -> &'a W {
    loader.sink()
}
