//! Flattening of raw API objects into tabular exhibition records.

use artic_etl_db::ExhibitionRecord;
use serde_json::Value;

/// Flatten one raw exhibition object onto the eleven destination fields.
///
/// A key that is absent or JSON null becomes `None`; it is never an error.
/// Timestamps are kept as the strings the feed provides.
pub fn flatten_record(raw: &Value) -> ExhibitionRecord {
    ExhibitionRecord {
        id: opt_i64(raw, "id"),
        title: opt_string(raw, "title"),
        short_description: opt_string(raw, "short_description"),
        web_url: opt_string(raw, "web_url"),
        image_url: opt_string(raw, "image_url"),
        gallery_title: opt_string(raw, "gallery_title"),
        artwork_ids: opt_i64_seq(raw, "artwork_ids"),
        artwork_titles: opt_string_seq(raw, "artwork_titles"),
        artist_ids: opt_i64_seq(raw, "artist_ids"),
        source_updated_at: opt_string(raw, "source_updated_at"),
        updated_at: opt_string(raw, "updated_at"),
    }
}

/// Flatten a fetched batch and drop rows missing `title` or `image_url`.
///
/// Survivors keep their relative order and end up at dense positions
/// `0..N-k`, the index values written to the destination table.
pub fn flatten_batch(raw: &[Value]) -> Vec<ExhibitionRecord> {
    raw.iter()
        .map(flatten_record)
        .filter(ExhibitionRecord::has_required_fields)
        .collect()
}

fn opt_string(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn opt_i64(raw: &Value, key: &str) -> Option<i64> {
    raw.get(key).and_then(Value::as_i64)
}

fn opt_i64_seq(raw: &Value, key: &str) -> Option<Vec<i64>> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
}

fn opt_string_seq(raw: &Value, key: &str) -> Option<Vec<String>> {
    raw.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}
