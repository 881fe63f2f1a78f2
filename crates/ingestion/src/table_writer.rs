//! Destination-table writes with replace and append semantics.

use artic_etl_db::{DbPool, ExhibitionRecord};
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::loader::ExhibitionSink;

/// Writes exhibition batches into a named Postgres table.
///
/// The table name comes from the operator, so it is always interpolated as
/// a quoted identifier; row values go through bind parameters.
pub struct TableWriter {
    db: DbPool,
    table: String,
}

impl TableWriter {
    pub fn new(db: DbPool, table: &str) -> Self {
        Self {
            db,
            table: table.to_string(),
        }
    }

    async fn insert_batch<'t>(
        &self,
        tx: &mut sqlx::Transaction<'t, sqlx::Postgres>,
        batch: &[ExhibitionRecord],
    ) -> anyhow::Result<u64> {
        let sql = insert_sql(&self.table);
        let ingested_at = Utc::now();

        for (index, record) in batch.iter().enumerate() {
            sqlx::query(&sql)
                .bind(index as i64)
                .bind(record.id)
                .bind(record.title.as_deref())
                .bind(record.short_description.as_deref())
                .bind(record.web_url.as_deref())
                .bind(record.image_url.as_deref())
                .bind(record.gallery_title.as_deref())
                .bind(to_json_text(&record.artwork_ids)?)
                .bind(to_json_text(&record.artwork_titles)?)
                .bind(to_json_text(&record.artist_ids)?)
                .bind(record.source_updated_at.as_deref())
                .bind(record.updated_at.as_deref())
                .bind(ingested_at)
                .execute(&mut **tx)
                .await?;
        }

        Ok(batch.len() as u64)
    }
}

#[async_trait]
impl ExhibitionSink for TableWriter {
    /// Drop and recreate the table, then insert the batch.
    async fn replace(&self, batch: &[ExhibitionRecord]) -> anyhow::Result<u64> {
        let mut tx = self.db.pool().begin().await?;
        sqlx::query(&format!(
            "DROP TABLE IF EXISTS {}",
            quote_ident(&self.table)
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&create_table_sql(&self.table))
            .execute(&mut *tx)
            .await?;
        let written = self.insert_batch(&mut tx, batch).await?;
        tx.commit().await?;

        info!(table = %self.table, rows = written, "Recreated table from batch");
        Ok(written)
    }

    /// Insert the batch into the existing table.
    async fn append(&self, batch: &[ExhibitionRecord]) -> anyhow::Result<u64> {
        let mut tx = self.db.pool().begin().await?;
        let written = self.insert_batch(&mut tx, batch).await?;
        tx.commit().await?;

        info!(table = %self.table, rows = written, "Appended batch to table");
        Ok(written)
    }
}

fn to_json_text<T: serde::Serialize>(value: &Option<T>) -> anyhow::Result<Option<String>> {
    value
        .as_ref()
        .map(|v| serde_json::to_string(v))
        .transpose()
        .map_err(Into::into)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// title and image_url are NOT NULL: the transformer discards rows missing
// either one, and the schema holds the line. id is intentionally not
// unique, the loop accumulates duplicates across passes over the feed.
fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {} (\
         \"index\" BIGINT NOT NULL, \
         id BIGINT, \
         title TEXT NOT NULL, \
         short_description TEXT, \
         web_url TEXT, \
         image_url TEXT NOT NULL, \
         gallery_title TEXT, \
         artwork_ids TEXT, \
         artwork_titles TEXT, \
         artist_ids TEXT, \
         source_updated_at TEXT, \
         updated_at TEXT, \
         ingested_at TIMESTAMPTZ NOT NULL)",
        quote_ident(table)
    )
}

fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} (\"index\", id, title, short_description, web_url, \
         image_url, gallery_title, artwork_ids, artwork_titles, artist_ids, \
         source_updated_at, updated_at, ingested_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        quote_ident(table)
    )
}
