//! Database models and types.

use serde::{Deserialize, Serialize};

/// One exhibition row, restricted to the eleven fields the destination
/// table carries.
///
/// Every field is optional because the upstream feed omits or nulls keys
/// freely; the transformer guarantees `title` and `image_url` are present
/// before a record reaches the database. Timestamps are stored as the
/// source provides them, unparsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhibitionRecord {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub web_url: Option<String>,
    pub image_url: Option<String>,
    pub gallery_title: Option<String>,
    pub artwork_ids: Option<Vec<i64>>,
    pub artwork_titles: Option<Vec<String>>,
    pub artist_ids: Option<Vec<i64>>,
    pub source_updated_at: Option<String>,
    pub updated_at: Option<String>,
}

impl ExhibitionRecord {
    /// True when the record satisfies the persistence invariant:
    /// non-null `title` and non-null `image_url`.
    pub fn has_required_fields(&self) -> bool {
        self.title.is_some() && self.image_url.is_some()
    }
}
