//! Free-text search overlay, applied after filtering.

use crate::entity::EntityKind;
use crate::format;
use crate::registry::schema;
use crate::row::{Row, TaggedRow};

/// Lower-cased concatenation of the entity's searchable fields.
fn haystack(kind: EntityKind, row: &Row) -> String {
    schema(kind)
        .search_fields
        .iter()
        .filter_map(|field| format::text_of(row.get(field)))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn matches(kind: EntityKind, row: &Row, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty() || haystack(kind, row).contains(&needle)
}

/// Narrow `rows` to those whose searchable fields contain `query`. Blank query is identity.
pub fn apply(kind: EntityKind, mut rows: Vec<Row>, query: &str) -> Vec<Row> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows;
    }
    rows.retain(|row| haystack(kind, row).contains(&needle));
    rows
}

/// Search over merged rows; each row is matched against its own entity's fields.
pub fn apply_tagged(mut rows: Vec<TaggedRow>, query: &str) -> Vec<TaggedRow> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows;
    }
    rows.retain(|tagged| haystack(tagged.source_entity, &tagged.row).contains(&needle));
    rows
}
