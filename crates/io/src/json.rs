// JSON directory data source

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use beantrack_engine::{rows_from_listing, EntityDataSource, EntityKind, FetchError, Row};

/// Reads `<dir>/<slug>.json` per entity kind.
///
/// Each file holds an array of objects, or an object whose `data` field is
/// that array (the shape the dashboard API wraps its listings in).
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.slug()))
    }
}

impl EntityDataSource for JsonDirSource {
    fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Row>, FetchError> {
        let path = self.path_for(kind);
        let text = fs::read_to_string(&path)
            .map_err(|e| FetchError::new(kind, format!("{}: {}", path.display(), e)))?;
        let rows = parse_rows(&text).map_err(|msg| FetchError::new(kind, format!("{}: {}", path.display(), msg)))?;
        log::debug!("loaded {} {} rows from {}", rows.len(), kind.slug(), path.display());
        Ok(rows)
    }
}

/// Parse a listing file's text into rows.
pub fn parse_rows(text: &str) -> Result<Vec<Row>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {}", e))?;
    rows_from_listing(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reads_entity_file_by_slug() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("farm-plots.json"),
            r#"[{"plot_id":"P-1","hectares":1.25},{"plot_id":"P-2","hectares":"0.5"}]"#,
        )
        .unwrap();
        let src = JsonDirSource::new(dir.path());
        let rows = src.fetch_all(EntityKind::FarmLocation).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("plot_id"), "P-2");
    }

    #[test]
    fn test_accepts_data_wrapper() {
        let rows = parse_rows(r#"{"data":[{"log_id":1}],"total":1}"#).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let dir = tempdir().unwrap();
        let err = JsonDirSource::new(dir.path()).fetch_all(EntityKind::SeedlingRecord).unwrap_err();
        assert_eq!(err.entity, EntityKind::SeedlingRecord);
        assert!(err.message.contains("seedlings.json"));
    }

    #[test]
    fn test_rejects_non_object_records() {
        assert!(parse_rows("[1,2]").is_err());
        assert!(parse_rows(r#"{"rows":[]}"#).is_err());
        assert!(parse_rows("not json").is_err());
    }
}
