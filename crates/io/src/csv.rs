// CSV export

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use beantrack_engine::ExportSpec;

use crate::{export_filename, target_path, ExportError};

/// Serialize `spec` to CSV text: header row first, rows joined by `\n`, no trailing newline.
///
/// Cells are quoted (embedded quotes doubled) only when they contain a comma,
/// a double quote or a line break. Values go through the shared formatter, so a
/// missing value is written as the placeholder.
pub fn to_csv_string(spec: &ExportSpec) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(false)
        .from_writer(Vec::new());

    writer.write_record(&spec.headers)?;
    for row in spec.display_rows() {
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Write `<filename_base>_<date>.csv` into `dir`.
///
/// Returns `Ok(None)` without touching the filesystem when there are no rows.
pub fn export(spec: &ExportSpec, dir: &Path, date: NaiveDate) -> Result<Option<PathBuf>, ExportError> {
    if spec.is_empty() {
        log::debug!("csv export of {:?} skipped: no rows", spec.filename_base);
        return Ok(None);
    }
    let path = target_path(dir, &export_filename(&spec.filename_base, date, "csv"))?;
    fs::write(&path, to_csv_string(spec)?)?;
    log::info!("wrote {} rows to {}", spec.row_count(), path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use beantrack_engine::{Cell, EntityKind};
    use tempfile::tempdir;

    fn spec(rows: Vec<Vec<Cell>>) -> ExportSpec {
        ExportSpec {
            headers: vec!["#".into(), "Beneficiary ID".into(), "Full Name".into()],
            rows,
            filename_base: "Beneficiary List".into(),
            entity: Some(EntityKind::BeneficiaryList),
        }
    }

    #[test]
    fn test_plain_cells_are_not_quoted() {
        let s = spec(vec![vec![Cell::Number(1.0), Cell::Text("B-1".into()), Cell::Text("Ana Cruz".into())]]);
        assert_eq!(to_csv_string(&s).unwrap(), "#,Beneficiary ID,Full Name\n1,B-1,Ana Cruz");
    }

    #[test]
    fn test_special_characters_are_quoted() {
        let s = spec(vec![vec![
            Cell::Number(1.0),
            Cell::Text("B-1".into()),
            Cell::Text("O'Brien, \"Joe\"".into()),
        ]]);
        let text = to_csv_string(&s).unwrap();
        assert!(text.ends_with(r#"1,B-1,"O'Brien, ""Joe""""#), "got {text}");
    }

    #[test]
    fn test_missing_cells_use_placeholder() {
        let s = spec(vec![vec![Cell::Number(1.0), Cell::Missing, Cell::Text("X".into())]]);
        assert!(to_csv_string(&s).unwrap().ends_with("1,\u{2014},X"));
    }

    #[test]
    fn test_export_writes_dated_file() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let s = spec(vec![vec![Cell::Number(1.0), Cell::Text("B-1".into()), Cell::Text("Ana".into())]]);
        let path = export(&s, dir.path(), date).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "Beneficiary_List_2024-01-31.csv");
        assert!(fs::read_to_string(&path).unwrap().starts_with("#,Beneficiary ID"));
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(export(&spec(vec![]), dir.path(), date).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let s = spec(vec![vec![Cell::Number(1.0), Cell::Missing, Cell::Missing]]);
        let err = export(&s, &dir.path().join("nope"), date).unwrap_err();
        assert!(matches!(err, ExportError::MissingDir(_)));
    }
}
