// Report export and file-backed data

pub mod csv;
pub mod document;
pub mod error;
pub mod json;
pub mod layout;

pub use error::ExportError;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use beantrack_engine::format;

/// `<base>_<YYYY-MM-DD>.<ext>`, whitespace and path separators in `base` replaced by `_`.
pub fn export_filename(base: &str, date: NaiveDate, ext: &str) -> String {
    let base: String = base
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let base = if base.is_empty() { "Report".to_string() } else { base };
    format!("{}_{}.{}", base, format::file_date(date), ext)
}

pub(crate) fn target_path(dir: &Path, file_name: &str) -> Result<PathBuf, ExportError> {
    if !dir.is_dir() {
        return Err(ExportError::MissingDir(dir.to_path_buf()));
    }
    Ok(dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_filename_replaces_whitespace() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(export_filename("Beneficiary List", date, "csv"), "Beneficiary_List_2024-06-05.csv");
        assert_eq!(export_filename("  Q2\tSurvey ", date, "pdf"), "Q2_Survey_2024-06-05.pdf");
        assert_eq!(export_filename("a/b", date, "csv"), "a_b_2024-06-05.csv");
        assert_eq!(export_filename("", date, "csv"), "Report_2024-06-05.csv");
    }
}
