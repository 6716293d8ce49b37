use std::path::PathBuf;

/// Failure while writing an export file.
///
/// An empty export is not an error; exporters return `Ok(None)` for it.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("export directory does not exist: {}", .0.display())]
    MissingDir(PathBuf),

    #[error("page layout: {0}")]
    Layout(String),
}
