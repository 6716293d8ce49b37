// Configuration loading

pub mod settings;

pub use settings::{settings_path, DocumentSettings, ExportSettings, Settings, SettingsError, SourceSettings};
