use std::path::{Path, PathBuf};

use ferry_core::error::AppError;
use ferry_core::models::ExportDocument;
use ferry_core::traits::ExportSink;

/// Writes the export document as pretty-printed JSON to a fixed path.
///
/// Parent directories are created on demand; an existing file is replaced.
#[derive(Debug, Clone)]
pub struct JsonFileExporter {
    path: PathBuf,
}

impl JsonFileExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for JsonFileExporter {
    async fn write(&self, document: &ExportDocument) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::ExportError(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            AppError::ExportError(format!("Failed to write {}: {e}", self.path.display()))
        })?;

        tracing::info!(path = %self.path.display(), "Exported connections");
        Ok(())
    }
}
