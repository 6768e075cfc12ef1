//! Résumé file intake: extension allow-list, filename sanitizing, and
//! persistence to the upload directory.
//!
//! Files are keyed by sanitized filename only. Two uploads with the same name
//! overwrite each other, across users.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::errors::AppError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf"];

/// Device names that cannot be used as filenames on Windows.
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

/// True when the filename has an extension whose lower-cased form is allowed.
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to a flat, ASCII-only name that is safe
/// to join onto the upload directory. May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = cleaned.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if !cleaned.is_empty() && WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        return format!("_{cleaned}");
    }
    cleaned
}

/// Upload directory for résumé files.
#[derive(Debug, Clone)]
pub struct ResumeStorage {
    dir: PathBuf,
}

impl ResumeStorage {
    /// Creates the upload directory if it does not exist yet.
    pub async fn init(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
        info!("Résumé uploads stored in {}", dir.display());
        Ok(Self { dir })
    }

    #[cfg(test)]
    pub fn from_existing(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[cfg(test)]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Validates and writes an uploaded résumé.
    ///
    /// Returns the stored reference, or `None` when the file was rejected by
    /// the allow-list. Rejection is not an error.
    pub async fn store(&self, filename: &str, contents: &[u8]) -> Result<Option<String>, AppError> {
        if !allowed_file(filename) {
            warn!("Rejected résumé upload with disallowed name {filename:?}");
            return Ok(None);
        }

        let safe_name = secure_filename(filename);
        if !allowed_file(&safe_name) {
            warn!("Rejected résumé upload {filename:?}: nothing usable left after sanitizing");
            return Ok(None);
        }

        let path = self.dir.join(&safe_name);
        tokio::fs::write(&path, contents).await?;
        info!("Stored résumé {} ({} bytes)", path.display(), contents.len());

        Ok(Some(path.to_string_lossy().into_owned()))
    }
}
