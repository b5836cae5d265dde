//! Runtime configuration loaded from `config.json` in the data directory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SheetError, SheetResult};

/// Maximum confirmation image size: 2 MB
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 2 * 1024 * 1024;

/// Default database filename inside the data directory
pub const DEFAULT_DATABASE_FILE: &str = "confirmations.redb";

/// Configuration for key encoding and the confirmation store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Accept raw names that sanitize to nothing
    pub allow_empty_names: bool,
    /// Maximum stored image size in bytes
    pub max_image_size: usize,
    /// Database filename, relative to the data directory
    pub database_file: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            allow_empty_names: false,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }
}

impl SheetConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults; unknown keys are ignored.
    pub fn load_or_default(path: impl AsRef<Path>) -> SheetResult<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(SheetError::Config(format!("{}: {}", path.display(), e))),
        };
        serde_json::from_str(&raw)
            .map_err(|e| SheetError::Config(format!("{}: {}", path.display(), e)))
    }
}
