//! Parsed form of a confirmation image storage key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{is_sanitized_char, MAX_NAME_LEN};
use crate::error::{SheetError, SheetResult};
use crate::folder::StorageFolder;

/// A storage key `"<folder>/<name>_<timestamp>[.<extension>]"`.
///
/// Built by [`PathCodec`](crate::PathCodec) or parsed back with
/// [`NamedTimestampKey::parse`]. The name is the sanitized form; the raw
/// name it came from is not recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamedTimestampKey {
    folder: StorageFolder,
    name: String,
    timestamp: u64,
    extension: Option<String>,
}

impl NamedTimestampKey {
    /// Caller guarantees `name` is already sanitized.
    pub(crate) fn from_parts(folder: StorageFolder, name: String, timestamp: u64) -> Self {
        Self {
            folder,
            name,
            timestamp,
            extension: None,
        }
    }

    pub fn folder(&self) -> StorageFolder {
        self.folder
    }

    /// Sanitized name segment
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Attach a file extension (stored lowercase, without the dot).
    pub fn with_extension(mut self, extension: &str) -> SheetResult<Self> {
        let extension = extension.trim_start_matches('.');
        if !is_valid_extension(extension) {
            return Err(SheetError::malformed(
                &format!("{}.{}", self, extension),
                "extension must be non-empty ASCII letters or digits",
            ));
        }
        self.extension = Some(extension.to_ascii_lowercase());
        Ok(self)
    }

    pub fn without_extension(mut self) -> Self {
        self.extension = None;
        self
    }

    /// Human-facing label: the sanitized name with underscores shown as spaces
    pub fn label(&self) -> String {
        self.name.replace('_', " ").trim().to_string()
    }

    /// Strictly parse a storage key.
    ///
    /// Accepts exactly `<known folder>/<name>_<digits>` with an optional
    /// `.<extension>`, where the name is 1 to 50 characters of `[a-z0-9_]`.
    pub fn parse(path: &str) -> SheetResult<Self> {
        Self::parse_with(path, false)
    }

    /// Like [`parse`](Self::parse), but also accepts the empty-name form
    /// `<folder>/_<digits>` that an encoder allowing empty names produces.
    pub fn parse_allowing_empty_name(path: &str) -> SheetResult<Self> {
        Self::parse_with(path, true)
    }

    fn parse_with(path: &str, allow_empty_name: bool) -> SheetResult<Self> {
        let (folder, filename) = path
            .split_once('/')
            .ok_or_else(|| SheetError::malformed(path, "missing '/' after folder"))?;
        if filename.contains('/') {
            return Err(SheetError::malformed(path, "more than one '/'"));
        }
        let folder: StorageFolder = folder
            .parse()
            .map_err(|_| SheetError::malformed(path, format!("unknown folder {:?}", folder)))?;

        let (stem, extension) = match filename.split_once('.') {
            Some((stem, ext)) if is_valid_extension(ext) => (stem, Some(ext.to_ascii_lowercase())),
            Some(_) => return Err(SheetError::malformed(path, "invalid extension")),
            None => (filename, None),
        };

        let (name, timestamp) = stem
            .rsplit_once('_')
            .ok_or_else(|| SheetError::malformed(path, "missing '_<timestamp>' suffix"))?;
        if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SheetError::malformed(path, "timestamp is not a number"));
        }
        let timestamp: u64 = timestamp
            .parse()
            .map_err(|_| SheetError::malformed(path, "timestamp out of range"))?;

        if name.is_empty() && !allow_empty_name {
            return Err(SheetError::malformed(path, "empty name"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(SheetError::malformed(
                path,
                format!("name longer than {} characters", MAX_NAME_LEN),
            ));
        }
        if !name.chars().all(is_sanitized_char) {
            return Err(SheetError::malformed(path, "name has characters outside [a-z0-9_]"));
        }

        Ok(Self {
            folder,
            name: name.to_string(),
            timestamp,
            extension,
        })
    }
}

fn is_valid_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl fmt::Display for NamedTimestampKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}_{}", self.folder, self.name, self.timestamp)?;
        if let Some(ext) = &self.extension {
            write!(f, ".{}", ext)?;
        }
        Ok(())
    }
}

impl FromStr for NamedTimestampKey {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NamedTimestampKey {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NamedTimestampKey> for String {
    fn from(key: NamedTimestampKey) -> Self {
        key.to_string()
    }
}
