//! PathCodec - storage keys for confirmation images
//!
//! Turns a human-readable quest or achievement name into a flat storage key
//! and recovers an approximate name from a key.
//!
//! # Sanitization
//!
//! Applied in order:
//!
//! 1. lowercase the whole string
//! 2. drop every character that is not `a-z`, `0-9`, `_` or whitespace
//! 3. replace each run of whitespace with a single `_`
//! 4. keep the first [`MAX_NAME_LEN`] characters
//!
//! The result only contains `[a-z0-9_]`, so it never needs escaping and a key
//! always has exactly one `/`. Sanitizing a sanitized name returns it unchanged.
//!
//! # Lenient vs strict
//!
//! [`encode_path`] and [`decode_name`] never fail: degenerate input produces a
//! degenerate key (`quests-confirm/_1730012345678`) or a partial name. The
//! [`PathCodec`] methods surface the same situations as [`SheetError`]s.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::SheetConfig;
use crate::error::{SheetError, SheetResult};
use crate::folder::StorageFolder;
use crate::key::NamedTimestampKey;

/// Maximum length of a sanitized name
pub const MAX_NAME_LEN: usize = 50;

pub(crate) fn is_sanitized_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_'
}

/// Sanitize a raw name into `[a-z0-9_]{0,50}`.
pub fn sanitize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(MAX_NAME_LEN));
    let mut in_whitespace = false;

    for ch in raw.chars().flat_map(char::to_lowercase) {
        if out.len() >= MAX_NAME_LEN {
            break;
        }
        if is_sanitized_char(ch) {
            out.push(ch);
            in_whitespace = false;
        } else if ch.is_whitespace() && !in_whitespace {
            out.push('_');
            in_whitespace = true;
        }
        // Dropped characters do not end a whitespace run: "a ! b" -> "a_b"
    }

    out
}

/// Build `"<folder>/<sanitized>_<timestamp>"` without any validation.
///
/// A name with nothing left after sanitization yields `"<folder>/_<timestamp>"`.
pub fn encode_path(folder: StorageFolder, raw_name: &str, timestamp: u64) -> String {
    format!("{}/{}_{}", folder, sanitize_name(raw_name), timestamp)
}

/// Best-effort recovery of the sanitized name from a key.
///
/// Takes the segment after the last `/`, cuts it at the first `.`, and drops
/// the last `_`-separated token. Input that does not look like a key returns
/// whatever is left, possibly an empty string.
pub fn decode_name(path: &str) -> String {
    let filename = path.rsplit('/').next().unwrap_or(path);
    let stem = filename.split('.').next().unwrap_or(filename);

    let tokens: Vec<&str> = stem.split('_').collect();
    tokens[..tokens.len() - 1].join("_")
}

/// Encoder/decoder for confirmation image keys.
///
/// Cheap to clone; the clock is shared.
#[derive(Clone)]
pub struct PathCodec {
    clock: Arc<dyn Clock>,
    allow_empty_names: bool,
}

impl Default for PathCodec {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl fmt::Debug for PathCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathCodec")
            .field("allow_empty_names", &self.allow_empty_names)
            .finish_non_exhaustive()
    }
}

impl PathCodec {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
            allow_empty_names: false,
        }
    }

    /// Create a codec configured from [`SheetConfig`]
    pub fn with_config(clock: impl Clock + 'static, config: &SheetConfig) -> Self {
        Self::new(clock).allow_empty_names(config.allow_empty_names)
    }

    /// Accept names that sanitize to nothing, producing `"<folder>/_<timestamp>"`
    pub fn allow_empty_names(mut self, allow: bool) -> Self {
        self.allow_empty_names = allow;
        self
    }

    /// Current reading of the codec's clock
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Encode a key stamped with the codec's clock
    pub fn encode(&self, folder: StorageFolder, raw_name: &str) -> SheetResult<NamedTimestampKey> {
        self.encode_at(folder, raw_name, self.clock.now_millis())
    }

    /// Encode a key with an explicit timestamp
    pub fn encode_at(
        &self,
        folder: StorageFolder,
        raw_name: &str,
        timestamp: u64,
    ) -> SheetResult<NamedTimestampKey> {
        let name = sanitize_name(raw_name);
        if name.is_empty() && !self.allow_empty_names {
            debug!(raw_name, "Rejecting name with no usable characters");
            return Err(SheetError::InvalidName(raw_name.to_string()));
        }
        Ok(NamedTimestampKey::from_parts(folder, name, timestamp))
    }

    /// Encode a key with a file extension, stamped with the codec's clock
    pub fn encode_with_extension(
        &self,
        folder: StorageFolder,
        raw_name: &str,
        extension: &str,
    ) -> SheetResult<NamedTimestampKey> {
        self.encode(folder, raw_name)?.with_extension(extension)
    }

    /// Encode from an untyped folder string, as received from callers outside the crate.
    ///
    /// Fails with [`SheetError::InvalidFolder`] for anything but the known prefixes.
    pub fn encode_str(
        &self,
        folder: &str,
        raw_name: &str,
        timestamp: Option<u64>,
    ) -> SheetResult<NamedTimestampKey> {
        let folder = StorageFolder::from_str(folder)?;
        match timestamp {
            Some(ts) => self.encode_at(folder, raw_name, ts),
            None => self.encode(folder, raw_name),
        }
    }

    /// Strictly decode a key; see [`NamedTimestampKey::parse`].
    ///
    /// Accepts exactly the keys this codec can encode, so the empty-name form
    /// is accepted only when empty names are allowed. Only the sanitized name
    /// comes back, never the raw name it was built from.
    pub fn decode(&self, path: &str) -> SheetResult<NamedTimestampKey> {
        let parsed = if self.allow_empty_names {
            NamedTimestampKey::parse_allowing_empty_name(path)
        } else {
            NamedTimestampKey::parse(path)
        };
        parsed.inspect_err(|e| debug!(path, error = %e, "Rejecting key"))
    }
}
