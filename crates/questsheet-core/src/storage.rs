//! Persistent storage for confirmation images using redb.
//!
//! Stands in for the remote blob store: images are named with
//! [`PathCodec`] before they are written, and listed back with their
//! decoded names for display.
//!
//! Two tables share the same key (the encoded storage path):
//! - image bytes
//! - metadata (BLAKE3 content hash, size, store time, format)

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use redb::Database;
use serde::{Deserialize, Serialize};

use crate::clock::{MonotonicClock, SystemClock};
use crate::codec::PathCodec;
use crate::config::SheetConfig;
use crate::error::SheetError;
use crate::key::NamedTimestampKey;

mod confirmations;

use confirmations::{CONFIRMATIONS_TABLE, CONFIRMATION_META_TABLE};

/// Metadata recorded alongside each stored image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationMeta {
    /// BLAKE3 hash of the image bytes (hex)
    pub content_hash: String,
    /// Image size in bytes
    pub size: u64,
    /// Unix timestamp (milliseconds) when the image was stored
    pub stored_at: u64,
    /// Sniffed image format extension (`png`, `jpg`, `webp`)
    pub format: String,
}

/// A stored confirmation, as returned by `store` and `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEntry {
    pub key: NamedTimestampKey,
    pub meta: ConfirmationMeta,
}

impl ConfirmationEntry {
    /// Sanitized name recovered from the key
    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// Name with underscores shown as spaces
    pub fn label(&self) -> String {
        self.key.label()
    }
}

/// Storage layer for confirmation images
#[derive(Clone)]
pub struct ConfirmationStore {
    db: Arc<RwLock<Database>>,
    codec: PathCodec,
    max_image_size: usize,
}

impl std::fmt::Debug for ConfirmationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationStore")
            .field("codec", &self.codec)
            .field("max_image_size", &self.max_image_size)
            .finish_non_exhaustive()
    }
}

impl ConfirmationStore {
    /// Open the store in a data directory, stamping keys with the wall clock.
    ///
    /// Keys are stamped through a [`MonotonicClock`], so two images stored in
    /// the same millisecond still get distinct keys.
    pub fn open(data_dir: impl AsRef<Path>, config: &SheetConfig) -> Result<Self, SheetError> {
        let codec = PathCodec::with_config(MonotonicClock::new(SystemClock), config);
        Self::new(data_dir.as_ref().join(&config.database_file), codec, config)
    }

    /// Create a store at the given database path with an explicit codec.
    ///
    /// Opens the database (creating it and its directory on first use) and
    /// makes sure the image and metadata tables exist.
    pub fn new(
        path: impl AsRef<Path>,
        codec: PathCodec,
        config: &SheetConfig,
    ) -> Result<Self, SheetError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CONFIRMATIONS_TABLE)?;
            let _ = write_txn.open_table(CONFIRMATION_META_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            codec,
            max_image_size: config.max_image_size,
        })
    }

    /// Codec used to name stored images
    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    fn db_handle(&self) -> Arc<RwLock<Database>> {
        self.db.clone()
    }
}
