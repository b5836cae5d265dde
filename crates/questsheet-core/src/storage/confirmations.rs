//! Confirmation Storage - CRUD operations for confirmation images
//!
//! Stores image bytes and metadata in redb with the encoded storage key
//! (`quests-confirm/complete_workout_1730012345678.jpg`) as the key.

use image::ImageFormat;
use redb::{ReadableTable, TableDefinition};
use tracing::{debug, info, warn};

use crate::error::SheetError;
use crate::folder::StorageFolder;

use super::{ConfirmationEntry, ConfirmationMeta, ConfirmationStore};

/// Table for image bytes (key: storage path, value: raw bytes)
pub(crate) const CONFIRMATIONS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("confirmations");

/// Table for image metadata (key: storage path, value: serialized ConfirmationMeta)
pub(crate) const CONFIRMATION_META_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("confirmation_meta");

/// Extension for the sniffed image format. Only PNG, JPEG and WebP are accepted.
fn sniff_extension(data: &[u8]) -> Result<&'static str, SheetError> {
    match image::guess_format(data) {
        Ok(ImageFormat::Png) => Ok("png"),
        Ok(ImageFormat::Jpeg) => Ok("jpg"),
        Ok(ImageFormat::WebP) => Ok("webp"),
        Ok(other) => Err(SheetError::UnsupportedImage(format!("{:?}", other))),
        Err(e) => Err(SheetError::UnsupportedImage(e.to_string())),
    }
}

impl ConfirmationStore {
    /// Store a confirmation image under a freshly encoded key.
    ///
    /// The key's extension comes from the image bytes, not from the caller.
    /// Fails with `KeyExists` rather than overwriting an existing image.
    pub fn store(
        &self,
        folder: StorageFolder,
        raw_name: &str,
        data: &[u8],
    ) -> Result<ConfirmationEntry, SheetError> {
        if data.len() > self.max_image_size {
            return Err(SheetError::ImageTooLarge {
                size: data.len(),
                max: self.max_image_size,
            });
        }
        let extension = sniff_extension(data)?;
        let stored_at = self.codec.now_millis();
        let key = self
            .codec
            .encode_at(folder, raw_name, stored_at)?
            .with_extension(extension)?;
        let path = key.to_string();

        let meta = ConfirmationMeta {
            content_hash: blake3::hash(data).to_hex().to_string(),
            size: data.len() as u64,
            stored_at,
            format: extension.to_string(),
        };
        let serialized =
            postcard::to_allocvec(&meta).map_err(|e| SheetError::Serialization(e.to_string()))?;

        let db = self.db_handle();
        let db_guard = db.read();
        let write_txn = db_guard.begin_write()?;
        {
            let mut images = write_txn.open_table(CONFIRMATIONS_TABLE)?;
            if images.get(path.as_str())?.is_some() {
                return Err(SheetError::KeyExists(path));
            }
            images.insert(path.as_str(), data)?;

            let mut metas = write_txn.open_table(CONFIRMATION_META_TABLE)?;
            metas.insert(path.as_str(), serialized.as_slice())?;
        }
        write_txn.commit()?;

        info!(key = %path, size = meta.size, hash = %meta.content_hash, "Stored confirmation image");
        Ok(ConfirmationEntry { key, meta })
    }

    /// Load image bytes by storage key
    ///
    /// Returns `None` if nothing is stored under the key.
    pub fn load(&self, path: &str) -> Result<Option<Vec<u8>>, SheetError> {
        let key = self.codec.decode(path)?;
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(CONFIRMATIONS_TABLE)?;

        if let Some(data) = table.get(key.to_string().as_str())? {
            Ok(Some(data.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// Load metadata by storage key
    ///
    /// Returns `None` if nothing is stored under the key.
    pub fn metadata(&self, path: &str) -> Result<Option<ConfirmationMeta>, SheetError> {
        let key = self.codec.decode(path)?;
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(CONFIRMATION_META_TABLE)?;

        if let Some(data) = table.get(key.to_string().as_str())? {
            let meta: ConfirmationMeta = postcard::from_bytes(data.value())
                .map_err(|e| SheetError::Serialization(e.to_string()))?;
            Ok(Some(meta))
        } else {
            Ok(None)
        }
    }

    /// List stored confirmations in key order, optionally limited to one folder.
    ///
    /// Entries whose key no longer parses are skipped with a warning.
    pub fn list(&self, folder: Option<StorageFolder>) -> Result<Vec<ConfirmationEntry>, SheetError> {
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(CONFIRMATION_META_TABLE)?;

        let mut entries = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let path = key.value();
            let key = match self.codec.decode(path) {
                Ok(key) => key,
                Err(e) => {
                    warn!(key = path, error = %e, "Skipping unreadable confirmation key");
                    continue;
                }
            };
            if folder.is_some_and(|f| f != key.folder()) {
                continue;
            }
            let meta: ConfirmationMeta = postcard::from_bytes(value.value())
                .map_err(|e| SheetError::Serialization(e.to_string()))?;
            entries.push(ConfirmationEntry { key, meta });
        }

        debug!(count = entries.len(), ?folder, "Listed confirmations");
        Ok(entries)
    }

    /// Delete a stored confirmation
    ///
    /// Returns whether anything was removed.
    pub fn delete(&self, path: &str) -> Result<bool, SheetError> {
        let key = self.codec.decode(path)?.to_string();
        let db = self.db_handle();
        let db_guard = db.read();
        let write_txn = db_guard.begin_write()?;
        let removed = {
            let mut images = write_txn.open_table(CONFIRMATIONS_TABLE)?;
            let mut metas = write_txn.open_table(CONFIRMATION_META_TABLE)?;
            let removed = images.remove(key.as_str())?.is_some();
            metas.remove(key.as_str())?;
            removed
        };
        write_txn.commit()?;

        if removed {
            info!(key = %key, "Deleted confirmation image");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, MonotonicClock};
    use crate::codec::PathCodec;
    use crate::config::SheetConfig;
    use tempfile::TempDir;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    fn create_test_store() -> (ConfirmationStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let codec = PathCodec::new(MonotonicClock::new(FixedClock(1730012345678)));
        let store = ConfirmationStore::new(
            temp_dir.path().join("test.redb"),
            codec,
            &SheetConfig::default(),
        )
        .unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_sniff_extension() {
        assert_eq!(sniff_extension(PNG).unwrap(), "png");
        assert_eq!(sniff_extension(JPEG).unwrap(), "jpg");
        assert_eq!(sniff_extension(b"RIFF\0\0\0\0WEBPVP8 ").unwrap(), "webp");
        assert!(matches!(
            sniff_extension(b"plain text"),
            Err(SheetError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_store_and_load() {
        let (store, _dir) = create_test_store();

        let stored = store
            .store(StorageFolder::QuestsConfirm, "Complete Workout!!", JPEG)
            .unwrap();
        assert_eq!(
            stored.key.to_string(),
            "quests-confirm/complete_workout_1730012345678.jpg"
        );
        assert_eq!(stored.meta.size, JPEG.len() as u64);
        assert_eq!(stored.meta.format, "jpg");
        assert_eq!(stored.meta.content_hash, blake3::hash(JPEG).to_hex().to_string());

        let path = stored.key.to_string();
        assert_eq!(store.load(&path).unwrap().as_deref(), Some(JPEG));
        assert_eq!(store.metadata(&path).unwrap(), Some(stored.meta));
    }

    #[test]
    fn test_same_name_gets_distinct_keys() {
        let (store, _dir) = create_test_store();

        let a = store.store(StorageFolder::QuestsConfirm, "Run", PNG).unwrap();
        let b = store.store(StorageFolder::QuestsConfirm, "Run", PNG).unwrap();
        assert_ne!(a.key, b.key);
        assert_eq!(b.key.timestamp(), a.key.timestamp() + 1);
        assert_eq!(a.meta.stored_at, a.key.timestamp());
    }

    #[test]
    fn test_fixed_clock_collision_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfirmationStore::new(
            temp_dir.path().join("test.redb"),
            PathCodec::new(FixedClock(7)),
            &SheetConfig::default(),
        )
        .unwrap();

        store.store(StorageFolder::QuestsConfirm, "Run", PNG).unwrap();
        let err = store.store(StorageFolder::QuestsConfirm, "Run", PNG).unwrap_err();
        assert!(matches!(err, SheetError::KeyExists(k) if k == "quests-confirm/run_7.png"));
    }

    #[test]
    fn test_rejects_oversized_and_non_images() {
        let temp_dir = TempDir::new().unwrap();
        let config = SheetConfig {
            max_image_size: 8,
            ..SheetConfig::default()
        };
        let store = ConfirmationStore::new(
            temp_dir.path().join("test.redb"),
            PathCodec::new(FixedClock(1)),
            &config,
        )
        .unwrap();

        let err = store.store(StorageFolder::QuestsConfirm, "Run", PNG).unwrap_err();
        assert!(matches!(err, SheetError::ImageTooLarge { max: 8, .. }));

        let err = store.store(StorageFolder::QuestsConfirm, "Run", b"hi").unwrap_err();
        assert!(matches!(err, SheetError::UnsupportedImage(_)));
    }

    #[test]
    fn test_rejects_empty_name() {
        let (store, _dir) = create_test_store();
        let err = store.store(StorageFolder::QuestsConfirm, "💪!", PNG).unwrap_err();
        assert!(matches!(err, SheetError::InvalidName(_)));
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_list_filters_by_folder() {
        let (store, _dir) = create_test_store();

        store.store(StorageFolder::QuestsConfirm, "Morning Run", PNG).unwrap();
        store.store(StorageFolder::AchievementsConfirm, "First Quest", JPEG).unwrap();
        store.store(StorageFolder::QuestsConfirm, "Drink Water", PNG).unwrap();

        let all = store.list(None).unwrap();
        assert_eq!(all.len(), 3);
        // Key order: achievements-confirm sorts before quests-confirm
        assert_eq!(all[0].name(), "first_quest");

        let quests = store.list(Some(StorageFolder::QuestsConfirm)).unwrap();
        let labels: Vec<String> = quests.iter().map(|e| e.label()).collect();
        assert_eq!(labels, vec!["drink water", "morning run"]);
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.load("quests-confirm/nothing_1.png").unwrap(), None);
        assert_eq!(store.metadata("quests-confirm/nothing_1.png").unwrap(), None);
        assert!(matches!(
            store.load("not a key"),
            Err(SheetError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_delete() {
        let (store, _dir) = create_test_store();
        let stored = store.store(StorageFolder::QuestsConfirm, "Run", PNG).unwrap();
        let path = stored.key.to_string();

        assert!(store.delete(&path).unwrap());
        assert!(!store.delete(&path).unwrap());
        assert_eq!(store.load(&path).unwrap(), None);
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = SheetConfig::default();

        let path = {
            let store = ConfirmationStore::open(temp_dir.path(), &config).unwrap();
            store
                .store(StorageFolder::AchievementsConfirm, "Streak 7 Days", PNG)
                .unwrap()
                .key
                .to_string()
        };

        let store = ConfirmationStore::open(temp_dir.path(), &config).unwrap();
        assert_eq!(store.load(&path).unwrap().as_deref(), Some(PNG));
        assert!(temp_dir.path().join("confirmations.redb").exists());
    }
}
