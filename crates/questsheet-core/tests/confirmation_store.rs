//! Confirmation store integration tests
//!
//! Exercise the store through the public API the way an upload flow and a
//! gallery listing would use it.

use questsheet_core::{ConfirmationStore, SheetConfig, SheetError, StorageFolder};
use tempfile::TempDir;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("questsheet_core=debug")
        .with_test_writer()
        .try_init();
}

fn open_store(dir: &TempDir) -> ConfirmationStore {
    init_tracing();
    ConfirmationStore::open(dir.path(), &SheetConfig::default()).unwrap()
}

#[test]
fn test_upload_then_gallery_listing() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let stored = store
        .store(StorageFolder::QuestsConfirm, "Complete Workout!!", PNG)
        .unwrap();
    let path = stored.key.to_string();
    assert!(path.starts_with("quests-confirm/complete_workout_"));
    assert!(path.ends_with(".png"));

    let listed = store.list(Some(StorageFolder::QuestsConfirm)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name(), "complete_workout");
    assert_eq!(listed[0].label(), "complete workout");
    assert_eq!(listed[0].key, stored.key);

    assert!(store.list(Some(StorageFolder::AchievementsConfirm)).unwrap().is_empty());
}

#[test]
fn test_concurrent_uploads_of_same_quest_get_unique_keys() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                (0..10)
                    .map(|_| {
                        store
                            .store(StorageFolder::QuestsConfirm, "Drink Water", PNG)
                            .unwrap()
                            .key
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut keys: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    keys.sort_by_key(|k| k.timestamp());
    keys.dedup();
    assert_eq!(keys.len(), 40);
    assert_eq!(store.list(None).unwrap().len(), 40);
}

#[test]
fn test_config_file_limits_image_size() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), r#"{ "max_image_size": 4 }"#).unwrap();

    let config = SheetConfig::load_or_default(dir.path().join("config.json")).unwrap();
    let store = ConfirmationStore::open(dir.path(), &config).unwrap();

    let err = store
        .store(StorageFolder::AchievementsConfirm, "First Quest", PNG)
        .unwrap_err();
    assert!(matches!(err, SheetError::ImageTooLarge { size, max: 4 } if size == PNG.len()));
}

#[test]
fn test_empty_names_round_trip_when_allowed() {
    let dir = TempDir::new().unwrap();
    init_tracing();
    let config = SheetConfig {
        allow_empty_names: true,
        ..SheetConfig::default()
    };
    let store = ConfirmationStore::open(dir.path(), &config).unwrap();

    let stored = store.store(StorageFolder::QuestsConfirm, "!!!", PNG).unwrap();
    let path = stored.key.to_string();
    assert!(path.starts_with("quests-confirm/_"));
    assert!(path.ends_with(".png"));
    assert_eq!(store.codec().decode(&path).unwrap(), stored.key);

    assert_eq!(store.load(&path).unwrap().as_deref(), Some(PNG));
    assert_eq!(store.metadata(&path).unwrap(), Some(stored.meta.clone()));

    let listed = store.list(None).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], stored);
    assert_eq!(listed[0].name(), "");

    assert!(store.delete(&path).unwrap());
    assert!(store.list(None).unwrap().is_empty());
}

#[test]
fn test_open_creates_missing_data_dir() {
    let dir = TempDir::new().unwrap();
    init_tracing();
    let data_dir = dir.path().join("nested").join("data");

    let store = ConfirmationStore::open(&data_dir, &SheetConfig::default()).unwrap();
    assert!(data_dir.join("confirmations.redb").is_file());
    assert!(store.list(None).unwrap().is_empty());
}
