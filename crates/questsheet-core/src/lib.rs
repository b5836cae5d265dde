//! Questsheet Core Library
//!
//! Storage keys and local storage for quest and achievement confirmation images.
//!
//! ## Overview
//!
//! A confirmation image is a photo a player submits to prove they completed a
//! quest or earned an achievement. Before the image is uploaded it needs a flat,
//! URL-safe storage key. This crate derives that key from the human-readable
//! quest name and a millisecond timestamp:
//!
//! ```text
//! quests-confirm/complete_workout_1730012345678.jpg
//! └─ folder ───┘ └─ name ───────┘ └─ timestamp ┘ └ ext
//! ```
//!
//! Name sanitization is lossy, so decoding a key only recovers the sanitized
//! name (`complete_workout`), never the original text (`Complete Workout!!`).
//!
//! ## Quick Start
//!
//! ```
//! use questsheet_core::{PathCodec, StorageFolder};
//!
//! let codec = PathCodec::default();
//! let key = codec
//!     .encode_at(StorageFolder::QuestsConfirm, "Complete Workout!!", 1730012345678)
//!     .unwrap();
//! assert_eq!(key.to_string(), "quests-confirm/complete_workout_1730012345678");
//!
//! let parsed = codec.decode("quests-confirm/complete_workout_1730012345678.jpg").unwrap();
//! assert_eq!(parsed.name(), "complete_workout");
//! ```

pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod folder;
pub mod key;
pub mod storage;

// Re-exports
pub use clock::{Clock, FixedClock, MonotonicClock, SystemClock};
pub use codec::{decode_name, encode_path, sanitize_name, PathCodec, MAX_NAME_LEN};
pub use config::SheetConfig;
pub use error::{SheetError, SheetResult};
pub use folder::StorageFolder;
pub use key::NamedTimestampKey;
pub use storage::{ConfirmationEntry, ConfirmationMeta, ConfirmationStore};
