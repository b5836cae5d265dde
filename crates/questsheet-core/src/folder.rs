//! Storage folders for confirmation images.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SheetError;

/// Logical bucket a confirmation image is stored under.
///
/// The string form is the first segment of every storage key and must be
/// accepted as a bucket prefix by whatever blob store receives the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageFolder {
    /// Photos proving a quest was completed
    QuestsConfirm,
    /// Photos proving an achievement was earned
    AchievementsConfirm,
}

impl StorageFolder {
    /// Every known folder, in declaration order
    pub const ALL: [StorageFolder; 2] = [StorageFolder::QuestsConfirm, StorageFolder::AchievementsConfirm];

    /// The bucket prefix used in storage keys
    pub const fn as_str(&self) -> &'static str {
        match self {
            StorageFolder::QuestsConfirm => "quests-confirm",
            StorageFolder::AchievementsConfirm => "achievements-confirm",
        }
    }
}

impl fmt::Display for StorageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageFolder {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageFolder::ALL
            .into_iter()
            .find(|folder| folder.as_str() == s)
            .ok_or_else(|| SheetError::InvalidFolder(s.to_string()))
    }
}
