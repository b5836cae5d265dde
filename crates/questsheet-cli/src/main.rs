//! Questsheet CLI
//!
//! Thin wrapper around questsheet-core for naming, storing and listing
//! quest confirmation images.
//!
//! ## Usage
//!
//! ```bash
//! # List the storage folders
//! questsheet folders
//!
//! # Encode a storage key
//! questsheet encode quests-confirm "Complete Workout!!" --timestamp 1730012345678
//!
//! # Decode a storage key
//! questsheet decode quests-confirm/complete_workout_1730012345678.jpg
//!
//! # Store a confirmation image
//! questsheet confirm store quests-confirm "Complete Workout!!" ./photo.jpg
//!
//! # List stored confirmations
//! questsheet confirm list --folder quests-confirm
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use questsheet_core::{
    decode_name, sanitize_name, ConfirmationStore, PathCodec, SheetConfig,
    StorageFolder, SystemClock,
};

/// Questsheet - confirmation image keys
#[derive(Parser)]
#[command(name = "questsheet")]
#[command(version = "0.1.0")]
#[command(about = "Questsheet - storage keys for quest confirmation images")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Data directory (default: ~/.questsheet/data)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known storage folders
    Folders,

    /// Show the sanitized form of a name
    Sanitize {
        /// Raw quest or achievement name
        name: String,
    },

    /// Encode a storage key
    Encode {
        /// Storage folder (quests-confirm, achievements-confirm)
        folder: String,
        /// Raw quest or achievement name
        name: String,
        /// Timestamp in milliseconds (default: now)
        #[arg(short, long)]
        timestamp: Option<u64>,
        /// File extension to append (e.g. jpg)
        #[arg(short, long)]
        ext: Option<String>,
        /// Accept names with no usable characters
        #[arg(long)]
        lenient: bool,
    },

    /// Decode a storage key
    Decode {
        /// Storage key (folder/name_timestamp[.ext])
        path: String,
        /// Best-effort name recovery, never fails
        #[arg(long)]
        lenient: bool,
    },

    /// Confirmation image storage
    Confirm {
        #[command(subcommand)]
        action: ConfirmAction,
    },
}

#[derive(Subcommand)]
enum ConfirmAction {
    /// Store an image under a freshly encoded key
    Store {
        /// Storage folder (quests-confirm, achievements-confirm)
        folder: String,
        /// Raw quest or achievement name
        name: String,
        /// Image file (PNG, JPEG or WebP)
        file: PathBuf,
    },
    /// List stored confirmations
    List {
        /// Only list this folder
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Write a stored image to a file
    Get {
        /// Storage key
        path: String,
        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Delete a stored image
    Delete {
        /// Storage key
        path: String,
    },
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

/// Get the default data directory (~/.questsheet/data)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".questsheet")
        .join("data")
}

/// Parse a storage folder from its prefix string
fn parse_folder(s: &str) -> Result<StorageFolder> {
    s.parse().map_err(|_| {
        let known: Vec<&str> = StorageFolder::ALL.iter().map(|f| f.as_str()).collect();
        anyhow::anyhow!("Invalid folder '{}'. Must be one of: {}", s, known.join(", "))
    })
}

/// Format a millisecond timestamp as RFC 3339
fn format_millis(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "(out of range)".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let config = SheetConfig::load_or_default(data_dir.join("config.json"))?;
    tracing::debug!(data_dir = %data_dir.display(), ?config, "Loaded configuration");

    match cli.command {
        Commands::Folders => {
            for folder in StorageFolder::ALL {
                println!("{}", folder);
            }
        }

        Commands::Sanitize { name } => {
            println!("{}", sanitize_name(&name));
        }

        Commands::Encode {
            folder,
            name,
            timestamp,
            ext,
            lenient,
        } => {
            let folder = parse_folder(&folder)?;
            let mut codec = PathCodec::with_config(SystemClock, &config);
            if lenient {
                codec = codec.allow_empty_names(true);
            }
            let timestamp = timestamp.unwrap_or_else(|| codec.now_millis());

            // Extensions are validated in both modes so a key keeps exactly one '/'
            let mut key = codec.encode_at(folder, &name, timestamp)?;
            if let Some(ext) = ext {
                key = key.with_extension(&ext)?;
            }
            println!("{}", key);
        }

        Commands::Decode { path, lenient } => {
            if lenient {
                println!("{}", decode_name(&path));
            } else {
                let key = PathCodec::with_config(SystemClock, &config).decode(&path)?;
                println!("Folder: {}", key.folder());
                println!("Name: {}", key.name());
                println!("Timestamp: {} ({})", key.timestamp(), format_millis(key.timestamp()));
                if let Some(ext) = key.extension() {
                    println!("Extension: {}", ext);
                }
            }
        }

        Commands::Confirm { action } => {
            let store = ConfirmationStore::open(&data_dir, &config)?;

            match action {
                ConfirmAction::Store { folder, name, file } => {
                    let folder = parse_folder(&folder)?;
                    let data = std::fs::read(&file)
                        .with_context(|| format!("Failed to read {}", file.display()))?;
                    let stored = store.store(folder, &name, &data)?;

                    println!("Stored: {}", stored.key);
                    println!("  Size: {} bytes", stored.meta.size);
                    println!("  Hash: {}", stored.meta.content_hash);
                }

                ConfirmAction::List { folder } => {
                    let folder = folder.as_deref().map(parse_folder).transpose()?;
                    let entries = store.list(folder)?;

                    if entries.is_empty() {
                        println!("No confirmations found.");
                    } else {
                        println!("Confirmations ({}):", entries.len());
                        println!();
                        for entry in entries {
                            println!(
                                "  {}  {}  {}",
                                entry.key,
                                entry.label(),
                                format_millis(entry.meta.stored_at)
                            );
                        }
                    }
                }

                ConfirmAction::Get { path, out } => {
                    let data = store
                        .load(&path)?
                        .ok_or_else(|| anyhow::anyhow!("No confirmation stored at {}", path))?;
                    std::fs::write(&out, &data)
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                    println!("Wrote {} bytes to {}", data.len(), out.display());
                }

                ConfirmAction::Delete { path } => {
                    if store.delete(&path)? {
                        println!("Deleted: {}", path);
                    } else {
                        anyhow::bail!("No confirmation stored at {}", path);
                    }
                }
            }
        }
    }

    Ok(())
}
