//! CacheArena - phone specification cache
//!
//! Merges scraped phone records into a persisted local cache keyed by
//! `(mediaType, slug)`, keeps a display-key index beside it and exports the
//! cache as CSV.

pub mod cache_store;
pub mod config;
pub mod csv_export;
pub mod error;
pub mod export;
pub mod extract;
pub mod io;
pub mod messages;
pub mod models;
pub mod normalize;
pub mod records;
pub mod service;
pub mod settings;
pub mod storage;

// Re-export commonly used items
pub use cache_store::CacheStore;
pub use csv_export::{build_csv, escape_csv};
pub use error::{CacheError, Result};
pub use export::{DirectoryDownloads, Downloads, ExportMode, ExportResult};
pub use extract::extract_phone_page;
pub use messages::{Background, Request, Response};
pub use models::{Cache, ClearResult, RawRecord, Record, Settings, UpdateMeta, UpdateResult};
pub use normalize::{key_for, normalize, slug_from_url};
pub use records::{index_records, merge_records, normalize_entry, normalize_records};
pub use service::{CacheService, ServiceHandle};
pub use settings::SettingsStore;
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
