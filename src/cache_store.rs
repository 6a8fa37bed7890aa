//! The persisted cache aggregate and the update/clear operations on it.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::config::CACHE_KEY;
use crate::error::Result;
use crate::models::{Cache, ClearResult, UpdateMeta, UpdateResult};
use crate::records::{index_records, merge_records, normalize_records};
use crate::settings::SettingsStore;
use crate::storage::Storage;

/// Owns the `{entries, index, lastSync, source}` aggregate.
///
/// The memo is only replaced after storage accepted the new aggregate, so a
/// failed write leaves the previous state visible.
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    memo: Option<Cache>,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            memo: None,
        }
    }

    /// Current cache, or `None` if nothing has been merged since the last clear
    pub fn load_cache(&mut self) -> Result<Option<Cache>> {
        if let Some(cache) = &self.memo {
            return Ok(Some(cache.clone()));
        }

        let cache: Option<Cache> = match self.storage.get(CACHE_KEY)? {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        };

        if let Some(cache) = &cache {
            log::debug!("Loaded cache with {} entries", cache.entries.len());
            self.memo = Some(cache.clone());
        }
        Ok(cache)
    }

    /// Merge an incoming batch into the cache.
    ///
    /// Returns a skipped result without touching storage when the media type
    /// is disabled in settings.
    pub fn handle_cache_update(
        &mut self,
        settings: &mut SettingsStore,
        records: &Value,
        meta: &UpdateMeta,
    ) -> Result<UpdateResult> {
        if !settings.is_enabled(&meta.media_type)? {
            log::debug!(
                "Skipping update because source is disabled: {}",
                meta.media_type
            );
            return Ok(UpdateResult::skipped());
        }

        let incoming = normalize_records(records, meta);
        let count = incoming.len();

        let existing = self
            .load_cache()?
            .map(|cache| cache.entries)
            .unwrap_or_default();
        let entries = merge_records(existing, incoming);
        let index = index_records(&entries);

        let next = Cache {
            entries,
            index,
            last_sync: Utc::now().timestamp_millis(),
            source: meta.source.clone(),
        };

        self.storage.set(CACHE_KEY, serde_json::to_value(&next)?)?;

        log::debug!(
            "Cache updated: media_type={} incoming={} total={}",
            meta.media_type,
            count,
            next.entries.len()
        );
        self.memo = Some(next);

        Ok(UpdateResult::accepted(count))
    }

    /// Delete the persisted aggregate and forget the memo
    pub fn handle_cache_clear(&mut self) -> Result<ClearResult> {
        self.storage.remove(CACHE_KEY)?;
        self.memo = None;
        log::debug!("Cache cleared");
        Ok(ClearResult { ok: true })
    }

    /// Drop the memo so the next load reads storage again
    pub fn forget(&mut self) {
        self.memo = None;
    }
}

#[cfg(test)]
#[path = "cache_store_tests.rs"]
mod tests;
