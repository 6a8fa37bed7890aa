//! Per-media-type enable/disable switches.

use std::sync::Arc;

use crate::config::{default_settings, SETTINGS_KEY};
use crate::error::Result;
use crate::models::Settings;
use crate::storage::Storage;

/// Owns the persisted settings aggregate and a memo of it
pub struct SettingsStore {
    storage: Arc<dyn Storage>,
    memo: Option<Settings>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            memo: None,
        }
    }

    /// Persist the defaults if nothing has been stored yet
    pub fn seed_defaults(&self) -> Result<()> {
        if self.storage.get(SETTINGS_KEY)?.is_none() {
            self.storage
                .set(SETTINGS_KEY, serde_json::to_value(default_settings())?)?;
            log::info!("Seeded default settings");
        }
        Ok(())
    }

    /// Current settings; every registered media type has an entry
    pub fn load_settings(&mut self) -> Result<Settings> {
        if let Some(settings) = &self.memo {
            return Ok(settings.clone());
        }

        let mut settings = default_settings();
        if let Some(value) = self.storage.get(SETTINGS_KEY)? {
            let stored: Settings = serde_json::from_value(value)?;
            settings.sources.extend(stored.sources);
        }

        self.memo = Some(settings.clone());
        Ok(settings)
    }

    /// Shallow-merge `partial.sources` into the current map and persist.
    ///
    /// Unknown media types are kept as given.
    pub fn save_settings(&mut self, partial: Settings) -> Result<Settings> {
        let mut merged = self.load_settings()?;
        merged.sources.extend(partial.sources);

        self.storage.set(SETTINGS_KEY, serde_json::to_value(&merged)?)?;
        self.memo = Some(merged.clone());

        log::debug!("Saved settings: {:?}", merged.sources);
        Ok(merged)
    }

    /// Whether updates for `media_type` should be merged
    pub fn is_enabled(&mut self, media_type: &str) -> Result<bool> {
        Ok(self.load_settings()?.is_enabled(media_type))
    }

    /// Drop the memo so the next load reads storage again
    pub fn forget(&mut self) {
        self.memo = None;
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
