//! Message vocabulary and the dispatcher that answers it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::cache_store::CacheStore;
use crate::config::{DEFAULT_MEDIA_TYPE, DEFAULT_SOURCE};
use crate::error::Result;
use crate::export::{handle_export, Downloads, ExportResult};
use crate::models::{Cache, ClearResult, Settings, UpdateMeta, UpdateResult};
use crate::settings::SettingsStore;
use crate::storage::Storage;

/// Inbound message, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    CacheUpdate {
        #[serde(default)]
        records: Value,
        #[serde(default)]
        source: Option<String>,
        #[serde(default, rename = "mediaType")]
        media_type: Option<String>,
    },
    CacheRequest,
    SettingsGet,
    SettingsSet {
        #[serde(default)]
        settings: Settings,
    },
    CacheExport,
    CacheClear,
}

impl Request {
    /// A `cache-update` carrying `records`
    pub fn update(records: Value, meta: UpdateMeta) -> Self {
        Request::CacheUpdate {
            records,
            source: Some(meta.source),
            media_type: Some(meta.media_type),
        }
    }

    /// Wire name of the message type
    pub fn kind(&self) -> &'static str {
        match self {
            Request::CacheUpdate { .. } => "cache-update",
            Request::CacheRequest => "cache-request",
            Request::SettingsGet => "settings-get",
            Request::SettingsSet { .. } => "settings-set",
            Request::CacheExport => "cache-export",
            Request::CacheClear => "cache-clear",
        }
    }
}

/// Reply to a [`Request`], serialized without a wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Update(UpdateResult),
    Cache(Option<Cache>),
    Settings(Settings),
    Export(ExportResult),
    Clear(ClearResult),
}

/// Owns the stores and answers one request at a time
pub struct Background {
    cache: CacheStore,
    settings: SettingsStore,
    downloads: Option<Box<dyn Downloads>>,
}

impl Background {
    /// Build the dispatcher over a storage backend; without `downloads`,
    /// exports come back inline.
    pub fn new(storage: Arc<dyn Storage>, downloads: Option<Box<dyn Downloads>>) -> Self {
        Self {
            cache: CacheStore::new(storage.clone()),
            settings: SettingsStore::new(storage),
            downloads,
        }
    }

    /// First-install hook: persist default settings if none exist
    pub fn on_installed(&self) -> Result<()> {
        self.settings.seed_defaults()
    }

    pub fn cache_store(&mut self) -> &mut CacheStore {
        &mut self.cache
    }

    pub fn settings_store(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    /// Handle a request, logging failures before handing them back
    pub fn dispatch(&mut self, request: Request) -> Result<Response> {
        let kind = request.kind();
        let result = self.dispatch_inner(request);
        if let Err(e) = &result {
            log::error!("{} failed: {}", kind, e);
        }
        result
    }

    fn dispatch_inner(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::CacheUpdate {
                records,
                source,
                media_type,
            } => {
                let meta = UpdateMeta::new(
                    source
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
                    media_type
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
                );
                log::debug!(
                    "Received cache update: source={} media_type={} entries={}",
                    meta.source,
                    meta.media_type,
                    records.as_array().map(Vec::len).unwrap_or(0)
                );
                let result = self
                    .cache
                    .handle_cache_update(&mut self.settings, &records, &meta)?;
                Ok(Response::Update(result))
            }
            Request::CacheRequest => Ok(Response::Cache(self.cache.load_cache()?)),
            Request::SettingsGet => Ok(Response::Settings(self.settings.load_settings()?)),
            Request::SettingsSet { settings } => {
                Ok(Response::Settings(self.settings.save_settings(settings)?))
            }
            Request::CacheExport => {
                let cache = self.cache.load_cache()?;
                let result = handle_export(
                    cache.as_ref(),
                    self.downloads.as_deref(),
                    Utc::now().timestamp_millis(),
                )?;
                Ok(Response::Export(result))
            }
            Request::CacheClear => Ok(Response::Clear(self.cache.handle_cache_clear()?)),
        }
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
