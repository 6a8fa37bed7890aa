use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{DEFAULT_MEDIA_TYPE, DEFAULT_SOURCE};

/// A record as delivered by an extraction adapter: named fields, any missing,
/// values of any JSON type.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// One normalized phone specification record.
///
/// Every field is always present; absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    pub media_type: String,
    pub source_id: String,
    pub slug: String,
    pub brand: String,
    pub model: String,
    pub announced: String,
    pub status: String,
    pub dimensions: String,
    pub weight: String,
    pub build: String,
    pub sim: String,
    pub display_type: String,
    pub display_size: String,
    pub display_resolution: String,
    pub os: String,
    pub chipset: String,
    pub memory: String,
    pub main_camera: String,
    pub selfie_camera: String,
    pub battery: String,
    pub charging: String,
    pub colors: String,
    pub price: String,
    pub image: String,
    pub url: String,
    /// ISO-8601 timestamp of the most recent observation
    pub updated_at: String,
    /// ISO-8601 timestamp of the first observation
    pub first_seen: String,
}

impl Record {
    /// Look up a field by its wire name (the names in `CSV_FIELDS`)
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "mediaType" => &self.media_type,
            "sourceId" => &self.source_id,
            "slug" => &self.slug,
            "brand" => &self.brand,
            "model" => &self.model,
            "announced" => &self.announced,
            "status" => &self.status,
            "dimensions" => &self.dimensions,
            "weight" => &self.weight,
            "build" => &self.build,
            "sim" => &self.sim,
            "displayType" => &self.display_type,
            "displaySize" => &self.display_size,
            "displayResolution" => &self.display_resolution,
            "os" => &self.os,
            "chipset" => &self.chipset,
            "memory" => &self.memory,
            "mainCamera" => &self.main_camera,
            "selfieCamera" => &self.selfie_camera,
            "battery" => &self.battery,
            "charging" => &self.charging,
            "colors" => &self.colors,
            "price" => &self.price,
            "image" => &self.image,
            "url" => &self.url,
            "updatedAt" => &self.updated_at,
            "firstSeen" => &self.first_seen,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable access to a data field by wire name.
    ///
    /// Identity and provenance fields are not reachable through here.
    pub(crate) fn data_field_mut(&mut self, name: &str) -> Option<&mut String> {
        let value = match name {
            "brand" => &mut self.brand,
            "model" => &mut self.model,
            "announced" => &mut self.announced,
            "status" => &mut self.status,
            "dimensions" => &mut self.dimensions,
            "weight" => &mut self.weight,
            "build" => &mut self.build,
            "sim" => &mut self.sim,
            "displayType" => &mut self.display_type,
            "displaySize" => &mut self.display_size,
            "displayResolution" => &mut self.display_resolution,
            "os" => &mut self.os,
            "chipset" => &mut self.chipset,
            "memory" => &mut self.memory,
            "mainCamera" => &mut self.main_camera,
            "selfieCamera" => &mut self.selfie_camera,
            "battery" => &mut self.battery,
            "charging" => &mut self.charging,
            "colors" => &mut self.colors,
            "price" => &mut self.price,
            "image" => &mut self.image,
            "url" => &mut self.url,
            _ => return None,
        };
        Some(value)
    }

    /// Merge identity: `mediaType::slug`
    pub fn identity_key(&self) -> String {
        format!("{}::{}", self.media_type, self.slug)
    }
}

/// The persisted cache aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cache {
    /// Authoritative list, unique by identity key
    pub entries: Vec<Record>,
    /// Display-key lookup, rebuilt from `entries` on every merge
    #[serde(default)]
    pub index: BTreeMap<String, Record>,
    /// Epoch milliseconds of the last successful merge
    pub last_sync: i64,
    /// Label of the collector that produced the last merge
    #[serde(default)]
    pub source: String,
}

/// Per-media-type enablement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub sources: BTreeMap<String, bool>,
}

impl Settings {
    /// A media type is enabled unless explicitly switched off
    pub fn is_enabled(&self, media_type: &str) -> bool {
        self.sources.get(media_type) != Some(&false)
    }
}

/// Who produced an incoming batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMeta {
    pub source: String,
    pub media_type: String,
}

impl UpdateMeta {
    pub fn new(source: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            media_type: media_type.into(),
        }
    }
}

impl Default for UpdateMeta {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE, DEFAULT_MEDIA_TYPE)
    }
}

/// Outcome of a cache update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
}

impl UpdateResult {
    pub fn accepted(count: usize) -> Self {
        Self {
            ok: true,
            count: Some(count),
            skipped: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            ok: false,
            count: None,
            skipped: Some(true),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped == Some(true)
    }
}

/// Outcome of a cache clear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearResult {
    pub ok: bool,
}
