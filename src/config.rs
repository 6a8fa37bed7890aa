//! Fixed configuration: storage keys, the source registry and the CSV layout.

use crate::models::Settings;
use std::collections::BTreeMap;
use url::Url;

/// Storage key of the persisted cache aggregate
pub const CACHE_KEY: &str = "gsmarena-cache-v1";

/// Storage key of the persisted settings aggregate
pub const SETTINGS_KEY: &str = "gsmarena-settings";

/// Media type assumed when a caller does not supply one
pub const DEFAULT_MEDIA_TYPE: &str = "phone";

/// Source label assumed when a caller does not supply one
pub const DEFAULT_SOURCE: &str = "unknown";

/// Source label used by the HTML extraction adapter
pub const EXTRACT_SOURCE: &str = "extract:phone-page";

/// Prefix of exported CSV file names
pub const EXPORT_FILE_PREFIX: &str = "cachearena-export-";

/// Column order of the exported CSV, also the full field set of a record
pub const CSV_FIELDS: [&str; 27] = [
    "mediaType",
    "sourceId",
    "slug",
    "brand",
    "model",
    "announced",
    "status",
    "dimensions",
    "weight",
    "build",
    "sim",
    "displayType",
    "displaySize",
    "displayResolution",
    "os",
    "chipset",
    "memory",
    "mainCamera",
    "selfieCamera",
    "battery",
    "charging",
    "colors",
    "price",
    "image",
    "url",
    "updatedAt",
    "firstSeen",
];

/// A site the extension knows how to collect from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub id: &'static str,
    pub label: &'static str,
    pub storage_key: &'static str,
    pub media_type: &'static str,
    pub hosts: &'static [&'static str],
}

impl Source {
    /// Returns true if the URL's host belongs to this source
    pub fn matches_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => parsed
                .host_str()
                .map(|host| self.hosts.iter().any(|h| h.eq_ignore_ascii_case(host)))
                .unwrap_or(false),
            Err(e) => {
                log::debug!("Unparseable URL {}: {}", url, e);
                false
            }
        }
    }
}

/// All registered sources
pub const SOURCES: &[Source] = &[Source {
    id: "phones",
    label: "GSMArena phones",
    storage_key: "gsmarena-phones::records",
    media_type: "phone",
    hosts: &["gsmarena.com", "www.gsmarena.com"],
}];

/// Find the registered source serving a URL
pub fn source_for_url(url: &str) -> Option<&'static Source> {
    SOURCES.iter().find(|source| source.matches_url(url))
}

/// Settings with every registered media type enabled
pub fn default_settings() -> Settings {
    let sources: BTreeMap<String, bool> = SOURCES
        .iter()
        .map(|source| (source.media_type.to_string(), true))
        .collect();
    Settings { sources }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_enable_every_source() {
        let settings = default_settings();
        assert_eq!(settings.sources.get("phone"), Some(&true));
        assert_eq!(settings.sources.len(), SOURCES.len());
    }

    #[test]
    fn source_matches_known_hosts_only() {
        let phones = &SOURCES[0];
        assert!(phones.matches_url("https://www.gsmarena.com/samsung_galaxy_s25-13610.php"));
        assert!(phones.matches_url("https://gsmarena.com/"));
        assert!(!phones.matches_url("https://example.com/samsung-1.php"));
        assert!(!phones.matches_url("not a url"));
    }

    #[test]
    fn source_for_url_finds_phones() {
        let source = source_for_url("https://www.gsmarena.com/apple_iphone_16-13317.php");
        assert_eq!(source.map(|s| s.id), Some("phones"));
        assert!(source_for_url("https://example.org").is_none());
    }
}
