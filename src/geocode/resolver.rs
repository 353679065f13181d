//! Geocode resolver — cache lookup plus the backend fallback chain.
//!
//! Chain per preference (Yandex only when an API key is present):
//!   yandex:    Yandex → Nominatim → Photon
//!   photon:    Photon → Yandex → Nominatim
//!   nominatim: Nominatim → Yandex → Photon

use super::cache::{GeoCache, DEFAULT_CACHE_FILE};
use super::client::GeoClient;
use super::providers;
use super::types::{Backend, Coords};
use std::path::{Path, PathBuf};

/// Yandex wants the full locale; the other backends take its short form.
const GEOCODE_LANG: &str = "ru_RU";

/// Build the ordered backend chain for one resolution attempt. Each
/// backend appears at most once; Photon is always the last resort.
pub(crate) fn fallback_chain(prefer: Backend, has_key: bool) -> Vec<Backend> {
    let mut chain = Vec::new();
    match prefer {
        Backend::Yandex => {
            if has_key {
                chain.push(Backend::Yandex);
            }
            chain.push(Backend::Nominatim);
        }
        Backend::Photon => {
            chain.push(Backend::Photon);
            if has_key {
                chain.push(Backend::Yandex);
            }
            chain.push(Backend::Nominatim);
        }
        Backend::Nominatim => {
            chain.push(Backend::Nominatim);
            if has_key {
                chain.push(Backend::Yandex);
            }
        }
    }
    if !chain.contains(&Backend::Photon) {
        chain.push(Backend::Photon);
    }
    chain
}

/// The geocode resolver. Owns the HTTP client and the cache location;
/// the cache file itself is re-read at the start of every resolution
/// and written back at most once.
pub struct GeocodeResolver {
    client: GeoClient,
    cache_path: PathBuf,
    apikey: Option<String>,
    lang: String,
    offline: bool,
}

impl GeocodeResolver {
    pub fn new(apikey: Option<String>, nominatim_email: Option<&str>) -> Self {
        Self {
            client: GeoClient::new(nominatim_email),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            apikey,
            lang: GEOCODE_LANG.to_string(),
            offline: false,
        }
    }

    /// Point the cache at a specific file (tests use a temp dir).
    pub fn with_cache_path(mut self, path: &Path) -> Self {
        self.cache_path = path.to_path_buf();
        self
    }

    /// Offline mode — cache lookups only, no network attempts.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Resolve an address to coordinates: cache first (preferred-backend
    /// key, then bare key), then the fallback chain. A transient backend
    /// error counts as "no result" and the chain moves on. On success
    /// both cache keys are written; on total failure any malformed cache
    /// entries under those keys are purged so a later run can retry.
    pub fn resolve(&self, addr: &str, prefer: Backend) -> Option<Coords> {
        let mut cache = GeoCache::load_from(&self.cache_path);
        let keys = [format!("{}:{}", prefer, addr), addr.to_string()];
        for key in &keys {
            if let Some(coords) = cache.get(key) {
                return Some(coords);
            }
        }

        if !self.offline {
            let lang_short = self.lang.split('_').next().unwrap_or("en");
            for backend in fallback_chain(prefer, self.apikey.is_some()) {
                let outcome = match backend {
                    Backend::Yandex => providers::yandex_geocode(
                        &self.client,
                        addr,
                        self.apikey.as_deref().unwrap_or(""),
                        &self.lang,
                    ),
                    Backend::Nominatim => {
                        providers::nominatim_geocode(&self.client, addr, lang_short)
                    }
                    Backend::Photon => providers::photon_geocode(&self.client, addr, lang_short),
                };
                match outcome {
                    Ok(Some(coords)) => {
                        for key in &keys {
                            cache.insert(key, coords);
                        }
                        cache.persist();
                        return Some(coords);
                    }
                    Ok(None) => {}
                    Err(_) => {} // transient: next backend in the chain
                }
            }
        }

        if cache.purge_malformed(&keys) {
            cache.persist();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn offline_resolver(dir: &TempDir) -> GeocodeResolver {
        let mut resolver = GeocodeResolver::new(None, None)
            .with_cache_path(&dir.path().join("geocache.json"));
        resolver.set_offline(true);
        resolver
    }

    #[test]
    fn test_chain_yandex_with_key() {
        assert_eq!(
            fallback_chain(Backend::Yandex, true),
            vec![Backend::Yandex, Backend::Nominatim, Backend::Photon]
        );
    }

    #[test]
    fn test_chain_yandex_without_key_skips_yandex() {
        // No API key: the Yandex backend must never be attempted.
        assert_eq!(
            fallback_chain(Backend::Yandex, false),
            vec![Backend::Nominatim, Backend::Photon]
        );
    }

    #[test]
    fn test_chain_photon_tried_once() {
        assert_eq!(
            fallback_chain(Backend::Photon, true),
            vec![Backend::Photon, Backend::Yandex, Backend::Nominatim]
        );
        assert_eq!(
            fallback_chain(Backend::Photon, false),
            vec![Backend::Photon, Backend::Nominatim]
        );
    }

    #[test]
    fn test_chain_nominatim() {
        assert_eq!(
            fallback_chain(Backend::Nominatim, true),
            vec![Backend::Nominatim, Backend::Yandex, Backend::Photon]
        );
        assert_eq!(
            fallback_chain(Backend::Nominatim, false),
            vec![Backend::Nominatim, Backend::Photon]
        );
    }

    #[test]
    fn test_resolve_cache_hit_preferred_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocache.json");
        fs::write(&path, r#"{"yandex:Тверская 1": [55.76, 37.61]}"#).unwrap();

        let resolver = offline_resolver(&dir);
        let coords = resolver.resolve("Тверская 1", Backend::Yandex).unwrap();
        assert_eq!(coords, Coords { lat: 55.76, lon: 37.61 });
    }

    #[test]
    fn test_resolve_cache_hit_bare_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocache.json");
        fs::write(&path, r#"{"Тверская 1": [55.76, 37.61]}"#).unwrap();

        let resolver = offline_resolver(&dir);
        // Bare key hits regardless of the preferred backend
        assert!(resolver.resolve("Тверская 1", Backend::Photon).is_some());
    }

    #[test]
    fn test_resolve_miss_offline() {
        let dir = TempDir::new().unwrap();
        let resolver = offline_resolver(&dir);
        assert!(resolver.resolve("нигде", Backend::Yandex).is_none());
    }

    #[test]
    fn test_resolve_purges_malformed_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocache.json");
        fs::write(
            &path,
            r#"{"yandex:Тверская 1": "failed", "Другая 2": [55.0, 37.0]}"#,
        )
        .unwrap();

        let resolver = offline_resolver(&dir);
        // Malformed entry reads as a miss, does not crash, and is purged
        assert!(resolver.resolve("Тверская 1", Backend::Yandex).is_none());

        let reloaded = GeoCache::load_from(&path);
        assert!(!reloaded.is_malformed("yandex:Тверская 1"));
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get("Другая 2").is_some());
    }

    #[test]
    fn test_resolve_keeps_wellformed_entries_on_miss() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocache.json");
        fs::write(&path, r#"{"Другая 2": [55.0, 37.0]}"#).unwrap();

        let resolver = offline_resolver(&dir);
        assert!(resolver.resolve("Тверская 1", Backend::Yandex).is_none());
        // Unrelated well-formed entries untouched
        assert!(GeoCache::load_from(&path).get("Другая 2").is_some());
    }
}
