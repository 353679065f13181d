//! File-based coordinate cache at ./geocache.json.
//!
//! Keys are either a bare address or `"{backend}:{address}"`; values
//! are `[lat, lon]` arrays. Entries never expire. The cache is a pure
//! performance optimization: a missing, corrupt, or unwritable file
//! degrades to no-cache behavior, never to a failed run.

use super::types::Coords;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_FILE: &str = "geocache.json";

/// The on-disk geocode cache. Entries are kept as raw JSON values so a
/// malformed entry survives loading and can be purged on lookup miss.
pub struct GeoCache {
    path: PathBuf,
    entries: serde_json::Map<String, Value>,
}

impl GeoCache {
    /// Load the cache from the default working-directory path.
    pub fn load() -> Self {
        Self::load_from(Path::new(DEFAULT_CACHE_FILE))
    }

    /// Load from a specific path (tests point this at a temp dir).
    pub fn load_from(path: &Path) -> Self {
        let entries = Self::read_file(path).unwrap_or_default();
        Self { path: path.to_path_buf(), entries }
    }

    fn read_file(path: &Path) -> Option<serde_json::Map<String, Value>> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key. Only a well-formed 2-element numeric array is a
    /// hit; anything else reads as a miss.
    pub fn get(&self, key: &str) -> Option<Coords> {
        as_coords(self.entries.get(key)?)
    }

    /// True if `key` is present but does not hold a valid pair.
    pub fn is_malformed(&self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(value) => as_coords(value).is_none(),
            None => false,
        }
    }

    /// Store a pair under `key` (in memory; call `persist` to flush).
    pub fn insert(&mut self, key: &str, coords: Coords) {
        self.entries.insert(
            key.to_string(),
            Value::Array(vec![coords.lat.into(), coords.lon.into()]),
        );
    }

    /// Drop any present-but-malformed entries among `keys` so a later
    /// run can retry them. Returns true if anything was removed.
    pub fn purge_malformed(&mut self, keys: &[String]) -> bool {
        let mut modified = false;
        for key in keys {
            if self.is_malformed(key) {
                self.entries.remove(key);
                modified = true;
            }
        }
        modified
    }

    /// Best-effort write-back. Failures are swallowed: losing the
    /// cache must never abort the run.
    pub fn persist(&self) {
        if let Ok(json) = serde_json::to_string_pretty(&self.entries) {
            let _ = fs::write(&self.path, json);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn as_coords(value: &Value) -> Option<Coords> {
    let arr = value.as_array()?;
    if arr.len() != 2 {
        return None;
    }
    Some(Coords {
        lat: arr[0].as_f64()?,
        lon: arr[1].as_f64()?,
    })
}
