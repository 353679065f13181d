//! Geocoding backends: Yandex Geocoder, OSM Nominatim, and Photon.
//!
//! Every backend maps an address to `Result<Option<Coords>, GeocodeError>`:
//! `Ok(Some(_))` is a hit, `Ok(None)` means the service answered with no
//! usable result, `Err(_)` is a transient failure. Coordinates are always
//! normalized to `(lat, lon)` whatever the service's native order.

use super::client::GeoClient;
use super::types::{Coords, GeocodeError};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

const YANDEX_TIMEOUT: Duration = Duration::from_secs(15);
const NOMINATIM_TIMEOUT: Duration = Duration::from_secs(20);
const PHOTON_TIMEOUT: Duration = Duration::from_secs(20);

// ─── Yandex Geocoder ────────────────────────────────────────────

#[derive(Deserialize)]
struct YandexReply {
    response: YandexResponse,
}

#[derive(Deserialize)]
struct YandexResponse {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    object: GeoObject,
}

#[derive(Deserialize)]
struct GeoObject {
    #[serde(rename = "Point", default)]
    point: Option<YandexPoint>,
}

#[derive(Deserialize)]
struct YandexPoint {
    #[serde(default)]
    pos: String,
}

/// Parse Yandex's `"lon lat"` position string into `(lat, lon)`.
fn parse_lon_lat(pos: &str) -> Result<Coords, GeocodeError> {
    let mut parts = pos.split_whitespace();
    let (Some(lon_str), Some(lat_str)) = (parts.next(), parts.next()) else {
        return Err(GeocodeError::InvalidResponse(format!("bad pos '{}'", pos)));
    };
    let lon: f64 = lon_str
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad pos '{}'", pos)))?;
    let lat: f64 = lat_str
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad pos '{}'", pos)))?;
    Ok(Coords { lat, lon })
}

/// Geocode via the Yandex Geocoder HTTP API (requires an API key).
pub fn yandex_geocode(
    client: &GeoClient,
    addr: &str,
    apikey: &str,
    lang: &str,
) -> Result<Option<Coords>, GeocodeError> {
    let url = format!(
        "https://geocode-maps.yandex.ru/1.x/?apikey={}&geocode={}&format=json&results=1&lang={}",
        urlencoding::encode(apikey),
        urlencoding::encode(addr),
        urlencoding::encode(lang),
    );
    let data = client.fetch_json(&url, &[], YANDEX_TIMEOUT)?;
    let reply: YandexReply =
        serde_json::from_value(data).map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    let Some(member) = reply.response.collection.members.into_iter().next() else {
        return Ok(None);
    };
    let Some(point) = member.object.point else {
        return Ok(None);
    };
    if point.pos.trim().is_empty() {
        return Ok(None);
    }
    parse_lon_lat(&point.pos).map(Some)
}

// ─── Nominatim ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

/// Geocode via OpenStreetMap Nominatim (top result only).
pub fn nominatim_geocode(
    client: &GeoClient,
    addr: &str,
    lang: &str,
) -> Result<Option<Coords>, GeocodeError> {
    let url = format!(
        "https://nominatim.openstreetmap.org/search?q={}&format=jsonv2&limit=1&accept-language={}",
        urlencoding::encode(addr),
        urlencoding::encode(lang),
    );
    let data = client.fetch_json(&url, &[("Accept-Language", lang)], NOMINATIM_TIMEOUT)?;
    let results: Vec<NominatimResult> =
        serde_json::from_value(data).map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    let Some(first) = results.first() else {
        return Ok(None);
    };
    let lat: f64 = first
        .lat
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad lat '{}'", first.lat)))?;
    let lon: f64 = first
        .lon
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad lon '{}'", first.lon)))?;
    Ok(Some(Coords { lat, lon }))
}

// ─── Photon (variant-scored) ────────────────────────────────────
//
// Photon's free-text search is loose about Russian house-number
// suffixes ("12к3", "5с2", "стр. 7"), so the backend queries several
// spelling variants of the address and scores every returned feature
// against the original text, keeping the best-scoring candidate.

#[derive(Deserialize, Default)]
pub(crate) struct PhotonFeature {
    // Raw JSON: a candidate with a malformed geometry must not sink
    // the sibling candidates in the same response.
    #[serde(default)]
    geometry: Value,
    #[serde(default)]
    properties: PhotonProps,
}

#[derive(Deserialize, Default)]
struct PhotonProps {
    #[serde(default)]
    housenumber: Option<String>,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    postcode: Option<String>,
    #[serde(default)]
    osm_value: Option<String>,
}

#[derive(Deserialize)]
struct PhotonReply {
    #[serde(default)]
    features: Vec<PhotonFeature>,
}

impl PhotonFeature {
    /// GeoJSON order is `[lon, lat]`; swap to `(lat, lon)`.
    fn coords(&self) -> Option<Coords> {
        let arr = self.geometry.get("coordinates")?.as_array()?;
        if arr.len() < 2 {
            return None;
        }
        Some(Coords {
            lat: arr[1].as_f64()?,
            lon: arr[0].as_f64()?,
        })
    }
}

/// Matches `12к3`, `5с2`, `стр.`/`строение` building markers. `к` is a
/// block ("корпус"), `с` a structure ("строение"); Latin `k`/`c`
/// look-alikes appear in OCR'd and transliterated lists.
fn house_continuation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d[^\s,]*)\s*([сc])(\d)").unwrap())
}

fn structure_marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)([сc])\s*(\d+)").unwrap())
}

fn block_marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)([кk])\s*(\d+)").unwrap())
}

fn stroenie_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(стр(?:\.|оение)?)\s*(\d+)").unwrap())
}

fn house_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+[^\s,]*").unwrap())
}

fn house_strip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^0-9a-zа-я]").unwrap())
}

/// Collapse commas to spaces and runs of whitespace to one space.
pub(crate) fn normalize_variant(text: &str) -> String {
    text.replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split inferred building/structure suffixes off their adjoining
/// token: `12к3` → `12к 3`, `5с2` → `5 с 2`, `стр.7` → `стр 7`.
pub(crate) fn separate_suffixes(text: &str) -> String {
    let step = house_continuation_pattern().replace_all(text, "${1} ${2}${3}");
    let step = structure_marker_pattern().replace_all(&step, "${1} ${2}");
    let step = block_marker_pattern().replace_all(&step, "${1} ${2}");
    stroenie_pattern().replace_all(&step, "стр ${2}").into_owned()
}

/// Lowercase and strip everything outside `[0-9a-zа-я]` so house
/// numbers compare loosely (`"12-А"` vs `"12а"`).
fn normalized_house(value: &str) -> String {
    house_strip_pattern()
        .replace_all(&value.to_lowercase(), "")
        .into_owned()
}

fn add_variant(variants: &mut Vec<String>, text: String) {
    if !text.is_empty() && !variants.contains(&text) {
        variants.push(text);
    }
}

/// Generate search variants in a fixed order, duplicates suppressed:
/// the raw address, its normalized form, the suffix-separated form,
/// and (for comma-separated addresses) a reordering that moves the
/// leading segment — commonly the city — to the end.
pub(crate) fn build_variants(addr: &str) -> Vec<String> {
    let mut variants = Vec::new();
    add_variant(&mut variants, addr.trim().to_string());
    add_variant(&mut variants, normalize_variant(addr));
    add_variant(&mut variants, normalize_variant(&separate_suffixes(addr)));
    if addr.contains(',') {
        let parts: Vec<&str> = addr
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() > 1 {
            let mut reordered = parts[1..].join(" ");
            reordered.push(' ');
            reordered.push_str(parts[0]);
            add_variant(&mut variants, normalize_variant(&reordered));
            add_variant(&mut variants, normalize_variant(&separate_suffixes(&reordered)));
        }
    }
    variants
}

/// Everything the scorer needs from the original address, computed once.
pub(crate) struct ScoreContext {
    /// The address exactly as given (postal-code check is literal).
    raw: String,
    /// Normalized, lowercased address for substring checks.
    address_lower: String,
    /// Normalized numeric tokens ("12к3" → "12к3") in first-seen order.
    house_tokens: Vec<String>,
}

impl ScoreContext {
    pub(crate) fn new(addr: &str) -> Self {
        let mut house_tokens = Vec::new();
        for m in house_token_pattern().find_iter(addr) {
            let token = normalized_house(m.as_str());
            if !token.is_empty() && !house_tokens.contains(&token) {
                house_tokens.push(token);
            }
        }
        Self {
            raw: addr.to_string(),
            address_lower: normalize_variant(addr).to_lowercase(),
            house_tokens,
        }
    }
}

/// Score one candidate against the original address. Starts at zero:
/// +5 exact house-number match, +3 partial (substring either way,
/// first matching token only), +1 street, +0.5 name, +0.25 city,
/// +0.25 literal postcode; −1 for bridge/street OSM features.
fn score_feature(ctx: &ScoreContext, props: &PhotonProps) -> f64 {
    let mut score = 0.0;

    if let Some(house) = props.housenumber.as_deref() {
        let house = normalized_house(house);
        if !house.is_empty() {
            if ctx.house_tokens.iter().any(|t| *t == house) {
                score += 5.0;
            } else if ctx
                .house_tokens
                .iter()
                .any(|t| house.contains(t.as_str()) || t.contains(&house))
            {
                score += 3.0;
            }
        }
    }

    if let Some(street) = props.street.as_deref() {
        let street = street.to_lowercase();
        if !street.is_empty() && ctx.address_lower.contains(&street) {
            score += 1.0;
        }
    }
    if let Some(name) = props.name.as_deref() {
        let name = name.to_lowercase();
        if !name.is_empty() && ctx.address_lower.contains(&name) {
            score += 0.5;
        }
    }
    if let Some(city) = props.city.as_deref() {
        let city = city.to_lowercase();
        if !city.is_empty() && ctx.address_lower.contains(&city) {
            score += 0.25;
        }
    }
    if let Some(postcode) = props.postcode.as_deref() {
        if !postcode.is_empty() && ctx.raw.contains(postcode) {
            score += 0.25;
        }
    }
    if let Some(osm_value) = props.osm_value.as_deref() {
        let osm_value = osm_value.to_lowercase();
        if osm_value == "bridge" || osm_value == "street" {
            score -= 1.0;
        }
    }

    score
}

/// Scan one variant's candidates, keeping the highest-scoring eligible
/// candidate seen so far (first seen wins ties; only positive scores
/// are eligible; candidates with malformed coordinates are skipped).
/// Returns true when a decisive candidate (score ≥ 5.0) was found and
/// remaining variants should not be queried.
pub(crate) fn scan_features(
    ctx: &ScoreContext,
    features: &[PhotonFeature],
    best: &mut Option<(Coords, f64)>,
) -> bool {
    for feature in features {
        let score = score_feature(ctx, &feature.properties);
        if score <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            let Some(coords) = feature.coords() else {
                continue;
            };
            *best = Some((coords, score));
            if score >= 5.0 {
                return true;
            }
        }
    }
    false
}

/// Photon only understands a handful of language codes.
fn photon_lang(lang: &str) -> &str {
    match lang {
        "default" | "en" | "de" | "fr" => lang,
        _ => "default",
    }
}

/// Geocode via Photon, trying several address variants and scoring up
/// to 15 candidates per variant. A transient failure on one variant is
/// swallowed and iteration continues with the next.
pub fn photon_geocode(
    client: &GeoClient,
    addr: &str,
    lang: &str,
) -> Result<Option<Coords>, GeocodeError> {
    let lang_param = photon_lang(lang);
    let ctx = ScoreContext::new(addr);
    let mut best: Option<(Coords, f64)> = None;

    for variant in build_variants(addr) {
        let url = format!(
            "https://photon.komoot.io/api/?q={}&limit=15&lang={}",
            urlencoding::encode(&variant),
            lang_param,
        );
        let data = match client.fetch_json(&url, &[], PHOTON_TIMEOUT) {
            Ok(data) => data,
            Err(_) => continue,
        };
        let reply: PhotonReply = match serde_json::from_value(data) {
            Ok(reply) => reply,
            Err(_) => continue,
        };
        if scan_features(&ctx, &reply.features, &mut best) {
            break;
        }
    }

    Ok(best.map(|(coords, _)| coords))
}
