//! Deep-link building for Yandex Maps route views.

use regex::Regex;
use std::sync::OnceLock;

/// Matches `lat,lon` with optional signs, decimals, and whitespace
/// around the comma. No locale decimal separators.
fn coords_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*[+-]?\d+(?:\.\d+)?\s*,\s*[+-]?\d+(?:\.\d+)?\s*$").unwrap()
    })
}

/// True iff `text` already looks like a numeric `lat,lon` pair.
pub fn is_coords(text: &str) -> bool {
    coords_pattern().is_match(text)
}

/// Percent-encode with quote-plus semantics: spaces become `+`,
/// everything outside `[A-Za-z0-9_.~-]` is percent-escaped.
fn quote_plus(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}

/// Build a Yandex Maps universal link that opens the route builder
/// with `target` as the destination and public transport selected.
///
/// An empty route start (`rtext=~...`) means "from current location".
/// Coordinate targets keep their comma literal so the pair reads
/// verbatim in the URL; everything else is quote-plus encoded.
pub fn build_route_link(target: &str, domain: &str) -> String {
    let encoded = if is_coords(target) {
        target.replace(' ', "")
    } else {
        quote_plus(target)
    };
    format!("https://{}/maps/?mode=routes&rtext=~{}&rtt=masstransit", domain, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_coords_plain() {
        assert!(is_coords("55.7539,37.6208"));
        assert!(is_coords("55,37"));
        assert!(is_coords("-55.7539, 37.6208"));
        assert!(is_coords("  +55.7539 , -37.6208  "));
    }

    #[test]
    fn test_is_coords_rejects_missing_comma() {
        assert!(!is_coords("55.7539 37.6208"));
        assert!(!is_coords("55.7539"));
    }

    #[test]
    fn test_is_coords_rejects_text() {
        assert!(!is_coords("Москва, Красная площадь"));
        assert!(!is_coords("55.7539,abc"));
        assert!(!is_coords("55.75.39,37.62"));
        assert!(!is_coords(""));
    }

    #[test]
    fn test_link_coords_comma_unencoded() {
        let url = build_route_link("55.7539, 37.6208", "yandex.ru");
        assert_eq!(
            url,
            "https://yandex.ru/maps/?mode=routes&rtext=~55.7539,37.6208&rtt=masstransit"
        );
    }

    #[test]
    fn test_link_address_encoded() {
        let url = build_route_link("Тверская 1", "yandex.ru");
        assert!(url.starts_with("https://yandex.ru/maps/?mode=routes&rtext=~"));
        assert!(url.ends_with("&rtt=masstransit"));
        // Space became '+', comma-free address fully escaped
        assert!(url.contains('+'));
        assert!(!url.contains("Тверская"));
    }

    #[test]
    fn test_link_address_comma_encoded() {
        let url = build_route_link("Moscow, Red Square", "yandex.com");
        assert!(url.contains("Moscow%2C+Red+Square"));
    }

    #[test]
    fn test_link_deterministic() {
        let a = build_route_link("Moscow, Red Square", "yandex.ru");
        let b = build_route_link("Moscow, Red Square", "yandex.ru");
        assert_eq!(a, b);
    }
}
