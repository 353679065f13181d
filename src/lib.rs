//! addr2yandex — turn a list of addresses into Yandex Maps route links.
//!
//! The binary reads one address per line, resolves each to coordinates
//! through a chain of geocoding backends (with a local JSON cache), and
//! writes `label,link` rows as CSV or as `label/link` pairs.

pub mod geocode;
pub mod input;
pub mod link;
pub mod output;
pub mod run;
