//! Run driver: one link row per address line, in input order.

use crate::geocode::{Backend, GeocodeResolver};
use crate::input;
use crate::link;

/// One output row: display label plus the generated deep link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    pub label: String,
    pub url: String,
}

pub struct RunConfig {
    pub domain: String,
    pub prefer: Backend,
    /// Context prefixed to the geocoding query only, never to the label.
    pub prepend: String,
}

/// Turn pre-filtered address lines into link rows. Targets that are
/// already coordinates skip geocoding; for the rest, a failed
/// resolution keeps the original address text in the link verbatim.
pub fn generate_rows(
    addresses: &[String],
    resolver: &GeocodeResolver,
    cfg: &RunConfig,
) -> Vec<LinkRow> {
    addresses
        .iter()
        .map(|raw| {
            let (label, mut target) = input::parse_label_and_target(raw);
            if !link::is_coords(&target) {
                let query = if cfg.prepend.is_empty() {
                    target.clone()
                } else {
                    format!("{}{}", cfg.prepend, target)
                };
                if let Some(coords) = resolver.resolve(&query, cfg.prefer) {
                    target = coords.to_string();
                }
            }
            LinkRow {
                label,
                url: link::build_route_link(&target, &cfg.domain),
            }
        })
        .collect()
}
