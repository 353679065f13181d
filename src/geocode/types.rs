//! Core types for the geocoding subsystem.

use std::fmt;

/// A latitude/longitude pair. Always stored in `(lat, lon)` order,
/// whatever order the backend reported them in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// The closed set of geocoding backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Yandex,
    Nominatim,
    Photon,
}

impl Backend {
    /// The name used in cache keys and on the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Self::Yandex => "yandex",
            Self::Nominatim => "nominatim",
            Self::Photon => "photon",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transient backend failures. The resolver treats these the same as
/// "no result" and moves on to the next backend in the chain, but
/// keeping them distinct from `Ok(None)` means "the service answered
/// with zero hits" and "the call never completed" stay tellable apart.
#[derive(Debug)]
pub enum GeocodeError {
    Network(String),
    InvalidResponse(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
        }
    }
}

impl std::error::Error for GeocodeError {}
