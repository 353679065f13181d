//! Geocoding subsystem: backend clients, fallback resolution, and a
//! persistent coordinate cache.

pub mod cache;
pub mod client;
pub mod providers;
pub mod resolver;
pub mod types;

pub use client::GeoClient;
pub use resolver::GeocodeResolver;
pub use types::{Backend, Coords, GeocodeError};
