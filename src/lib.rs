//! Marker annotations for the terminal map: the in-memory marker set, its
//! KML persistence, and the small amount of geometry used for highlights.

pub mod error;
pub mod kml;
pub mod markers;

pub use error::{MarkerError, Result};
pub use markers::{circle_points, highlight_rings, Argb, GeoPoint, Marker, MarkerStore, Position};
