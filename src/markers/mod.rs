mod circle;
mod color;
mod store;

pub use circle::{circle_points, highlight_rings, GeoPoint, CIRCLE_POINTS, RING_COUNT, RING_RADIUS_STEP};
pub use color::{Argb, PALETTE};
pub use store::{Marker, MarkerStore, Position, DEFAULT_LABEL};
