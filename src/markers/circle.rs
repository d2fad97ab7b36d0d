use std::f64::consts::PI;

/// Vertices per generated circle
pub const CIRCLE_POINTS: usize = 72;

/// Radius step between highlight rings, in degrees
pub const RING_RADIUS_STEP: f64 = 0.002;

/// Number of concentric highlight rings
pub const RING_COUNT: usize = 5;

/// A plain floating-point coordinate for drawing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Approximate a circle around `center` with `CIRCLE_POINTS` vertices.
///
/// `radius` is in degrees and applied on a flat lat/lng plane: latitude is
/// offset by `radius * sin(angle)` and longitude by `radius * cos(angle)`.
/// There is no geodesic correction, so rings stretch east-west away from the
/// equator, and points are not clamped near the poles or antimeridian.
pub fn circle_points(center: GeoPoint, radius: f64) -> Vec<GeoPoint> {
    let slice = 2.0 * PI / CIRCLE_POINTS as f64;

    (0..CIRCLE_POINTS)
        .map(|i| {
            let angle = slice * i as f64;
            GeoPoint {
                lat: center.lat + radius * angle.sin(),
                lng: center.lng + radius * angle.cos(),
            }
        })
        .collect()
}

/// Concentric rings shown briefly around a selected marker, innermost first.
pub fn highlight_rings(center: GeoPoint) -> Vec<Vec<GeoPoint>> {
    (1..=RING_COUNT)
        .map(|i| circle_points(center, RING_RADIUS_STEP * i as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_point_count_and_start() {
        let r = 0.5;
        let points = circle_points(GeoPoint::new(0.0, 0.0), r);
        assert_eq!(points.len(), 72);
        assert_eq!(points[0], GeoPoint::new(0.0, r));
    }

    #[test]
    fn test_points_follow_sin_cos() {
        let r = 2.0;
        let points = circle_points(GeoPoint::new(0.0, 0.0), r);
        for (i, p) in points.iter().enumerate() {
            let angle = 2.0 * PI / 72.0 * i as f64;
            assert!((p.lat - r * angle.sin()).abs() < EPS);
            assert!((p.lng - r * angle.cos()).abs() < EPS);
            assert!(((p.lat * p.lat + p.lng * p.lng).sqrt() - r).abs() < EPS);
        }
        // Quarter turn lands on the latitude axis
        assert!((points[18].lat - r).abs() < EPS);
        assert!(points[18].lng.abs() < EPS);
        // Half turn mirrors point 0
        assert!((points[36].lng + r).abs() < EPS);
    }

    #[test]
    fn test_offset_by_center() {
        let center = GeoPoint::new(35.1264, 33.4299);
        let points = circle_points(center, 0.01);
        assert!((points[0].lat - center.lat).abs() < EPS);
        assert!((points[0].lng - (center.lng + 0.01)).abs() < EPS);
    }

    #[test]
    fn test_no_clamping_near_pole() {
        let points = circle_points(GeoPoint::new(89.9, 179.95), 0.2);
        assert!(points.iter().any(|p| p.lat > 90.0));
        assert!(points.iter().any(|p| p.lng > 180.0));
    }

    #[test]
    fn test_highlight_rings_grow() {
        let rings = highlight_rings(GeoPoint::new(0.0, 0.0));
        assert_eq!(rings.len(), RING_COUNT);
        for (i, ring) in rings.iter().enumerate() {
            assert_eq!(ring.len(), CIRCLE_POINTS);
            assert!((ring[0].lng - RING_RADIUS_STEP * (i + 1) as f64).abs() < EPS);
        }
    }
}
