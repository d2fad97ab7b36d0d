use std::f64::consts::PI;

/// Most zoomed-out level (whole world across the map width)
pub const MIN_ZOOM: f64 = 4.0;
/// Most zoomed-in level
pub const MAX_ZOOM: f64 = 20.0;

/// Levels per zoom step
const ZOOM_STEP: f64 = 1.0;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level; each level doubles the scale
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat: center_lat.clamp(-85.0, 85.0),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Pixels spanned by the full 360° of longitude
    fn scale(&self) -> f64 {
        self.width.max(1) as f64 * 2f64.powf(self.zoom - MIN_ZOOM)
    }

    /// Web Mercator x/y of a coordinate, both in [0, 1]
    fn mercator(lon: f64, lat: f64) -> (f64, f64) {
        let x = (lon + 180.0) / 360.0;
        let lat_rad = lat.clamp(-85.0, 85.0) * PI / 180.0;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
        (x, y)
    }

    /// Coordinate (lon, lat) of a Web Mercator x/y
    fn inverse_mercator(x: f64, y: f64) -> (f64, f64) {
        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;
        (lon, lat)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let degrees_per_px = 360.0 / self.scale();
        self.center_lon += dx as f64 * degrees_per_px;
        self.center_lat -= dy as f64 * degrees_per_px * self.center_lat.to_radians().cos();

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// Move the center to a coordinate
    pub fn center_on(&mut self, lon: f64, lat: f64) {
        self.center_lon = lon;
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    /// Set the zoom level, clamped to the supported range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -ZOOM_STEP);
    }

    /// Change zoom by `delta` levels, keeping the coordinate under the pixel fixed
    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let (lon, lat) = self.unproject(px, py);
        let (anchor_x, anchor_y) = Self::mercator(lon, lat);

        self.set_zoom(self.zoom + delta);

        let scale = self.scale();
        let center_x = anchor_x - (px as f64 - self.width as f64 / 2.0) / scale;
        let center_y = anchor_y - (py as f64 - self.height as f64 / 2.0) / scale;
        let (center_lon, center_lat) = Self::inverse_mercator(center_x, center_y);
        self.center_on(center_lon, center_lat);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let (center_x, center_y) = Self::mercator(self.center_lon, self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        Self::inverse_mercator(x, y)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = Self::mercator(lon, lat);
        let (center_x, center_y) = Self::mercator(self.center_lon, self.center_lat);
        let scale = self.scale();

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;

        (px, py)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, MIN_ZOOM, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(33.4299, 35.1264, 10.0, 200, 100);
        let (px, py) = vp.project(33.5, 35.2);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 33.5).abs() < 0.05);
        assert!((lat - 35.2).abs() < 0.05);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, MIN_ZOOM, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, 10);
        assert!(vp.center_lat < 0.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut vp = Viewport::new(0.0, 0.0, 25.0, 100, 100);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom_in();
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.set_zoom(1.0);
        assert_eq!(vp.zoom, MIN_ZOOM);
        vp.zoom_out();
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut vp = Viewport::new(33.0, 35.0, 10.0, 200, 100);
        let (lon, lat) = vp.unproject(150, 30);
        vp.zoom_in_at(150, 30);
        let (after_lon, after_lat) = vp.unproject(150, 30);
        assert!((after_lon - lon).abs() < 0.01);
        assert!((after_lat - lat).abs() < 0.01);
    }
}
