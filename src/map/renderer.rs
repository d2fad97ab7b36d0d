use tui_markers::{Argb, GeoPoint, MarkerStore};

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_line, draw_polygon};
use crate::map::projection::Viewport;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - regional
    High,   // 10m - local
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 7.0 {
            Lod::Low
        } else if zoom < 10.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_coastlines: bool,
    pub show_borders: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_borders: true,
            show_labels: true,
        }
    }
}

/// A marker placed on the character grid of the map area
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerGlyph {
    pub col: u16,
    pub row: u16,
    pub label: String,
    pub color: Argb,
}

/// Rendered layers, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub highlight: BrailleCanvas,
    pub markers: Vec<MarkerGlyph>,
}

/// Basemap line data plus marker placement
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub coastlines_high: Vec<LineString>,
    pub borders_medium: Vec<LineString>,
    pub borders_high: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Coastlines for the given LOD, falling back to coarser data
    fn get_coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_high],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    fn get_borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    /// Render the basemap, highlight rings and marker positions for a map
    /// area of `width` x `height` characters.
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        store: &MarkerStore,
        rings: &[Vec<GeoPoint>],
    ) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);

        let mut coastlines = BrailleCanvas::new(width, height);
        if self.settings.show_coastlines {
            for line in self.get_coastlines(lod) {
                draw_linestring(&mut coastlines, line, viewport);
            }
        }

        let mut borders = BrailleCanvas::new(width, height);
        if self.settings.show_borders {
            for line in self.get_borders(lod) {
                draw_linestring(&mut borders, line, viewport);
            }
        }

        let mut highlight = BrailleCanvas::new(width, height);
        for ring in rings {
            let projected: Vec<(i32, i32)> = ring.iter().map(|p| viewport.project(p.lng, p.lat)).collect();
            draw_polygon(&mut highlight, &projected, viewport.width as i32, viewport.height as i32);
        }

        let markers = store
            .iter()
            .filter_map(|marker| {
                let (px, py) = viewport.project(marker.position.lng_f64(), marker.position.lat_f64());
                viewport.is_visible(px, py).then(|| MarkerGlyph {
                    col: (px / 2) as u16,
                    row: (py / 4) as u16,
                    label: marker.label.clone(),
                    color: marker.color,
                })
            })
            .collect();

        MapLayers {
            coastlines,
            borders,
            highlight,
            markers,
        }
    }

    /// Add coastline data at a specific LOD
    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Add border data at a specific LOD (Low shares the Medium set)
    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Medium | Lod::Low => self.borders_medium.push(line),
        }
    }

    /// Check if any coastline data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_coastlines(&mut self) {
        self.settings.show_coastlines = !self.settings.show_coastlines;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Long jumps are antimeridian wraps or far off-screen segments
            let dist = (px as i64 - prev_x as i64).abs() + (py as i64 - prev_y as i64).abs();
            if dist < viewport.width as i64 && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_markers::{highlight_rings, Position};

    fn store_with(lat: f64, lng: f64) -> MarkerStore {
        let mut store = MarkerStore::new();
        store.add(Position::from_degrees(lat, lng).unwrap(), "Here", Argb::RED);
        store
    }

    #[test]
    fn test_lod_thresholds() {
        assert_eq!(Lod::from_zoom(4.0), Lod::Low);
        assert_eq!(Lod::from_zoom(8.0), Lod::Medium);
        assert_eq!(Lod::from_zoom(10.0), Lod::High);
    }

    #[test]
    fn test_coastline_fallback() {
        let mut renderer = MapRenderer::new();
        renderer.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::Low);
        assert_eq!(renderer.get_coastlines(Lod::High).len(), 1);
        assert!(renderer.has_data());
    }

    #[test]
    fn test_marker_at_center_lands_mid_grid() {
        let renderer = MapRenderer::new();
        let viewport = Viewport::new(33.4299, 35.1264, 10.0, 80, 40);
        let layers = renderer.render(40, 10, &viewport, &store_with(35.1264, 33.4299), &[]);
        assert_eq!(layers.markers.len(), 1);
        assert_eq!((layers.markers[0].col, layers.markers[0].row), (20, 5));
        assert_eq!(layers.markers[0].color, Argb::RED);
    }

    #[test]
    fn test_offscreen_marker_is_culled() {
        let renderer = MapRenderer::new();
        let viewport = Viewport::new(33.4299, 35.1264, 10.0, 80, 40);
        let layers = renderer.render(40, 10, &viewport, &store_with(-33.9, 151.2), &[]);
        assert!(layers.markers.is_empty());
    }

    #[test]
    fn test_highlight_rings_are_drawn() {
        let renderer = MapRenderer::new();
        let viewport = Viewport::new(33.4299, 35.1264, 18.0, 80, 40);
        let rings = highlight_rings(GeoPoint::new(35.1264, 33.4299));
        let layers = renderer.render(40, 10, &viewport, &MarkerStore::new(), &rings);
        assert!(layers.highlight.cells().count() > 0);
    }
}
