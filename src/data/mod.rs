use crate::map::{Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Load whatever Natural Earth GeoJSON files are present in `data_dir`.
/// Missing files are skipped; unreadable ones are logged and skipped.
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: &Path) {
    let coastline_files = [
        ("ne_110m_coastline.json", Lod::Low),
        ("ne_50m_coastline.json", Lod::Medium),
        ("ne_10m_coastline.json", Lod::High),
    ];
    for (filename, lod) in coastline_files {
        let path = data_dir.join(filename);
        if path.exists() {
            match load_lines(&path) {
                Ok(lines) => lines.into_iter().for_each(|line| renderer.add_coastline(line, lod)),
                Err(e) => warn!("Failed to load {}: {:#}", filename, e),
            }
        }
    }

    let border_files = [
        ("ne_50m_borders.json", Lod::Medium),
        ("ne_10m_borders.json", Lod::High),
    ];
    for (filename, lod) in border_files {
        let path = data_dir.join(filename);
        if path.exists() {
            match load_lines(&path) {
                Ok(lines) => lines.into_iter().for_each(|line| renderer.add_border(line, lod)),
                Err(e) => warn!("Failed to load {}: {:#}", filename, e),
            }
        }
    }

    debug!(dir = %data_dir.display(), has_data = renderer.has_data(), "basemap loaded");
}

/// Read a GeoJSON file and flatten it to (lon, lat) lines
fn load_lines(path: &Path) -> Result<Vec<Vec<(f64, f64)>>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content.parse().context("parsing GeoJSON")?;

    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Walk GeoJSON and hand every line-like ring to `add_line`
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    let to_line = |coords: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
    };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|coords| add_line(to_line(coords))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Rough eastern Mediterranean outline for when no data files are available
pub fn generate_fallback_outline(renderer: &mut MapRenderer) {
    // Cyprus
    renderer.add_coastline(
        vec![
            (32.27, 35.06), (32.40, 34.75), (32.95, 34.57), (33.04, 34.65),
            (33.64, 34.90), (34.08, 34.96), (33.95, 35.12), (34.59, 35.69),
            (33.90, 35.40), (33.32, 35.34), (32.92, 35.40), (32.85, 35.18),
            (32.42, 35.04), (32.27, 35.06),
        ],
        Lod::Low,
    );

    // Anatolian coast, Levant and the Nile delta
    renderer.add_coastline(
        vec![
            (27.2, 37.0), (28.3, 36.8), (30.6, 36.8), (32.0, 36.5),
            (33.5, 36.2), (34.6, 36.8), (36.2, 36.6), (35.9, 35.9),
            (35.8, 35.0), (35.5, 34.0), (35.0, 33.0), (34.5, 31.6),
            (33.0, 31.1), (32.3, 31.2), (31.0, 31.6), (30.0, 31.3),
            (29.0, 30.9), (25.0, 31.6), (20.0, 32.0),
        ],
        Lod::Low,
    );

    // Crete
    renderer.add_coastline(
        vec![
            (23.5, 35.3), (24.3, 35.35), (25.5, 35.3), (26.3, 35.2),
            (25.9, 35.0), (24.7, 34.9), (23.5, 35.3),
        ],
        Lod::Low,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_exterior_only() {
        let geojson: GeoJson = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [
                    [[0, 0], [1, 0], [1, 1], [0, 0]],
                    [[0.2, 0.2], [0.4, 0.2], [0.4, 0.4], [0.2, 0.2]]
                ]
            }
        }"#
        .parse()
        .unwrap();

        let mut lines = Vec::new();
        process_geojson_lines(&geojson, |line| lines.push(line));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][1], (1.0, 0.0));
    }

    #[test]
    fn test_feature_collection_lines() {
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[0, 0], [2, 2]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "MultiLineString", "coordinates": [[[1, 1], [3, 3]], [[4, 4], [5, 5]]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [9, 9]}}
            ]
        }"#
        .parse()
        .unwrap();

        let mut lines = Vec::new();
        process_geojson_lines(&geojson, |line| lines.push(line));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_missing_data_dir_loads_nothing() {
        let mut renderer = MapRenderer::new();
        load_basemap(&mut renderer, Path::new("/nonexistent/tui-markers-data"));
        assert!(!renderer.has_data());

        generate_fallback_outline(&mut renderer);
        assert!(renderer.has_data());
    }
}
