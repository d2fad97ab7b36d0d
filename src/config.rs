//! Command-line configuration.
//!
//! Parses flags into a validated `Config` so the rest of the program never
//! re-checks ranges.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::map::{MAX_ZOOM, MIN_ZOOM};

/// Initial view: Nicosia, Cyprus
pub const DEFAULT_CENTER_LAT: f64 = 35.1264;
pub const DEFAULT_CENTER_LON: f64 = 33.4299;
pub const DEFAULT_ZOOM: f64 = 10.0;

#[derive(Debug, Parser)]
#[command(name = "tui-markers", version, about = "Terminal map with labeled, colored markers saved to KML")]
pub struct Cli {
    /// Marker document read at start and written on save.
    #[arg(long, value_name = "PATH", default_value = "markers.kml")]
    pub markers: PathBuf,
    /// Directory holding Natural Earth GeoJSON files for the basemap.
    #[arg(long = "data-dir", value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,
    /// Initial center latitude in degrees.
    #[arg(long, value_name = "DEG", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Initial center longitude in degrees.
    #[arg(long, value_name = "DEG", allow_hyphen_values = true)]
    pub lon: Option<f64>,
    /// Initial zoom level (4-20).
    #[arg(long, value_name = "LEVEL")]
    pub zoom: Option<f64>,
    /// Suffix duplicate labels found in the marker document while loading.
    #[arg(long = "dedupe-on-load", action = clap::ArgAction::SetTrue)]
    pub dedupe_on_load: bool,
    /// Trace output file (filter with RUST_LOG).
    #[arg(long = "log-file", value_name = "PATH", default_value = "tui-markers.log")]
    pub log_file: PathBuf,
}

/// Settings shared by startup and the interactive session
#[derive(Clone, Debug)]
pub struct Config {
    pub markers_path: PathBuf,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub dedupe_on_load: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            markers_path: PathBuf::from("markers.kml"),
            data_dir: PathBuf::from("data"),
            log_file: PathBuf::from("tui-markers.log"),
            center_lat: DEFAULT_CENTER_LAT,
            center_lon: DEFAULT_CENTER_LON,
            zoom: DEFAULT_ZOOM,
            dedupe_on_load: false,
        }
    }
}

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Cli) -> Result<Self> {
        let center_lat = args.lat.unwrap_or(DEFAULT_CENTER_LAT);
        if !(-90.0..=90.0).contains(&center_lat) {
            bail!("--lat must be between -90 and 90");
        }

        let center_lon = args.lon.unwrap_or(DEFAULT_CENTER_LON);
        if !(-180.0..=180.0).contains(&center_lon) {
            bail!("--lon must be between -180 and 180");
        }

        let zoom = args.zoom.unwrap_or(DEFAULT_ZOOM);
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            bail!("--zoom must be between {MIN_ZOOM} and {MAX_ZOOM}");
        }

        if args.markers.as_os_str().is_empty() {
            bail!("--markers must not be empty");
        }

        Ok(Self {
            markers_path: args.markers,
            data_dir: args.data_dir,
            log_file: args.log_file,
            center_lat,
            center_lon,
            zoom,
            dedupe_on_load: args.dedupe_on_load,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        let cli = Cli::try_parse_from(std::iter::once("tui-markers").chain(args.iter().copied()))?;
        Config::try_from(cli)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.markers_path, PathBuf::from("markers.kml"));
        assert_eq!(config.center_lat, DEFAULT_CENTER_LAT);
        assert_eq!(config.center_lon, DEFAULT_CENTER_LON);
        assert_eq!(config.zoom, DEFAULT_ZOOM);
        assert!(!config.dedupe_on_load);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--markers", "trip.kml", "--lat", "-33.9", "--lon", "151.2", "--zoom", "12", "--dedupe-on-load",
        ])
        .unwrap();
        assert_eq!(config.markers_path, PathBuf::from("trip.kml"));
        assert_eq!(config.center_lat, -33.9);
        assert_eq!(config.center_lon, 151.2);
        assert_eq!(config.zoom, 12.0);
        assert!(config.dedupe_on_load);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(parse(&["--lat", "91"]).is_err());
        assert!(parse(&["--lon", "-181"]).is_err());
        assert!(parse(&["--zoom", "2"]).is_err());
        assert!(parse(&["--zoom", "abc"]).is_err());
    }
}
