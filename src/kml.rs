//! Marker document reading and writing.
//!
//! The document is a small dialect of KML 2.2: a `Document` holding one
//! `Placemark` per marker. Each placemark carries `latidude`, `longidude`,
//! `name` and a `Style/IconStyle/color` hex ARGB value. The two coordinate
//! element names keep the spelling of existing marker files, so they must
//! not be corrected.
//!
//! Loading is per-entry best effort: a placemark with a missing or unreadable
//! field is dropped and the rest of the document still loads.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::markers::{Argb, Marker, MarkerStore, Position};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

const PLACEMARK: &[u8] = b"Placemark";
const LATITUDE: &[u8] = b"latidude";
const LONGITUDE: &[u8] = b"longidude";
const NAME: &[u8] = b"name";
const COLOR: &[u8] = b"color";

/// Significant digits written for coordinates
const COORDINATE_DIGITS: u32 = 17;

/// Result of reading a marker document
#[derive(Debug, Default)]
pub struct Decoded {
    /// Well-formed entries in document order
    pub markers: Vec<Marker>,
    /// Entries dropped for missing or unreadable fields
    pub skipped: usize,
}

impl Decoded {
    /// Build a store from the loaded entries. With `dedupe`, repeated labels
    /// are suffixed the way interactive inserts are; otherwise the document
    /// is taken as written.
    pub fn into_store(self, dedupe: bool) -> MarkerStore {
        if dedupe {
            MarkerStore::from_records_deduplicated(self.markers)
        } else {
            MarkerStore::from_records(self.markers)
        }
    }
}

/// Format a coordinate with up to 17 significant digits, `.` as the decimal
/// separator and no trailing zeros.
///
/// Rounding only fails for magnitudes with more than 17 integer digits, which
/// no latitude or longitude has; such a value is written in full.
pub fn format_coordinate(value: Decimal) -> String {
    value
        .round_sf(COORDINATE_DIGITS)
        .unwrap_or(value)
        .normalize()
        .to_string()
}

/// Parse a plain decimal coordinate (`35.1264`, ` -0.5 `). Never locale
/// dependent. Exponents (`1e5`) and digit separators are rejected.
pub fn parse_coordinate(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if !text.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+')) {
        return None;
    }
    Decimal::from_str(text).ok()
}

/// Render markers as a document, in iteration order.
pub fn encode<'a>(markers: impl IntoIterator<Item = &'a Marker>) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(&format!("<kml xmlns=\"{KML_NAMESPACE}\">\n"));

    let mut body = String::new();
    for marker in markers {
        body.push_str("    <Placemark>\n");
        body.push_str(&format!(
            "      <latidude>{}</latidude>\n",
            format_coordinate(marker.position.lat)
        ));
        body.push_str(&format!(
            "      <longidude>{}</longidude>\n",
            format_coordinate(marker.position.lng)
        ));
        body.push_str(&format!("      <name>{}</name>\n", escape(marker.label.as_str())));
        body.push_str("      <Style>\n        <IconStyle>\n");
        body.push_str(&format!("          <color>{}</color>\n", marker.color));
        body.push_str("        </IconStyle>\n      </Style>\n");
        body.push_str("    </Placemark>\n");
    }

    if body.is_empty() {
        out.push_str("  <Document />\n");
    } else {
        out.push_str("  <Document>\n");
        out.push_str(&body);
        out.push_str("  </Document>\n");
    }
    out.push_str("</kml>\n");
    out
}

/// Write the store to `path`, replacing any existing file.
///
/// The document goes to a sibling staging file first and is renamed into
/// place, so an interrupted save leaves the previous file intact.
pub fn save(store: &MarkerStore, path: &Path) -> Result<()> {
    let document = encode(store.iter());
    let staging = staging_path(path);

    let written = fs::File::create(&staging).and_then(|mut file| {
        file.write_all(document.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|_| fs::rename(&staging, path)) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }

    info!(path = %path.display(), markers = store.len(), "saved markers");
    Ok(())
}

/// Read the document at `path`. A missing file is an empty result.
pub fn load(path: &Path) -> Result<Decoded> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no marker file yet");
            return Ok(Decoded::default());
        }
        Err(e) => return Err(e.into()),
    };

    let decoded = decode(&text)?;
    info!(
        path = %path.display(),
        markers = decoded.markers.len(),
        skipped = decoded.skipped,
        "loaded markers"
    );
    Ok(decoded)
}

/// Parse a document held in memory.
///
/// Placemarks are matched at any depth in the KML 2.2 namespace. Coordinates
/// and name are taken from direct children, the color from the first `color`
/// element anywhere inside the placemark. Only a document that is not
/// well-formed XML fails as a whole.
pub fn decode(text: &str) -> Result<Decoded> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = NsReader::from_str(text);
    let mut decoder = Decoder::default();

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let in_kml = matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == KML_NAMESPACE.as_bytes());

        match event {
            Event::Start(start) => {
                decoder.depth += 1;
                decoder.open(in_kml, start.local_name().as_ref());
            }
            Event::Empty(start) => {
                decoder.depth += 1;
                decoder.open(in_kml, start.local_name().as_ref());
                decoder.close();
                decoder.depth -= 1;
            }
            Event::End(_) => {
                decoder.close();
                decoder.depth = decoder.depth.saturating_sub(1);
            }
            Event::Text(chunk) => {
                if let Some(capture) = decoder.capture.as_mut() {
                    let unescaped = chunk.unescape().map_err(quick_xml::Error::from)?;
                    capture.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(capture) = decoder.capture.as_mut() {
                    capture.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(decoder.decoded)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "markers.kml".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Latitude,
    Longitude,
    Name,
    Color,
}

struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

#[derive(Default)]
struct Draft {
    ordinal: usize,
    depth: usize,
    latitude: Option<String>,
    longitude: Option<String>,
    name: Option<String>,
    color: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum EntryError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("unreadable {field} {value:?}")]
    Invalid { field: &'static str, value: String },
}

impl Draft {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Latitude => &mut self.latitude,
            Field::Longitude => &mut self.longitude,
            Field::Name => &mut self.name,
            Field::Color => &mut self.color,
        }
    }

    fn build(self) -> std::result::Result<Marker, EntryError> {
        let latitude = self.latitude.ok_or(EntryError::Missing("latitude"))?;
        let longitude = self.longitude.ok_or(EntryError::Missing("longitude"))?;
        let name = self.name.ok_or(EntryError::Missing("name"))?;
        let color = self.color.ok_or(EntryError::Missing("color"))?;

        if name.is_empty() {
            return Err(EntryError::Missing("name"));
        }

        let lat = parse_coordinate(&latitude).ok_or(EntryError::Invalid {
            field: "latitude",
            value: latitude.clone(),
        })?;
        let lng = parse_coordinate(&longitude).ok_or(EntryError::Invalid {
            field: "longitude",
            value: longitude.clone(),
        })?;
        let color = Argb::from_hex(&color).ok_or(EntryError::Invalid {
            field: "color",
            value: color.clone(),
        })?;

        Ok(Marker::new(Position::new(lat, lng), name, color))
    }
}

#[derive(Default)]
struct Decoder {
    depth: usize,
    placemarks_seen: usize,
    placemark: Option<Draft>,
    capture: Option<Capture>,
    decoded: Decoded,
}

impl Decoder {
    fn open(&mut self, in_kml: bool, local_name: &[u8]) {
        if !in_kml || self.capture.is_some() {
            return;
        }

        let Some(draft) = self.placemark.as_mut() else {
            if local_name == PLACEMARK {
                self.placemarks_seen += 1;
                self.placemark = Some(Draft {
                    ordinal: self.placemarks_seen,
                    depth: self.depth,
                    ..Draft::default()
                });
            }
            return;
        };

        let direct_child = self.depth == draft.depth + 1;
        let field = match local_name {
            LATITUDE if direct_child => Field::Latitude,
            LONGITUDE if direct_child => Field::Longitude,
            NAME if direct_child => Field::Name,
            COLOR => Field::Color,
            _ => return,
        };

        // First occurrence wins
        if draft.slot(field).is_none() {
            self.capture = Some(Capture {
                field,
                depth: self.depth,
                text: String::new(),
            });
        }
    }

    fn close(&mut self) {
        if self.capture.as_ref().is_some_and(|c| c.depth == self.depth) {
            if let (Some(capture), Some(draft)) = (self.capture.take(), self.placemark.as_mut()) {
                *draft.slot(capture.field) = Some(capture.text);
            }
            return;
        }

        if self.placemark.as_ref().is_some_and(|d| d.depth == self.depth) {
            if let Some(draft) = self.placemark.take() {
                self.finish(draft);
            }
        }
    }

    fn finish(&mut self, draft: Draft) {
        let ordinal = draft.ordinal;
        match draft.build() {
            Ok(marker) => self.decoded.markers.push(marker),
            Err(e @ EntryError::Missing(_)) => {
                debug!(entry = ordinal, "skipping placemark: {e}");
                self.decoded.skipped += 1;
            }
            Err(e) => {
                warn!(entry = ordinal, "skipping placemark: {e}");
                self.decoded.skipped += 1;
            }
        }
    }
}
