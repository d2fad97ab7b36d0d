use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::debug;

use super::circle::GeoPoint;
use super::color::Argb;
use crate::error::{MarkerError, Result};

/// Label used when a marker is added with a blank label
pub const DEFAULT_LABEL: &str = "Marker";

/// Significant digits kept when a position comes from a binary float
const FLOAT_DIGITS: u32 = 15;

/// Geographic position in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub lat: Decimal,
    pub lng: Decimal,
}

impl Position {
    pub fn new(lat: Decimal, lng: Decimal) -> Self {
        Self { lat, lng }
    }

    /// Build from float degrees (e.g. an unprojected screen point). Only the
    /// first 15 significant digits of a float are meaningful, so the rest is
    /// rounded away. Returns `None` for NaN or infinite input.
    pub fn from_degrees(lat: f64, lng: f64) -> Option<Self> {
        let lat = Decimal::from_f64(lat)?.round_sf(FLOAT_DIGITS)?;
        let lng = Decimal::from_f64(lng)?.round_sf(FLOAT_DIGITS)?;
        Some(Self { lat, lng })
    }

    pub fn lat_f64(&self) -> f64 {
        self.lat.to_f64().unwrap_or(0.0)
    }

    pub fn lng_f64(&self) -> f64 {
        self.lng.to_f64().unwrap_or(0.0)
    }

    pub fn to_point(&self) -> GeoPoint {
        GeoPoint::new(self.lat_f64(), self.lng_f64())
    }
}

/// A labeled, colored point on the map
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub position: Position,
    pub label: String,
    pub color: Argb,
}

impl Marker {
    pub fn new(position: Position, label: impl Into<String>, color: Argb) -> Self {
        Self {
            position,
            label: label.into(),
            color,
        }
    }
}

/// Ordered marker collection. Labels identify markers and are kept unique by
/// suffixing (` #2`, ` #3`, ...) on insert and rename.
///
/// Every mutation bumps [`MarkerStore::revision`]; views that mirror the label
/// list re-query when the revision they rendered is stale.
#[derive(Clone, Debug, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    revision: u64,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take records as-is, in order. Duplicate labels are kept.
    pub fn from_records(markers: Vec<Marker>) -> Self {
        Self {
            markers,
            revision: 0,
        }
    }

    /// Take records in order, routing each through [`MarkerStore::add`] so
    /// duplicate labels pick up suffixes.
    pub fn from_records_deduplicated(records: Vec<Marker>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.add(record.position, &record.label, record.color);
        }
        store.revision = 0;
        store
    }

    /// Insert a marker and return the label actually assigned.
    pub fn add(&mut self, position: Position, proposed_label: &str, color: Argb) -> String {
        let base = match proposed_label.trim() {
            "" => DEFAULT_LABEL,
            trimmed => trimmed,
        };
        let label = self.unique_label(base, None);

        debug!(label = %label, lat = %position.lat, lng = %position.lng, "marker added");
        self.markers.push(Marker::new(position, label.clone(), color));
        self.revision += 1;
        label
    }

    /// Exact-match lookup
    pub fn find_by_label(&self, label: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.label == label)
    }

    /// Marker at a position in insertion order
    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    /// Relabel and recolor the first marker labeled `label`. See
    /// [`MarkerStore::rename_at`].
    pub fn rename(&mut self, label: &str, new_label: &str, color: Argb) -> Result<String> {
        let idx = self
            .index_of(label)
            .ok_or_else(|| MarkerError::NotFound(label.to_string()))?;
        self.rename_at(idx, new_label, color)
    }

    /// Relabel and recolor the marker at `index`. The marker itself is exempt
    /// from the collision check, so submitting its own label again leaves it
    /// unchanged.
    pub fn rename_at(&mut self, index: usize, new_label: &str, color: Argb) -> Result<String> {
        if index >= self.markers.len() {
            return Err(MarkerError::NotFound(format!("#{index}")));
        }

        let base = new_label.trim();
        if base.is_empty() {
            return Err(MarkerError::EmptyLabel);
        }

        let assigned = self.unique_label(base, Some(index));
        let marker = &mut self.markers[index];
        if marker.label != assigned || marker.color != color {
            debug!(from = %marker.label, to = %assigned, color = %color, "marker edited");
        }
        marker.label = assigned.clone();
        marker.color = color;
        self.revision += 1;
        Ok(assigned)
    }

    /// Remove the first marker labeled `label`. Removing an absent label is a
    /// no-op.
    pub fn remove(&mut self, label: &str) -> Option<Marker> {
        let idx = self.index_of(label)?;
        self.remove_at(idx)
    }

    /// Remove the marker at `index`. Out-of-range indices are a no-op.
    pub fn remove_at(&mut self, index: usize) -> Option<Marker> {
        if index >= self.markers.len() {
            return None;
        }
        let removed = self.markers.remove(index);
        debug!(label = %removed.label, "marker removed");
        self.revision += 1;
        Some(removed)
    }

    /// Marker indices ordered by label, ordinal. Equal labels keep insertion
    /// order.
    pub fn indices_by_label(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.markers.len()).collect();
        indices.sort_by(|&a, &b| self.markers[a].label.cmp(&self.markers[b].label));
        indices
    }

    /// All labels in ordinal (byte-wise) order
    pub fn all_labels_sorted(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.markers.iter().map(|m| m.label.clone()).collect();
        labels.sort_unstable();
        labels
    }

    /// Markers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn index_of(&self, label: &str) -> Option<usize> {
        self.markers.iter().position(|m| m.label == label)
    }

    fn is_taken(&self, candidate: &str, exempt: Option<usize>) -> bool {
        self.markers
            .iter()
            .enumerate()
            .any(|(idx, m)| Some(idx) != exempt && m.label == candidate)
    }

    fn unique_label(&self, base: &str, exempt: Option<usize>) -> String {
        if !self.is_taken(base, exempt) {
            return base.to_string();
        }
        let mut suffix: u64 = 2;
        loop {
            let candidate = format!("{base} #{suffix}");
            if !self.is_taken(&candidate, exempt) {
                return candidate;
            }
            suffix += 1;
        }
    }
}
