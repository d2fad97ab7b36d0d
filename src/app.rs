use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tui_markers::{highlight_rings, kml, Argb, GeoPoint, Marker, MarkerError, MarkerStore, Position};

use crate::config::Config;
use crate::map::{MapRenderer, Viewport};

/// Width of the label list on the right, including its border
pub const LIST_PANEL_WIDTH: u16 = 30;

/// Label for markers placed by double-click
pub const DOUBLE_CLICK_LABEL: &str = "New Location";
/// Label for markers placed from the coordinate dialog
pub const COORDINATE_LABEL: &str = "New Marker";

/// Zoom level the map is raised to when a marker is highlighted. The rings
/// are 0.002° apart, under one braille dot each below about level 14 on a
/// typical terminal width.
pub const HIGHLIGHT_MIN_ZOOM: f64 = 16.0;
/// Highlight lifetime in frames (~0.5s at 60fps)
const HIGHLIGHT_FRAMES: u16 = 30;

/// Two clicks on the same cell within this window are a double-click
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// Transient rings around a selected marker
#[derive(Clone, Debug)]
pub struct Highlight {
    /// Store index of the highlighted marker
    pub index: usize,
    pub rings: Vec<Vec<GeoPoint>>,
    pub frames_left: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinateField {
    Latitude,
    Longitude,
}

/// Coordinate entry form
#[derive(Clone, Debug)]
pub struct CoordinateDialog {
    pub latitude: String,
    pub longitude: String,
    pub focus: CoordinateField,
}

impl CoordinateDialog {
    pub fn new() -> Self {
        Self {
            latitude: String::new(),
            longitude: String::new(),
            focus: CoordinateField::Latitude,
        }
    }

    fn focused(&mut self) -> &mut String {
        match self.focus {
            CoordinateField::Latitude => &mut self.latitude,
            CoordinateField::Longitude => &mut self.longitude,
        }
    }

    pub fn push(&mut self, ch: char) {
        self.focused().push(ch);
    }

    pub fn backspace(&mut self) {
        self.focused().pop();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            CoordinateField::Latitude => CoordinateField::Longitude,
            CoordinateField::Longitude => CoordinateField::Latitude,
        };
    }

    /// Validate both fields. The error text is shown to the user as-is.
    pub fn parse(&self) -> std::result::Result<Position, String> {
        let lat = kml::parse_coordinate(&self.latitude);
        let lng = kml::parse_coordinate(&self.longitude);
        let (Some(lat), Some(lng)) = (lat, lng) else {
            return Err("Invalid coordinates. Enter decimal degrees such as 35.1264".to_string());
        };

        let position = Position::new(lat, lng);
        if !(-90.0..=90.0).contains(&position.lat_f64()) {
            return Err("Latitude must be between -90 and 90".to_string());
        }
        if !(-180.0..=180.0).contains(&position.lng_f64()) {
            return Err("Longitude must be between -180 and 180".to_string());
        }
        Ok(position)
    }
}

impl Default for CoordinateDialog {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker edit form: label text, palette color and read-only coordinates
#[derive(Clone, Debug)]
pub struct EditDialog {
    /// Store index of the marker being edited
    pub index: usize,
    pub label: String,
    pub color: Argb,
    pub position: Position,
}

impl EditDialog {
    pub fn for_marker(index: usize, marker: &Marker) -> Self {
        Self {
            index,
            label: marker.label.clone(),
            color: marker.color,
            position: marker.position,
        }
    }
}

/// What keyboard input currently drives
#[derive(Clone, Debug)]
pub enum Mode {
    Normal,
    EnterCoordinates(CoordinateDialog),
    EditMarker(EditDialog),
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub store: MarkerStore,
    pub markers_path: PathBuf,
    pub mode: Mode,
    /// Blocking message; any key dismisses it
    pub notification: Option<String>,
    /// One-line status shown in the status bar
    pub status: Option<String>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor and hover
    pub mouse_pos: Option<(u16, u16)>,
    pub highlight: Option<Highlight>,
    /// Index into `labels()` of the selected list entry
    pub selected: Option<usize>,
    /// First visible list row
    pub list_offset: usize,
    /// Frame counter, also seeds default colors
    pub frame: u64,
    labels: Vec<String>,
    /// Store index behind each list row
    entries: Vec<usize>,
    labels_revision: Option<u64>,
    saved_revision: u64,
    last_click: Option<(Instant, u16, u16)>,
    screen_width: u16,
    screen_height: u16,
    home: (f64, f64, f64),
}

impl App {
    pub fn new(width: u16, height: u16, config: &Config, store: MarkerStore) -> Self {
        let (pixel_width, pixel_height) = Self::map_pixels(width, height);
        let saved_revision = store.revision();

        let mut app = Self {
            viewport: Viewport::new(config.center_lon, config.center_lat, config.zoom, pixel_width, pixel_height),
            map_renderer: MapRenderer::new(),
            store,
            markers_path: config.markers_path.clone(),
            mode: Mode::Normal,
            notification: None,
            status: None,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            highlight: None,
            selected: None,
            list_offset: 0,
            frame: 0,
            labels: Vec::new(),
            entries: Vec::new(),
            labels_revision: None,
            saved_revision,
            last_click: None,
            screen_width: width,
            screen_height: height,
            home: (config.center_lon, config.center_lat, config.zoom),
        };
        app.sync_labels();
        app
    }

    /// Braille pixel size of the map area for a terminal size.
    /// Map border takes 2 columns and 2 rows, the status bar 1 row, the
    /// label list `LIST_PANEL_WIDTH` columns.
    fn map_pixels(width: u16, height: u16) -> (usize, usize) {
        let inner_width = width.saturating_sub(2 + LIST_PANEL_WIDTH) as usize;
        let inner_height = height.saturating_sub(3) as usize;
        (inner_width * 2, inner_height * 4)
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        let (pixel_width, pixel_height) = Self::map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
        self.screen_width = width;
        self.screen_height = height;
        self.clamp_list_offset();
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Back to the configured start view
    pub fn reset_view(&mut self) {
        let (lon, lat, zoom) = self.home;
        self.viewport.center_on(lon, lat);
        self.viewport.set_zoom(zoom);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Terminal cell to braille pixel, if the cell is inside the map area
    fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        if col == 0 || row == 0 {
            return None;
        }
        let px = (col - 1) as i32 * 2;
        let py = (row - 1) as i32 * 4;
        self.viewport.is_visible(px, py).then_some((px, py))
    }

    /// Label list row under a terminal cell
    pub fn list_index_at(&self, col: u16, row: u16) -> Option<usize> {
        let panel_x = self.screen_width.saturating_sub(LIST_PANEL_WIDTH);
        let last_row = self.screen_height.saturating_sub(3);
        if col <= panel_x || col >= self.screen_width.saturating_sub(1) || row == 0 || row > last_row {
            return None;
        }
        let idx = self.list_offset + (row - 1) as usize;
        (idx < self.labels.len()).then_some(idx)
    }

    /// Rows available to the label list
    fn list_rows(&self) -> usize {
        self.screen_height.saturating_sub(3).max(1) as usize
    }

    fn clamp_list_offset(&mut self) {
        let rows = self.list_rows();
        if let Some(selected) = self.selected {
            if selected < self.list_offset {
                self.list_offset = selected;
            } else if selected >= self.list_offset + rows {
                self.list_offset = selected + 1 - rows;
            }
        }
        self.list_offset = self.list_offset.min(self.labels.len().saturating_sub(1));
    }

    /// Store index of the marker drawn at a terminal cell, nearest first
    pub fn marker_at(&self, col: u16, row: u16) -> Option<usize> {
        let (px, py) = self.map_pixel(col, row)?;
        let (cell_x, cell_y) = (px / 2, py / 4);

        self.store
            .iter()
            .enumerate()
            .filter_map(|(index, marker)| {
                let (mx, my) = self.viewport.project(marker.position.lng_f64(), marker.position.lat_f64());
                if !self.viewport.is_visible(mx, my) {
                    return None;
                }
                let (dx, dy) = ((mx / 2 - cell_x).abs(), (my / 4 - cell_y).abs());
                (dx <= 1 && dy == 0).then_some((dx + dy, index))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, index)| index)
    }

    /// Marker under the mouse cursor
    pub fn hovered_marker(&self) -> Option<&Marker> {
        let (col, row) = self.mouse_pos?;
        self.store.get(self.marker_at(col, row)?)
    }

    /// Tooltip text for the hovered marker
    pub fn hover_text(&self) -> Option<String> {
        self.hovered_marker().map(|m| {
            format!(
                "Marker: {}  Lat: {}  Lng: {}",
                m.label,
                kml::format_coordinate(m.position.lat),
                kml::format_coordinate(m.position.lng)
            )
        })
    }

    /// Left button pressed: edit a marker, add one on double-click, or
    /// start a drag.
    pub fn mouse_down(&mut self, col: u16, row: u16, now: Instant) {
        if let Some(idx) = self.list_index_at(col, row) {
            self.select_index(idx);
            return;
        }

        if let Some(index) = self.marker_at(col, row) {
            self.last_click = None;
            self.open_edit_dialog(index);
            return;
        }

        if self.is_double_click(col, row, now) {
            self.last_click = None;
            self.add_marker_at(col, row);
            return;
        }

        self.last_click = Some((now, col, row));
        self.last_mouse = Some((col, row));
    }

    fn is_double_click(&self, col: u16, row: u16, now: Instant) -> bool {
        matches!(
            self.last_click,
            Some((at, c, r)) if c == col && r == row && now.duration_since(at) <= DOUBLE_CLICK_WINDOW
        )
    }

    /// Handle mouse drag: pan by the cursor movement
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            // Terminal cells are 2x4 braille pixels
            let dx = (last_x as i32 - x as i32) * 2;
            let dy = (last_y as i32 - y as i32) * 4;
            self.pan(dx, dy);
            self.last_click = None;
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Mouse position as a character cell inside the map area
    pub fn cursor_cell(&self) -> Option<(u16, u16)> {
        let (col, row) = self.mouse_pos?;
        let (px, py) = self.map_pixel(col, row)?;
        Some(((px / 2) as u16, (py / 4) as u16))
    }

    /// Add a marker at the coordinate under a terminal cell
    pub fn add_marker_at(&mut self, col: u16, row: u16) -> Option<String> {
        let (px, py) = self.map_pixel(col, row)?;
        let (lon, lat) = self.viewport.unproject(px, py);
        let position = Position::from_degrees(lat, lon)?;
        Some(self.add_marker(position, DOUBLE_CLICK_LABEL))
    }

    /// Add a marker with a default palette color
    pub fn add_marker(&mut self, position: Position, label: &str) -> String {
        let seed = self.frame ^ (self.store.len() as u64).rotate_left(32);
        let assigned = self.store.add(position, label, Argb::default_for(seed));
        self.status = Some(format!("Added {assigned}"));
        self.sync_labels();
        assigned
    }

    pub fn open_coordinate_dialog(&mut self) {
        self.mode = Mode::EnterCoordinates(CoordinateDialog::new());
    }

    /// Add the marker described by the coordinate dialog. Invalid input
    /// raises a notification and leaves the dialog open.
    pub fn submit_coordinates(&mut self) {
        let Mode::EnterCoordinates(dialog) = &self.mode else {
            return;
        };
        match dialog.parse() {
            Ok(position) => {
                self.mode = Mode::Normal;
                self.add_marker(position, COORDINATE_LABEL);
            }
            Err(message) => self.notification = Some(message),
        }
    }

    pub fn open_edit_dialog(&mut self, index: usize) {
        if let Some(marker) = self.store.get(index) {
            self.mode = Mode::EditMarker(EditDialog::for_marker(index, marker));
        }
    }

    /// Apply the edit dialog's label and color
    pub fn submit_edit(&mut self) {
        let Mode::EditMarker(dialog) = &self.mode else {
            return;
        };
        let index = dialog.index;
        match self.store.rename_at(index, &dialog.label, dialog.color) {
            Ok(assigned) => {
                self.mode = Mode::Normal;
                self.status = Some(format!("Saved {assigned}"));
                self.sync_labels();
                self.selected = self.entries.iter().position(|&i| i == index);
                self.clamp_list_offset();
            }
            Err(MarkerError::EmptyLabel) => {
                self.notification = Some("Label cannot be empty".to_string());
            }
            Err(e) => {
                self.mode = Mode::Normal;
                self.notification = Some(e.to_string());
            }
        }
    }

    /// Delete the marker being edited
    pub fn delete_edited(&mut self) {
        let Mode::EditMarker(dialog) = &self.mode else {
            return;
        };
        let index = dialog.index;
        self.mode = Mode::Normal;
        let Some(removed) = self.store.remove_at(index) else {
            return;
        };
        self.status = Some(format!("Deleted {}", removed.label));

        // Later markers shift down by one
        match self.highlight.as_mut() {
            Some(h) if h.index == index => self.highlight = None,
            Some(h) if h.index > index => h.index -= 1,
            _ => {}
        }
        self.sync_labels();
    }

    pub fn cancel_dialog(&mut self) {
        self.mode = Mode::Normal;
    }

    /// Current label list, sorted
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Markers in list order
    pub fn list_entries(&self) -> impl Iterator<Item = &Marker> + '_ {
        self.entries.iter().filter_map(|&i| self.store.get(i))
    }

    /// Re-query the sorted labels if the store changed since the last sync
    pub fn sync_labels(&mut self) {
        if self.labels_revision == Some(self.store.revision()) {
            return;
        }
        self.entries = self.store.indices_by_label();
        self.labels = self
            .entries
            .iter()
            .filter_map(|&i| self.store.get(i))
            .map(|m| m.label.clone())
            .collect();
        self.labels_revision = Some(self.store.revision());
        let last = self.labels.len().checked_sub(1);
        self.selected = self.selected.zip(last).map(|(idx, last)| idx.min(last));
        self.clamp_list_offset();
    }

    pub fn select_next(&mut self) {
        if self.labels.is_empty() {
            return;
        }
        let idx = self.selected.map_or(0, |i| (i + 1).min(self.labels.len() - 1));
        self.select_index(idx);
    }

    pub fn select_prev(&mut self) {
        if self.labels.is_empty() {
            return;
        }
        let idx = self.selected.map_or(0, |i| i.saturating_sub(1));
        self.select_index(idx);
    }

    /// Select a list entry and highlight its marker
    pub fn select_index(&mut self, idx: usize) {
        let Some(&index) = self.entries.get(idx) else {
            return;
        };
        self.selected = Some(idx);
        self.clamp_list_offset();
        self.highlight_marker(index);
    }

    /// Edit the selected list entry
    pub fn edit_selected(&mut self) {
        if let Some(&index) = self.selected.and_then(|i| self.entries.get(i)) {
            self.open_edit_dialog(index);
        }
    }

    /// Center on a marker, zoom in close enough to see the rings and show
    /// them for a short while.
    pub fn highlight_marker(&mut self, index: usize) {
        let Some(marker) = self.store.get(index) else {
            return;
        };
        let center = marker.position.to_point();

        if self.viewport.zoom < HIGHLIGHT_MIN_ZOOM {
            self.viewport.set_zoom(HIGHLIGHT_MIN_ZOOM);
        }
        self.viewport.center_on(center.lng, center.lat);
        self.highlight = Some(Highlight {
            index,
            rings: highlight_rings(center),
            frames_left: HIGHLIGHT_FRAMES,
        });
    }

    /// Rings to draw this frame
    pub fn highlight_rings(&self) -> &[Vec<GeoPoint>] {
        match &self.highlight {
            Some(highlight) => &highlight.rings,
            None => &[],
        }
    }

    /// Advance one frame
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);

        if let Some(highlight) = self.highlight.as_mut() {
            highlight.frames_left = highlight.frames_left.saturating_sub(1);
            if highlight.frames_left == 0 {
                self.highlight = None;
            }
        }

        self.sync_labels();
    }

    /// True when the store changed since the last save or load
    pub fn is_dirty(&self) -> bool {
        self.store.revision() != self.saved_revision
    }

    /// Write the store to the marker document
    pub fn save(&mut self) -> Result<()> {
        kml::save(&self.store, &self.markers_path)
            .with_context(|| format!("saving markers to {}", self.markers_path.display()))?;
        self.saved_revision = self.store.revision();
        self.status = Some(format!("Saved {} markers", self.store.len()));
        Ok(())
    }

    /// Save, then quit. A failed save is reported and the session stays open.
    pub fn save_and_quit(&mut self) {
        match self.save() {
            Ok(()) => {
                info!("saved on exit");
                self.quit();
            }
            Err(e) => {
                warn!("save failed: {e:#}");
                self.notification = Some(format!("{e:#}"));
            }
        }
    }

    /// Save without quitting, reporting failures
    pub fn save_now(&mut self) {
        if let Err(e) = self.save() {
            warn!("save failed: {e:#}");
            self.notification = Some(format!("{e:#}"));
        }
    }

    /// Current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.0}", self.viewport.zoom)
    }

    /// Current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.4}°{}, {:.4}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn app() -> App {
        App::new(100, 40, &Config::default(), MarkerStore::new())
    }

    fn pos(lat: &str, lng: &str) -> Position {
        Position::new(Decimal::from_str(lat).unwrap(), Decimal::from_str(lng).unwrap())
    }

    /// Terminal cell where a coordinate is drawn
    fn cell_of(app: &App, lat: f64, lng: f64) -> (u16, u16) {
        let (px, py) = app.viewport.project(lng, lat);
        ((px / 2) as u16 + 1, (py / 4) as u16 + 1)
    }

    fn enter_coordinates(app: &mut App, lat: &str, lng: &str) {
        app.open_coordinate_dialog();
        if let Mode::EnterCoordinates(dialog) = &mut app.mode {
            lat.chars().for_each(|c| dialog.push(c));
            dialog.toggle_focus();
            lng.chars().for_each(|c| dialog.push(c));
        }
        app.submit_coordinates();
    }

    #[test]
    fn test_coordinate_entry_adds_marker() {
        let mut app = app();
        enter_coordinates(&mut app, "35.17", "33.36");
        assert!(matches!(app.mode, Mode::Normal));
        let marker = app.store.find_by_label(COORDINATE_LABEL).unwrap();
        assert_eq!(marker.position, pos("35.17", "33.36"));
        assert!(marker.color.palette_name().is_some());
        assert_eq!(app.labels(), [COORDINATE_LABEL.to_string()]);
    }

    #[test]
    fn test_invalid_coordinates_keep_dialog_open() {
        let mut app = app();
        enter_coordinates(&mut app, "35,17", "33.36");
        assert!(app.notification.is_some());
        assert!(matches!(app.mode, Mode::EnterCoordinates(_)));
        assert!(app.store.is_empty());

        app.notification = None;
        enter_coordinates(&mut app, "95", "33.36");
        assert!(app.notification.as_deref().unwrap().contains("Latitude"));
    }

    #[test]
    fn test_dialog_editing() {
        let mut dialog = CoordinateDialog::new();
        dialog.push('1');
        dialog.push('2');
        dialog.backspace();
        dialog.toggle_focus();
        dialog.push('3');
        assert_eq!(dialog.latitude, "1");
        assert_eq!(dialog.longitude, "3");
        assert_eq!(dialog.parse().unwrap(), pos("1", "3"));
    }

    #[test]
    fn test_double_click_adds_marker() {
        let mut app = app();
        let t0 = Instant::now();
        app.mouse_down(20, 10, t0);
        app.end_drag();
        assert!(app.store.is_empty());
        app.mouse_down(20, 10, t0 + Duration::from_millis(150));
        assert_eq!(app.store.len(), 1);
        assert!(app.store.find_by_label(DOUBLE_CLICK_LABEL).is_some());
    }

    #[test]
    fn test_slow_clicks_do_not_add() {
        let mut app = app();
        let t0 = Instant::now();
        app.mouse_down(20, 10, t0);
        app.mouse_down(20, 10, t0 + Duration::from_millis(900));
        app.mouse_down(21, 10, t0 + Duration::from_millis(1000));
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_click_on_marker_opens_editor_and_rename() {
        let mut app = app();
        app.add_marker(pos("35.1264", "33.4299"), "Nicosia");
        let (col, row) = cell_of(&app, 35.1264, 33.4299);
        app.mouse_down(col, row, Instant::now());

        let Mode::EditMarker(dialog) = &mut app.mode else {
            panic!("edit dialog should be open");
        };
        assert_eq!(dialog.index, 0);
        assert_eq!(dialog.label, "Nicosia");
        dialog.label = "Lefkosia".to_string();
        dialog.color = Argb::PURPLE;
        app.submit_edit();

        assert!(matches!(app.mode, Mode::Normal));
        let marker = app.store.find_by_label("Lefkosia").unwrap();
        assert_eq!(marker.color, Argb::PURPLE);
        assert_eq!(app.labels(), ["Lefkosia".to_string()]);
        assert!(app.is_dirty());
    }

    #[test]
    fn test_empty_label_keeps_editor_open() {
        let mut app = app();
        app.add_marker(pos("1", "1"), "Camp");
        app.open_edit_dialog(0);
        if let Mode::EditMarker(dialog) = &mut app.mode {
            dialog.label.clear();
        }
        app.submit_edit();
        assert!(matches!(app.mode, Mode::EditMarker(_)));
        assert!(app.notification.is_some());
        assert!(app.store.find_by_label("Camp").is_some());
    }

    #[test]
    fn test_delete_from_editor() {
        let mut app = app();
        app.add_marker(pos("1", "1"), "Camp");
        app.add_marker(pos("2", "2"), "Well");
        app.open_edit_dialog(0);
        app.delete_edited();
        assert!(app.store.find_by_label("Camp").is_none());
        assert_eq!(app.labels(), ["Well".to_string()]);
    }

    #[test]
    fn test_hover_tooltip() {
        let mut app = app();
        app.add_marker(pos("35.1264", "33.4299"), "Nicosia");
        let (col, row) = cell_of(&app, 35.1264, 33.4299);
        app.set_mouse_pos(col, row);
        assert_eq!(
            app.hover_text().unwrap(),
            "Marker: Nicosia  Lat: 35.1264  Lng: 33.4299"
        );
        app.set_mouse_pos(1, 1);
        assert!(app.hover_text().is_none());
    }

    #[test]
    fn test_selection_highlights_and_expires() {
        let mut app = app();
        app.add_marker(pos("34.92", "33.63"), "Larnaca");
        app.add_marker(pos("34.70", "33.04"), "Limassol");
        app.select_next();
        assert_eq!(app.selected, Some(0));

        let highlight = app.highlight.as_ref().unwrap();
        assert_eq!(highlight.index, 0);
        assert_eq!(highlight.rings.len(), 5);
        assert!(app.viewport.zoom >= HIGHLIGHT_MIN_ZOOM);
        assert!((app.viewport.center_lat - 34.92).abs() < 1e-9);

        app.select_next();
        assert_eq!(app.highlight.as_ref().unwrap().index, 1);
        for _ in 0..HIGHLIGHT_FRAMES {
            app.tick();
        }
        assert!(app.highlight.is_none());
        assert!(app.highlight_rings().is_empty());
    }

    #[test]
    fn test_list_click_selects() {
        let mut app = app();
        app.add_marker(pos("1", "1"), "Alpha");
        app.add_marker(pos("2", "2"), "Beta");
        let col = 100 - LIST_PANEL_WIDTH + 2;
        assert_eq!(app.list_index_at(col, 2), Some(1));
        assert_eq!(app.list_index_at(col, 3), None);
        app.mouse_down(col, 2, Instant::now());
        assert_eq!(app.selected, Some(1));
        assert_eq!(app.highlight.as_ref().unwrap().index, 1);
    }

    fn duplicate_store() -> MarkerStore {
        MarkerStore::from_records(vec![
            Marker::new(pos("35.0", "33.0"), "Dup", Argb::BLUE),
            Marker::new(pos("35.3", "33.8"), "Dup", Argb::RED),
        ])
    }

    #[test]
    fn test_click_on_duplicate_edits_that_marker() {
        let mut app = App::new(100, 40, &Config::default(), duplicate_store());
        let (col, row) = cell_of(&app, 35.3, 33.8);
        app.mouse_down(col, row, Instant::now());

        let Mode::EditMarker(dialog) = &app.mode else {
            panic!("edit dialog should be open");
        };
        assert_eq!(dialog.index, 1);
        assert_eq!(dialog.color, Argb::RED);
        assert_eq!(dialog.position, pos("35.3", "33.8"));

        app.delete_edited();
        let remaining: Vec<&Marker> = app.store.iter().collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].position, pos("35.0", "33.0"));
        assert_eq!(remaining[0].color, Argb::BLUE);
    }

    #[test]
    fn test_rename_duplicate_from_editor() {
        let mut app = App::new(100, 40, &Config::default(), duplicate_store());
        app.open_edit_dialog(1);
        if let Mode::EditMarker(dialog) = &mut app.mode {
            dialog.color = Argb::PINK;
        }
        app.submit_edit();

        assert_eq!(app.store.get(1).unwrap().label, "Dup #2");
        assert_eq!(app.store.get(1).unwrap().color, Argb::PINK);
        assert_eq!(app.store.get(0).unwrap().color, Argb::BLUE);
        assert_eq!(app.selected, Some(1));
    }

    #[test]
    fn test_list_selection_reaches_second_duplicate() {
        let mut app = App::new(100, 40, &Config::default(), duplicate_store());
        assert_eq!(app.labels(), ["Dup".to_string(), "Dup".to_string()]);
        app.select_index(1);
        assert_eq!(app.highlight.as_ref().unwrap().index, 1);
        assert!((app.viewport.center_lat - 35.3).abs() < 1e-9);
    }

    #[test]
    fn test_highlight_rings_visible_at_highlight_zoom() {
        let mut app = app();
        app.add_marker(pos("35.1264", "33.4299"), "Nicosia");
        app.select_index(0);
        assert_eq!(app.viewport.zoom, HIGHLIGHT_MIN_ZOOM);

        let layers = app.map_renderer.render(
            app.viewport.width / 2,
            app.viewport.height / 4,
            &app.viewport,
            &app.store,
            app.highlight_rings(),
        );
        let mut columns: Vec<u16> = layers.highlight.cells().map(|(col, _, _)| col).collect();
        columns.sort_unstable();
        columns.dedup();
        // Outer ring is 0.02° across
        assert!(columns.len() >= 8, "rings span {} columns", columns.len());
    }

    #[test]
    fn test_save_round_trip_clears_dirty() {
        let path = std::env::temp_dir().join(format!("tui-markers-app-{}.kml", std::process::id()));
        let config = Config {
            markers_path: path.clone(),
            ..Config::default()
        };
        let mut app = App::new(100, 40, &config, MarkerStore::new());
        app.add_marker(pos("35.1264", "33.4299"), "Nicosia");
        assert!(app.is_dirty());

        app.save_and_quit();
        assert!(app.should_quit);
        assert!(!app.is_dirty());

        let loaded = kml::load(&path).unwrap().into_store(false);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.all_labels_sorted(), vec!["Nicosia"]);
    }

    #[test]
    fn test_failed_save_is_reported() {
        let config = Config {
            markers_path: std::env::temp_dir().join("tui-markers-missing-dir").join("m.kml"),
            ..Config::default()
        };
        let mut app = App::new(100, 40, &config, MarkerStore::new());
        app.save_and_quit();
        assert!(!app.should_quit);
        assert!(app.notification.is_some());
    }

    #[test]
    fn test_reset_view() {
        let mut app = app();
        app.pan(50, 50);
        app.zoom_in();
        app.reset_view();
        assert_eq!(app.viewport.center_lat, crate::config::DEFAULT_CENTER_LAT);
        assert_eq!(app.viewport.zoom, crate::config::DEFAULT_ZOOM);
    }
}
