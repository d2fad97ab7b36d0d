use crate::app::{App, CoordinateDialog, CoordinateField, EditDialog, Mode, LIST_PANEL_WIDTH};
use crate::braille::BrailleCanvas;
use crate::map::MapLayers;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Widget, Wrap},
    Frame,
};
use tui_markers::{kml, Argb};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map row and status bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map and list
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(LIST_PANEL_WIDTH)])
        .split(rows[0]);

    render_map(frame, app, columns[0]);
    render_label_list(frame, app, columns[1]);
    render_status_bar(frame, app, rows[1]);

    match &app.mode {
        Mode::Normal => {}
        Mode::EnterCoordinates(dialog) => render_coordinate_dialog(frame, dialog, area),
        Mode::EditMarker(dialog) => render_edit_dialog(frame, dialog, area),
    }

    if let Some(message) = &app.notification {
        render_notification(frame, message, area);
    }
}

fn argb_color(color: Argb) -> Color {
    Color::Rgb(color.red(), color.green(), color.blue())
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.is_dirty() { " Markers * " } else { " Markers " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &app.viewport,
        &app.store,
        app.highlight_rings(),
    );

    let map_widget = MapWidget {
        layers,
        cursor_pos: app.cursor_cell(),
        show_labels: app.map_renderer.settings.show_labels,
    };
    frame.render_widget(map_widget, inner);
}

/// Braille basemap with marker glyphs and labels on top
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
    show_labels: bool,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.cells() {
            if col < area.width && row < area.height {
                buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color);
            }
        }
    }

    fn put_str(text: &str, x: u16, y: u16, style: Style, area: Rect, buf: &mut Buffer) {
        let right = area.x + area.width;
        for (i, ch) in text.chars().enumerate() {
            let px = x + i as u16;
            if px >= right {
                break;
            }
            buf[(px, y)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::render_layer(&self.layers.coastlines, Color::Cyan, area, buf);
        Self::render_layer(&self.layers.borders, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.highlight, Color::LightBlue, area, buf);

        for glyph in &self.layers.markers {
            if glyph.row >= area.height || glyph.col >= area.width {
                continue;
            }
            let x = area.x + glyph.col;
            let y = area.y + glyph.row;
            let color = argb_color(glyph.color);
            buf[(x, y)].set_char('●').set_fg(color);

            if self.show_labels {
                let label: String = glyph.label.chars().take(24).collect();
                let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
                Self::put_str(&label, x + 2, y, style, area, buf);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            if cx < area.width && cy < area.height {
                let cell = &mut buf[(area.x + cx, area.y + cy)];
                if cell.symbol() != "●" {
                    cell.set_char('╋').set_fg(Color::Red);
                }
            }
        }
    }
}

fn render_label_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Labels ({}) ", app.labels().len()),
            Style::default().fg(Color::Cyan),
        ));

    let items: Vec<ListItem> = app
        .list_entries()
        .map(|marker| {
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(argb_color(marker.color))),
                Span::raw(marker.label.as_str()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    let mut state = ListState::default()
        .with_selected(app.selected)
        .with_offset(app.list_offset);
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", dim),
        Span::styled(format!("{} markers", app.store.len()), Style::default().fg(Color::Magenta)),
        Span::styled(" | ", dim),
    ];

    match app.hover_text() {
        Some(text) => spans.push(Span::styled(text, Style::default().fg(Color::White))),
        None => {
            if let Some(status) = &app.status {
                spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
            }
            spans.push(Span::styled(
                " | dbl-click/a:add  click:edit  n/p:list  w:save  q:save+quit",
                dim,
            ));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// `width` x `height` rectangle centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn dialog_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
}

fn field_line<'a>(name: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let value_style = if focused {
        Style::default().fg(Color::Black).bg(Color::White)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if focused { "▏" } else { "" };
    Line::from(vec![
        Span::styled(name, Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{value}{cursor}"), value_style),
    ])
}

fn render_coordinate_dialog(frame: &mut Frame, dialog: &CoordinateDialog, area: Rect) {
    let rect = centered(area, 44, 7);
    let lines = vec![
        field_line(
            "Latitude:  ",
            &dialog.latitude,
            dialog.focus == CoordinateField::Latitude,
        ),
        field_line(
            "Longitude: ",
            &dialog.longitude,
            dialog.focus == CoordinateField::Longitude,
        ),
        Line::raw(""),
        Line::styled("Tab: switch  Enter: add  Esc: cancel", Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(dialog_block(" Add marker ")), rect);
}

fn render_edit_dialog(frame: &mut Frame, dialog: &EditDialog, area: Rect) {
    let rect = centered(area, 52, 9);
    let color_name = dialog.color.palette_name().unwrap_or("Custom");
    let lat = kml::format_coordinate(dialog.position.lat);
    let lng = kml::format_coordinate(dialog.position.lng);

    let lines = vec![
        field_line("Label: ", &dialog.label, true),
        Line::from(vec![
            Span::styled("Color: ", Style::default().fg(Color::DarkGray)),
            Span::styled("■ ", Style::default().fg(argb_color(dialog.color))),
            Span::raw(format!("{color_name} ({})", dialog.color)),
        ]),
        Line::from(vec![
            Span::styled("Lat:   ", Style::default().fg(Color::DarkGray)),
            Span::raw(lat),
        ]),
        Line::from(vec![
            Span::styled("Lng:   ", Style::default().fg(Color::DarkGray)),
            Span::raw(lng),
        ]),
        Line::raw(""),
        Line::styled(
            "Enter: save  Tab: color  Del: delete  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        ),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(dialog_block(" Edit marker ")), rect);
}

fn render_notification(frame: &mut Frame, message: &str, area: Rect) {
    let rect = centered(area, 50, 6);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(Span::styled(" Notice ", Style::default().fg(Color::Red)));
    let lines = vec![
        Line::raw(message),
        Line::raw(""),
        Line::styled("Press any key", Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), rect);
}
