mod app;
mod braille;
mod config;
mod data;
mod map;
mod ui;

use anyhow::{Context, Result};
use app::{App, Mode};
use clap::Parser;
use config::{Cli, Config};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tui_markers::{kml, MarkerStore};

fn main() -> Result<()> {
    let config = Config::try_from(Cli::parse())?;
    init_tracing(&config)?;

    // Load before the terminal switches to the alternate screen so errors
    // print normally
    let store = load_markers(&config)?;

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config, store);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Trace to a file; the terminal belongs to the map
fn init_tracing(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("opening log file {}", config.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_markers(config: &Config) -> Result<MarkerStore> {
    let decoded = kml::load(&config.markers_path)
        .with_context(|| format!("loading markers from {}", config.markers_path.display()))?;
    if decoded.skipped > 0 {
        warn!(skipped = decoded.skipped, "some marker entries were unreadable");
    }
    let store = decoded.into_store(config.dedupe_on_load);
    info!(count = store.len(), path = %config.markers_path.display(), "markers loaded");
    Ok(store)
}

/// Handle mouse events for selection, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor and hover
    app.set_mouse_pos(mouse.column, mouse.row);

    if app.notification.is_some() || !matches!(app.mode, Mode::Normal) {
        return;
    }

    match mouse.kind {
        // Scroll wheel zooms towards the mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row, Instant::now()),
        MouseEventKind::Down(MouseButton::Right) => app.last_mouse = Some((mouse.column, mouse.row)),
        MouseEventKind::Drag(MouseButton::Left | MouseButton::Right) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(_) => app.end_drag(),
        _ => {}
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.save_and_quit(),
        KeyCode::Char('w') => app.save_now(),
        KeyCode::Char('a') => app.open_coordinate_dialog(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Label list
        KeyCode::Char('n') | KeyCode::Tab | KeyCode::PageDown => app.select_next(),
        KeyCode::Char('p') | KeyCode::BackTab | KeyCode::PageUp => app.select_prev(),
        KeyCode::Enter => app.edit_selected(),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
        KeyCode::Char('c') | KeyCode::Char('C') => app.map_renderer.toggle_coastlines(),
        KeyCode::Char('L') => app.map_renderer.toggle_labels(),

        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

fn handle_coordinate_key(app: &mut App, key: KeyEvent) {
    let Mode::EnterCoordinates(dialog) = &mut app.mode else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.cancel_dialog(),
        KeyCode::Enter => app.submit_coordinates(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => dialog.toggle_focus(),
        KeyCode::Backspace => dialog.backspace(),
        KeyCode::Char(ch) if ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | ',') => dialog.push(ch),
        _ => {}
    }
}

fn handle_edit_key(app: &mut App, key: KeyEvent) {
    let Mode::EditMarker(dialog) = &mut app.mode else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.cancel_dialog(),
        KeyCode::Enter => app.submit_edit(),
        KeyCode::Delete => app.delete_edited(),
        KeyCode::Tab => dialog.color = dialog.color.next_in_palette(),
        KeyCode::BackTab => dialog.color = dialog.color.prev_in_palette(),
        KeyCode::Backspace => {
            dialog.label.pop();
        }
        KeyCode::Char(ch) => dialog.label.push(ch),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &Config, store: MarkerStore) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width, size.height, config, store);

    data::load_basemap(&mut app.map_renderer, &config.data_dir);
    if !app.map_renderer.has_data() {
        data::generate_fallback_outline(&mut app.map_renderer);
    }

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.notification.is_some() {
                        // Any key dismisses a notification
                        app.notification = None;
                    } else {
                        match app.mode {
                            Mode::Normal => handle_normal_key(&mut app, key),
                            Mode::EnterCoordinates(_) => handle_coordinate_key(&mut app, key),
                            Mode::EditMarker(_) => handle_edit_key(&mut app, key),
                        }
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
