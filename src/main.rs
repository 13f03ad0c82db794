//! agrigrid - Terminal Data Grid
//!
//! Loads rows from a JSON or CSV file or a URL and shows them in an
//! interactive grid with sorting, filtering, selection, grouping and
//! mouse-driven column resize and reorder.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use agrigrid::application::{App, AppMode, DataGrid};
use agrigrid::domain::Row;
use agrigrid::infrastructure::{fetch_rows, DataFormat, FileRepository, LayoutDocument};
use agrigrid::presentation::{render_ui, GridGeometry, InputHandler};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, LevelFilter};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use simplelog::{Config, WriteLogger};

#[derive(Parser, Debug)]
#[command(name = "agrigrid")]
#[command(about = "Interactive terminal data grid", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON array or CSV file with one record per row
    #[arg(required_unless_present = "url")]
    data: Option<PathBuf>,

    /// Fetch rows from a URL serving a JSON array of objects
    #[arg(long, conflicts_with = "data")]
    url: Option<String>,

    /// Layout document with columns, options and saved grid state
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Format of DATA, overriding the file extension
    #[arg(long, value_enum)]
    format: Option<DataFormat>,

    /// File receiving log output
    #[arg(long, default_value = "agrigrid.log")]
    log_file: PathBuf,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Entry point for the agrigrid terminal viewer.
///
/// Loads rows and layout before touching the terminal so that load errors
/// are printed normally, then runs the event loop until the user quits.
///
/// # Errors
///
/// Returns an error if logging, loading or terminal setup fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    WriteLogger::init(cli.log_level, Config::default(), File::create(&cli.log_file)?)?;

    let (rows, source) = load_rows(&cli)?;
    let layout = match &cli.layout {
        Some(path) => FileRepository::load_layout(path)?,
        None => LayoutDocument::inferred(&rows),
    };

    let mut grid = DataGrid::new(rows, layout.columns, layout.options)?
        .on_row_click(|row| info!("Row clicked: {}", serde_json::to_string(row).unwrap_or_default()))
        .on_selection_change(|rows| info!("Selection changed: {} rows", rows.len()));
    if let Some(state) = &layout.state {
        grid = grid.with_state(state);
    }
    let mut app = App::new(grid, source)
        .with_layout_path(cli.layout.as_ref().map(|p| p.display().to_string()));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn load_rows(cli: &Cli) -> Result<(Vec<Row>, String), Box<dyn std::error::Error>> {
    match (&cli.url, &cli.data) {
        (Some(url), _) => Ok((fetch_rows(url)?, url.clone())),
        (None, Some(path)) => Ok((FileRepository::load_rows(path, cli.format)?, path.display().to_string())),
        (None, None) => Err("no data source given".into()),
    }
}

/// Main application event loop.
///
/// Redraws, records where the grid was drawn so mouse events can be mapped
/// back to headers and rows, and dispatches key and mouse input. Continues
/// until the user presses 'q' in normal mode.
///
/// # Errors
///
/// Returns an IO error if terminal operations fail.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let mut geometry = GridGeometry::default();
    loop {
        terminal.draw(|f| geometry = render_ui(f, app))?;
        app.update_viewport_size(usize::from(geometry.body_height), geometry.spans.len());

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') if app.mode == AppMode::Normal => return Ok(()),
                _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
            },
            Event::Mouse(mouse) => InputHandler::handle_mouse_event(app, mouse, &geometry),
            _ => {}
        }
    }
}
