use super::geometry::{
    cells_for_width, grid_height, layout_headers, GridGeometry, COLUMN_SPACING, MARKER_WIDTH,
};
use crate::application::{App, AppMode, GridLine};
use crate::domain::SortDirection;
use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

/// Draws one frame and reports where the grid landed on screen.
pub fn render_ui(f: &mut Frame, app: &App) -> GridGeometry {
    let area = f.area();
    let available = area.height.saturating_sub(4);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(grid_height(app.grid.options(), available)),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    let geometry = render_grid(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    if matches!(app.mode, AppMode::Help) {
        render_help_popup(f, app.help_scroll);
    }
    geometry
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let state = app.grid.state();
    let mut parts = vec![
        format!("agrigrid | {}", app.source),
        format!("{}/{} rows", app.grid.derived_len(), app.grid.rows().len()),
    ];
    if !state.selection.is_empty() {
        parts.push(format!("{} selected", state.selection.len()));
    }
    if let Some(group) = &state.group_by {
        parts.push(format!("grouped by {}", group));
    }
    let header = Paragraph::new(parts.join(" | ")).style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn header_label(app: &App, key: &str, header: &str) -> String {
    let state = app.grid.state();
    let mut label = header.to_string();
    if let Some(sort) = state.sort.as_ref().filter(|s| s.column == key) {
        label.push_str(match sort.direction {
            SortDirection::Asc => " ▲",
            SortDirection::Desc => " ▼",
        });
    }
    if state.filters.contains_key(key) {
        label.push_str(" ~");
    }
    label
}

fn render_grid(f: &mut Frame, app: &App, area: Rect) -> GridGeometry {
    let pixels_per_cell = app.grid.options().pixels_per_cell;
    let ordered = app.grid.ordered_columns();
    let candidates: Vec<(usize, &str, u16)> = ordered
        .iter()
        .enumerate()
        .skip(app.scroll_col)
        .map(|(index, c)| {
            (index, c.key.as_str(), cells_for_width(app.grid.column_width(&c.key), pixels_per_cell))
        })
        .collect();

    let origin_x = area.x + 1 + MARKER_WIDTH + COLUMN_SPACING;
    let available = area.width.saturating_sub(2 + MARKER_WIDTH + COLUMN_SPACING);
    let spans = layout_headers(&candidates, origin_x, available);
    let geometry = GridGeometry {
        header_y: area.y + 1,
        body_top: area.y + 2,
        body_height: area.height.saturating_sub(3),
        marker_x: area.x + 1,
        spans,
    };

    let all_selected = app.grid.state().is_all_selected(app.grid.derived_len());
    let mut headers = vec![Cell::from(if all_selected { "[x]" } else { "[ ]" })];
    for span in &geometry.spans {
        let Some(column) = ordered.get(span.index) else {
            continue;
        };
        let style = if span.index == app.cursor_col {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        headers.push(Cell::from(header_label(app, &column.key, &column.header)).style(style));
    }
    let header_row = Row::new(headers).height(1);

    let lines = app.visible_lines();
    let visible = usize::from(geometry.body_height);
    let mut rows = Vec::new();
    for (offset, line) in lines.iter().enumerate().skip(app.scroll_line).take(visible) {
        let on_cursor = offset == app.cursor_line;
        match line {
            GridLine::Group { key, count, expanded } => {
                let marker = if *expanded { " ▾" } else { " ▸" };
                let style = if on_cursor {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else {
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
                };
                let mut cells = vec![Cell::from(marker)];
                cells.push(Cell::from(format!("{} ({})", key, count)));
                cells.extend(geometry.spans.iter().skip(1).map(|_| Cell::from("")));
                rows.push(Row::new(cells).style(style).height(1));
            }
            GridLine::Row { index } => {
                let Some(row) = app.grid.derived_row(*index) else {
                    continue;
                };
                let selected = app.grid.is_selected(*index);
                let mut cells = vec![Cell::from(if selected { "[x]" } else { "[ ]" })];
                for span in &geometry.spans {
                    let text = ordered.get(span.index).map(|c| c.display(row)).unwrap_or_default();
                    let style = if on_cursor && span.index == app.cursor_col {
                        Style::default().bg(Color::Blue).fg(Color::White)
                    } else if on_cursor {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else if selected {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default()
                    };
                    cells.push(Cell::from(text).style(style));
                }
                rows.push(Row::new(cells).height(1));
            }
        }
    }

    let mut widths = vec![Constraint::Length(MARKER_WIDTH)];
    widths.extend(geometry.spans.iter().map(|span| Constraint::Length(span.width)));

    let title = match &app.grid.state().group_by {
        Some(group) => format!("Grid (grouped by {})", group),
        None => "Grid".to_string(),
    };
    let table = Table::new(rows, widths)
        .header(header_row)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(COLUMN_SPACING)
        .flex(Flex::Start);

    f.render_widget(table, area);
    geometry
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                let layout = app.layout_path.as_deref().unwrap_or("inferred");
                format!(
                    "Layout: {} | s: sort | /: filter | x: select | a: all | g: group | Ctrl+S: save layout | Ctrl+E: export CSV | Ctrl+Y: copy | ?: help | q: quit",
                    layout
                )
            }
        }
        AppMode::Filtering => {
            let header = app.current_column().map(|c| c.header.as_str()).unwrap_or("");
            format!("Filter {}: {} (Enter to apply, Esc to cancel)", header, app.input)
        }
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
        AppMode::SaveLayout => format!("Save layout as: {} (Enter to save, Esc to cancel)", app.filename_input),
        AppMode::ExportCsv => format!("Export CSV as: {} (Enter to export, Esc to cancel)", app.filename_input),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Filtering => Style::default().fg(Color::Green),
            AppMode::Help => Style::default().fg(Color::Cyan),
            AppMode::SaveLayout => Style::default().fg(Color::Yellow),
            AppMode::ExportCsv => Style::default().fg(Color::Magenta),
        });
    f.render_widget(input, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("agrigrid Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"AGRIGRID KEY REFERENCE

=== NAVIGATION ===
Arrow keys      Move the cursor (hjkl also work)
PgUp/PgDn       Move one screen up or down
Mouse wheel     Scroll the grid

=== SORTING AND FILTERING ===
s               Sort by the current column (again to flip direction)
/               Filter the current column (case-insensitive substring)
                Rows update as you type; Esc restores the previous filter
c               Clear every filter
▲ / ▼           Header marks the sorted column and direction
~               Header marks a filtered column

=== SELECTION ===
x or Space      Toggle selection of the row under the cursor
a               Select every row, or clear when all are selected
Esc             Clear the selection
Click [ ]       Toggle the row's selection with the mouse

=== GROUPING ===
g               Group by the current column (again to ungroup)
Enter           On a group header: expand or collapse it
                On a row: show the row in the status bar

=== COLUMNS ===
< / >           Move the current column left or right
- / _ or +      Shrink or grow the current column
Drag border     Drag the cell right of a header to resize
Drag header     Drop a header onto another to move it there
Click header    Sort by that column

=== FILES ===
Ctrl+S          Save columns, options and sort/filter/grouping as a layout
Ctrl+E          Export the selected rows (or every shown row) to CSV
Ctrl+Y          Copy the selected rows (or every shown row) as TSV

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window

q               Quit"#;
