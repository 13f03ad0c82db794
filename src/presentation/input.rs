use super::geometry::{GridGeometry, HeaderHit};
use crate::application::{App, AppMode, GridLine};
use crate::infrastructure::{copy_rows, FileRepository, LayoutDocument};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use log::debug;

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Filtering => Self::handle_filter_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::SaveLayout | AppMode::ExportCsv => Self::handle_filename_input_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('s') => {
                    app.start_save_layout();
                    return;
                }
                KeyCode::Char('e') => {
                    app.start_csv_export();
                    return;
                }
                KeyCode::Char('y') => {
                    let result = copy_rows(&app.grid.ordered_columns(), &app.target_rows())
                        .map_err(|e| e.to_string());
                    app.set_copy_result(result);
                    return;
                }
                _ => {}
            }
        }

        app.status_message = None;

        match key {
            KeyCode::Up | KeyCode::Char('k') => app.move_up(),
            KeyCode::Down | KeyCode::Char('j') => app.move_down(),
            KeyCode::Left | KeyCode::Char('h') => app.move_left(),
            KeyCode::Right | KeyCode::Char('l') => app.move_right(),
            KeyCode::PageUp => app.page_up(),
            KeyCode::PageDown => app.page_down(),
            KeyCode::Char('s') => app.sort_current_column(),
            KeyCode::Char('/') => app.start_filter(),
            KeyCode::Char('c') => app.clear_filters(),
            KeyCode::Char('x') | KeyCode::Char(' ') => app.toggle_selection_at_cursor(),
            KeyCode::Char('a') => app.toggle_select_all(),
            KeyCode::Char('g') => app.toggle_grouping(),
            KeyCode::Enter => app.activate_line(),
            KeyCode::Char('<') => app.move_current_column(-1),
            KeyCode::Char('>') => app.move_current_column(1),
            KeyCode::Char('-') => app.resize_current_column(-1),
            KeyCode::Char('_') | KeyCode::Char('+') => app.resize_current_column(1),
            KeyCode::F(1) | KeyCode::Char('?') => app.start_help(),
            KeyCode::Esc => {
                app.grid.cancel_gesture();
                app.clear_selection();
            }
            _ => {}
        }
    }

    fn handle_filter_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.finish_filter(),
            KeyCode::Esc => app.cancel_filter(),
            _ => {
                if edit_text(&mut app.input, &mut app.cursor_position, key) {
                    app.update_filter();
                }
            }
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_filename_input_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => match app.mode {
                AppMode::SaveLayout => {
                    let filename = app.get_save_filename();
                    let layout = LayoutDocument::new(
                        app.grid.columns().to_vec(),
                        app.grid.options().clone(),
                        Some(app.grid.state().layout()),
                    );
                    let result = FileRepository::save_layout(&layout, &filename).map_err(|e| e.to_string());
                    app.set_save_result(result);
                }
                AppMode::ExportCsv => {
                    let filename = app.get_csv_export_filename();
                    let result = FileRepository::export_csv(&app.grid.ordered_columns(), &app.target_rows(), &filename)
                        .map_err(|e| e.to_string());
                    app.set_csv_export_result(result);
                }
                _ => {}
            },
            KeyCode::Esc => app.cancel_filename_input(),
            _ => {
                edit_text(&mut app.filename_input, &mut app.cursor_position, key);
            }
        }
    }

    /// Routes a mouse event into the grid's gesture machine.
    ///
    /// Pressing a header border starts a resize, pressing a header label
    /// starts a drag that reorders on release over another header, and a
    /// press and release on the same header sorts by it.
    pub fn handle_mouse_event(app: &mut App, event: MouseEvent, geometry: &GridGeometry) {
        let units = i64::from(event.column) * i64::from(app.grid.options().pixels_per_cell.max(1));

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                app.pressed_header = None;
                match geometry.hit_header(event.column, event.row) {
                    Some(HeaderHit::Border(span)) => {
                        debug!("Resize handle pressed on '{}'", span.key);
                        app.grid.pointer_down_resize(&span.key, units);
                    }
                    Some(HeaderHit::Label(span)) => {
                        app.grid.pointer_down_header(&span.key);
                        app.pressed_header = Some(span.key.clone());
                        app.cursor_col = span.index;
                    }
                    None => Self::click_body(app, event, geometry),
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let over = geometry.column_at(event.column).map(|span| span.key.as_str());
                if app.pressed_header.as_deref() != over {
                    app.pressed_header = None;
                }
                app.grid.pointer_move(units);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let over = match geometry.hit_header(event.column, event.row) {
                    Some(HeaderHit::Label(span)) | Some(HeaderHit::Border(span)) => Some(span.key.as_str()),
                    None => None,
                };
                let clicked = app.pressed_header.take().filter(|key| Some(key.as_str()) == over);
                app.grid.pointer_up(units, over);
                if let Some(key) = clicked {
                    app.sort_by(&key);
                }
                app.clamp_cursor();
            }
            MouseEventKind::ScrollDown => app.move_down(),
            MouseEventKind::ScrollUp => app.move_up(),
            _ => {}
        }
    }

    fn click_body(app: &mut App, event: MouseEvent, geometry: &GridGeometry) {
        let Some(offset) = geometry.body_offset(event.row) else {
            return;
        };
        let line = app.scroll_line + offset;
        if line >= app.visible_lines().len() {
            return;
        }
        app.cursor_line = line;
        if let Some(span) = geometry.column_at(event.column) {
            app.cursor_col = span.index;
        }
        if geometry.is_marker(event.column) {
            match app.current_line() {
                Some(GridLine::Row { .. }) => app.toggle_selection_at_cursor(),
                Some(GridLine::Group { .. }) => app.activate_line(),
                None => {}
            }
        }
    }
}

/// Applies an editing key to `buffer`, with `cursor` counted in characters.
/// Returns whether the text changed.
fn edit_text(buffer: &mut String, cursor: &mut usize, key: KeyCode) -> bool {
    let len = buffer.chars().count();
    *cursor = (*cursor).min(len);
    match key {
        KeyCode::Backspace if *cursor > 0 => {
            buffer.remove(byte_offset(buffer, *cursor - 1));
            *cursor -= 1;
            true
        }
        KeyCode::Delete if *cursor < len => {
            buffer.remove(byte_offset(buffer, *cursor));
            true
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
            false
        }
        KeyCode::Right => {
            *cursor = (*cursor + 1).min(len);
            false
        }
        KeyCode::Home => {
            *cursor = 0;
            false
        }
        KeyCode::End => {
            *cursor = len;
            false
        }
        KeyCode::Char(c) => {
            buffer.insert(byte_offset(buffer, *cursor), c);
            *cursor += 1;
            true
        }
        _ => false,
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::DataGrid;
    use crate::domain::{ColumnDescriptor, GridOptions, Row, SortDirection, Value};
    use crate::presentation::geometry::layout_headers;
    use tempfile::tempdir;

    fn app() -> App {
        let rows = vec![
            Row::from_pairs([("farmer", Value::from("Amina")), ("crop", Value::from("maize")), ("acres", Value::from(4))]),
            Row::from_pairs([("farmer", Value::from("Kofi")), ("crop", Value::from("cocoa")), ("acres", Value::from(12))]),
            Row::from_pairs([("farmer", Value::from("Zainab")), ("crop", Value::from("maize")), ("acres", Value::from(7))]),
        ];
        let columns = ColumnDescriptor::infer_from_rows(&rows);
        App::new(DataGrid::new(rows, columns, GridOptions::default()).unwrap(), "test")
    }

    fn geometry() -> GridGeometry {
        GridGeometry {
            header_y: 2,
            body_top: 3,
            body_height: 10,
            marker_x: 1,
            spans: layout_headers(&[(0, "farmer", 18), (1, "crop", 18), (2, "acres", 18)], 6, 80),
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn press(app: &mut App, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    #[test]
    fn test_sort_key_binding() {
        let mut app = app();
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('s'));
        let sort = app.grid.state().sort.clone().unwrap();
        assert_eq!(sort.column, "acres");
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_filter_typing_applies_live() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode, AppMode::Filtering);
        for c in "am".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.grid.derived_len(), 1);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.grid.derived_len(), 2);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.grid.state().filters.get("farmer").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_filter_typing_non_ascii() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('é'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "a");
        assert_eq!(app.cursor_position, 0);
    }

    #[test]
    fn test_selection_and_select_all_bindings() {
        let mut app = app();
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.grid.state().selection.len(), 1);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.grid.state().selection.len(), 3);
        press(&mut app, KeyCode::Char('a'));
        assert!(app.grid.state().selection.is_empty());
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Esc);
        assert!(app.grid.state().selection.is_empty());
    }

    #[test]
    fn test_group_binding_and_enter() {
        let mut app = app();
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.visible_lines().len(), 2);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.visible_lines().len(), 4);
    }

    #[test]
    fn test_help_toggle() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.help_scroll, 1);
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_save_layout_through_prompt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));

        InputHandler::handle_key_event(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(app.mode, AppMode::SaveLayout);
        app.filename_input = path.to_str().unwrap().to_string();
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, AppMode::Normal);
        let layout = FileRepository::load_layout(&path).unwrap();
        assert_eq!(layout.columns.len(), 3);
        assert_eq!(layout.state.unwrap().sort.unwrap().column, "farmer");
    }

    #[test]
    fn test_export_through_prompt_uses_selection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('x'));

        InputHandler::handle_key_event(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(app.mode, AppMode::ExportCsv);
        app.filename_input = path.to_str().unwrap().to_string();
        press(&mut app, KeyCode::Enter);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Farmer,Crop,Acres\nKofi,cocoa,12\n");
    }

    #[test]
    fn test_filename_prompt_editing_and_cancel() {
        let mut app = app();
        app.start_csv_export();
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.filename_input, "export.csvx");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.filename_input, "export.csv");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.filename_input.is_empty());
    }

    #[test]
    fn test_click_header_sorts() {
        let mut app = app();
        let geometry = geometry();
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 30, 2), &geometry);
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 31, 2), &geometry);
        let sort = app.grid.state().sort.clone().unwrap();
        assert_eq!(sort.column, "crop");
        assert_eq!(app.cursor_col, 1);
        assert!(app.grid.gesture().is_idle());
    }

    #[test]
    fn test_drag_header_onto_another_reorders() {
        let mut app = app();
        let geometry = geometry();
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 45, 2), &geometry);
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 20, 2), &geometry);
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 8, 2), &geometry);
        assert_eq!(app.grid.state().column_order, vec!["acres", "farmer", "crop"]);
        assert!(app.grid.state().sort.is_none());
        assert!(app.grid.gesture().is_idle());
    }

    #[test]
    fn test_drag_border_resizes_with_floor() {
        let mut app = app();
        let geometry = geometry();
        let border = geometry.spans[0].end();
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), border, 2), &geometry);
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), border + 5, 2), &geometry);
        assert_eq!(app.grid.column_width("farmer"), 190);
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 0, 20), &geometry);
        assert_eq!(app.grid.column_width("farmer"), 80);
        assert!(app.grid.gesture().is_idle());
    }

    #[test]
    fn test_click_marker_toggles_row() {
        let mut app = app();
        let geometry = geometry();
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 2, 4), &geometry);
        assert_eq!(app.cursor_line, 1);
        assert!(app.grid.is_selected(1));
    }

    #[test]
    fn test_click_below_rows_is_ignored() {
        let mut app = app();
        let geometry = geometry();
        InputHandler::handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 2, 9), &geometry);
        assert_eq!(app.cursor_line, 0);
        assert!(app.grid.state().selection.is_empty());
    }
}
