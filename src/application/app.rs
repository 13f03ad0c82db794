//! Terminal application state for the grid viewer.
//!
//! `App` wraps a [`DataGrid`] with everything the terminal front end needs:
//! a cursor over the visible lines and ordered columns, scroll offsets, the
//! current input mode and the buffers used by prompts.

use super::grid::{DataGrid, GridLine};
use crate::domain::{ColumnDescriptor, Row};

/// Represents the current mode of the application.
///
/// The mode determines how key presses are interpreted and which prompt the
/// status bar shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Navigation mode - arrow keys move the cursor, shortcuts available
    Normal,
    /// Typing a filter for the current column
    Filtering,
    /// Help screen is displayed
    Help,
    /// Save-layout dialog is open
    SaveLayout,
    /// CSV export dialog is open
    ExportCsv,
}

/// Main application state containing the grid and UI state.
///
/// # Examples
///
/// ```
/// use agrigrid::application::{App, DataGrid};
/// use agrigrid::domain::{ColumnDescriptor, GridOptions, Row, Value};
///
/// let rows = vec![Row::from_pairs([("crop", Value::from("maize"))])];
/// let columns = vec![ColumnDescriptor::new("crop", "Crop").sortable()];
/// let grid = DataGrid::new(rows, columns, GridOptions::default()).unwrap();
/// let app = App::new(grid, "farms.json");
/// assert_eq!(app.cursor_line, 0);
/// assert_eq!(app.current_column_key().as_deref(), Some("crop"));
/// ```
#[derive(Debug)]
pub struct App {
    /// The grid engine
    pub grid: DataGrid,
    /// Cursor position in the visible lines (zero-based)
    pub cursor_line: usize,
    /// Cursor position in the ordered columns (zero-based)
    pub cursor_col: usize,
    /// First visible line in the viewport
    pub scroll_line: usize,
    /// Left-most visible column in the viewport
    pub scroll_col: usize,
    /// Current application mode
    pub mode: AppMode,
    /// Filter text being typed
    pub input: String,
    /// Cursor position within the active input buffer
    pub cursor_position: usize,
    /// Column whose filter is being edited
    pub filter_column: Option<String>,
    /// Filter text to restore when filtering is cancelled
    pub filter_backup: String,
    /// Input buffer for filename entry
    pub filename_input: String,
    /// Where the layout was loaded from or last saved to
    pub layout_path: Option<String>,
    /// Description of where the rows came from
    pub source: String,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Viewport height in lines
    pub viewport_rows: usize,
    /// Viewport width in columns
    pub viewport_cols: usize,
    /// Header pressed without moving, sorted on release
    pub pressed_header: Option<String>,
}

impl App {
    pub fn new(grid: DataGrid, source: impl Into<String>) -> Self {
        Self {
            grid,
            cursor_line: 0,
            cursor_col: 0,
            scroll_line: 0,
            scroll_col: 0,
            mode: AppMode::Normal,
            input: String::new(),
            cursor_position: 0,
            filter_column: None,
            filter_backup: String::new(),
            filename_input: String::new(),
            layout_path: None,
            source: source.into(),
            help_scroll: 0,
            status_message: None,
            viewport_rows: 20,
            viewport_cols: 6,
            pressed_header: None,
        }
    }

    pub fn with_layout_path(mut self, path: Option<String>) -> Self {
        self.layout_path = path;
        self
    }

    pub fn visible_lines(&self) -> Vec<GridLine> {
        self.grid.visible_lines()
    }

    pub fn current_line(&self) -> Option<GridLine> {
        self.visible_lines().into_iter().nth(self.cursor_line)
    }

    pub fn current_column(&self) -> Option<&ColumnDescriptor> {
        self.grid.ordered_columns().get(self.cursor_col).copied()
    }

    pub fn current_column_key(&self) -> Option<String> {
        self.current_column().map(|c| c.key.clone())
    }

    pub fn move_up(&mut self) {
        self.cursor_line = self.cursor_line.saturating_sub(1);
        self.ensure_cursor_visible();
    }

    pub fn move_down(&mut self) {
        let count = self.visible_lines().len();
        if self.cursor_line + 1 < count {
            self.cursor_line += 1;
        }
        self.ensure_cursor_visible();
    }

    pub fn move_left(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
        self.ensure_cursor_visible();
    }

    pub fn move_right(&mut self) {
        if self.cursor_col + 1 < self.grid.columns().len() {
            self.cursor_col += 1;
        }
        self.ensure_cursor_visible();
    }

    pub fn page_down(&mut self) {
        let count = self.visible_lines().len();
        self.cursor_line = (self.cursor_line + self.viewport_rows).min(count.saturating_sub(1));
        self.ensure_cursor_visible();
    }

    pub fn page_up(&mut self) {
        self.cursor_line = self.cursor_line.saturating_sub(self.viewport_rows);
        self.ensure_cursor_visible();
    }

    /// Updates the viewport size for proper scrolling calculations.
    pub fn update_viewport_size(&mut self, rows: usize, cols: usize) {
        self.viewport_rows = rows.max(1);
        self.viewport_cols = cols.max(1);
        self.ensure_cursor_visible();
    }

    /// Pulls the cursor back inside the visible lines after they shrink.
    pub fn clamp_cursor(&mut self) {
        let count = self.visible_lines().len();
        self.cursor_line = self.cursor_line.min(count.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(self.grid.columns().len().saturating_sub(1));
        self.ensure_cursor_visible();
    }

    /// Ensures the cursor is visible by adjusting scroll position.
    pub fn ensure_cursor_visible(&mut self) {
        if self.cursor_line < self.scroll_line {
            self.scroll_line = self.cursor_line;
        } else if self.cursor_line >= self.scroll_line + self.viewport_rows {
            self.scroll_line = self.cursor_line + 1 - self.viewport_rows;
        }

        if self.cursor_col < self.scroll_col {
            self.scroll_col = self.cursor_col;
        } else if self.cursor_col >= self.scroll_col + self.viewport_cols {
            self.scroll_col = self.cursor_col + 1 - self.viewport_cols;
        }
    }

    pub fn sort_by(&mut self, key: &str) {
        self.grid.sort(key);
        self.status_message = match &self.grid.state().sort {
            Some(spec) if spec.column == key => Some(format!("Sorted by {} {:?}", key, spec.direction)),
            _ => Some(format!("Column '{}' is not sortable", key)),
        };
        self.clamp_cursor();
    }

    pub fn sort_current_column(&mut self) {
        if let Some(key) = self.current_column_key() {
            self.sort_by(&key);
        }
    }

    /// Opens the filter prompt for the current column.
    pub fn start_filter(&mut self) {
        let Some(column) = self.current_column() else {
            return;
        };
        if !column.filterable {
            self.status_message = Some(format!("Column '{}' is not filterable", column.key));
            return;
        }
        let key = column.key.clone();
        let current = self.grid.state().filters.get(&key).cloned().unwrap_or_default();
        self.mode = AppMode::Filtering;
        self.input = current.clone();
        self.filter_backup = current;
        self.cursor_position = self.input.chars().count();
        self.filter_column = Some(key);
        self.status_message = None;
    }

    /// Applies the filter buffer as typed.
    pub fn update_filter(&mut self) {
        if let Some(key) = self.filter_column.clone() {
            self.grid.filter(&key, &self.input);
            self.cursor_line = 0;
            self.scroll_line = 0;
            self.clamp_cursor();
        }
    }

    pub fn finish_filter(&mut self) {
        self.update_filter();
        self.status_message = Some(format!("{} of {} rows", self.grid.derived_len(), self.grid.rows().len()));
        self.mode = AppMode::Normal;
        self.input.clear();
        self.filter_column = None;
        self.cursor_position = 0;
    }

    /// Restores the filter that was active before the prompt opened.
    pub fn cancel_filter(&mut self) {
        if let Some(key) = self.filter_column.take() {
            self.grid.filter(&key, &self.filter_backup);
            self.clamp_cursor();
        }
        self.mode = AppMode::Normal;
        self.input.clear();
        self.filter_backup.clear();
        self.cursor_position = 0;
    }

    pub fn clear_filters(&mut self) {
        self.grid.clear_filters();
        self.status_message = Some("Filters cleared".to_string());
        self.clamp_cursor();
    }

    pub fn toggle_selection_at_cursor(&mut self) {
        if let Some(GridLine::Row { index }) = self.current_line() {
            self.grid.select(index);
            self.status_message = Some(format!("{} selected", self.grid.state().selection.len()));
        }
    }

    pub fn toggle_select_all(&mut self) {
        self.grid.select_all();
        self.status_message = Some(format!("{} selected", self.grid.state().selection.len()));
    }

    pub fn clear_selection(&mut self) {
        self.grid.clear_selection();
    }

    /// Groups by the current column, or clears grouping when already grouped
    /// by it.
    pub fn toggle_grouping(&mut self) {
        let Some(key) = self.current_column_key() else {
            return;
        };
        if self.grid.state().group_by.as_deref() == Some(key.as_str()) {
            self.grid.group_by(None);
            self.status_message = Some("Grouping cleared".to_string());
        } else {
            self.grid.group_by(Some(key.as_str()));
            self.status_message = match &self.grid.state().group_by {
                Some(group) if *group == key => Some(format!("Grouped by {}", key)),
                _ => Some(format!("Column '{}' is not groupable", key)),
            };
        }
        self.cursor_line = 0;
        self.scroll_line = 0;
        self.clamp_cursor();
    }

    /// Enter on a group header toggles it; on a row it fires the row click.
    pub fn activate_line(&mut self) {
        match self.current_line() {
            Some(GridLine::Group { key, .. }) => {
                self.grid.toggle_group(&key);
                self.clamp_cursor();
            }
            Some(GridLine::Row { index }) => {
                self.grid.click_row(index);
                self.status_message = self.grid.derived_row(index).map(|row| describe_row(self, row));
            }
            None => {}
        }
    }

    /// Swaps the current column with its left (`-1`) or right (`1`)
    /// neighbour; the cursor follows the column.
    pub fn move_current_column(&mut self, offset: isize) {
        let order = &self.grid.state().column_order;
        let Some(target_index) = self.cursor_col.checked_add_signed(offset) else {
            return;
        };
        let (Some(dragged), Some(target)) = (order.get(self.cursor_col).cloned(), order.get(target_index).cloned())
        else {
            return;
        };
        self.grid.reorder(&dragged, &target);
        if self.grid.state().column_order.get(target_index) == Some(&dragged) {
            self.cursor_col = target_index;
        } else {
            self.status_message = Some("Column reordering is disabled".to_string());
        }
        self.ensure_cursor_visible();
    }

    /// Shrinks or grows the current column by `cells` terminal cells.
    pub fn resize_current_column(&mut self, cells: i64) {
        let Some(key) = self.current_column_key() else {
            return;
        };
        let start_width = self.grid.column_width(&key);
        let delta = cells * i64::from(self.grid.options().pixels_per_cell.max(1));
        self.grid.resize(&key, start_width, delta);
        let width = self.grid.column_width(&key);
        self.status_message = if width == start_width {
            Some(format!("Column '{}' width {}", key, width))
        } else {
            Some(format!("Column '{}' resized to {}", key, width))
        };
    }

    pub fn start_help(&mut self) {
        self.mode = AppMode::Help;
        self.help_scroll = 0;
    }

    /// Switches to save-layout mode to prompt for a filename.
    pub fn start_save_layout(&mut self) {
        self.mode = AppMode::SaveLayout;
        self.filename_input = self.layout_path.clone().unwrap_or_else(|| "layout.json".to_string());
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    /// Switches to CSV export mode to prompt for a filename.
    pub fn start_csv_export(&mut self) {
        self.mode = AppMode::ExportCsv;
        self.filename_input = "export.csv".to_string();
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    /// Cancels filename input and returns to normal mode.
    pub fn cancel_filename_input(&mut self) {
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Gets the filename to use for saving the layout.
    pub fn get_save_filename(&self) -> String {
        if self.filename_input.is_empty() {
            "layout.json".to_string()
        } else {
            self.filename_input.clone()
        }
    }

    /// Gets the filename to use for CSV export.
    pub fn get_csv_export_filename(&self) -> String {
        if self.filename_input.is_empty() {
            "export.csv".to_string()
        } else {
            self.filename_input.clone()
        }
    }

    /// Processes the result of a layout save.
    ///
    /// # Arguments
    ///
    /// * `result` - Saved filename or error message
    pub fn set_save_result(&mut self, result: Result<String, String>) {
        match result {
            Ok(filename) => {
                self.status_message = Some(format!("Layout saved to {}", filename));
                self.layout_path = Some(filename);
            }
            Err(error) => {
                self.status_message = Some(format!("Save failed: {}", error));
            }
        }

        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Processes the result of a CSV export.
    ///
    /// # Arguments
    ///
    /// * `result` - Number of exported rows or error message
    pub fn set_csv_export_result(&mut self, result: Result<usize, String>) {
        let filename = self.get_csv_export_filename();
        match result {
            Ok(count) => {
                self.status_message = Some(format!("Exported {} rows to {}", count, filename));
            }
            Err(error) => {
                self.status_message = Some(format!("Export failed: {}", error));
            }
        }

        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    pub fn set_copy_result(&mut self, result: Result<usize, String>) {
        self.status_message = Some(match result {
            Ok(count) => format!("Copied {} rows", count),
            Err(error) => format!("Copy failed: {}", error),
        });
    }

    /// Rows acted on by export and copy: the selection when there is one,
    /// otherwise every derived row.
    pub fn target_rows(&self) -> Vec<&Row> {
        if self.grid.state().selection.is_empty() {
            self.grid.derived_rows()
        } else {
            self.grid.selected_rows()
        }
    }
}

fn describe_row(app: &App, row: &Row) -> String {
    app.grid
        .ordered_columns()
        .iter()
        .take(3)
        .map(|c| format!("{}: {}", c.header, c.display(row)))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GridOptions, SortDirection, Value};

    fn farm(name: &str, crop: &str, acres: i64) -> Row {
        Row::from_pairs([
            ("name", Value::from(name)),
            ("crop", Value::from(crop)),
            ("acres", Value::from(acres)),
        ])
    }

    fn app() -> App {
        let rows = vec![
            farm("Amina", "maize", 4),
            farm("Kofi", "cocoa", 12),
            farm("Wanjiru", "maize", 2),
            farm("Tendai", "sorghum", 7),
        ];
        let columns = vec![
            ColumnDescriptor::new("name", "Name").sortable().filterable(),
            ColumnDescriptor::new("crop", "Crop").filterable().groupable(),
            ColumnDescriptor::new("acres", "Acres").sortable().resizable(),
        ];
        App::new(DataGrid::new(rows, columns, GridOptions::default()).unwrap(), "test")
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut app = app();
        app.move_up();
        assert_eq!(app.cursor_line, 0);
        for _ in 0..10 {
            app.move_down();
            app.move_right();
        }
        assert_eq!(app.cursor_line, 3);
        assert_eq!(app.cursor_col, 2);
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let mut app = app();
        app.update_viewport_size(2, 1);
        app.move_down();
        app.move_down();
        assert_eq!(app.scroll_line, 1);
        app.move_right();
        assert_eq!(app.scroll_col, 1);
        app.move_up();
        app.move_up();
        assert_eq!(app.scroll_line, 0);
    }

    #[test]
    fn test_sort_current_column_toggles_direction() {
        let mut app = app();
        app.cursor_col = 2;
        app.sort_current_column();
        assert_eq!(app.grid.state().sort.as_ref().unwrap().direction, SortDirection::Asc);
        app.sort_current_column();
        assert_eq!(app.grid.state().sort.as_ref().unwrap().direction, SortDirection::Desc);

        app.cursor_col = 1;
        app.sort_current_column();
        assert_eq!(app.grid.state().sort.as_ref().unwrap().column, "acres");
        assert!(app.status_message.as_deref().unwrap().contains("not sortable"));
    }

    #[test]
    fn test_filter_prompt_applies_live_and_cancels() {
        let mut app = app();
        app.cursor_col = 1;
        app.start_filter();
        assert_eq!(app.mode, AppMode::Filtering);

        app.input = "maize".to_string();
        app.update_filter();
        assert_eq!(app.grid.derived_len(), 2);

        app.cancel_filter();
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.grid.derived_len(), 4);
    }

    #[test]
    fn test_finish_filter_keeps_filter_and_clamps_cursor() {
        let mut app = app();
        app.cursor_line = 3;
        app.start_filter();
        app.input = "kofi".to_string();
        app.finish_filter();
        assert_eq!(app.grid.derived_len(), 1);
        assert_eq!(app.cursor_line, 0);
        assert_eq!(app.status_message.as_deref(), Some("1 of 4 rows"));

        app.start_filter();
        assert_eq!(app.input, "kofi");
    }

    #[test]
    fn test_filter_on_fixed_column_is_refused() {
        let mut app = app();
        app.cursor_col = 2;
        app.start_filter();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_grouping_and_activation() {
        let mut app = app();
        app.cursor_col = 1;
        app.toggle_grouping();
        assert_eq!(app.visible_lines().len(), 3);
        assert!(matches!(app.current_line(), Some(GridLine::Group { ref key, count: 2, .. }) if key == "maize"));

        app.activate_line();
        assert_eq!(app.visible_lines().len(), 5);

        app.move_down();
        app.toggle_selection_at_cursor();
        assert_eq!(app.grid.selected_rows().len(), 1);

        app.toggle_grouping();
        assert!(app.grid.state().group_by.is_none());
        assert_eq!(app.visible_lines().len(), 4);
    }

    #[test]
    fn test_selection_on_group_header_is_ignored() {
        let mut app = app();
        app.cursor_col = 1;
        app.toggle_grouping();
        app.toggle_selection_at_cursor();
        assert!(app.grid.state().selection.is_empty());
    }

    #[test]
    fn test_activate_row_describes_it() {
        let mut app = app();
        app.activate_line();
        assert_eq!(app.status_message.as_deref(), Some("Name: Amina | Crop: maize | Acres: 4"));
    }

    #[test]
    fn test_move_column_cursor_follows() {
        let mut app = app();
        app.move_current_column(1);
        assert_eq!(app.grid.state().column_order, vec!["crop", "name", "acres"]);
        assert_eq!(app.cursor_col, 1);

        app.move_current_column(-1);
        assert_eq!(app.grid.state().column_order, vec!["name", "crop", "acres"]);
        assert_eq!(app.cursor_col, 0);

        app.move_current_column(-1);
        assert_eq!(app.cursor_col, 0);
    }

    #[test]
    fn test_resize_current_column_by_cells() {
        let mut app = app();
        app.cursor_col = 2;
        app.resize_current_column(2);
        assert_eq!(app.grid.column_width("acres"), 166);
        for _ in 0..20 {
            app.resize_current_column(-1);
        }
        assert_eq!(app.grid.column_width("acres"), 80);
    }

    #[test]
    fn test_save_layout_prompt_round_trip() {
        let mut app = app();
        app.start_save_layout();
        assert_eq!(app.mode, AppMode::SaveLayout);
        assert_eq!(app.filename_input, "layout.json");

        app.set_save_result(Ok("farm-layout.json".to_string()));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.layout_path.as_deref(), Some("farm-layout.json"));

        app.start_save_layout();
        assert_eq!(app.filename_input, "farm-layout.json");
        app.cancel_filename_input();
        assert!(app.filename_input.is_empty());
    }

    #[test]
    fn test_export_result_messages() {
        let mut app = app();
        app.start_csv_export();
        app.set_csv_export_result(Ok(4));
        assert_eq!(app.status_message.as_deref(), Some("Exported 4 rows to export.csv"));

        app.start_csv_export();
        app.set_csv_export_result(Err("disk full".to_string()));
        assert_eq!(app.status_message.as_deref(), Some("Export failed: disk full"));
    }

    #[test]
    fn test_target_rows_prefers_selection() {
        let mut app = app();
        assert_eq!(app.target_rows().len(), 4);
        app.toggle_selection_at_cursor();
        assert_eq!(app.target_rows().len(), 1);
    }
}
