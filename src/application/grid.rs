//! The grid engine instance.
//!
//! A `DataGrid` owns the caller's rows and column descriptors together with
//! the current [`GridState`], the derived row order and the pointer gesture.
//! Every operation swaps in the next state produced by a pure transition and
//! re-derives rows when filters or sort changed.

use super::state::GridState;
use crate::domain::{
    derive_order, group_rows, validate_columns, ColumnDescriptor, DomainResult, Gesture,
    GestureOutcome, GridOptions, Row, RowGroup,
};
use log::{debug, info};
use std::fmt;

/// Invoked with the clicked row.
pub type RowClickHandler = Box<dyn FnMut(&Row)>;
/// Invoked with the selected rows, in derived order.
pub type SelectionHandler = Box<dyn FnMut(&[&Row])>;

/// One displayable line of the grid body.
#[derive(Debug, Clone, PartialEq)]
pub enum GridLine {
    /// Collapsible group header
    Group {
        key: String,
        count: usize,
        expanded: bool,
    },
    /// Detail row at a position in the derived list
    Row { index: usize },
}

pub struct DataGrid {
    rows: Vec<Row>,
    columns: Vec<ColumnDescriptor>,
    options: GridOptions,
    state: GridState,
    derived: Vec<usize>,
    gesture: Gesture,
    on_row_click: Option<RowClickHandler>,
    on_selection_change: Option<SelectionHandler>,
}

impl fmt::Debug for DataGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGrid")
            .field("rows", &self.rows.len())
            .field("columns", &self.columns)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("derived", &self.derived.len())
            .field("gesture", &self.gesture)
            .finish()
    }
}

impl DataGrid {
    /// Builds a grid in its initial state.
    ///
    /// # Examples
    ///
    /// ```
    /// use agrigrid::application::DataGrid;
    /// use agrigrid::domain::{ColumnDescriptor, GridOptions, Row, Value};
    ///
    /// let rows = vec![
    ///     Row::from_pairs([("name", Value::from("Alice")), ("age", Value::from(30))]),
    ///     Row::from_pairs([("name", Value::from("Bob")), ("age", Value::from(25))]),
    /// ];
    /// let columns = vec![
    ///     ColumnDescriptor::new("name", "Name").filterable(),
    ///     ColumnDescriptor::new("age", "Age").sortable(),
    /// ];
    /// let mut grid = DataGrid::new(rows, columns, GridOptions::default()).unwrap();
    /// grid.sort("age");
    /// assert_eq!(grid.derived(), &[1, 0]);
    /// ```
    pub fn new(rows: Vec<Row>, columns: Vec<ColumnDescriptor>, options: GridOptions) -> DomainResult<Self> {
        validate_columns(&columns)?;
        let state = GridState::new(&columns);
        let mut grid = Self {
            rows,
            columns,
            options,
            state,
            derived: Vec::new(),
            gesture: Gesture::Idle,
            on_row_click: None,
            on_selection_change: None,
        };
        grid.derived = grid.compute_order();
        info!("Grid created with {} rows and {} columns", grid.rows.len(), grid.columns.len());
        Ok(grid)
    }

    /// Restores a previously saved state, reconciled with the columns.
    pub fn with_state(mut self, state: &GridState) -> Self {
        self.state = state.reconciled(&self.columns);
        if self.state.group_by.is_some() && !self.options.enable_row_grouping {
            self.state = self.state.with_group_by(&self.columns, &self.options, None);
        }
        self.derived = self.compute_order();
        self.state = self.state.with_selection_pruned(self.derived.len());
        self
    }

    pub fn on_row_click(mut self, handler: impl FnMut(&Row) + 'static) -> Self {
        self.on_row_click = Some(Box::new(handler));
        self
    }

    pub fn on_selection_change(mut self, handler: impl FnMut(&[&Row]) + 'static) -> Self {
        self.on_selection_change = Some(Box::new(handler));
        self
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Columns in their current display order.
    pub fn ordered_columns(&self) -> Vec<&ColumnDescriptor> {
        self.state
            .column_order
            .iter()
            .filter_map(|key| self.column(key))
            .collect()
    }

    pub fn column_width(&self, key: &str) -> u32 {
        self.state
            .column_width(key)
            .or_else(|| self.column(key).map(ColumnDescriptor::initial_width))
            .unwrap_or(crate::domain::DEFAULT_COLUMN_WIDTH)
    }

    /// Input-row indices in derived order.
    pub fn derived(&self) -> &[usize] {
        &self.derived
    }

    pub fn derived_len(&self) -> usize {
        self.derived.len()
    }

    /// Row at a derived position; `None` when out of range.
    pub fn derived_row(&self, index: usize) -> Option<&Row> {
        self.derived.get(index).and_then(|&i| self.rows.get(i))
    }

    pub fn derived_rows(&self) -> Vec<&Row> {
        self.derived.iter().filter_map(|&i| self.rows.get(i)).collect()
    }

    /// Selected rows materialized against the derived list.
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.state
            .selection
            .iter()
            .filter_map(|&index| self.derived_row(index))
            .collect()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.state.selection.contains(&index)
    }

    /// Groups of the derived list, or empty when ungrouped.
    pub fn groups(&self) -> Vec<RowGroup> {
        match &self.state.group_by {
            Some(key) if self.options.enable_row_grouping => group_rows(&self.rows, &self.derived, key),
            _ => Vec::new(),
        }
    }

    /// Display model: group headers and the detail rows of expanded groups,
    /// or every derived row when ungrouped.
    pub fn visible_lines(&self) -> Vec<GridLine> {
        if self.state.group_by.is_none() || !self.options.enable_row_grouping {
            return (0..self.derived.len()).map(|index| GridLine::Row { index }).collect();
        }

        let mut lines = Vec::new();
        for group in self.groups() {
            let expanded = self.state.is_group_expanded(&group.key);
            lines.push(GridLine::Group {
                key: group.key.clone(),
                count: group.len(),
                expanded,
            });
            if expanded {
                lines.extend(group.members.iter().map(|&index| GridLine::Row { index }));
            }
        }
        lines
    }

    pub fn filter(&mut self, key: &str, text: &str) {
        let next = self.state.with_filter(&self.columns, key, text);
        self.apply(next);
    }

    pub fn clear_filters(&mut self) {
        let next = self.state.without_filters();
        self.apply(next);
    }

    pub fn sort(&mut self, key: &str) {
        let next = self.state.with_sort_toggled(&self.columns, key);
        self.apply(next);
    }

    /// Toggles a derived position and reports the new selection.
    pub fn select(&mut self, index: usize) {
        if index >= self.derived.len() {
            debug!("Ignoring selection of stale index {}", index);
            return;
        }
        let next = self.state.with_row_toggled(index, self.derived.len());
        self.apply(next);
        self.notify_selection();
    }

    pub fn select_all(&mut self) {
        let next = self.state.with_all_toggled(self.derived.len());
        self.apply(next);
        self.notify_selection();
    }

    pub fn clear_selection(&mut self) {
        if self.state.selection.is_empty() {
            return;
        }
        let next = self.state.without_selection();
        self.apply(next);
        self.notify_selection();
    }

    pub fn group_by(&mut self, key: Option<&str>) {
        let next = self.state.with_group_by(&self.columns, &self.options, key);
        self.apply(next);
    }

    pub fn toggle_group(&mut self, group_key: &str) {
        let next = self.state.with_group_toggled(group_key);
        self.apply(next);
    }

    pub fn reorder(&mut self, dragged: &str, target: &str) {
        let next = self.state.with_columns_reordered(&self.options, dragged, target);
        self.apply(next);
    }

    pub fn resize(&mut self, key: &str, start_width: u32, delta_x: i64) {
        let next = self
            .state
            .with_column_resized(&self.columns, &self.options, key, start_width, delta_x);
        self.apply(next);
    }

    /// Fires the row-click callback for a derived position.
    pub fn click_row(&mut self, index: usize) {
        let Some(&row_index) = self.derived.get(index) else {
            return;
        };
        if let (Some(handler), Some(row)) = (self.on_row_click.as_mut(), self.rows.get(row_index)) {
            handler(row);
        }
    }

    /// Replaces the input collection, keeping layout but clearing selection.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        info!("Replacing {} rows with {}", self.rows.len(), rows.len());
        self.rows = rows;
        let had_selection = !self.state.selection.is_empty();
        self.state = self.state.without_selection();
        self.derived = self.compute_order();
        if had_selection {
            self.notify_selection();
        }
    }

    /// Pointer pressed on the resize handle of `key` at `x` width units.
    pub fn pointer_down_resize(&mut self, key: &str, x: i64) {
        let resizable = self.column(key).is_some_and(|c| c.resizable);
        if !resizable || !self.options.enable_column_resize {
            self.gesture.cancel();
            return;
        }
        let start_width = self.column_width(key);
        self.gesture.begin_resize(key, x, start_width);
    }

    /// Pointer pressed on the header of `key`.
    pub fn pointer_down_header(&mut self, key: &str) {
        if self.options.enable_column_reorder && self.column(key).is_some() {
            self.gesture.begin_drag(key);
        } else {
            self.gesture.cancel();
        }
    }

    pub fn pointer_move(&mut self, x: i64) {
        if let Some(outcome) = self.gesture.pointer_move(x) {
            self.apply_gesture(outcome);
        }
    }

    /// Pointer released; always ends the current gesture.
    pub fn pointer_up(&mut self, x: i64, over: Option<&str>) {
        if let Some(outcome) = self.gesture.pointer_up(x, over) {
            self.apply_gesture(outcome);
        }
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture.cancel();
    }

    fn apply_gesture(&mut self, outcome: GestureOutcome) {
        match outcome {
            GestureOutcome::Resize {
                column,
                start_width,
                delta_x,
            } => self.resize(&column, start_width, delta_x),
            GestureOutcome::Reorder { dragged, target } => self.reorder(&dragged, &target),
        }
    }

    fn compute_order(&self) -> Vec<usize> {
        derive_order(&self.rows, &self.state.filters, self.state.sort.as_ref())
    }

    fn apply(&mut self, next: GridState) {
        let rederive = next.filters != self.state.filters || next.sort != self.state.sort;
        self.state = next;
        if rederive {
            self.derived = self.compute_order();
            let pruned = self.state.with_selection_pruned(self.derived.len());
            let dropped = pruned.selection.len() != self.state.selection.len();
            self.state = pruned;
            debug!("Derived {} of {} rows", self.derived.len(), self.rows.len());
            if dropped {
                self.notify_selection();
            }
        }
    }

    fn notify_selection(&mut self) {
        let Some(mut handler) = self.on_selection_change.take() else {
            return;
        };
        handler(&self.selected_rows());
        self.on_selection_change = Some(handler);
    }
}
