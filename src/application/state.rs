//! Interactive grid state and its transitions.
//!
//! `GridState` is a plain serializable record. Every operation is a pure
//! function returning the next state; the current state is never edited in
//! place. Transitions that would violate a column's capabilities return an
//! unchanged copy.

use crate::domain::{
    reorder_columns, resized_width, ColumnDescriptor, FilterMap, GridOptions, SortDirection,
    SortSpec,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sort, filter, grouping, selection and column layout of one grid.
///
/// # Examples
///
/// ```
/// use agrigrid::application::GridState;
/// use agrigrid::domain::{ColumnDescriptor, SortDirection};
///
/// let columns = vec![ColumnDescriptor::new("age", "Age").sortable()];
/// let state = GridState::new(&columns).with_sort_toggled(&columns, "age");
/// assert_eq!(state.sort.unwrap().direction, SortDirection::Asc);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridState {
    /// The single active sort, if any
    pub sort: Option<SortSpec>,
    /// Per-column substring queries
    pub filters: FilterMap,
    /// Column the derived list is grouped by
    pub group_by: Option<String>,
    /// Group keys whose detail rows are shown
    pub expanded_groups: BTreeSet<String>,
    /// Selected positions in the derived list
    pub selection: BTreeSet<usize>,
    /// Display order of column keys
    pub column_order: Vec<String>,
    /// Current width of each column, in width units
    pub column_widths: BTreeMap<String, u32>,
}

fn find<'a>(columns: &'a [ColumnDescriptor], key: &str) -> Option<&'a ColumnDescriptor> {
    columns.iter().find(|c| c.key == key)
}

impl GridState {
    /// Initial state: no sort, filters, grouping or selection, columns in
    /// declaration order at their initial widths.
    pub fn new(columns: &[ColumnDescriptor]) -> Self {
        Self {
            column_order: columns.iter().map(|c| c.key.clone()).collect(),
            column_widths: columns
                .iter()
                .map(|c| (c.key.clone(), c.initial_width()))
                .collect(),
            ..Self::default()
        }
    }

    /// Aligns a restored state with the current column set.
    ///
    /// Unknown keys are dropped, new columns are appended in declaration
    /// order, widths are re-clamped and capability-less sort, filter and
    /// grouping entries are discarded.
    pub fn reconciled(&self, columns: &[ColumnDescriptor]) -> Self {
        let mut column_order: Vec<String> = self
            .column_order
            .iter()
            .filter(|k| find(columns, k).is_some())
            .cloned()
            .collect();
        for column in columns {
            if !column_order.contains(&column.key) {
                column_order.push(column.key.clone());
            }
        }

        let column_widths = columns
            .iter()
            .map(|c| {
                let width = self
                    .column_widths
                    .get(&c.key)
                    .map(|w| c.clamp_width(*w))
                    .unwrap_or_else(|| c.initial_width());
                (c.key.clone(), width)
            })
            .collect();

        let filters = self
            .filters
            .iter()
            .filter(|(k, _)| find(columns, k).is_some_and(|c| c.filterable))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let sort = self
            .sort
            .clone()
            .filter(|s| find(columns, &s.column).is_some_and(|c| c.sortable));

        let group_by = self
            .group_by
            .clone()
            .filter(|k| find(columns, k).is_some_and(|c| c.groupable));
        let expanded_groups = if group_by.is_some() {
            self.expanded_groups.clone()
        } else {
            BTreeSet::new()
        };

        Self {
            sort,
            filters,
            group_by,
            expanded_groups,
            selection: self.selection.clone(),
            column_order,
            column_widths,
        }
    }

    /// Replaces the filter for a filterable column. Empty text clears it.
    pub fn with_filter(&self, columns: &[ColumnDescriptor], key: &str, text: &str) -> Self {
        if !find(columns, key).is_some_and(|c| c.filterable) {
            warn!("Ignoring filter on non-filterable column '{}'", key);
            return self.clone();
        }
        let mut next = self.clone();
        if text.is_empty() {
            next.filters.remove(key);
        } else {
            next.filters.insert(key.to_string(), text.to_string());
        }
        debug!("Filter '{}' set to '{}'", key, text);
        next
    }

    pub fn without_filters(&self) -> Self {
        Self {
            filters: FilterMap::new(),
            ..self.clone()
        }
    }

    /// Makes `key` the sort column ascending, or flips the direction when it
    /// already is. There is no return to the unsorted state.
    pub fn with_sort_toggled(&self, columns: &[ColumnDescriptor], key: &str) -> Self {
        if !find(columns, key).is_some_and(|c| c.sortable) {
            warn!("Ignoring sort on non-sortable column '{}'", key);
            return self.clone();
        }
        let direction = match &self.sort {
            Some(current) if current.column == key => current.direction.flipped(),
            _ => SortDirection::Asc,
        };
        debug!("Sort '{}' {:?}", key, direction);
        Self {
            sort: Some(SortSpec::new(key, direction)),
            ..self.clone()
        }
    }

    /// Toggles one derived position. Positions outside the derived list are
    /// ignored.
    pub fn with_row_toggled(&self, index: usize, derived_len: usize) -> Self {
        if index >= derived_len {
            return self.clone();
        }
        let mut next = self.clone();
        if !next.selection.remove(&index) {
            next.selection.insert(index);
        }
        next
    }

    /// Selects every derived position, or none when all are selected.
    pub fn with_all_toggled(&self, derived_len: usize) -> Self {
        let selection = if self.is_all_selected(derived_len) {
            BTreeSet::new()
        } else {
            (0..derived_len).collect()
        };
        Self {
            selection,
            ..self.clone()
        }
    }

    pub fn without_selection(&self) -> Self {
        Self {
            selection: BTreeSet::new(),
            ..self.clone()
        }
    }

    /// Drops selected positions that no longer exist in the derived list.
    pub fn with_selection_pruned(&self, derived_len: usize) -> Self {
        Self {
            selection: self.selection.range(..derived_len).copied().collect(),
            ..self.clone()
        }
    }

    pub fn is_all_selected(&self, derived_len: usize) -> bool {
        derived_len > 0 && (0..derived_len).all(|i| self.selection.contains(&i))
    }

    /// Sets or clears grouping. Grouping by a column that is not groupable,
    /// or while grouping is disabled, leaves the grid ungrouped.
    pub fn with_group_by(
        &self,
        columns: &[ColumnDescriptor],
        options: &GridOptions,
        key: Option<&str>,
    ) -> Self {
        let group_by = match key {
            Some(key) if options.enable_row_grouping && find(columns, key).is_some_and(|c| c.groupable) => {
                Some(key.to_string())
            }
            Some(key) => {
                warn!("Ignoring grouping by column '{}'", key);
                None
            }
            None => None,
        };
        if group_by == self.group_by {
            return self.clone();
        }
        Self {
            group_by,
            expanded_groups: BTreeSet::new(),
            ..self.clone()
        }
    }

    /// Flips whether `group_key` shows its detail rows.
    pub fn with_group_toggled(&self, group_key: &str) -> Self {
        if self.group_by.is_none() {
            return self.clone();
        }
        let mut next = self.clone();
        if !next.expanded_groups.remove(group_key) {
            next.expanded_groups.insert(group_key.to_string());
        }
        next
    }

    pub fn is_group_expanded(&self, group_key: &str) -> bool {
        self.expanded_groups.contains(group_key)
    }

    /// Moves `dragged` to `target`'s position when reordering is enabled.
    pub fn with_columns_reordered(&self, options: &GridOptions, dragged: &str, target: &str) -> Self {
        if !options.enable_column_reorder {
            return self.clone();
        }
        match reorder_columns(&self.column_order, dragged, target) {
            Some(column_order) => {
                debug!("Moved column '{}' to '{}'", dragged, target);
                Self {
                    column_order,
                    ..self.clone()
                }
            }
            None => self.clone(),
        }
    }

    /// Applies a resize drag of `delta_x` that started at `start_width`.
    pub fn with_column_resized(
        &self,
        columns: &[ColumnDescriptor],
        options: &GridOptions,
        key: &str,
        start_width: u32,
        delta_x: i64,
    ) -> Self {
        let Some(column) = find(columns, key).filter(|c| c.resizable) else {
            return self.clone();
        };
        if !options.enable_column_resize {
            return self.clone();
        }
        let width = resized_width(column, start_width, delta_x, options.min_resize_width);
        let mut next = self.clone();
        next.column_widths.insert(key.to_string(), width);
        next
    }

    pub fn column_width(&self, key: &str) -> Option<u32> {
        self.column_widths.get(key).copied()
    }

    /// Layout worth persisting: everything except selection and expansion.
    pub fn layout(&self) -> Self {
        Self {
            selection: BTreeSet::new(),
            expanded_groups: BTreeSet::new(),
            ..self.clone()
        }
    }
}
