//! Column layout math: reordering and drag resizing.

use super::models::ColumnDescriptor;

/// Moves `dragged` to the index `target` occupies, keeping every other
/// column in relative order.
///
/// Returns `None` when either key is absent or both name the same column.
///
/// ```
/// use agrigrid::domain::reorder_columns;
///
/// let order: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
/// let moved = reorder_columns(&order, "d", "b").unwrap();
/// assert_eq!(moved, vec!["a", "d", "b", "c"]);
/// ```
pub fn reorder_columns(order: &[String], dragged: &str, target: &str) -> Option<Vec<String>> {
    if dragged == target {
        return None;
    }
    let from = order.iter().position(|k| k == dragged)?;
    let to = order.iter().position(|k| k == target)?;

    let mut next = order.to_vec();
    let column = next.remove(from);
    next.insert(to, column);
    Some(next)
}

/// Width produced by a resize drag of `delta_x` from `start_width`.
///
/// The `floor` is applied first and the column's own bounds last, so the
/// result always stays within `[min_width, max_width]`.
///
/// ```
/// use agrigrid::domain::{resized_width, ColumnDescriptor};
///
/// let column = ColumnDescriptor::new("a", "A").resizable().with_bounds(Some(40), Some(60));
/// assert_eq!(resized_width(&column, 60, -100, 80), 60);
/// ```
pub fn resized_width(column: &ColumnDescriptor, start_width: u32, delta_x: i64, floor: u32) -> u32 {
    let raw = (i64::from(start_width) + delta_x).clamp(0, i64::from(u32::MAX)) as u32;
    column.clamp_width(raw.max(floor))
}
