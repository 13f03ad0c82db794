use super::errors::InfrastructureResult;
use crate::domain::{ColumnDescriptor, Row};
use log::info;

/// Renders rows as tab-separated text with a header line.
///
/// Tabs and newlines inside cells are replaced by spaces so that every row
/// stays on one line.
pub fn rows_as_tsv(columns: &[&ColumnDescriptor], rows: &[&Row]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| sanitize(&c.header))
            .collect::<Vec<_>>()
            .join("\t"),
    );
    for row in rows {
        lines.push(
            columns
                .iter()
                .map(|c| sanitize(&c.display(row)))
                .collect::<Vec<_>>()
                .join("\t"),
        );
    }
    lines.join("\n")
}

fn sanitize(cell: &str) -> String {
    cell.replace(['\t', '\n', '\r'], " ")
}

/// Places `rows` on the system clipboard. Returns the number of rows copied.
pub fn copy_rows(columns: &[&ColumnDescriptor], rows: &[&Row]) -> InfrastructureResult<usize> {
    let text = rows_as_tsv(columns, rows);
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)?;
    info!("Copied {} rows to clipboard", rows.len());
    Ok(rows.len())
}
