use super::errors::{InfrastructureError, InfrastructureResult};
use crate::application::GridState;
use crate::domain::{validate_columns, ColumnDescriptor, GridOptions, Row, Value};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// On-disk encoding of a row file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    /// Guesses the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => DataFormat::Csv,
            _ => DataFormat::Json,
        }
    }
}

/// Columns, options and optionally the saved grid state of one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub options: GridOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<GridState>,
}

impl LayoutDocument {
    pub fn new(columns: Vec<ColumnDescriptor>, options: GridOptions, state: Option<GridState>) -> Self {
        Self { columns, options, state }
    }

    /// Layout for rows that arrive without one.
    pub fn inferred(rows: &[Row]) -> Self {
        Self::new(ColumnDescriptor::infer_from_rows(rows), GridOptions::default(), None)
    }
}

pub struct FileRepository;

impl FileRepository {
    /// Loads rows from `path`, picking the format from the extension unless
    /// one is given.
    pub fn load_rows(path: &Path, format: Option<DataFormat>) -> InfrastructureResult<Vec<Row>> {
        let rows = match format.unwrap_or_else(|| DataFormat::from_path(path)) {
            DataFormat::Json => Self::parse_rows_json(&fs::read_to_string(path)?)?,
            DataFormat::Csv => Self::read_rows_csv(fs::File::open(path)?)?,
        };
        info!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Parses a JSON array of objects.
    ///
    /// # Examples
    ///
    /// ```
    /// use agrigrid::infrastructure::FileRepository;
    ///
    /// let rows = FileRepository::parse_rows_json(r#"[{"crop": "maize", "acres": 4}]"#).unwrap();
    /// assert_eq!(rows.len(), 1);
    /// assert!(FileRepository::parse_rows_json(r#"{"crop": "maize"}"#).is_err());
    /// ```
    pub fn parse_rows_json(text: &str) -> InfrastructureResult<Vec<Row>> {
        let items = match serde_json::from_str::<serde_json::Value>(text)? {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(InfrastructureError::Shape(format!(
                    "expected an array of objects, found {}",
                    json_kind(&other)
                )));
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                if !item.is_object() {
                    return Err(InfrastructureError::Shape(format!(
                        "expected an object at index {}, found {}",
                        index,
                        json_kind(&item)
                    )));
                }
                Ok(serde_json::from_value::<Row>(item)?)
            })
            .collect()
    }

    /// Reads rows from CSV with a header line. Empty cells become null and
    /// cells that look like numbers or booleans are typed accordingly.
    pub fn read_rows_csv<R: Read>(reader: R) -> InfrastructureResult<Vec<Row>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(Row::from_pairs(
                headers.iter().zip(record.iter()).map(|(key, cell)| (key, parse_cell(cell))),
            ));
        }
        Ok(rows)
    }

    pub fn load_layout(path: &Path) -> InfrastructureResult<LayoutDocument> {
        let content = fs::read_to_string(path)?;
        let layout: LayoutDocument = serde_json::from_str(&content)?;
        validate_columns(&layout.columns)?;
        info!("Loaded layout with {} columns from {}", layout.columns.len(), path.display());
        Ok(layout)
    }

    pub fn save_layout(layout: &LayoutDocument, filename: &str) -> InfrastructureResult<String> {
        let json = serde_json::to_string_pretty(layout)?;
        fs::write(filename, json)?;
        info!("Saved layout to {}", filename);
        Ok(filename.to_string())
    }

    /// Writes `rows` to a CSV file using the columns' headers and display
    /// text. Returns the number of data rows written.
    pub fn export_csv(
        columns: &[&ColumnDescriptor],
        rows: &[&Row],
        filename: &str,
    ) -> InfrastructureResult<usize> {
        let count = Self::write_csv(fs::File::create(filename)?, columns, rows)?;
        info!("Exported {} rows to {}", count, filename);
        Ok(count)
    }

    pub fn write_csv<W: Write>(
        writer: W,
        columns: &[&ColumnDescriptor],
        rows: &[&Row],
    ) -> InfrastructureResult<usize> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(columns.iter().map(|c| c.header.as_str()))?;
        for row in rows {
            writer.write_record(columns.iter().map(|c| c.display(row)))?;
        }
        writer.flush()?;
        Ok(rows.len())
    }
}

fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(cell.to_string()),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
