use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::errors::{DomainError, DomainResult};

/// Width given to columns that do not declare one, in width units.
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

/// A single field value inside a row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Coerces a possibly missing field the way `String(v)` would.
    ///
    /// ```
    /// use agrigrid::domain::Value;
    ///
    /// assert_eq!(Value::coerce(Some(&Value::Number(30.0))), "30");
    /// assert_eq!(Value::coerce(Some(&Value::Null)), "null");
    /// assert_eq!(Value::coerce(None), "undefined");
    /// ```
    pub fn coerce(value: Option<&Value>) -> String {
        match value {
            Some(v) => v.to_string(),
            None => "undefined".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.is_infinite() => {
                write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Formats a finite number the way `String(n)` does: negative zero prints as
/// `0`, and magnitudes of at least `1e21` or below `1e-6` use exponent form.
fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) || n.is_nan() {
        return n.to_string();
    }
    let scientific = format!("{:e}", n);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
        _ => scientific,
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            nested => Value::Text(nested.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// One record of the grid's input collection.
///
/// Fields keep the order in which they were inserted so that columns can be
/// inferred in the order the data source presents them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from `(key, value)` pairs.
    ///
    /// ```
    /// use agrigrid::domain::{Row, Value};
    ///
    /// let row = Row::from_pairs([("name", Value::from("Alice")), ("age", Value::from(30))]);
    /// assert_eq!(row.get("age"), Some(&Value::Number(30.0)));
    /// assert!(row.get("missing").is_none());
    /// ```
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut row = Row::new();
        for (key, value) in pairs {
            row.insert(key, value);
        }
        row
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts or replaces a field, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::{MapAccess, Visitor};

        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object of field values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut row = Row::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    row.insert(key, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Direction of the single active sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Display format applied to a column when no render callback is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    #[default]
    Plain,
    Number,
    Currency,
    Percent,
    Boolean,
}

impl ColumnFormat {
    /// Formats a value for display. Missing and null values render empty.
    pub fn apply(self, value: Option<&Value>) -> String {
        let value = match value {
            None | Some(Value::Null) => return String::new(),
            Some(v) => v,
        };
        match (self, value) {
            (ColumnFormat::Number, Value::Number(n)) => group_thousands(*n, None),
            (ColumnFormat::Currency, Value::Number(n)) => {
                let body = group_thousands(n.abs(), Some(2));
                if *n < 0.0 { format!("-${}", body) } else { format!("${}", body) }
            }
            (ColumnFormat::Percent, Value::Number(n)) => format!("{}%", round_to(*n, 2)),
            (ColumnFormat::Boolean, Value::Bool(b)) => (if *b { "Yes" } else { "No" }).to_string(),
            _ => value.to_string(),
        }
    }
}

fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor).round() / factor
}

fn group_thousands(n: f64, fixed_decimals: Option<usize>) -> String {
    if !n.is_finite() {
        return Value::Number(n).to_string();
    }
    let text = match fixed_decimals {
        Some(d) => format!("{:.*}", d, n),
        None => round_to(n, 2).to_string(),
    };
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Pure function turning a field value into display text.
#[derive(Clone)]
pub struct CellRenderer(Arc<dyn Fn(Option<&Value>, &Row) -> String + Send + Sync>);

impl CellRenderer {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(Option<&Value>, &Row) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(render))
    }

    pub fn render(&self, value: Option<&Value>, row: &Row) -> String {
        (self.0)(value, row)
    }
}

impl fmt::Debug for CellRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CellRenderer(..)")
    }
}

/// Describes how one field is shown, sorted, filtered and grouped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub key: String,
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub resizable: bool,
    #[serde(default)]
    pub groupable: bool,
    #[serde(default)]
    pub format: ColumnFormat,
    #[serde(skip)]
    pub render: Option<CellRenderer>,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width: None,
            min_width: None,
            max_width: None,
            sortable: false,
            filterable: false,
            resizable: false,
            groupable: false,
            format: ColumnFormat::Plain,
            render: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn resizable(mut self) -> Self {
        self.resizable = true;
        self
    }

    pub fn groupable(mut self) -> Self {
        self.groupable = true;
        self
    }

    /// Enables every interactive feature on the column.
    pub fn interactive(self) -> Self {
        self.sortable().filterable().resizable().groupable()
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_bounds(mut self, min_width: Option<u32>, max_width: Option<u32>) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }

    pub fn with_format(mut self, format: ColumnFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(Option<&Value>, &Row) -> String + Send + Sync + 'static,
    {
        self.render = Some(CellRenderer::new(render));
        self
    }

    /// Display text for this column's field on `row`.
    pub fn display(&self, row: &Row) -> String {
        let value = row.get(&self.key);
        match &self.render {
            Some(renderer) => renderer.render(value, row),
            None => self.format.apply(value),
        }
    }

    /// Clamps `width` into the column's own `[minWidth, maxWidth]` bounds.
    pub fn clamp_width(&self, width: u32) -> u32 {
        let width = self.min_width.map_or(width, |min| width.max(min));
        self.max_width.map_or(width, |max| width.min(max))
    }

    pub fn initial_width(&self) -> u32 {
        self.clamp_width(self.width.unwrap_or(DEFAULT_COLUMN_WIDTH))
    }

    /// Infers fully interactive columns from the union of row keys, in
    /// first-seen order.
    pub fn infer_from_rows(rows: &[Row]) -> Vec<ColumnDescriptor> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for row in rows {
            for key in row.keys() {
                if seen.insert(key.to_string()) {
                    keys.push(key.to_string());
                }
            }
        }

        keys.into_iter()
            .map(|key| {
                let format = infer_format(rows, &key);
                ColumnDescriptor::new(key.clone(), humanize_key(&key))
                    .interactive()
                    .with_format(format)
            })
            .collect()
    }
}

fn infer_format(rows: &[Row], key: &str) -> ColumnFormat {
    let values: Vec<&Value> = rows
        .iter()
        .filter_map(|r| r.get(key))
        .filter(|v| !v.is_null())
        .collect();
    if values.is_empty() {
        ColumnFormat::Plain
    } else if values.iter().all(|v| matches!(v, Value::Number(_))) {
        ColumnFormat::Number
    } else if values.iter().all(|v| matches!(v, Value::Bool(_))) {
        ColumnFormat::Boolean
    } else {
        ColumnFormat::Plain
    }
}

/// Turns `loan_amount` or `loanAmount` into `Loan Amount`.
pub fn humanize_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rejects column sets that cannot describe a table.
pub fn validate_columns(columns: &[ColumnDescriptor]) -> DomainResult<()> {
    let mut keys = HashSet::new();
    for (index, column) in columns.iter().enumerate() {
        if column.key.is_empty() {
            return Err(DomainError::EmptyColumnKey(index));
        }
        if !keys.insert(column.key.as_str()) {
            return Err(DomainError::DuplicateColumnKey(column.key.clone()));
        }
        if let (Some(min), Some(max)) = (column.min_width, column.max_width) {
            if min > max {
                return Err(DomainError::InvalidWidthBounds {
                    key: column.key.clone(),
                    min,
                    max,
                });
            }
        }
    }
    Ok(())
}

/// Feature switches and layout bounds for one grid instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridOptions {
    pub enable_column_resize: bool,
    pub enable_column_reorder: bool,
    pub enable_row_grouping: bool,
    /// Minimum body height in terminal rows.
    pub min_height: Option<u16>,
    /// Maximum body height in terminal rows.
    pub max_height: Option<u16>,
    /// Floor applied to every drag resize, in width units.
    pub min_resize_width: u32,
    /// Width units per terminal character cell.
    pub pixels_per_cell: u32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            enable_column_resize: true,
            enable_column_reorder: true,
            enable_row_grouping: true,
            min_height: None,
            max_height: None,
            min_resize_width: 80,
            pixels_per_cell: 8,
        }
    }
}
