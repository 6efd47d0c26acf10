// Typed in-memory table: columns carry an explicit value-kind tag

use crate::error::TableError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::io::Read;

/// Value kind tag attached to every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    UInt,
    Float,
    Complex,
    Str,
}

impl ValueKind {
    /// Boolean, signed, unsigned, float and complex columns count as numeric.
    pub fn is_numeric(self) -> bool {
        !matches!(self, ValueKind::Str)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::Complex => "complex",
            ValueKind::Str => "str",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

/// Column storage, one typed vector per kind
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Float(Vec<f64>),
    Complex(Vec<Complex>),
    Str(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::UInt(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Complex(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ColumnData::Bool(_) => ValueKind::Bool,
            ColumnData::Int(_) => ValueKind::Int,
            ColumnData::UInt(_) => ValueKind::UInt,
            ColumnData::Float(_) => ValueKind::Float,
            ColumnData::Complex(_) => ValueKind::Complex,
            ColumnData::Str(_) => ValueKind::Str,
        }
    }

    fn head(&self, n: usize) -> ColumnData {
        let n = n.min(self.len());
        match self {
            ColumnData::Bool(v) => ColumnData::Bool(v[..n].to_vec()),
            ColumnData::Int(v) => ColumnData::Int(v[..n].to_vec()),
            ColumnData::UInt(v) => ColumnData::UInt(v[..n].to_vec()),
            ColumnData::Float(v) => ColumnData::Float(v[..n].to_vec()),
            ColumnData::Complex(v) => ColumnData::Complex(v[..n].to_vec()),
            ColumnData::Str(v) => ColumnData::Str(v[..n].to_vec()),
        }
    }

    fn append(&mut self, other: &ColumnData) -> bool {
        match (self, other) {
            (ColumnData::Bool(a), ColumnData::Bool(b)) => a.extend_from_slice(b),
            (ColumnData::Int(a), ColumnData::Int(b)) => a.extend_from_slice(b),
            (ColumnData::UInt(a), ColumnData::UInt(b)) => a.extend_from_slice(b),
            (ColumnData::Float(a), ColumnData::Float(b)) => a.extend_from_slice(b),
            (ColumnData::Complex(a), ColumnData::Complex(b)) => a.extend_from_slice(b),
            (ColumnData::Str(a), ColumnData::Str(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }
}

impl From<Vec<bool>> for ColumnData {
    fn from(v: Vec<bool>) -> Self {
        ColumnData::Bool(v)
    }
}

impl From<Vec<i32>> for ColumnData {
    fn from(v: Vec<i32>) -> Self {
        ColumnData::Int(v.into_iter().map(i64::from).collect())
    }
}

impl From<Vec<i64>> for ColumnData {
    fn from(v: Vec<i64>) -> Self {
        ColumnData::Int(v)
    }
}

impl From<Vec<u64>> for ColumnData {
    fn from(v: Vec<u64>) -> Self {
        ColumnData::UInt(v)
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self {
        ColumnData::Float(v)
    }
}

impl From<Vec<Complex>> for ColumnData {
    fn from(v: Vec<Complex>) -> Self {
        ColumnData::Complex(v)
    }
}

impl From<Vec<String>> for ColumnData {
    fn from(v: Vec<String>) -> Self {
        ColumnData::Str(v)
    }
}

impl From<Vec<&str>> for ColumnData {
    fn from(v: Vec<&str>) -> Self {
        ColumnData::Str(v.into_iter().map(str::to_string).collect())
    }
}

/// Hashable identity of a single cell, used for duplicate detection.
/// Every NaN is one key and -0.0 equals 0.0.
#[derive(Hash, PartialEq, Eq)]
enum CellKey<'a> {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(u64),
    Complex(u64, u64),
    Str(&'a str),
}

fn float_key(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn kind(&self) -> ValueKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn key(&self, row: usize) -> CellKey<'_> {
        match &self.data {
            ColumnData::Bool(v) => CellKey::Bool(v[row]),
            ColumnData::Int(v) => CellKey::Int(v[row]),
            ColumnData::UInt(v) => CellKey::UInt(v[row]),
            ColumnData::Float(v) => CellKey::Float(float_key(v[row])),
            ColumnData::Complex(v) => CellKey::Complex(float_key(v[row].re), float_key(v[row].im)),
            ColumnData::Str(v) => CellKey::Str(&v[row]),
        }
    }

    /// Marks every occurrence of a value after its first appearance.
    pub fn duplicated(&self) -> Vec<bool> {
        let mut seen = HashSet::with_capacity(self.len());
        (0..self.len()).map(|row| !seen.insert(self.key(row))).collect()
    }

    pub fn has_duplicates(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.len());
        (0..self.len()).any(|row| !seen.insert(self.key(row)))
    }

    /// Display text of a cell, used for category labels.
    pub fn label(&self, row: usize) -> Option<String> {
        if row >= self.len() {
            return None;
        }
        let text = match &self.data {
            ColumnData::Bool(v) => String::from(if v[row] { "True" } else { "False" }),
            ColumnData::Int(v) => v[row].to_string(),
            ColumnData::UInt(v) => v[row].to_string(),
            ColumnData::Float(v) => format_float(v[row]),
            ColumnData::Complex(v) => {
                let c = v[row];
                let sign = if c.im.is_sign_negative() { '-' } else { '+' };
                format!("({}{}{}i)", format_float(c.re), sign, format_float(c.im.abs()))
            }
            ColumnData::Str(v) => v[row].clone(),
        };
        Some(text)
    }

    /// Numeric view of the column. Booleans map to 0/1 and complex values to their real part.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match &self.data {
            ColumnData::Bool(v) => Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            ColumnData::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            ColumnData::UInt(v) => Some(v.iter().map(|&x| x as f64).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            ColumnData::Complex(v) => Some(v.iter().map(|c| c.re).collect()),
            ColumnData::Str(_) => None,
        }
    }
}

/// A numeric series keyed by the labels of another column, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedSeries {
    pub index_name: String,
    pub name: String,
    pub entries: Vec<(String, f64)>,
}

impl KeyedSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table; columns must share one length and have distinct names.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(TableError::Malformed(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    first.len()
                )));
            }
        }

        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(TableError::Malformed(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn height(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.height() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.head(n),
                })
                .collect(),
        }
    }

    /// Rows of `self` followed by rows of `other`. Both tables need the same
    /// column names and kinds, in the same order.
    pub fn concat(&self, other: &Table) -> Result<Table, TableError> {
        if self.column_names() != other.column_names() {
            return Err(TableError::Malformed(
                "cannot concatenate tables with different columns".to_string(),
            ));
        }

        let mut columns = self.columns.clone();
        for (column, extra) in columns.iter_mut().zip(&other.columns) {
            if !column.data.append(&extra.data) {
                return Err(TableError::Malformed(format!(
                    "column '{}' is {} in one table and {} in the other",
                    column.name,
                    column.kind(),
                    extra.kind()
                )));
            }
        }

        Ok(Table { columns })
    }

    /// Re-key `value_col` by the labels of `index_col`. The table is left untouched.
    pub fn set_index(&self, index_col: &str, value_col: &str) -> Result<KeyedSeries, TableError> {
        let index = self.column(index_col)?;
        let values = self.column(value_col)?;
        let numbers = values.to_f64().ok_or_else(|| {
            TableError::Malformed(format!(
                "column '{}' holds {} values, expected numbers",
                value_col,
                values.kind()
            ))
        })?;

        let entries = numbers
            .into_iter()
            .enumerate()
            .map(|(row, v)| (index.label(row).unwrap_or_default(), v))
            .collect();

        Ok(KeyedSeries {
            index_name: index_col.to_string(),
            name: value_col.to_string(),
            entries,
        })
    }

    /// Read a CSV document with a header row, inferring each column's kind.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

        for result in rdr.records() {
            let record = result.map_err(ragged_rows_are_malformed)?;
            for (column, field) in cells.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| infer_text_column(name, values))
            .collect();

        Table::new(columns)
    }

    /// Build a table from a JSON array of objects. The first object's keys give the columns.
    pub fn from_json(value: &Value) -> Result<Self, TableError> {
        let array = value.as_array().ok_or_else(|| {
            TableError::Malformed("input data must be a JSON array of objects".to_string())
        })?;

        let Some(first) = array.first() else {
            return Ok(Table::default());
        };

        let first_obj = first.as_object().ok_or_else(|| {
            TableError::Malformed("items in array must be objects".to_string())
        })?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut cells: Vec<Vec<&Value>> = vec![Vec::with_capacity(array.len()); headers.len()];
        for item in array {
            let obj = item.as_object().ok_or_else(|| {
                TableError::Malformed("items in array must be objects".to_string())
            })?;
            for (header, column) in headers.iter().zip(cells.iter_mut()) {
                column.push(obj.get(header).unwrap_or(&NULL));
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| infer_json_column(name, &values))
            .collect::<Result<Vec<_>, _>>()?;

        Table::new(columns)
    }
}

static NULL: Value = Value::Null;

fn ragged_rows_are_malformed(err: csv::Error) -> TableError {
    if let csv::ErrorKind::UnequalLengths { pos, expected_len, len } = err.kind() {
        let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
        return TableError::Malformed(format!(
            "row on line {} has {} fields, expected {}",
            line, len, expected_len
        ));
    }
    TableError::Csv(err)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Infer the narrowest kind for a column of CSV text. Blank cells are only
/// allowed in numeric columns, where they become NaN.
fn infer_text_column(name: String, values: Vec<String>) -> Column {
    if values.is_empty() {
        return Column::new(name, ColumnData::Str(values));
    }

    let trimmed: Vec<&str> = values.iter().map(|v| v.trim()).collect();
    let has_blank = trimmed.iter().any(|v| v.is_empty());
    let filled = || trimmed.iter().copied().filter(|v| !v.is_empty());

    if !has_blank {
        if let Some(bools) = trimmed.iter().map(|v| parse_bool(v)).collect::<Option<Vec<_>>>() {
            return Column::new(name, bools);
        }
        if let Some(ints) = trimmed.iter().map(|v| v.parse::<i64>().ok()).collect::<Option<Vec<_>>>() {
            return Column::new(name, ints);
        }
        if let Some(uints) = trimmed.iter().map(|v| v.parse::<u64>().ok()).collect::<Option<Vec<_>>>() {
            return Column::new(name, uints);
        }
    }

    if filled().all(|v| v.parse::<f64>().is_ok()) {
        let floats: Vec<f64> = trimmed
            .iter()
            .map(|v| v.parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        return Column::new(name, floats);
    }

    Column::new(name, values)
}

fn infer_json_column(name: String, values: &[&Value]) -> Result<Column, TableError> {
    let has_null = values.iter().any(|v| v.is_null());
    let filled: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();

    if !has_null && values.iter().all(|v| v.is_boolean()) {
        let bools = values.iter().filter_map(|v| v.as_bool()).collect::<Vec<_>>();
        return Ok(Column::new(name, bools));
    }

    if filled.iter().all(|v| v.is_number()) {
        if !has_null {
            if let Some(ints) = values.iter().map(|v| v.as_i64()).collect::<Option<Vec<_>>>() {
                return Ok(Column::new(name, ints));
            }
            if let Some(uints) = values.iter().map(|v| v.as_u64()).collect::<Option<Vec<_>>>() {
                return Ok(Column::new(name, uints));
            }
        }
        let floats: Vec<f64> = values
            .iter()
            .map(|v| v.as_f64().unwrap_or(f64::NAN))
            .collect();
        return Ok(Column::new(name, floats));
    }

    let strings = values
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok(String::new()),
            _ => Err(TableError::Malformed(format!(
                "unsupported value type for field '{}'",
                name
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Column::new(name, strings))
}
