use super::json::ItemRecord;
use super::ImportError;
use crate::domain::{ColumnMapping, ScheduleValue, Status};
use serde_json::Value;

/// Default number of leading rows searched for the header
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 25;

const IDENTIFIER_KEYWORDS: &[&str] = &["wsid", "id mesin", "id_ws", "id atm", "no wsid", "data mesin"];
const LOCATION_KEYWORDS: &[&str] = &["lokasi", "alamat", "location", "site", "address"];
const SCHEDULE_KEYWORDS: &[&str] = &[
    "plan", "bulan", "month", "jadwal", "periode", "period", "tanggal", "date",
];

/// One decoded spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl Cell {
    /// Cell content as text; whole numbers print without a decimal point
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numbers are spreadsheet date serials; everything else is text
    pub fn to_schedule_value(&self) -> ScheduleValue {
        match self {
            Cell::Empty => ScheduleValue::Empty,
            Cell::Number(n) => ScheduleValue::Serial(*n),
            other => ScheduleValue::Text(other.text()),
        }
    }
}

fn matches_any(cells: &[String], keywords: &[&str]) -> bool {
    cells
        .iter()
        .any(|cell| keywords.iter().any(|keyword| cell.contains(keyword)))
}

/// Locate the header row of a raw matrix.
///
/// Looks at the first `scan_rows` rows and returns the first one that mentions
/// any identifier, location or schedule keyword. Falls back to row 0.
pub fn detect_header_row(rows: &[Vec<Cell>], scan_rows: usize) -> usize {
    for (index, row) in rows.iter().take(scan_rows).enumerate() {
        let cells: Vec<String> = row.iter().map(|c| c.text().to_lowercase()).collect();
        let score = [IDENTIFIER_KEYWORDS, LOCATION_KEYWORDS, SCHEDULE_KEYWORDS]
            .iter()
            .filter(|family| matches_any(&cells, family))
            .count();
        if score >= 1 || cells.concat().contains("wsid") {
            return index;
        }
    }
    0
}

/// Propose identifier/location/schedule columns from header names
pub fn suggest_mapping(headers: &[String]) -> ColumnMapping {
    let find = |keywords: &[&str]| {
        headers
            .iter()
            .find(|h| {
                let lower = h.to_lowercase();
                keywords.iter().any(|k| lower.contains(k))
            })
            .cloned()
    };
    ColumnMapping {
        identifier: find(IDENTIFIER_KEYWORDS).unwrap_or_default(),
        location: find(LOCATION_KEYWORDS),
        schedule: find(SCHEDULE_KEYWORDS).unwrap_or_default(),
    }
}

/// A decoded spreadsheet matrix with its header row located
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    rows: Vec<Vec<Cell>>,
    header_row: usize,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<Cell>>, scan_rows: usize) -> Self {
        let header_row = detect_header_row(&rows, scan_rows);
        Self { rows, header_row }
    }

    /// Parse a JSON matrix (`[[cell, ...], ...]`) as emitted by a workbook decoder
    pub fn from_json(raw: &str, scan_rows: usize) -> Result<Self, ImportError> {
        let matrix: Vec<Vec<Value>> = serde_json::from_str(raw)?;
        if matrix.is_empty() {
            return Err(ImportError::EmptySheet);
        }
        let rows = matrix
            .iter()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        Ok(Self::new(rows, scan_rows))
    }

    pub fn header_row(&self) -> usize {
        self.header_row
    }

    pub fn headers(&self) -> Vec<String> {
        self.rows
            .get(self.header_row)
            .map(|row| row.iter().map(|c| c.text().trim().to_string()).collect())
            .unwrap_or_default()
    }

    /// Index of a named column in the header row
    pub fn column(&self, name: &str) -> Result<usize, ImportError> {
        let wanted = name.trim();
        self.headers()
            .iter()
            .position(|h| !wanted.is_empty() && h == wanted)
            .ok_or_else(|| ImportError::MissingColumn {
                column: name.to_string(),
                row: self.header_row + 1,
            })
    }

    /// Rows strictly after the header
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        self.rows.get(self.header_row + 1..).unwrap_or(&[])
    }

    fn optional_column(&self, name: Option<&str>) -> Result<Option<usize>, ImportError> {
        match name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => self.column(name).map(Some),
            None => Ok(None),
        }
    }

    /// New outstanding items from the data rows.
    ///
    /// Rows with a blank identifier are skipped. The location column, when
    /// mapped, becomes the item notes. Schedule and location columns are
    /// optional; a named column that is not in the header is an error.
    pub fn records(&self, mapping: &ColumnMapping) -> Result<Vec<ItemRecord>, ImportError> {
        let id_column = self.column(&mapping.identifier)?;
        let location_column = self.optional_column(mapping.location.as_deref())?;
        let schedule_column = self.optional_column(Some(mapping.schedule.as_str()))?;

        let records = self
            .data_rows()
            .iter()
            .filter(|row| !cell_at(row, id_column).is_blank())
            .map(|row| ItemRecord {
                identifier: cell_at(row, id_column).text().trim().to_string(),
                notes: location_column
                    .map(|column| cell_at(row, column).text().trim().to_string())
                    .unwrap_or_default(),
                schedule: schedule_column
                    .map(|column| cell_at(row, column).to_schedule_value())
                    .unwrap_or_default(),
                status: Status::Outstanding,
                ..ItemRecord::default()
            })
            .collect();
        Ok(records)
    }
}

/// Cell at a column, treating short rows as blank
pub(crate) fn cell_at(row: &[Cell], column: usize) -> &Cell {
    const BLANK: &Cell = &Cell::Empty;
    row.get(column).unwrap_or(BLANK)
}
