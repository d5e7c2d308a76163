//! Data exchange with the outside world: JSON import/export, spreadsheet
//! matrices and schedule reconciliation.

pub mod json;
pub mod reconcile;
pub mod sheet;

use thiserror::Error;

pub use json::{
    export_state_json, export_tab_json, import_dataset, snapshot_from_tabs, Dataset, ItemRecord,
};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use sheet::{suggest_mapping, Sheet};

/// Problems with an imported payload. The store is never touched when one
/// of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Unrecognized format: expected an array of items, an object with a `data` array, or a backup with `tabs`")]
    UnrecognizedFormat,

    #[error("Record {index} is not an object")]
    InvalidRecord { index: usize },

    #[error("Column `{column}` not found in header row {row}")]
    MissingColumn { column: String, row: usize },

    #[error("Spreadsheet has no rows")]
    EmptySheet,
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InvalidJson(err.to_string())
    }
}
