use crate::domain::Tab;
use serde::{Deserialize, Serialize};

/// The persisted application state blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub current_tab_id: u32,
}

impl StateSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Strict parse of the current persisted format
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
