use super::ImportError;
use crate::domain::{ColumnMapping, Item, Schedule, ScheduleValue, Status, Tab};
use crate::persistence::StateSnapshot;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Accepted source fields per attribute, first present wins
pub const IDENTIFIER_FIELDS: &[&str] = &["machineData", "wsid", "identifier"];
pub const SCHEDULE_FIELDS: &[&str] = &["period", "plan", "scheduleLabel", "schedule"];
pub const NOTES_FIELDS: &[&str] = &["notes", "note"];
pub const STATUS_FIELDS: &[&str] = &["status"];

/// Identifier given to records that carry none
const UNKNOWN_IDENTIFIER: &str = "Unknown";

/// Tab name prefix for backups that omit names
const BACKUP_TAB_PREFIX: &str = "Tab";

/// An imported item before it gets an id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemRecord {
    pub identifier: String,
    pub notes: String,
    pub schedule: ScheduleValue,
    pub status: Status,
    /// Already-resolved schedule from a backup; used as is instead of `schedule`
    pub stored_schedule: Option<Schedule>,
    pub created_at: Option<DateTime<Local>>,
}

impl ItemRecord {
    pub fn into_item(self) -> Item {
        let mut item = Item::new(self.identifier)
            .with_notes(self.notes)
            .with_status(self.status);
        match self.stored_schedule {
            Some(schedule) => item.schedule = schedule,
            None => item.set_schedule(&self.schedule),
        }
        if let Some(created_at) = self.created_at {
            item.created_at = created_at;
        }
        item
    }
}

/// What an imported JSON file turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    /// A full backup; applying it replaces every tab
    FullState(StateSnapshot),
    /// Items to append to one tab
    ItemList(Vec<ItemRecord>),
}

/// Exported item shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub machine_data: String,
    pub period: String,
    pub status: String,
    pub notes: String,
}

/// Classify and parse an import payload.
///
/// - object with a `tabs` array: full backup
/// - array, or object with a `data` array: item list
pub fn import_dataset(raw: &str) -> Result<Dataset, ImportError> {
    let value: Value = serde_json::from_str(raw)?;
    match &value {
        Value::Object(map) => {
            if let Some(Value::Array(tabs)) = map.get("tabs") {
                let current = map.get("currentTabId").and_then(Value::as_u64);
                return Ok(Dataset::FullState(snapshot_from_tabs(tabs, current)?));
            }
            if let Some(Value::Array(records)) = map.get("data") {
                return Ok(Dataset::ItemList(records_from_values(records)?));
            }
            Err(ImportError::UnrecognizedFormat)
        }
        Value::Array(records) => Ok(Dataset::ItemList(records_from_values(records)?)),
        _ => Err(ImportError::UnrecognizedFormat),
    }
}

fn records_from_values(values: &[Value]) -> Result<Vec<ItemRecord>, ImportError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => Ok(record_from_map(map)),
            _ => Err(ImportError::InvalidRecord { index }),
        })
        .collect()
}

/// First alias whose value is present (non-null, non-blank)
fn first_present<'a>(map: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields.iter().filter_map(|field| map.get(*field)).find(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn schedule_value(value: &Value) -> ScheduleValue {
    match value {
        Value::Number(n) => n.as_f64().map(ScheduleValue::Serial).unwrap_or(ScheduleValue::Empty),
        Value::String(s) => ScheduleValue::Text(s.clone()),
        // Objects without a usable sort key fall back to their label
        Value::Object(inner) => match inner.get("label") {
            Some(Value::String(label)) => ScheduleValue::Text(label.clone()),
            _ => ScheduleValue::Empty,
        },
        _ => ScheduleValue::Empty,
    }
}

/// A persisted `{label, sortKey}` object, kept verbatim
fn stored_schedule(value: &Value) -> Option<Schedule> {
    match value {
        Value::Object(inner) if inner.get("sortKey").is_some_and(Value::is_i64) => {
            serde_json::from_value(value.clone()).ok()
        }
        _ => None,
    }
}

fn record_from_map(map: &Map<String, Value>) -> ItemRecord {
    let identifier = first_present(map, IDENTIFIER_FIELDS)
        .map(value_text)
        .unwrap_or_else(|| UNKNOWN_IDENTIFIER.to_string());
    let notes = first_present(map, NOTES_FIELDS).map(value_text).unwrap_or_default();
    let schedule_field = first_present(map, SCHEDULE_FIELDS);
    let schedule = schedule_field.map(schedule_value).unwrap_or(ScheduleValue::Empty);
    let stored_schedule = schedule_field.and_then(stored_schedule);
    let status = first_present(map, STATUS_FIELDS)
        .and_then(Value::as_str)
        .map(Status::from_label)
        .unwrap_or_default();
    let created_at = map
        .get("createdAt")
        .cloned()
        .and_then(|v| serde_json::from_value::<DateTime<Local>>(v).ok());

    ItemRecord {
        identifier,
        notes,
        schedule,
        status,
        stored_schedule,
        created_at,
    }
}

/// Build a snapshot from backup-style tab objects.
///
/// Items come from `items` or the older `data` field; missing or duplicate
/// tab ids are reassigned. Item ids are always fresh, but a stored
/// `{label, sortKey}` schedule and `createdAt` are kept.
pub fn snapshot_from_tabs(tabs: &[Value], current_tab_id: Option<u64>) -> Result<StateSnapshot, ImportError> {
    let mut used_ids = HashSet::new();
    let mut parsed = Vec::with_capacity(tabs.len());

    for (index, value) in tabs.iter().enumerate() {
        let Value::Object(map) = value else {
            return Err(ImportError::InvalidRecord { index });
        };

        let records = match map.get("items").or_else(|| map.get("data")) {
            Some(Value::Array(records)) => records_from_values(records)?,
            _ => Vec::new(),
        };

        let requested = map
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok());
        let id = match requested {
            Some(id) if !used_ids.contains(&id) => id,
            _ => next_free_id(&used_ids),
        };
        used_ids.insert(id);

        let name = map
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Tab::default_name(BACKUP_TAB_PREFIX, id));

        let mut tab = Tab::new(id, name);
        tab.items = records.into_iter().map(ItemRecord::into_item).collect();
        tab.import_mapping = map
            .get("importMapping")
            .cloned()
            .and_then(|v| serde_json::from_value::<ColumnMapping>(v).ok())
            .unwrap_or_default();
        tab.allowed_identifiers = map
            .get("allowedIdentifiers")
            .cloned()
            .and_then(|v| serde_json::from_value::<Vec<String>>(v).ok())
            .unwrap_or_default();
        parsed.push(tab);
    }

    let current_tab_id = current_tab_id
        .and_then(|id| u32::try_from(id).ok())
        .filter(|id| used_ids.contains(id))
        .or_else(|| parsed.first().map(|tab| tab.id))
        .unwrap_or(0);

    Ok(StateSnapshot {
        tabs: parsed,
        current_tab_id,
    })
}

fn next_free_id(used: &HashSet<u32>) -> u32 {
    (0..).find(|id| !used.contains(id)).unwrap_or(u32::MAX)
}

/// Export a tab's items with only their user-facing fields
pub fn export_tab(tab: &Tab) -> Vec<ExportRecord> {
    tab.items
        .iter()
        .map(|item| ExportRecord {
            machine_data: item.identifier.clone(),
            period: item.schedule.label.clone(),
            status: item.status.label().to_string(),
            notes: item.notes.clone(),
        })
        .collect()
}

pub fn export_tab_json(tab: &Tab) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_tab(tab))
}

/// Full backup of every tab
pub fn export_state_json(snapshot: &StateSnapshot) -> serde_json::Result<String> {
    snapshot.to_json()
}
