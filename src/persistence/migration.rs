use super::snapshot::StateSnapshot;
use crate::exchange::snapshot_from_tabs;
use serde_json::Value;
use tracing::{info, warn};

/// Turn a stored blob into a snapshot.
///
/// The current format is tried first. Older layouts are accepted too:
/// - tabs keeping their items under `data`
/// - a bare array of tab objects with no `currentTabId`
///
/// Returns `None` when the blob is unreadable; the caller starts fresh.
pub fn load_and_migrate(raw: &str) -> Option<StateSnapshot> {
    match StateSnapshot::from_json(raw) {
        Ok(snapshot) => return Some(snapshot),
        Err(e) => info!(error = %e, "state is not in the current format, trying older layouts"),
    }

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "stored state is not valid JSON");
            return None;
        }
    };

    let migrated = match &value {
        Value::Object(map) => match map.get("tabs") {
            Some(Value::Array(tabs)) => {
                snapshot_from_tabs(tabs, map.get("currentTabId").and_then(Value::as_u64)).ok()
            }
            _ => None,
        },
        Value::Array(tabs) if tabs.iter().all(is_legacy_tab) => snapshot_from_tabs(tabs, None).ok(),
        _ => None,
    };

    match &migrated {
        Some(snapshot) => info!(tabs = snapshot.tabs.len(), "migrated stored state"),
        None => warn!("stored state has an unknown layout"),
    }
    migrated
}

fn is_legacy_tab(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| map.contains_key("data") || map.contains_key("items"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Item, Status, Tab};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_current_format_is_loaded_as_is() {
        let mut tab = Tab::new(2, "Rute".to_string());
        tab.items.push(Item::new("A".to_string()));
        let snapshot = StateSnapshot {
            tabs: vec![tab],
            current_tab_id: 2,
        };
        let loaded = load_and_migrate(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_tabs_with_data_field_are_migrated() {
        let raw = r#"{"tabs": [{"id": 1, "name": "Old", "data": [{"wsid": "S1", "status": "Done"}]}], "currentTabId": 1}"#;
        let loaded = load_and_migrate(raw).unwrap();
        assert_eq!(loaded.current_tab_id, 1);
        assert_eq!(loaded.tabs[0].name, "Old");
        assert_eq!(loaded.tabs[0].items[0].identifier, "S1");
        assert_eq!(loaded.tabs[0].items[0].status, Status::Done);
    }

    #[test]
    fn test_bare_tab_array_is_migrated() {
        let raw = r#"[{"name": "A", "data": []}, {"name": "B", "items": [{"machineData": "M"}]}]"#;
        let loaded = load_and_migrate(raw).unwrap();
        assert_eq!(loaded.tabs.len(), 2);
        assert_eq!(loaded.current_tab_id, 0);
        assert_eq!(loaded.tabs[1].items[0].identifier, "M");
    }

    #[test]
    fn test_unreadable_state_yields_none() {
        assert_eq!(load_and_migrate("{broken"), None);
        assert_eq!(load_and_migrate("42"), None);
        assert_eq!(load_and_migrate(r#"[{"wsid": "x"}]"#), None);
    }
}
