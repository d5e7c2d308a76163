use super::identifier::normalize;
use super::item::Item;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Spreadsheet column names last used for a tab (advisory only)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    #[serde(default)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub schedule: String,
}

/// A named, ordered list of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: u32,
    pub name: String,
    /// Persisted (drag) order
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub import_mapping: ColumnMapping,
    /// Identifiers to show; empty shows every item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_identifiers: Vec<String>,
}

impl Tab {
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            items: Vec::new(),
            import_mapping: ColumnMapping::default(),
            allowed_identifiers: Vec::new(),
        }
    }

    /// Default tab name, e.g. "Tab 1" for id 0
    pub fn default_name(prefix: &str, id: u32) -> String {
        format!("{} {}", prefix, id + 1)
    }

    pub fn position(&self, item_id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id == item_id)
    }

    pub fn item(&self, item_id: Uuid) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: Uuid) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    /// Matching keys of the allow-list. Entries without a key are ignored.
    pub fn allowed_keys(&self) -> HashSet<String> {
        self.allowed_identifiers
            .iter()
            .map(|identifier| normalize(identifier))
            .filter(|key| !key.is_empty())
            .collect()
    }

    /// Move one item to sit directly before or after another.
    /// Returns false when either id is unknown.
    pub fn relocate(&mut self, item_id: Uuid, target_id: Uuid, after: bool) -> bool {
        if item_id == target_id {
            return self.position(item_id).is_some();
        }
        let Some(from) = self.position(item_id) else {
            return false;
        };
        if self.position(target_id).is_none() {
            return false;
        }

        let item = self.items.remove(from);
        // Target index shifts once the moved item is out of the list
        let target = self.position(target_id).unwrap_or(self.items.len());
        let insert_at = if after { target + 1 } else { target };
        self.items.insert(insert_at, item);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab_with(names: &[&str]) -> Tab {
        let mut tab = Tab::new(0, "Tab 1".to_string());
        for name in names {
            tab.items.push(Item::new(name.to_string()));
        }
        tab
    }

    fn order(tab: &Tab) -> Vec<&str> {
        tab.items.iter().map(|i| i.identifier.as_str()).collect()
    }

    #[test]
    fn test_default_name() {
        assert_eq!(Tab::default_name("Tab", 0), "Tab 1");
        assert_eq!(Tab::default_name("Rute", 4), "Rute 5");
    }

    #[test]
    fn test_relocate_before_and_after() {
        let mut tab = tab_with(&["a", "b", "c", "d"]);
        let a = tab.items[0].id;
        let c = tab.items[2].id;
        let d = tab.items[3].id;

        assert!(tab.relocate(a, c, false));
        assert_eq!(order(&tab), vec!["b", "a", "c", "d"]);

        assert!(tab.relocate(a, d, true));
        assert_eq!(order(&tab), vec!["b", "c", "d", "a"]);

        assert!(tab.relocate(d, tab.items[0].id, false));
        assert_eq!(order(&tab), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_allowed_keys_normalize_entries() {
        let mut tab = tab_with(&[]);
        assert!(tab.allowed_keys().is_empty());

        tab.allowed_identifiers = ["S1A01 Mall", "s1a01", "--", "!!"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut keys: Vec<String> = tab.allowed_keys().into_iter().collect();
        keys.sort();
        assert_eq!(keys, vec!["--", "s1a01"]);
    }

    #[test]
    fn test_relocate_unknown_ids() {
        let mut tab = tab_with(&["a", "b"]);
        let a = tab.items[0].id;
        assert!(!tab.relocate(a, Uuid::new_v4(), true));
        assert!(!tab.relocate(Uuid::new_v4(), a, true));
        assert!(tab.relocate(a, a, true));
        assert_eq!(order(&tab), vec!["a", "b"]);
    }
}
