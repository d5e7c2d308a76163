use crate::config::TabPolicy;
use crate::domain::{
    filter_items, normalize, ColumnMapping, Filter, Item, Placement, ScheduleValue, Status, Tab,
    TabCounts,
};
use crate::error::{Error, Result};
use crate::exchange::{import_dataset, reconcile, Dataset, ItemRecord, ReconcileOutcome, Sheet};
use crate::persistence::{load_and_migrate, StatePort, StateSnapshot};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fields for a manually entered item
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub identifier: String,
    pub notes: String,
    pub schedule: ScheduleValue,
    pub status: Status,
}

/// Partial update; `None` leaves the field as it is
#[derive(Debug, Clone, Default)]
pub struct ItemEdit {
    pub identifier: Option<String>,
    pub notes: Option<String>,
    pub schedule: Option<ScheduleValue>,
    pub status: Option<Status>,
}

/// Result of applying an imported JSON payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSummary {
    /// Items appended to one tab
    Appended { tab_id: u32, count: usize },
    /// Every tab replaced by a backup
    Replaced { tabs: usize },
}

/// Tabs and items with write-through persistence
pub struct AppState {
    pub tabs: Vec<Tab>,
    pub current_tab_id: u32,
    /// Read-side status filter, never persisted
    pub filter: Filter,
    policy: TabPolicy,
    port: Box<dyn StatePort>,
}

impl AppState {
    /// Load state from the port.
    ///
    /// Unreadable or unknown blobs fall back to a single default tab; the
    /// blob is overwritten on the next save.
    pub fn load(port: Box<dyn StatePort>, policy: TabPolicy) -> Result<Self> {
        let raw = port
            .load()
            .map_err(|e| Error::Storage(format!("{:#}", e)))?;

        let snapshot = match raw.as_deref().map(load_and_migrate) {
            Some(Some(snapshot)) => snapshot,
            Some(None) => {
                warn!("stored state is corrupt, starting with a fresh tab");
                StateSnapshot {
                    tabs: Vec::new(),
                    current_tab_id: 0,
                }
            }
            None => StateSnapshot {
                tabs: Vec::new(),
                current_tab_id: 0,
            },
        };

        let mut app = Self {
            tabs: snapshot.tabs,
            current_tab_id: snapshot.current_tab_id,
            filter: Filter::All,
            policy,
            port,
        };
        app.enforce_invariants();
        Ok(app)
    }

    /// Non-empty tab list, unique tab ids, fresh identifier keys, and a
    /// current tab that resolves
    fn enforce_invariants(&mut self) {
        if self.tabs.is_empty() {
            let tab = self.default_tab();
            self.tabs.push(tab);
        }

        let mut seen = HashSet::new();
        let mut next_id = self.tabs.iter().map(|t| t.id).max().map_or(0, |id| id.saturating_add(1));
        for tab in &mut self.tabs {
            if !seen.insert(tab.id) {
                debug!(tab = tab.id, new_id = next_id, "reassigning duplicate tab id");
                tab.id = next_id;
                seen.insert(next_id);
                next_id = next_id.saturating_add(1);
            }
            for item in &mut tab.items {
                item.refresh_key();
            }
        }

        if !seen.contains(&self.current_tab_id) {
            self.current_tab_id = self.tabs[0].id;
        }
    }

    fn default_tab(&self) -> Tab {
        Tab::new(0, Tab::default_name(&self.policy.default_name_prefix, 0))
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            tabs: self.tabs.clone(),
            current_tab_id: self.current_tab_id,
        }
    }

    /// Write the full snapshot through the port
    pub fn save(&mut self) -> Result<()> {
        let blob = self.snapshot().to_json()?;
        self.port
            .save(&blob)
            .map_err(|e| Error::Storage(format!("{:#}", e)))
    }

    fn require_confirmation(confirmed: bool, action: String) -> Result<()> {
        if confirmed {
            Ok(())
        } else {
            Err(Error::ConfirmationRequired(action))
        }
    }

    // Tabs

    pub fn tab(&self, tab_id: u32) -> Result<&Tab> {
        self.tabs
            .iter()
            .find(|tab| tab.id == tab_id)
            .ok_or(Error::TabNotFound(tab_id))
    }

    fn tab_mut(&mut self, tab_id: u32) -> Result<&mut Tab> {
        self.tabs
            .iter_mut()
            .find(|tab| tab.id == tab_id)
            .ok_or(Error::TabNotFound(tab_id))
    }

    pub fn current_tab(&self) -> &Tab {
        self.tabs
            .iter()
            .find(|tab| tab.id == self.current_tab_id)
            .unwrap_or(&self.tabs[0])
    }

    /// Create a tab and make it current
    pub fn add_tab(&mut self, name: Option<&str>) -> Result<u32> {
        if let Some(max) = self.policy.max_tabs {
            if self.tabs.len() >= max {
                return Err(Error::TabLimitReached(max));
            }
        }

        let id = self.tabs.iter().map(|t| t.id).max().map_or(0, |id| id + 1);
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Tab::default_name(&self.policy.default_name_prefix, id));

        debug!(tab = id, name = %name, "adding tab");
        self.tabs.push(Tab::new(id, name));
        self.current_tab_id = id;
        self.save()?;
        Ok(id)
    }

    pub fn rename_tab(&mut self, tab_id: u32, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("tab name cannot be empty".to_string()));
        }
        self.tab_mut(tab_id)?.name = name.to_string();
        self.save()
    }

    pub fn switch_tab(&mut self, tab_id: u32) -> Result<()> {
        self.tab(tab_id)?;
        self.current_tab_id = tab_id;
        self.save()
    }

    /// Delete a tab; deleting the last one leaves a fresh default tab
    pub fn delete_tab(&mut self, tab_id: u32, confirmed: bool) -> Result<()> {
        let tab = self.tab(tab_id)?;
        if self.policy.protect_first_tab && self.tabs[0].id == tab_id {
            return Err(Error::TabProtected(tab_id));
        }
        Self::require_confirmation(
            confirmed,
            format!("delete tab '{}' and its {} items", tab.name, tab.items.len()),
        )?;

        self.tabs.retain(|tab| tab.id != tab_id);
        if self.tabs.is_empty() {
            let tab = self.default_tab();
            self.tabs.push(tab);
        }
        if self.tab(self.current_tab_id).is_err() {
            self.current_tab_id = self.tabs[0].id;
        }
        debug!(tab = tab_id, "deleted tab");
        self.save()
    }

    // Items

    /// Resolve a 1-based position in stored order, or an item id
    pub fn resolve_item(&self, tab_id: u32, reference: &str) -> Result<Uuid> {
        let tab = self.tab(tab_id)?;
        let reference = reference.trim();
        if let Ok(position) = reference.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|index| tab.items.get(index))
                .map(|item| item.id)
                .ok_or_else(|| Error::ItemNotFound(reference.to_string()));
        }
        Uuid::parse_str(reference)
            .ok()
            .filter(|id| tab.item(*id).is_some())
            .ok_or_else(|| Error::ItemNotFound(reference.to_string()))
    }

    fn item_mut(&mut self, tab_id: u32, item_id: Uuid) -> Result<&mut Item> {
        self.tab_mut(tab_id)?
            .item_mut(item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))
    }

    pub fn add_item(&mut self, tab_id: u32, new_item: NewItem) -> Result<Uuid> {
        let identifier = new_item.identifier.trim().to_string();
        if identifier.is_empty() {
            return Err(Error::InvalidInput("identifier is required".to_string()));
        }
        let item = Item::new(identifier)
            .with_notes(new_item.notes.trim())
            .with_schedule(&new_item.schedule)
            .with_status(new_item.status);
        let id = item.id;

        self.tab_mut(tab_id)?.items.push(item);
        debug!(tab = tab_id, item = %id, "added item");
        self.save()?;
        Ok(id)
    }

    pub fn edit_item(&mut self, tab_id: u32, item_id: Uuid, edit: ItemEdit) -> Result<()> {
        if let Some(identifier) = &edit.identifier {
            if identifier.trim().is_empty() {
                return Err(Error::InvalidInput("identifier cannot be empty".to_string()));
            }
        }

        let item = self.item_mut(tab_id, item_id)?;
        if let Some(identifier) = edit.identifier {
            item.set_identifier(identifier.trim().to_string());
        }
        if let Some(notes) = edit.notes {
            item.notes = notes.trim().to_string();
        }
        if let Some(schedule) = edit.schedule {
            item.set_schedule(&schedule);
        }
        if let Some(status) = edit.status {
            item.status = status;
        }
        self.save()
    }

    pub fn delete_item(&mut self, tab_id: u32, item_id: Uuid, confirmed: bool) -> Result<()> {
        let tab = self.tab(tab_id)?;
        let item = tab
            .item(item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;
        Self::require_confirmation(confirmed, format!("delete item '{}'", item.identifier))?;

        self.tab_mut(tab_id)?.items.retain(|item| item.id != item_id);
        debug!(tab = tab_id, item = %item_id, "deleted item");
        self.save()
    }

    /// Remove every item in a tab, returning how many were removed
    pub fn clear_items(&mut self, tab_id: u32, confirmed: bool) -> Result<usize> {
        let tab = self.tab(tab_id)?;
        Self::require_confirmation(
            confirmed,
            format!("delete all {} items in '{}'", tab.items.len(), tab.name),
        )?;

        let removed = std::mem::take(&mut self.tab_mut(tab_id)?.items).len();
        debug!(tab = tab_id, removed, "cleared tab");
        self.save()?;
        Ok(removed)
    }

    pub fn set_status(&mut self, tab_id: u32, item_id: Uuid, status: Status) -> Result<()> {
        self.item_mut(tab_id, item_id)?.status = status;
        self.save()
    }

    pub fn toggle_status(&mut self, tab_id: u32, item_id: Uuid) -> Result<Status> {
        let item = self.item_mut(tab_id, item_id)?;
        item.toggle_status();
        let status = item.status;
        self.save()?;
        Ok(status)
    }

    /// Mark every item outstanding, returning how many changed
    pub fn reset_statuses(&mut self, tab_id: u32, confirmed: bool) -> Result<usize> {
        let tab = self.tab(tab_id)?;
        Self::require_confirmation(
            confirmed,
            format!("reset every item in '{}' to Outstanding", tab.name),
        )?;

        let mut changed = 0;
        for item in &mut self.tab_mut(tab_id)?.items {
            if item.status != Status::Outstanding {
                item.status = Status::Outstanding;
                changed += 1;
            }
        }
        self.save()?;
        Ok(changed)
    }

    /// Relocate one item directly before or after another
    pub fn move_item(
        &mut self,
        tab_id: u32,
        item_id: Uuid,
        target_id: Uuid,
        placement: Placement,
    ) -> Result<()> {
        let tab = self.tab_mut(tab_id)?;
        for id in [item_id, target_id] {
            if tab.item(id).is_none() {
                return Err(Error::ItemNotFound(id.to_string()));
            }
        }
        tab.relocate(item_id, target_id, placement == Placement::After);
        self.save()
    }

    /// Append imported records to a tab
    pub fn append_records(&mut self, tab_id: u32, records: Vec<ItemRecord>) -> Result<usize> {
        let tab = self.tab_mut(tab_id)?;
        let count = records.len();
        tab.items.extend(records.into_iter().map(ItemRecord::into_item));
        info!(tab = tab_id, count, "appended imported items");
        self.save()?;
        Ok(count)
    }

    /// Replace every tab with a backup
    pub fn replace_state(&mut self, snapshot: StateSnapshot, confirmed: bool) -> Result<()> {
        Self::require_confirmation(
            confirmed,
            format!(
                "replace all {} tabs with {} imported tabs",
                self.tabs.len(),
                snapshot.tabs.len()
            ),
        )?;

        self.tabs = snapshot.tabs;
        self.current_tab_id = snapshot.current_tab_id;
        self.enforce_invariants();
        info!(tabs = self.tabs.len(), "replaced state from backup");
        self.save()
    }

    /// Apply an import payload read for `tab_id`.
    ///
    /// The tab is re-validated here because it may have been deleted while
    /// the file was being read.
    pub fn import_json(&mut self, tab_id: u32, raw: &str, confirmed: bool) -> Result<ImportSummary> {
        match import_dataset(raw)? {
            Dataset::ItemList(records) => {
                self.tab(tab_id)?;
                let count = self.append_records(tab_id, records)?;
                Ok(ImportSummary::Appended { tab_id, count })
            }
            Dataset::FullState(snapshot) => {
                self.replace_state(snapshot, confirmed)?;
                Ok(ImportSummary::Replaced {
                    tabs: self.tabs.len(),
                })
            }
        }
    }

    /// Append one new item per spreadsheet data row and remember the columns.
    ///
    /// Appending to a tab that already has items needs confirmation.
    pub fn append_sheet_rows(
        &mut self,
        tab_id: u32,
        sheet: &Sheet,
        mapping: &ColumnMapping,
        confirmed: bool,
    ) -> Result<usize> {
        let tab = self.tab(tab_id)?;
        let records = sheet.records(mapping)?;
        if !tab.items.is_empty() {
            Self::require_confirmation(
                confirmed,
                format!(
                    "append {} rows to the {} items in '{}'",
                    records.len(),
                    tab.items.len(),
                    tab.name
                ),
            )?;
        }

        self.tab_mut(tab_id)?.import_mapping = mapping.clone();
        self.append_records(tab_id, records)
    }

    /// Replace a tab's identifier allow-list; an empty list shows everything.
    /// Returns how many entries were kept.
    pub fn set_allowed_identifiers(&mut self, tab_id: u32, identifiers: Vec<String>) -> Result<usize> {
        let allowed: Vec<String> = identifiers
            .iter()
            .map(|identifier| identifier.trim())
            .filter(|identifier| !normalize(identifier).is_empty())
            .map(str::to_string)
            .collect();
        let count = allowed.len();

        self.tab_mut(tab_id)?.allowed_identifiers = allowed;
        debug!(tab = tab_id, count, "set allow-list");
        self.save()?;
        Ok(count)
    }

    /// Merge spreadsheet schedules into a tab and remember the columns used.
    ///
    /// Nothing is saved when no item matched.
    pub fn reconcile_tab(
        &mut self,
        tab_id: u32,
        sheet: &Sheet,
        mapping: &ColumnMapping,
        samples: usize,
    ) -> Result<ReconcileOutcome> {
        let tab = self.tab_mut(tab_id)?;
        let outcome = reconcile(
            &mut tab.items,
            sheet,
            &mapping.identifier,
            &mapping.schedule,
            samples,
        )?;

        if let ReconcileOutcome::Updated(_) = outcome {
            tab.import_mapping = mapping.clone();
            self.save()?;
        }
        Ok(outcome)
    }

    // Views

    /// Items passing the allow-list and the current filter, in stored order
    pub fn visible_items(&self, tab_id: u32) -> Result<Vec<&Item>> {
        let tab = self.tab(tab_id)?;
        let allowed = tab.allowed_keys();
        let mut items = filter_items(&tab.items, self.filter);
        if !allowed.is_empty() {
            items.retain(|item| allowed.contains(&item.identifier_key));
        }
        Ok(items)
    }

    pub fn counts(&self, tab_id: u32) -> Result<TabCounts> {
        Ok(TabCounts::of(&self.tab(tab_id)?.items))
    }
}
