use super::sheet::{cell_at, Sheet};
use super::ImportError;
use crate::domain::{normalize, parse_schedule, Item, Schedule};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Counts from one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Items whose schedule was overwritten
    pub updated: usize,
    /// Distinct identifier keys found in the sheet
    pub lookup_size: usize,
    /// Data rows with a non-empty identifier
    pub source_rows: usize,
}

/// Samples from both sides when nothing matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDiagnostic {
    pub report: ReconcileReport,
    pub sheet_samples: Vec<String>,
    pub item_samples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Updated(ReconcileReport),
    /// Zero updates although items have identifiers; most likely the two
    /// sides use different identifier formats
    NoMatches(MatchDiagnostic),
}

impl ReconcileOutcome {
    pub fn report(&self) -> &ReconcileReport {
        match self {
            ReconcileOutcome::Updated(report) => report,
            ReconcileOutcome::NoMatches(diagnostic) => &diagnostic.report,
        }
    }
}

/// Identifier key to schedule, keeping first-seen key order for diagnostics
struct Lookup {
    schedules: HashMap<String, Schedule>,
    order: Vec<String>,
    source_rows: usize,
}

fn build_lookup(sheet: &Sheet, id_column: usize, schedule_column: usize) -> Lookup {
    let mut lookup = Lookup {
        schedules: HashMap::new(),
        order: Vec::new(),
        source_rows: 0,
    };

    for row in sheet.data_rows() {
        let id_cell = cell_at(row, id_column);
        if id_cell.is_blank() {
            continue;
        }
        lookup.source_rows += 1;

        let key = normalize(&id_cell.text());
        if key.is_empty() {
            debug!(identifier = %id_cell.text(), "skipping row without a usable identifier");
            continue;
        }

        let schedule = parse_schedule(&cell_at(row, schedule_column).to_schedule_value());
        // Later rows win for duplicate identifiers
        if lookup.schedules.insert(key.clone(), schedule).is_none() {
            lookup.order.push(key);
        }
    }

    lookup
}

/// Merge schedules from a sheet into existing items.
///
/// Items are matched by identifier key. Only `schedule` is overwritten; notes,
/// status, identifier and id are left alone, and no item is added or removed.
/// Stored order is not changed.
pub fn reconcile(
    items: &mut [Item],
    sheet: &Sheet,
    identifier_column: &str,
    schedule_column: &str,
    sample_size: usize,
) -> Result<ReconcileOutcome, ImportError> {
    let id_column = sheet.column(identifier_column)?;
    let schedule_column = sheet.column(schedule_column)?;
    let lookup = build_lookup(sheet, id_column, schedule_column);

    let mut updated = 0;
    for item in items.iter_mut() {
        if item.identifier_key.is_empty() {
            item.refresh_key();
        }
        if let Some(schedule) = lookup.schedules.get(&item.identifier_key) {
            item.schedule = schedule.clone();
            updated += 1;
        }
    }

    let report = ReconcileReport {
        updated,
        lookup_size: lookup.schedules.len(),
        source_rows: lookup.source_rows,
    };

    let has_identifiers = items.iter().any(|item| !item.identifier_key.is_empty());
    if updated == 0 && has_identifiers {
        let diagnostic = MatchDiagnostic {
            report,
            sheet_samples: lookup.order.iter().take(sample_size).cloned().collect(),
            item_samples: items
                .iter()
                .filter(|item| !item.identifier_key.is_empty())
                .take(sample_size)
                .map(|item| item.identifier_key.clone())
                .collect(),
        };
        warn!(
            sheet = ?diagnostic.sheet_samples,
            items = ?diagnostic.item_samples,
            "no items matched the imported sheet"
        );
        return Ok(ReconcileOutcome::NoMatches(diagnostic));
    }

    info!(
        updated = report.updated,
        lookup = report.lookup_size,
        rows = report.source_rows,
        "reconciled schedules"
    );
    Ok(ReconcileOutcome::Updated(report))
}
