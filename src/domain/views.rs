use super::enums::{Filter, Status};
use super::item::Item;

/// Items matching a status filter, in stored order
pub fn filter_items(items: &[Item], filter: Filter) -> Vec<&Item> {
    items.iter().filter(|item| filter.matches(item.status)).collect()
}

/// Display ordering by schedule. Stable, so equal keys (including all
/// unscheduled items) keep their stored relative order. Never touches storage.
pub fn by_schedule<'a>(mut items: Vec<&'a Item>) -> Vec<&'a Item> {
    items.sort_by_key(|item| item.schedule.sort_key);
    items
}

/// Counters shown above a tab's table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabCounts {
    pub total: usize,
    pub done: usize,
    pub outstanding: usize,
}

impl TabCounts {
    pub fn of<'a>(items: impl IntoIterator<Item = &'a Item>) -> Self {
        let mut counts = TabCounts::default();
        for item in items {
            counts.total += 1;
            match item.status {
                Status::Done => counts.done += 1,
                Status::Outstanding => counts.outstanding += 1,
            }
        }
        counts
    }
}
