use crate::domain::{by_schedule, Item, Status, Tab, TabCounts};
use chrono::NaiveDate;

/// Figures across every tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalStats {
    pub tab_count: usize,
    pub counts: TabCounts,
    pub overdue_count: usize,
    pub unscheduled_count: usize,
}

/// Figures for one tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabStats {
    pub tab_id: u32,
    pub name: String,
    pub counts: TabCounts,
    /// Outstanding items dated before the report date
    pub overdue_count: usize,
    /// Items with an empty or unparseable schedule
    pub unscheduled_count: usize,
    pub next_due: Option<NaiveDate>,
}

impl TabStats {
    pub fn completion_percent(&self) -> f64 {
        if self.counts.total == 0 {
            0.0
        } else {
            self.counts.done as f64 / self.counts.total as f64 * 100.0
        }
    }
}

fn is_overdue(item: &Item, today: NaiveDate) -> bool {
    item.status == Status::Outstanding && item.schedule.date().is_some_and(|date| date < today)
}

/// Outstanding dated items, earliest first
pub fn outstanding_by_schedule(items: &[Item]) -> Vec<&Item> {
    by_schedule(
        items
            .iter()
            .filter(|item| item.status == Status::Outstanding && item.schedule.is_dated())
            .collect(),
    )
}

/// Outstanding items scheduled before `today`, earliest first
pub fn overdue_items(items: &[Item], today: NaiveDate) -> Vec<&Item> {
    by_schedule(items.iter().filter(|item| is_overdue(item, today)).collect())
}

pub fn unscheduled_items(items: &[Item]) -> Vec<&Item> {
    items.iter().filter(|item| !item.schedule.is_dated()).collect()
}

pub fn calculate_tab_stats(tab: &Tab, today: NaiveDate) -> TabStats {
    let next_due = tab
        .items
        .iter()
        .filter(|item| item.status == Status::Outstanding)
        .filter_map(|item| item.schedule.date())
        .filter(|date| *date >= today)
        .min();

    TabStats {
        tab_id: tab.id,
        name: tab.name.clone(),
        counts: TabCounts::of(&tab.items),
        overdue_count: tab.items.iter().filter(|item| is_overdue(item, today)).count(),
        unscheduled_count: unscheduled_items(&tab.items).len(),
        next_due,
    }
}

pub fn calculate_global_stats(tabs: &[Tab], today: NaiveDate) -> GlobalStats {
    let all_items = tabs.iter().flat_map(|tab| tab.items.iter());

    GlobalStats {
        tab_count: tabs.len(),
        counts: TabCounts::of(all_items.clone()),
        overdue_count: all_items.clone().filter(|item| is_overdue(item, today)).count(),
        unscheduled_count: all_items.filter(|item| !item.schedule.is_dated()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScheduleValue;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(identifier: &str, schedule: &str, status: Status) -> Item {
        Item::new(identifier.to_string())
            .with_schedule(&ScheduleValue::from(schedule))
            .with_status(status)
    }

    fn sample_tab() -> Tab {
        let mut tab = Tab::new(0, "Jakarta".to_string());
        tab.items = vec![
            item("A", "10/06/24", Status::Outstanding),
            item("B", "01/06/24", Status::Outstanding),
            item("C", "01/05/24", Status::Done),
            item("D", "", Status::Outstanding),
            item("E", "20/06/24", Status::Outstanding),
        ];
        tab
    }

    #[test]
    fn test_tab_stats() {
        let stats = calculate_tab_stats(&sample_tab(), date(2024, 6, 15));
        assert_eq!(stats.counts.total, 5);
        assert_eq!(stats.counts.done, 1);
        assert_eq!(stats.overdue_count, 2);
        assert_eq!(stats.unscheduled_count, 1);
        assert_eq!(stats.next_due, Some(date(2024, 6, 20)));
        assert!((stats.completion_percent() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overdue_sorted_by_schedule() {
        let tab = sample_tab();
        let overdue: Vec<&str> = overdue_items(&tab.items, date(2024, 6, 15))
            .iter()
            .map(|item| item.identifier.as_str())
            .collect();
        assert_eq!(overdue, vec!["B", "A"]);

        let outstanding: Vec<&str> = outstanding_by_schedule(&tab.items)
            .iter()
            .map(|item| item.identifier.as_str())
            .collect();
        assert_eq!(outstanding, vec!["B", "A", "E"]);
    }

    #[test]
    fn test_global_stats() {
        let mut second = Tab::new(1, "Bogor".to_string());
        second.items.push(item("F", "banana", Status::Done));
        let stats = calculate_global_stats(&[sample_tab(), second], date(2024, 6, 15));
        assert_eq!(stats.tab_count, 2);
        assert_eq!(stats.counts.total, 6);
        assert_eq!(stats.counts.done, 2);
        assert_eq!(stats.overdue_count, 2);
        assert_eq!(stats.unscheduled_count, 2);
    }

    #[test]
    fn test_empty_tab_completion() {
        let stats = calculate_tab_stats(&Tab::new(3, "Empty".to_string()), date(2024, 1, 1));
        assert_eq!(stats.completion_percent(), 0.0);
        assert_eq!(stats.next_due, None);
    }
}
