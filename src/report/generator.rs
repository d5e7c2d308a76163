use crate::domain::{Item, Tab};
use crate::report::stats::{
    calculate_global_stats, calculate_tab_stats, outstanding_by_schedule, overdue_items,
    unscheduled_items,
};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::PathBuf;

/// Format percentage with 1 decimal place
fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

fn format_schedule(item: &Item) -> String {
    if item.schedule.label.is_empty() {
        "-".to_string()
    } else {
        item.schedule.label.clone()
    }
}

fn push_item(report: &mut String, item: &Item) {
    report.push_str(&format!("- **{}** ({})", item.identifier, format_schedule(item)));
    if !item.notes.is_empty() {
        report.push_str(&format!(" - {}", item.notes));
    }
    report.push('\n');
}

/// Render the markdown summary of every tab as of `report_date`
pub fn render_report(tabs: &[Tab], report_date: NaiveDate) -> String {
    let global = calculate_global_stats(tabs, report_date);
    let mut report = String::new();

    report.push_str(&format!("# Work Plan Report - {}\n\n", report_date));

    report.push_str("## Summary\n\n");
    report.push_str(&format!(
        "- **Items:** {} across {} tabs (Done: {}, Outstanding: {})\n",
        global.counts.total, global.tab_count, global.counts.done, global.counts.outstanding
    ));
    report.push_str(&format!("- **Overdue:** {}\n", global.overdue_count));
    report.push_str(&format!("- **Unscheduled:** {}\n\n", global.unscheduled_count));

    for tab in tabs {
        let stats = calculate_tab_stats(tab, report_date);
        report.push_str(&format!("## {}\n\n", stats.name));
        report.push_str(&format!(
            "- **Progress:** {}/{} done ({})\n",
            stats.counts.done,
            stats.counts.total,
            format_percent(stats.completion_percent())
        ));
        if let Some(next_due) = stats.next_due {
            report.push_str(&format!("- **Next due:** {}\n", next_due.format("%d/%m/%y")));
        }
        report.push('\n');

        let overdue = overdue_items(&tab.items, report_date);
        if !overdue.is_empty() {
            report.push_str("### Overdue\n\n");
            for item in overdue {
                push_item(&mut report, item);
            }
            report.push('\n');
        }

        let upcoming: Vec<&Item> = outstanding_by_schedule(&tab.items)
            .into_iter()
            .filter(|item| item.schedule.date().is_some_and(|date| date >= report_date))
            .collect();
        if !upcoming.is_empty() {
            report.push_str("### Upcoming\n\n");
            for item in upcoming {
                push_item(&mut report, item);
            }
            report.push('\n');
        }

        let unscheduled = unscheduled_items(&tab.items);
        if !unscheduled.is_empty() {
            report.push_str("### Unscheduled\n\n");
            for item in unscheduled {
                push_item(&mut report, item);
            }
            report.push('\n');
        }
    }

    report
}

/// Write a report for the given date (default today). Defaults to
/// `report-YYYY-MM-DD.md` in the data directory.
pub fn generate_report(
    tabs: &[Tab],
    date: Option<NaiveDate>,
    output_path: Option<PathBuf>,
) -> Result<PathBuf> {
    let report_date = date.unwrap_or_else(|| Local::now().date_naive());
    let report = render_report(tabs, report_date);

    let output = if let Some(path) = output_path {
        path
    } else {
        crate::persistence::ensure_data_dir()?.join(format!("report-{}.md", report_date))
    };

    fs::write(&output, report)
        .with_context(|| format!("Failed to write report: {}", output.display()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScheduleValue, Status};

    fn sample_tabs() -> Vec<Tab> {
        let mut tab = Tab::new(0, "Jakarta".to_string());
        tab.items = vec![
            Item::new("S1A01".to_string())
                .with_schedule(&ScheduleValue::from("01/06/24"))
                .with_notes("ganti kaset"),
            Item::new("S1A02".to_string()).with_schedule(&ScheduleValue::from("20/06/24")),
            Item::new("S1A03".to_string()).with_status(Status::Done),
            Item::new("S1A04".to_string()).with_schedule(&ScheduleValue::from("nanti")),
        ];
        vec![tab, Tab::new(1, "Bogor".to_string())]
    }

    #[test]
    fn test_render_report_sections() {
        let report = render_report(&sample_tabs(), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());

        assert!(report.starts_with("# Work Plan Report - 2024-06-15"));
        assert!(report.contains("- **Items:** 4 across 2 tabs (Done: 1, Outstanding: 3)"));
        assert!(report.contains("- **Overdue:** 1"));
        assert!(report.contains("## Jakarta"));
        assert!(report.contains("- **Progress:** 1/4 done (25.0%)"));
        assert!(report.contains("- **Next due:** 20/06/24"));
        assert!(report.contains("### Overdue\n\n- **S1A01** (01/06/24) - ganti kaset"));
        assert!(report.contains("### Upcoming\n\n- **S1A02** (20/06/24)"));
        assert!(report.contains("- **S1A03** (-)"));
        assert!(report.contains("- **S1A04** (nanti)"));
        assert!(report.contains("## Bogor\n\n- **Progress:** 0/0 done (0.0%)"));
    }

    #[test]
    fn test_generate_report_writes_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("report.md");
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        let path = generate_report(&sample_tabs(), Some(date), Some(output.clone())).unwrap();

        assert_eq!(path, output);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("## Jakarta"));
    }
}
