use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Sort key for schedules that could not be resolved to a date; sorts last
pub const SORT_KEY_MAX: i64 = i64::MAX;

/// Display format for resolved schedules
const LABEL_FORMAT: &str = "%d/%m/%y";

static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/-](\d{1,2})(?:[/-](\d{4}|\d{2}))?$").expect("valid regex")
});
static MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/-](\d{4}|\d{2})$").expect("valid regex"));
static MONTH_NAME_SHORT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)[-'](\d{2})$").expect("valid regex"));

/// Raw schedule value as it arrives from manual entry, JSON or a spreadsheet cell
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScheduleValue {
    #[default]
    Empty,
    Text(String),
    /// Spreadsheet serial day count (days since 1899-12-30)
    Serial(f64),
    Date(NaiveDate),
}

impl From<&str> for ScheduleValue {
    fn from(value: &str) -> Self {
        ScheduleValue::Text(value.to_string())
    }
}

impl From<String> for ScheduleValue {
    fn from(value: String) -> Self {
        ScheduleValue::Text(value)
    }
}

impl From<f64> for ScheduleValue {
    fn from(value: f64) -> Self {
        ScheduleValue::Serial(value)
    }
}

impl From<NaiveDate> for ScheduleValue {
    fn from(value: NaiveDate) -> Self {
        ScheduleValue::Date(value)
    }
}

/// Display label plus ordering key for an item's schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub label: String,
    pub sort_key: i64,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::unscheduled()
    }
}

impl Schedule {
    pub fn unscheduled() -> Self {
        Self {
            label: String::new(),
            sort_key: SORT_KEY_MAX,
        }
    }

    /// Resolved schedule: `DD/MM/YY` label keyed by midnight UTC in milliseconds
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            label: date.format(LABEL_FORMAT).to_string(),
            sort_key: date.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
        }
    }

    /// Unparseable input kept verbatim so it stays visible
    fn verbatim(label: &str) -> Self {
        Self {
            label: label.to_string(),
            sort_key: SORT_KEY_MAX,
        }
    }

    /// Whether the schedule resolved to a calendar date
    pub fn is_dated(&self) -> bool {
        self.sort_key != SORT_KEY_MAX
    }

    pub fn date(&self) -> Option<NaiveDate> {
        if !self.is_dated() {
            return None;
        }
        DateTime::from_timestamp_millis(self.sort_key).map(|dt| dt.date_naive())
    }
}

/// Parse a schedule value, filling missing years with the current local year
pub fn parse_schedule(value: &ScheduleValue) -> Schedule {
    parse_schedule_in_year(value, Local::now().year())
}

/// Parse a schedule value against an explicit reference year.
///
/// Rules are tried in order: spreadsheet serial, date value, `D/M[/Y]`,
/// `M/Y`, then free text (ISO dates and month names). Anything else keeps its
/// trimmed text as the label with [`SORT_KEY_MAX`].
pub fn parse_schedule_in_year(value: &ScheduleValue, reference_year: i32) -> Schedule {
    match value {
        ScheduleValue::Empty => Schedule::unscheduled(),
        ScheduleValue::Serial(serial) => match date_from_serial(*serial) {
            Some(date) => Schedule::from_date(date),
            None => Schedule::verbatim(&format_serial(*serial)),
        },
        ScheduleValue::Date(date) => Schedule::from_date(*date),
        ScheduleValue::Text(raw) => parse_text(raw, reference_year),
    }
}

fn parse_text(raw: &str, reference_year: i32) -> Schedule {
    let text = raw.trim();
    if text.is_empty() {
        return Schedule::unscheduled();
    }

    parse_day_month(text, reference_year)
        .or_else(|| parse_month_year(text))
        .or_else(|| parse_free_text(text, reference_year))
        .map(Schedule::from_date)
        .unwrap_or_else(|| Schedule::verbatim(text))
}

fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    // Fractional part is the time of day, which the label does not carry
    let days = serial.floor();
    if days.abs() > 100_000_000.0 {
        return None;
    }
    let offset = chrono::Duration::try_days(days as i64)?;
    epoch.checked_add_signed(offset)
}

fn format_serial(serial: f64) -> String {
    if serial.is_finite() && serial.fract() == 0.0 && serial.abs() < 1e15 {
        format!("{}", serial as i64)
    } else {
        serial.to_string()
    }
}

fn expand_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    if digits.len() <= 2 {
        Some(2000 + year)
    } else {
        Some(year)
    }
}

/// `D/M`, `D/M/YY`, `D/M/YYYY` (also with `-`)
fn parse_day_month(text: &str, reference_year: i32) -> Option<NaiveDate> {
    let caps = DAY_MONTH.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        Some(y) => expand_year(y.as_str())?,
        None => reference_year,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `M/YY`, `M/YYYY` (also with `-`), first of the month
fn parse_month_year(text: &str) -> Option<NaiveDate> {
    let caps = MONTH_YEAR.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let year = expand_year(&caps[2])?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn parse_free_text(text: &str, reference_year: i32) -> Option<NaiveDate> {
    parse_iso_like(text).or_else(|| parse_month_name(text, reference_year))
}

fn parse_iso_like(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }
    None
}

/// Month number for English or Indonesian month names and abbreviations
fn month_from_name(word: &str) -> Option<u32> {
    let month = match word.to_lowercase().as_str() {
        "jan" | "january" | "januari" => 1,
        "feb" | "february" | "februari" | "pebruari" => 2,
        "mar" | "march" | "maret" => 3,
        "apr" | "april" => 4,
        "may" | "mei" => 5,
        "jun" | "june" | "juni" => 6,
        "jul" | "july" | "juli" => 7,
        "aug" | "august" | "agu" | "agt" | "ags" | "agustus" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" | "okt" | "oktober" => 10,
        "nov" | "nop" | "november" => 11,
        "dec" | "december" | "des" | "desember" => 12,
        _ => return None,
    };
    Some(month)
}

fn is_weekday_name(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "mon" | "monday" | "tue" | "tues" | "tuesday" | "wed" | "wednesday" | "thu" | "thur"
            | "thurs" | "thursday" | "fri" | "friday" | "sat" | "saturday" | "sun" | "sunday"
            | "senin" | "selasa" | "rabu" | "kamis" | "jumat" | "sabtu" | "minggu"
    )
}

/// Dates spelled with a month name, e.g. "15 Juni 2024", "March 5, 2024",
/// "Jun 2024", "Agt-24" or just "Mei".
fn parse_month_name(text: &str, reference_year: i32) -> Option<NaiveDate> {
    // Spreadsheet "mmm-yy" display format: the digits are the year
    if let Some(caps) = MONTH_NAME_SHORT_YEAR.captures(text) {
        let month = month_from_name(&caps[1])?;
        let year = expand_year(&caps[2])?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    let mut month = None;
    let mut year = None;
    let mut numbers: Vec<u32> = Vec::new();

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if token.chars().all(|c| c.is_ascii_digit()) {
            match token.len() {
                1 | 2 => numbers.push(token.parse().ok()?),
                4 => {
                    if year.is_some() {
                        return None;
                    }
                    year = Some(token.parse::<i32>().ok()?);
                }
                _ => return None,
            }
        } else if let Some(m) = month_from_name(token) {
            if month.is_some() {
                return None;
            }
            month = Some(m);
        } else if !is_weekday_name(token) {
            return None;
        }
    }

    let month = month?;
    let day = match (numbers.as_slice(), year) {
        ([], _) => 1,
        ([n], Some(_)) => *n,
        ([n], None) if *n > 31 => {
            year = Some(2000 + *n as i32);
            1
        }
        ([n], None) => *n,
        ([d, y], None) => {
            year = Some(2000 + *y as i32);
            *d
        }
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year.unwrap_or(reference_year), month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> Schedule {
        parse_schedule_in_year(&ScheduleValue::from(value), 2024)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_is_unscheduled() {
        assert_eq!(text(""), Schedule::unscheduled());
        assert_eq!(text("   "), Schedule::unscheduled());
        assert_eq!(parse_schedule(&ScheduleValue::Empty), Schedule::unscheduled());
        assert!(!Schedule::unscheduled().is_dated());
    }

    #[test]
    fn test_unparseable_text_kept_verbatim() {
        let schedule = text("banana");
        assert_eq!(schedule.label, "banana");
        assert_eq!(schedule.sort_key, SORT_KEY_MAX);

        let schedule = text("  after lebaran ");
        assert_eq!(schedule.label, "after lebaran");
        assert_eq!(schedule.sort_key, SORT_KEY_MAX);

        // Impossible date in every form
        assert_eq!(text("31/2/24").label, "31/2/24");
        assert!(!text("31/2/24").is_dated());
    }

    #[test]
    fn test_day_month_year() {
        let schedule = text("5/3/24");
        assert_eq!(schedule.label, "05/03/24");
        assert_eq!(schedule.sort_key, Schedule::from_date(ymd(2024, 3, 5)).sort_key);

        assert_eq!(text("15-6-2024").label, "15/06/24");
        assert_eq!(text("01/12/1999").label, "01/12/99");
        assert_eq!(text("01/12/1999").date(), Some(ymd(1999, 12, 1)));
    }

    #[test]
    fn test_label_round_trip_keeps_sort_key() {
        for raw in ["5/3/24", "15-6-2024", "1/1/30", "28/02/2023"] {
            let first = text(raw);
            let second = text(&first.label);
            assert_eq!(first, second, "round trip changed {:?}", raw);
        }
    }

    #[test]
    fn test_day_month_defaults_to_reference_year() {
        let schedule = parse_schedule_in_year(&ScheduleValue::from("5/3"), 2023);
        assert_eq!(schedule.label, "05/03/23");
    }

    #[test]
    fn test_month_year() {
        assert_eq!(text("3/2024").label, "01/03/24");
        assert_eq!(text("11-2025").date(), Some(ymd(2025, 11, 1)));
        // Not a valid day/month, so it is read as month/year
        assert_eq!(text("3/24").label, "01/03/24");
    }

    #[test]
    fn test_spreadsheet_serial() {
        assert_eq!(parse_schedule(&ScheduleValue::Serial(44256.0)).label, "01/03/21");
        assert_eq!(parse_schedule(&ScheduleValue::Serial(44287.0)).label, "01/04/21");
        // Time of day does not move the date
        let schedule = parse_schedule(&ScheduleValue::Serial(45458.75));
        assert_eq!(schedule.label, "15/06/24");
        assert_eq!(schedule.date(), Some(ymd(2024, 6, 15)));
    }

    #[test]
    fn test_bad_serial_degrades() {
        let schedule = parse_schedule(&ScheduleValue::Serial(f64::NAN));
        assert_eq!(schedule.sort_key, SORT_KEY_MAX);
        assert_eq!(schedule.label, "NaN");

        let schedule = parse_schedule(&ScheduleValue::Serial(1e300));
        assert_eq!(schedule.sort_key, SORT_KEY_MAX);
    }

    #[test]
    fn test_date_value_used_directly() {
        let schedule = parse_schedule(&ScheduleValue::Date(ymd(2024, 12, 25)));
        assert_eq!(schedule.label, "25/12/24");
        assert_eq!(schedule.date(), Some(ymd(2024, 12, 25)));
    }

    #[test]
    fn test_free_text_iso() {
        assert_eq!(text("2024-06-15").label, "15/06/24");
        assert_eq!(text("2024/06/15").label, "15/06/24");
        assert_eq!(text("2024-06-15T08:30:00Z").label, "15/06/24");
        assert_eq!(text("15.06.2024").label, "15/06/24");
    }

    #[test]
    fn test_free_text_month_names() {
        assert_eq!(text("15 Juni 2024").label, "15/06/24");
        assert_eq!(text("March 5, 2024").label, "05/03/24");
        assert_eq!(text("Jun 2024").label, "01/06/24");
        assert_eq!(text("Des 2023").label, "01/12/23");
        assert_eq!(text("Agt-24").label, "01/08/24");
        assert_eq!(text("Saturday, 15 June 2024").label, "15/06/24");
        assert_eq!(parse_schedule_in_year(&ScheduleValue::from("Mei"), 2025).label, "01/05/25");
        assert_eq!(text("Jan 24").label, "24/01/24");
    }

    #[test]
    fn test_month_name_rejects_noise() {
        assert!(!text("Jun banana").is_dated());
        assert!(!text("Jan Feb 2024").is_dated());
        assert!(!text("30 Feb 2024").is_dated());
    }

    #[test]
    fn test_sort_keys_order_by_date() {
        let early = text("01/01/24");
        let late = text("02/01/24");
        assert!(early.sort_key < late.sort_key);
        assert!(late.sort_key < text("not a date").sort_key);
    }
}
