mod app;
mod config;
mod domain;
mod error;
mod exchange;
mod persistence;
mod report;

use anyhow::{Context, Result};
use app::{AppState, ImportSummary, ItemEdit, NewItem};
use clap::{Parser, Subcommand};
use config::Config;
use domain::{by_schedule, ColumnMapping, Filter, Placement, ScheduleValue, Status};
use exchange::{export_state_json, export_tab_json, suggest_mapping, ReconcileOutcome, Sheet};
use persistence::{ensure_data_dir, init_local_data_dir, read_import, FileStatePort};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "workplan")]
#[command(version)]
#[command(about = "Tabbed work planner: track machines, merge spreadsheet schedules, mark work done", long_about = None)]
struct Cli {
    /// Tab to operate on. Defaults to the current tab.
    #[arg(long, global = true)]
    tab: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .workplan directory in the current directory
    Init,
    /// List tabs with their item counts
    Tabs,
    /// Create, rename, delete or switch tabs
    Tab {
        #[command(subcommand)]
        command: TabCommands,
    },
    /// List items of a tab
    List {
        /// all, done or outstanding
        #[arg(short, long, value_parser = parse_filter, default_value = "all")]
        filter: Filter,
        /// Order by schedule instead of stored order
        #[arg(long)]
        by_schedule: bool,
    },
    /// Add an item
    Add {
        identifier: String,
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Schedule, e.g. 15/6/24, Jun 2024 or 2024-06-15
        #[arg(short, long)]
        schedule: Option<String>,
        /// Mark the item done right away
        #[arg(long)]
        done: bool,
    },
    /// Edit an item (position or id)
    Edit {
        item: String,
        #[arg(long)]
        identifier: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        #[arg(short, long)]
        schedule: Option<String>,
    },
    /// Set an item's status
    Status {
        item: String,
        #[arg(value_parser = parse_status)]
        status: Status,
    },
    /// Flip an item between done and outstanding
    Toggle { item: String },
    /// Delete an item
    Rm {
        item: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete every item in the tab
    Clear {
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark every item in the tab outstanding
    ResetStatus {
        #[arg(short, long)]
        yes: bool,
    },
    /// Move an item next to another one
    Move {
        item: String,
        #[arg(long, conflicts_with = "after", required_unless_present = "after")]
        before: Option<String>,
        #[arg(long)]
        after: Option<String>,
    },
    /// Import a JSON item list (appended) or a backup (replaces everything)
    Import {
        file: PathBuf,
        /// Confirm replacing all tabs when the file is a backup
        #[arg(short, long)]
        yes: bool,
    },
    /// Export the tab's items as JSON
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export every tab as a JSON backup
    Backup {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the detected header row of a spreadsheet matrix (JSON rows)
    Headers { file: PathBuf },
    /// Merge schedules from a spreadsheet matrix into the tab's items
    Reconcile {
        file: PathBuf,
        /// Identifier column. Defaults to the tab's last mapping or a guess.
        #[arg(long)]
        id_column: Option<String>,
        /// Schedule column. Defaults to the tab's last mapping or a guess.
        #[arg(long)]
        schedule_column: Option<String>,
    },
    /// Add one item per row of a spreadsheet matrix
    ImportSheet {
        file: PathBuf,
        #[arg(long)]
        id_column: Option<String>,
        /// Column copied into the item notes
        #[arg(long)]
        location_column: Option<String>,
        #[arg(long)]
        schedule_column: Option<String>,
        /// Confirm appending to a tab that already has items
        #[arg(short, long)]
        yes: bool,
    },
    /// Only show these identifiers in the tab (comma separated); no arguments clears the list
    Allow { identifiers: Vec<String> },
    /// Generate a markdown report
    Report {
        /// Date to report on (YYYY-MM-DD format). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        /// Output file path. Defaults to report-YYYY-MM-DD.md in the data directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TabCommands {
    /// Create a tab and switch to it
    Add { name: Option<String> },
    Rename { id: u32, name: String },
    Delete {
        id: u32,
        #[arg(short, long)]
        yes: bool,
    },
    Switch { id: u32 },
}

fn parse_filter(value: &str) -> std::result::Result<Filter, String> {
    Filter::parse(value).ok_or_else(|| format!("unknown filter '{}' (all|done|outstanding)", value))
}

fn parse_status(value: &str) -> std::result::Result<Status, String> {
    match value.trim().to_lowercase().as_str() {
        "done" => Ok(Status::Done),
        "outstanding" => Ok(Status::Outstanding),
        _ => Err(format!("unknown status '{}' (done|outstanding)", value)),
    }
}

fn schedule_arg(value: Option<String>) -> ScheduleValue {
    value.map(ScheduleValue::from).unwrap_or_default()
}

#[tokio::main]
async fn main() {
    // Tracing is opt-in via RUST_LOG
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        let code = err
            .downcast_ref::<error::Error>()
            .map(error::Error::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

/// Data directory, its config, and the store loaded from it
fn open_store() -> Result<(AppState, Config)> {
    let data_dir = ensure_data_dir()?;
    let config = Config::load_from_dir(&data_dir);
    let port = FileStatePort::in_dir(&data_dir, &config.storage.state_file);
    let app = AppState::load(Box::new(port), config.tabs.clone())?;
    Ok((app, config))
}

fn write_output(content: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn init() -> Result<()> {
    let current_dir = std::env::current_dir().context("Could not determine current directory")?;
    let data_dir = init_local_data_dir(&current_dir)?;
    Config::default().save(&data_dir.join(config::CONFIG_FILE))?;
    println!("Initialized workplan directory: {}", data_dir.display());
    println!();
    println!("workplan will now use this local directory for its state.");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // Init must not open (and so create) a store first
    if matches!(cli.command, Commands::Init) {
        return init();
    }

    let (mut app, config) = open_store()?;
    let tab_id = cli.tab.unwrap_or(app.current_tab_id);

    match cli.command {
        Commands::Init => unreachable!("init returns before the store is opened"),
        Commands::Tabs => {
            for tab in &app.tabs {
                let counts = app.counts(tab.id)?;
                let marker = if tab.id == app.current_tab_id { "*" } else { " " };
                println!(
                    "{} {:>3}  {}  ({} items, {} done, {} outstanding)",
                    marker, tab.id, tab.name, counts.total, counts.done, counts.outstanding
                );
            }
        }
        Commands::Tab { command } => match command {
            TabCommands::Add { name } => {
                let id = app.add_tab(name.as_deref())?;
                println!("Created tab {} ({})", id, app.tab(id)?.name);
            }
            TabCommands::Rename { id, name } => {
                app.rename_tab(id, &name)?;
                println!("Renamed tab {}", id);
            }
            TabCommands::Delete { id, yes } => {
                app.delete_tab(id, yes)?;
                println!("Deleted tab {}", id);
            }
            TabCommands::Switch { id } => {
                app.switch_tab(id)?;
                println!("Switched to tab {} ({})", id, app.current_tab().name);
            }
        },
        Commands::List {
            filter,
            by_schedule: sorted,
        } => {
            app.filter = filter;
            let tab = app.tab(tab_id)?;
            let mut items = app.visible_items(tab_id)?;
            if sorted {
                items = by_schedule(items);
            }
            println!("{} ({} of {} items)", tab.name, items.len(), tab.items.len());
            for item in items {
                let position = tab.position(item.id).map_or(0, |index| index + 1);
                let mark = if item.status.is_done() { "x" } else { " " };
                let schedule = if item.schedule.label.is_empty() {
                    "-"
                } else {
                    item.schedule.label.as_str()
                };
                print!("{:>4}. [{}] {}  {}", position, mark, item.identifier, schedule);
                if !item.notes.is_empty() {
                    print!("  {}", item.notes);
                }
                println!();
            }
        }
        Commands::Add {
            identifier,
            notes,
            schedule,
            done,
        } => {
            let status = if done { Status::Done } else { Status::Outstanding };
            let id = app.add_item(
                tab_id,
                NewItem {
                    identifier,
                    notes,
                    schedule: schedule_arg(schedule),
                    status,
                },
            )?;
            println!("Added {}", id);
        }
        Commands::Edit {
            item,
            identifier,
            notes,
            schedule,
        } => {
            let item_id = app.resolve_item(tab_id, &item)?;
            app.edit_item(
                tab_id,
                item_id,
                ItemEdit {
                    identifier,
                    notes,
                    schedule: schedule.map(ScheduleValue::from),
                    status: None,
                },
            )?;
            println!("Updated {}", item_id);
        }
        Commands::Status { item, status } => {
            let item_id = app.resolve_item(tab_id, &item)?;
            app.set_status(tab_id, item_id, status)?;
            println!("{} is {}", item, status.label());
        }
        Commands::Toggle { item } => {
            let item_id = app.resolve_item(tab_id, &item)?;
            let status = app.toggle_status(tab_id, item_id)?;
            println!("{} is {}", item, status.label());
        }
        Commands::Rm { item, yes } => {
            let item_id = app.resolve_item(tab_id, &item)?;
            app.delete_item(tab_id, item_id, yes)?;
            println!("Deleted {}", item_id);
        }
        Commands::Clear { yes } => {
            let removed = app.clear_items(tab_id, yes)?;
            println!("Deleted {} items", removed);
        }
        Commands::ResetStatus { yes } => {
            let changed = app.reset_statuses(tab_id, yes)?;
            println!("Reset {} items to Outstanding", changed);
        }
        Commands::Move {
            item,
            before,
            after,
        } => {
            let (target, placement) = match (before, after) {
                (Some(target), _) => (target, Placement::Before),
                (None, Some(target)) => (target, Placement::After),
                (None, None) => anyhow::bail!("either --before or --after is required"),
            };
            let item_id = app.resolve_item(tab_id, &item)?;
            let target_id = app.resolve_item(tab_id, &target)?;
            app.move_item(tab_id, item_id, target_id, placement)?;
            println!("Moved {}", item);
        }
        Commands::Import { file, yes } => {
            let raw = read_import(&file).await?;
            match app.import_json(tab_id, &raw, yes)? {
                ImportSummary::Appended { tab_id, count } => {
                    println!("Imported {} items into tab {}", count, tab_id)
                }
                ImportSummary::Replaced { tabs } => println!("Restored {} tabs from backup", tabs),
            }
        }
        Commands::Export { output } => {
            let json = export_tab_json(app.tab(tab_id)?)?;
            write_output(&json, output)?;
        }
        Commands::Backup { output } => {
            let json = export_state_json(&app.snapshot())?;
            write_output(&json, output)?;
        }
        Commands::Headers { file } => {
            let raw = read_import(&file).await?;
            let sheet = Sheet::from_json(&raw, config.import.header_scan_rows)
                .map_err(error::Error::from)?;
            let headers = sheet.headers();
            println!("Header row: {}", sheet.header_row() + 1);
            for (index, header) in headers.iter().enumerate() {
                println!("{:>3}. {}", index + 1, header);
            }
            let suggested = suggest_mapping(&headers);
            println!("Suggested identifier column: {}", suggested.identifier);
            if let Some(location) = &suggested.location {
                println!("Suggested location column: {}", location);
            }
            println!("Suggested schedule column: {}", suggested.schedule);
        }
        Commands::Reconcile {
            file,
            id_column,
            schedule_column,
        } => {
            let raw = read_import(&file).await?;
            let sheet = Sheet::from_json(&raw, config.import.header_scan_rows)
                .map_err(error::Error::from)?;
            let mapping = resolve_mapping(&app, tab_id, &sheet, id_column, None, schedule_column)?;
            if mapping.schedule.is_empty() {
                anyhow::bail!("No schedule column found; pass --schedule-column");
            }

            let outcome = app.reconcile_tab(tab_id, &sheet, &mapping, config.import.diagnostic_samples)?;
            let report = outcome.report();
            match &outcome {
                ReconcileOutcome::Updated(_) => println!(
                    "Updated {} items ({} identifiers in {} sheet rows)",
                    report.updated, report.lookup_size, report.source_rows
                ),
                ReconcileOutcome::NoMatches(diagnostic) => {
                    println!(
                        "No items matched ({} identifiers in {} sheet rows).",
                        report.lookup_size, report.source_rows
                    );
                    println!("Sheet identifiers: {}", diagnostic.sheet_samples.join(", "));
                    println!("Item identifiers:  {}", diagnostic.item_samples.join(", "));
                    println!("Check that both sides use the same identifier format.");
                }
            }
        }
        Commands::ImportSheet {
            file,
            id_column,
            location_column,
            schedule_column,
            yes,
        } => {
            let raw = read_import(&file).await?;
            let sheet = Sheet::from_json(&raw, config.import.header_scan_rows)
                .map_err(error::Error::from)?;
            let mapping =
                resolve_mapping(&app, tab_id, &sheet, id_column, location_column, schedule_column)?;
            let count = app.append_sheet_rows(tab_id, &sheet, &mapping, yes)?;
            println!(
                "Imported {} rows into tab {} (header on row {})",
                count,
                tab_id,
                sheet.header_row() + 1
            );
        }
        Commands::Allow { identifiers } => {
            let identifiers = identifiers
                .iter()
                .flat_map(|arg| arg.split(','))
                .map(str::to_string)
                .collect();
            match app.set_allowed_identifiers(tab_id, identifiers)? {
                0 => println!("Showing every item in tab {}", tab_id),
                count => println!("Showing only {} identifiers in tab {}", count, tab_id),
            }
        }
        Commands::Report { date, output } => {
            let report_date = if let Some(date_str) = date {
                chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                    .map_err(|e| anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD: {}", e))?
            } else {
                chrono::Local::now().date_naive()
            };

            let report_path = report::generate_report(&app.tabs, Some(report_date), output)?;
            println!("Report generated: {}", report_path.display());
        }
    }

    Ok(())
}

/// Sheet columns: explicit flags, then the tab's last mapping, then a guess
/// from the header row. Only the identifier column is required here.
fn resolve_mapping(
    app: &AppState,
    tab_id: u32,
    sheet: &Sheet,
    id_column: Option<String>,
    location_column: Option<String>,
    schedule_column: Option<String>,
) -> Result<ColumnMapping> {
    let remembered = &app.tab(tab_id)?.import_mapping;
    let suggested = suggest_mapping(&sheet.headers());
    let pick = |explicit: Option<String>, last: &str, guess: &str| {
        explicit
            .filter(|name| !name.trim().is_empty())
            .or_else(|| (!last.is_empty()).then(|| last.to_string()))
            .or_else(|| (!guess.is_empty()).then(|| guess.to_string()))
    };

    let identifier = pick(id_column, &remembered.identifier, &suggested.identifier)
        .context("No identifier column found; pass --id-column")?;
    // A remembered or guessed location is dropped when this sheet lacks it
    let explicit_location = location_column.is_some();
    let location = pick(
        location_column,
        remembered.location.as_deref().unwrap_or_default(),
        suggested.location.as_deref().unwrap_or_default(),
    )
    .filter(|name| explicit_location || sheet.column(name).is_ok());
    let schedule = pick(schedule_column, &remembered.schedule, &suggested.schedule).unwrap_or_default();

    Ok(ColumnMapping {
        identifier,
        location,
        schedule,
    })
}
